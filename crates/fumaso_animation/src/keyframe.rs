//! Keyframes and paths
//!
//! A [`Path`] is a sequence of keyframes plus a handler. Sampling a path at a
//! playhead time finds the segment containing that time, eases the segment
//! progress with the starting keyframe's curve, and interpolates the values
//! component-wise.

use crate::curve::Curve;
use crate::error::{Result, TimelineError};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Callback receiving a path's interpolated value
pub type PathHandler = Box<dyn FnMut(&KeyframeValue)>;

/// The shape of a keyframe value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueShape {
    Scalar,
    Vector(usize),
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueShape::Scalar => f.write_str("scalar"),
            ValueShape::Vector(len) => write!(f, "vector of {}", len),
        }
    }
}

/// A value carried by a keyframe: a scalar or a fixed-length vector
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyframeValue {
    Scalar(f32),
    Vector(SmallVec<[f32; 4]>),
}

impl KeyframeValue {
    pub fn shape(&self) -> ValueShape {
        match self {
            KeyframeValue::Scalar(_) => ValueShape::Scalar,
            KeyframeValue::Vector(components) => ValueShape::Vector(components.len()),
        }
    }

    /// Scalar value, if this is a scalar
    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            KeyframeValue::Scalar(value) => Some(*value),
            KeyframeValue::Vector(_) => None,
        }
    }

    /// Vector components, if this is a vector
    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            KeyframeValue::Scalar(_) => None,
            KeyframeValue::Vector(components) => Some(components),
        }
    }

    /// Interpolate toward `other` by `t`, component-wise for vectors
    pub fn lerp(&self, other: &Self, t: f32) -> Result<Self> {
        match (self, other) {
            (KeyframeValue::Scalar(a), KeyframeValue::Scalar(b)) => {
                Ok(KeyframeValue::Scalar(a + (b - a) * t))
            }
            (KeyframeValue::Vector(a), KeyframeValue::Vector(b)) if a.len() == b.len() => Ok(
                KeyframeValue::Vector(a.iter().zip(b).map(|(a, b)| a + (b - a) * t).collect()),
            ),
            _ => Err(TimelineError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            }),
        }
    }
}

impl fmt::Display for KeyframeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyframeValue::Scalar(value) => write!(f, "{}", value),
            KeyframeValue::Vector(components) => {
                f.write_str("[")?;
                for (i, value) in components.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<f32> for KeyframeValue {
    fn from(value: f32) -> Self {
        KeyframeValue::Scalar(value)
    }
}

impl<const N: usize> From<[f32; N]> for KeyframeValue {
    fn from(value: [f32; N]) -> Self {
        KeyframeValue::Vector(SmallVec::from_slice(&value))
    }
}

impl From<&[f32]> for KeyframeValue {
    fn from(value: &[f32]) -> Self {
        KeyframeValue::Vector(SmallVec::from_slice(value))
    }
}

impl From<Vec<f32>> for KeyframeValue {
    fn from(value: Vec<f32>) -> Self {
        KeyframeValue::Vector(SmallVec::from_vec(value))
    }
}

/// A sample point on a path
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Keyframe {
    /// Playhead time of this keyframe
    pub time: f64,
    /// Value at this keyframe
    pub value: KeyframeValue,
    /// Curve for the segment that starts at this keyframe
    #[serde(default)]
    pub curve: Curve,
}

impl Keyframe {
    pub fn new(time: f64, value: impl Into<KeyframeValue>) -> Self {
        Self {
            time,
            value: value.into(),
            curve: Curve::Linear,
        }
    }

    /// Builder: set the curve leaving this keyframe
    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }
}

/// Check that keyframes are strictly ascending and share one value shape
pub fn validate_keyframes(keyframes: &[Keyframe]) -> Result<()> {
    let Some(first) = keyframes.first() else {
        return Ok(());
    };
    let shape = first.value.shape();

    for (index, keyframe) in keyframes.iter().enumerate() {
        if !keyframe.time.is_finite() {
            return Err(TimelineError::InvalidPath {
                index,
                reason: format!("time {} is not finite", keyframe.time),
            });
        }
        if keyframe.value.shape() != shape {
            return Err(TimelineError::InvalidPath {
                index,
                reason: format!(
                    "value is a {} but the path started with a {}",
                    keyframe.value.shape(),
                    shape
                ),
            });
        }
        if index > 0 && keyframe.time <= keyframes[index - 1].time {
            return Err(TimelineError::InvalidPath {
                index,
                reason: format!(
                    "time {} does not come after {}",
                    keyframe.time,
                    keyframes[index - 1].time
                ),
            });
        }
    }
    Ok(())
}

/// Values sampled from one path at one time, in segment order
pub type Samples = SmallVec<[KeyframeValue; 2]>;

/// Sample keyframes at `time`.
///
/// Yields one value per segment that spans `time`, so a time sitting exactly
/// on an interior keyframe yields the end of the incoming segment followed by
/// the start of the outgoing one. Past the last keyframe the final value is
/// held. Before the first keyframe (and for empty paths) nothing is yielded.
pub fn sample_keyframes(keyframes: &[Keyframe], time: f64) -> Result<Samples> {
    let mut samples = Samples::new();

    for pair in keyframes.windows(2) {
        let (curr, next) = (&pair[0], &pair[1]);
        if curr.time <= time && time <= next.time {
            let progress = ((time - curr.time) / (next.time - curr.time)) as f32;
            let eased = curr.curve.apply(progress);
            samples.push(curr.value.lerp(&next.value, eased)?);
        }
    }

    if let Some(last) = keyframes.last() {
        if time > last.time {
            samples.push(last.value.clone());
        }
    }

    Ok(samples)
}

/// A keyframe sequence and the handler that receives its sampled values
pub struct Path {
    pub(crate) name: Option<String>,
    pub(crate) keyframes: Vec<Keyframe>,
    pub(crate) handler: PathHandler,
}

impl Path {
    /// Create an empty path delivering samples to `handler`
    pub fn new(handler: impl FnMut(&KeyframeValue) + 'static) -> Self {
        Self {
            name: None,
            keyframes: Vec::new(),
            handler: Box::new(handler),
        }
    }

    /// Builder: label the path (used in logs)
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: append a linear keyframe
    pub fn keyframe(mut self, time: f64, value: impl Into<KeyframeValue>) -> Self {
        self.keyframes.push(Keyframe::new(time, value));
        self
    }

    /// Builder: append a keyframe whose outgoing segment uses `curve`
    pub fn keyframe_with_curve(
        mut self,
        time: f64,
        value: impl Into<KeyframeValue>,
        curve: Curve,
    ) -> Self {
        self.keyframes.push(Keyframe::new(time, value).with_curve(curve));
        self
    }

    /// Builder: append prepared keyframes
    pub fn keyframes(mut self, keyframes: impl IntoIterator<Item = Keyframe>) -> Self {
        self.keyframes.extend(keyframes);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn keyframe_slice(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Latest keyframe time, if any
    pub fn end_time(&self) -> Option<f64> {
        self.keyframes.iter().map(|k| k.time).reduce(f64::max)
    }

    /// Sample this path at `time` without invoking the handler
    pub fn sample(&self, time: f64) -> Result<Samples> {
        sample_keyframes(&self.keyframes, time)
    }

    pub fn validate(&self) -> Result<()> {
        validate_keyframes(&self.keyframes)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("name", &self.name)
            .field("keyframes", &self.keyframes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Vec<Keyframe> {
        vec![Keyframe::new(0.0, 0.0), Keyframe::new(1000.0, 100.0)]
    }

    /// The value a handler is left with after a sample
    fn scalar(samples: Samples) -> f32 {
        samples
            .last()
            .and_then(|v| v.as_scalar())
            .expect("scalar sample")
    }

    fn scalars(samples: Samples) -> Vec<f32> {
        samples.iter().filter_map(|v| v.as_scalar()).collect()
    }

    #[test]
    fn test_scalar_interpolation() {
        let keyframes = ramp();
        for f in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let value = scalar(sample_keyframes(&keyframes, 1000.0 * f).unwrap());
            assert!((value - 100.0 * f as f32).abs() < 1e-4);
        }
    }

    #[test]
    fn test_vector_interpolation() {
        let keyframes = vec![
            Keyframe::new(0.0, [0.0, 0.0, 0.0]),
            Keyframe::new(1000.0, [10.0, 20.0, 30.0]),
        ];
        let samples = sample_keyframes(&keyframes, 500.0).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].as_vector(), Some(&[5.0, 10.0, 15.0][..]));
    }

    #[test]
    fn test_before_first_keyframe_is_none() {
        let keyframes = vec![Keyframe::new(100.0, 1.0), Keyframe::new(200.0, 2.0)];
        assert!(sample_keyframes(&keyframes, 99.0).unwrap().is_empty());
        assert!(sample_keyframes(&keyframes, -5.0).unwrap().is_empty());
    }

    #[test]
    fn test_past_last_keyframe_holds() {
        let keyframes = ramp();
        assert_eq!(scalar(sample_keyframes(&keyframes, 1500.0).unwrap()), 100.0);
        assert_eq!(scalar(sample_keyframes(&keyframes, 1e9).unwrap()), 100.0);
    }

    #[test]
    fn test_single_keyframe_path() {
        let keyframes = vec![Keyframe::new(10.0, 4.0)];
        assert!(sample_keyframes(&keyframes, 10.0).unwrap().is_empty());
        assert_eq!(scalar(sample_keyframes(&keyframes, 10.5).unwrap()), 4.0);
    }

    #[test]
    fn test_curve_belongs_to_segment_start() {
        let keyframes = vec![
            Keyframe::new(0.0, 0.0).with_curve(Curve::EaseIn),
            Keyframe::new(100.0, 100.0),
            Keyframe::new(200.0, 0.0),
        ];
        assert!((scalar(sample_keyframes(&keyframes, 50.0).unwrap()) - 25.0).abs() < 1e-4);
        assert!((scalar(sample_keyframes(&keyframes, 150.0).unwrap()) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_interior_keyframe_samples_both_segments() {
        let keyframes = vec![
            Keyframe::new(0.0, 0.0),
            Keyframe::new(100.0, 10.0),
            Keyframe::new(200.0, 30.0),
        ];
        assert_eq!(scalars(sample_keyframes(&keyframes, 100.0).unwrap()), vec![10.0, 10.0]);
        assert_eq!(scalars(sample_keyframes(&keyframes, 0.0).unwrap()), vec![0.0]);
        assert_eq!(scalars(sample_keyframes(&keyframes, 200.0).unwrap()), vec![30.0]);
    }

    #[test]
    fn test_interior_keyframe_outgoing_segment_decides() {
        // Curves that miss their endpoints make the two segment samples differ
        let keyframes = vec![
            Keyframe::new(0.0, 0.0).with_curve(Curve::custom(|t| t * 0.5)),
            Keyframe::new(100.0, 10.0).with_curve(Curve::custom(|t| t + 0.5)),
            Keyframe::new(200.0, 30.0),
        ];
        let samples = sample_keyframes(&keyframes, 100.0).unwrap();
        assert_eq!(scalars(samples.clone()), vec![5.0, 20.0]);
        assert_eq!(scalar(samples), 20.0);
    }

    #[test]
    fn test_lerp_shape_mismatch() {
        let err = KeyframeValue::Scalar(1.0)
            .lerp(&KeyframeValue::from([1.0, 2.0]), 0.5)
            .unwrap_err();
        assert_eq!(
            err,
            TimelineError::ShapeMismatch {
                left: ValueShape::Scalar,
                right: ValueShape::Vector(2),
            }
        );

        assert!(KeyframeValue::from([1.0, 2.0])
            .lerp(&KeyframeValue::from([1.0, 2.0, 3.0]), 0.5)
            .is_err());
    }

    #[test]
    fn test_validate_rejects_unordered_times() {
        let keyframes = vec![Keyframe::new(100.0, 0.0), Keyframe::new(50.0, 1.0)];
        assert!(matches!(
            validate_keyframes(&keyframes),
            Err(TimelineError::InvalidPath { index: 1, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_times() {
        let keyframes = vec![Keyframe::new(100.0, 0.0), Keyframe::new(100.0, 1.0)];
        assert!(validate_keyframes(&keyframes).is_err());
    }

    #[test]
    fn test_validate_rejects_mixed_shapes() {
        let keyframes = vec![
            Keyframe::new(0.0, [0.0, 0.0]),
            Keyframe::new(10.0, [1.0, 1.0]),
            Keyframe::new(20.0, [1.0, 1.0, 1.0]),
        ];
        assert!(matches!(
            validate_keyframes(&keyframes),
            Err(TimelineError::InvalidPath { index: 2, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_nan_time() {
        let keyframes = vec![Keyframe::new(f64::NAN, 0.0)];
        assert!(validate_keyframes(&keyframes).is_err());
    }

    #[test]
    fn test_empty_path_is_valid_and_silent() {
        assert!(validate_keyframes(&[]).is_ok());
        assert!(sample_keyframes(&[], 10.0).unwrap().is_empty());
    }

    #[test]
    fn test_value_deserializes_untagged() {
        let scalar: KeyframeValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(scalar, KeyframeValue::Scalar(2.5));

        let vector: KeyframeValue = serde_json::from_str("[1.0, 2.0]").unwrap();
        assert_eq!(vector.shape(), ValueShape::Vector(2));
    }

    #[test]
    fn test_display() {
        assert_eq!(KeyframeValue::Scalar(1.5).to_string(), "1.5");
        assert_eq!(KeyframeValue::from([1.0, 2.5]).to_string(), "[1, 2.5]");
    }

    #[test]
    fn test_path_end_time() {
        let path = Path::new(|_| {}).keyframe(0.0, 1.0).keyframe(250.0, 2.0);
        assert_eq!(path.end_time(), Some(250.0));
        assert_eq!(Path::new(|_| {}).end_time(), None);
    }
}
