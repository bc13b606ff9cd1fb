//! Fumaso Animation System
//!
//! Keyframe paths and timeline playback.
//!
//! # Features
//!
//! - **Paths**: Keyframe sequences over scalar or vector values, each with a handler
//! - **Curves**: Named easing curves, CSS cubic beziers, and custom functions
//! - **Timelines**: Sample every registered path at an animated playhead,
//!   driven tick by tick through an injected update scheduler

pub mod curve;
pub mod error;
pub mod keyframe;
pub mod timeline;

pub use curve::{Curve, CustomCurve};
pub use error::{Result, TimelineError};
pub use keyframe::{Keyframe, KeyframeValue, Path, PathHandler, Samples, ValueShape};
pub use timeline::{Timeline, TimelineOptions};
