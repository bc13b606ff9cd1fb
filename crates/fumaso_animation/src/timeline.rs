//! Keyframe timeline playback
//!
//! A [`Timeline`] owns a playhead and a set of registered [`Path`]s. Every
//! scheduled tick it reads the playhead, samples each path at that time and
//! hands the interpolated value to the path's handler. While the playhead is
//! transitioning the timeline keeps asking the scheduler for another tick;
//! once the transition completes it asks for exactly one more so the final
//! state is delivered, then goes quiet.

use crate::error::{Result, TimelineError};
use crate::keyframe::{sample_keyframes, Keyframe, Path, PathHandler};
use fumaso_core::{
    Clock, CompletionCallback, Transition, Transitionable, Updatable, UpdateScheduler,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Construction options for a [`Timeline`]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineOptions {
    /// Initial playhead position
    #[serde(default)]
    pub start_time: f64,
    /// Multiplier applied to the playhead before sampling paths
    #[serde(default = "default_timescale")]
    pub timescale: f64,
}

fn default_timescale() -> f64 {
    1.0
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            timescale: default_timescale(),
        }
    }
}

impl TimelineOptions {
    /// Builder: set the initial playhead position
    pub fn start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Builder: set the timescale
    pub fn timescale(mut self, timescale: f64) -> Self {
        self.timescale = timescale;
        self
    }
}

fn check_timescale(timescale: f64) -> Result<()> {
    if timescale.is_finite() && timescale > 0.0 {
        Ok(())
    } else {
        Err(TimelineError::InvalidTimescale(timescale))
    }
}

/// A registered path. The handler sits behind its own cell so handlers can
/// register further paths on the timeline while they run.
struct PathEntry {
    name: Option<String>,
    keyframes: Vec<Keyframe>,
    handler: RefCell<PathHandler>,
}

struct TimelineInner {
    this: Weak<TimelineInner>,
    scheduler: Rc<dyn UpdateScheduler>,
    current_time: Transitionable,
    timescale: Cell<f64>,
    end_time: Cell<f64>,
    paths: RefCell<Vec<Rc<PathEntry>>>,
    in_transition: Cell<bool>,
    /// Bumped on every `set`; only the latest transition may complete
    generation: Cell<u64>,
}

impl TimelineInner {
    fn request_tick(&self) {
        let target: Weak<dyn Updatable> = self.this.clone();
        self.scheduler.request_update_on_next_tick(target);
    }

    fn finish_transition(&self, generation: u64, callback: Option<CompletionCallback>) {
        if self.generation.get() != generation {
            tracing::debug!(generation, "ignoring completion of superseded transition");
            return;
        }
        tracing::debug!(time = self.current_time.get(), "timeline transition finished");
        self.in_transition.set(false);
        self.request_tick();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn sample(&self) {
        let time = self.current_time.get() * self.timescale.get();

        // Handlers may register paths; those join from the next tick
        let paths: Vec<Rc<PathEntry>> = self.paths.borrow().clone();

        for entry in &paths {
            let samples = match sample_keyframes(&entry.keyframes, time) {
                Ok(samples) => samples,
                Err(e) => {
                    tracing::warn!(path = ?entry.name, time, "skipping path sample: {}", e);
                    continue;
                }
            };
            if samples.is_empty() {
                continue;
            }

            match entry.handler.try_borrow_mut() {
                Ok(mut handler) => {
                    for value in &samples {
                        (*handler)(value);
                    }
                }
                Err(_) => {
                    tracing::warn!(path = ?entry.name, "path handler re-entered, sample dropped");
                }
            }
        }

        tracing::trace!(time, paths = paths.len(), "timeline sampled");

        if self.in_transition.get() {
            self.request_tick();
        }
    }
}

impl Updatable for TimelineInner {
    fn on_update(&self, _time: f64) {
        self.sample();
    }
}

/// Plays registered keyframe paths against an animatable playhead.
///
/// `Timeline` is a cheap handle; clones share the same playhead and paths.
/// The scheduler only holds the timeline weakly, so dropping every handle
/// stops further ticks.
///
/// # Example
///
/// ```rust
/// use fumaso_animation::{Path, Timeline, TimelineOptions};
/// use fumaso_core::{Clock, FrameScheduler};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let clock = Clock::new();
/// let scheduler = Rc::new(FrameScheduler::new(clock.clone()));
/// let timeline = Timeline::new(scheduler.clone(), clock, TimelineOptions::default()).unwrap();
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = seen.clone();
/// timeline
///     .register_path(
///         Path::new(move |v| sink.borrow_mut().push(v.as_scalar().unwrap()))
///             .keyframe(0.0, 0.0)
///             .keyframe(1000.0, 100.0),
///     )
///     .unwrap();
///
/// timeline.play();
/// scheduler.run_until_idle(250.0, 100);
///
/// assert_eq!(*seen.borrow(), vec![25.0, 50.0, 75.0, 100.0, 100.0]);
/// ```
#[derive(Clone)]
pub struct Timeline {
    inner: Rc<TimelineInner>,
}

impl Timeline {
    /// Create a timeline whose playhead reads time from `clock` and whose
    /// ticks are requested from `scheduler`.
    pub fn new(
        scheduler: Rc<dyn UpdateScheduler>,
        clock: Clock,
        options: TimelineOptions,
    ) -> Result<Self> {
        check_timescale(options.timescale)?;

        let inner = Rc::new_cyclic(|this| TimelineInner {
            this: this.clone(),
            scheduler,
            current_time: Transitionable::new(clock, options.start_time),
            timescale: Cell::new(options.timescale),
            end_time: Cell::new(0.0),
            paths: RefCell::new(Vec::new()),
            in_transition: Cell::new(false),
            generation: Cell::new(0),
        });

        Ok(Self { inner })
    }

    /// Register a path for sampling.
    ///
    /// Rejects paths whose keyframe times are not strictly ascending or whose
    /// values change shape. Raises [`end_time`](Self::end_time) to cover the
    /// new keyframes; it never lowers it.
    pub fn register_path(&self, path: Path) -> Result<()> {
        path.validate()?;

        let Path {
            name,
            keyframes,
            handler,
        } = path;

        let end_time = keyframes
            .iter()
            .fold(self.inner.end_time.get(), |end, k| end.max(k.time));
        self.inner.end_time.set(end_time);

        tracing::debug!(
            path = ?name,
            keyframes = keyframes.len(),
            end_time,
            "registered timeline path"
        );

        self.inner.paths.borrow_mut().push(Rc::new(PathEntry {
            name,
            keyframes,
            handler: RefCell::new(handler),
        }));
        Ok(())
    }

    /// Play forward from the current playhead to the end of the latest path,
    /// at normal speed.
    pub fn play(&self) {
        let end_time = self.inner.end_time.get();
        let duration = end_time - self.inner.current_time.get();
        self.set(end_time, Some(Transition::new(duration)), None);
    }

    /// Move the playhead to `time`.
    ///
    /// With a transition the playhead animates there and the timeline ticks
    /// until it arrives, plus one final tick; `callback` runs on arrival.
    /// Without one the playhead jumps, a single tick is requested and
    /// `callback` is dropped unrun.
    /// Out-of-range times are accepted as-is.
    pub fn set(
        &self,
        time: f64,
        transition: Option<Transition>,
        callback: Option<CompletionCallback>,
    ) {
        let inner = &self.inner;
        let generation = inner.generation.get() + 1;
        inner.generation.set(generation);

        match transition {
            Some(transition) => {
                tracing::debug!(
                    from = inner.current_time.get(),
                    to = time,
                    duration = transition.duration,
                    "timeline transition started"
                );
                inner.in_transition.set(true);
                inner.request_tick();

                let this = inner.this.clone();
                inner.current_time.set(
                    time,
                    Some(transition),
                    Some(Box::new(move || {
                        if let Some(inner) = this.upgrade() {
                            inner.finish_transition(generation, callback);
                        }
                    })),
                );
            }
            None => {
                inner.current_time.set(time, None, None);
                inner.in_transition.set(false);
                inner.request_tick();
                if callback.is_some() {
                    tracing::debug!(time, "jump has no transition to complete, callback dropped");
                }
            }
        }
    }

    /// Sample every path at the current playhead and fire their handlers.
    ///
    /// Normally driven by the scheduler; calling it directly samples without
    /// waiting for a tick.
    pub fn on_update(&self) {
        self.inner.sample();
    }

    /// Current playhead position (before the timescale is applied)
    pub fn current_time(&self) -> f64 {
        self.inner.current_time.get()
    }

    /// Latest keyframe time over every registered path
    pub fn end_time(&self) -> f64 {
        self.inner.end_time.get()
    }

    pub fn timescale(&self) -> f64 {
        self.inner.timescale.get()
    }

    pub fn set_timescale(&self, timescale: f64) -> Result<()> {
        check_timescale(timescale)?;
        self.inner.timescale.set(timescale);
        Ok(())
    }

    /// Whether a timed playhead transition is in flight
    pub fn is_in_transition(&self) -> bool {
        self.inner.in_transition.get()
    }

    pub fn path_count(&self) -> usize {
        self.inner.paths.borrow().len()
    }
}

impl std::fmt::Debug for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timeline")
            .field("current_time", &self.current_time())
            .field("end_time", &self.end_time())
            .field("timescale", &self.timescale())
            .field("in_transition", &self.is_in_transition())
            .field("paths", &self.path_count())
            .finish()
    }
}
