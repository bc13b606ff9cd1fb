//! Animatable scalar values
//!
//! A [`Transitionable`] holds a value that can either be set immediately or
//! moved toward a target over a duration. Progress is computed lazily from
//! the shared [`Clock`] whenever the value is read, and the completion
//! callback fires from the read that first observes the end of the
//! transition.

use crate::clock::Clock;
use std::cell::RefCell;

/// Maps linear progress (0.0 to 1.0) to eased progress
pub type TransitionCurve = fn(f64) -> f64;

/// Invoked once when a transition finishes
pub type CompletionCallback = Box<dyn FnOnce()>;

fn linear(t: f64) -> f64 {
    t
}

/// Configuration for a timed transition
#[derive(Clone, Copy, Debug)]
pub struct Transition {
    /// Duration in milliseconds
    pub duration: f64,
    /// Easing applied to the transition's progress
    pub curve: TransitionCurve,
}

impl Transition {
    /// A linear transition lasting `duration` ms (negative durations clamp to zero)
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            curve: linear,
        }
    }

    /// Builder: set the easing curve
    pub fn with_curve(mut self, curve: TransitionCurve) -> Self {
        self.curve = curve;
        self
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::new(0.0)
    }
}

struct ActiveTransition {
    from: f64,
    to: f64,
    start_ms: f64,
    transition: Transition,
    on_complete: Option<CompletionCallback>,
}

impl ActiveTransition {
    /// Sample at `now`; `None` once the transition has run its full duration
    fn sample(&self, now: f64) -> Option<f64> {
        let elapsed = now - self.start_ms;
        if elapsed >= self.transition.duration {
            return None;
        }
        let progress = (elapsed / self.transition.duration).max(0.0);
        let eased = (self.transition.curve)(progress);
        Some(self.from + (self.to - self.from) * eased)
    }
}

struct TransitionState {
    value: f64,
    active: Option<ActiveTransition>,
}

/// A scalar value supporting instantaneous sets and timed transitions
pub struct Transitionable {
    clock: Clock,
    state: RefCell<TransitionState>,
}

impl Transitionable {
    pub fn new(clock: Clock, initial: f64) -> Self {
        Self {
            clock,
            state: RefCell::new(TransitionState {
                value: initial,
                active: None,
            }),
        }
    }

    /// Current value at the clock's time.
    ///
    /// If this read observes the end of an active transition, the value
    /// settles on the target and the transition's completion callback runs
    /// before this returns.
    pub fn get(&self) -> f64 {
        let now = self.clock.now();
        let (value, on_complete) = {
            let mut state = self.state.borrow_mut();
            let Some(active) = state.active.as_ref() else {
                return state.value;
            };

            match active.sample(now) {
                Some(value) => {
                    state.value = value;
                    return value;
                }
                None => {
                    let finished = state.active.take();
                    let to = finished.as_ref().map_or(state.value, |done| done.to);
                    state.value = to;
                    (to, finished.and_then(|done| done.on_complete))
                }
            }
        };

        if let Some(on_complete) = on_complete {
            on_complete();
        }
        value
    }

    /// Set a new target.
    ///
    /// Without a transition the value jumps to `target` and `on_complete`
    /// runs immediately. With one, the value moves from its current reading
    /// toward `target`. Any transition still in flight is replaced and its
    /// callback is dropped without running.
    pub fn set(
        &self,
        target: f64,
        transition: Option<Transition>,
        on_complete: Option<CompletionCallback>,
    ) {
        let from = self.get();

        match transition {
            Some(transition) => {
                let replaced = self
                    .state
                    .borrow_mut()
                    .active
                    .replace(ActiveTransition {
                        from,
                        to: target,
                        start_ms: self.clock.now(),
                        transition,
                        on_complete,
                    });
                if replaced.is_some() {
                    tracing::debug!(from, target, "replacing in-flight transition");
                }
            }
            None => {
                {
                    let mut state = self.state.borrow_mut();
                    state.active = None;
                    state.value = target;
                }
                if let Some(on_complete) = on_complete {
                    on_complete();
                }
            }
        }
    }

    /// Stop any active transition at its current value without completing it
    pub fn halt(&self) {
        let now = self.clock.now();
        let mut state = self.state.borrow_mut();
        if let Some(active) = state.active.take() {
            state.value = active.sample(now).unwrap_or(active.to);
        }
    }

    /// Whether a transition is in flight.
    ///
    /// A transition that has run its duration stays active until the next
    /// [`get`](Self::get) observes it.
    pub fn is_active(&self) -> bool {
        self.state.borrow().active.is_some()
    }
}
