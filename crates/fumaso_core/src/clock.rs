//! Shared frame clock

use std::cell::Cell;
use std::rc::Rc;

/// A frame clock measured in milliseconds.
///
/// Cloning a `Clock` yields another handle onto the same time source, so the
/// scheduler that advances it and every value reading from it stay in step.
#[derive(Clone, Debug, Default)]
pub struct Clock {
    now_ms: Rc<Cell<f64>>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock whose current time is `now_ms`
    pub fn starting_at(now_ms: f64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(now_ms)),
        }
    }

    /// Current time in milliseconds
    pub fn now(&self) -> f64 {
        self.now_ms.get()
    }

    /// Jump to an absolute time
    pub fn set(&self, now_ms: f64) {
        self.now_ms.set(now_ms);
    }

    /// Move the clock forward by `dt_ms`
    pub fn advance(&self, dt_ms: f64) {
        self.now_ms.set(self.now_ms.get() + dt_ms);
    }
}
