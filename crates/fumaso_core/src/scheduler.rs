//! Update scheduler
//!
//! Objects that want to run per-frame logic ask for exactly one update on the
//! next tick. Registration is not persistent: an updatable that needs another
//! frame has to ask again from inside its `on_update`.

use crate::clock::Clock;
use rustc_hash::FxHashSet;
use std::cell::{Cell, RefCell};
use std::rc::Weak;

/// Something that can be updated once per frame tick
pub trait Updatable {
    /// Called by the scheduler with the clock time of the tick (ms)
    fn on_update(&self, time: f64);
}

/// The capability to schedule an update on the next frame tick
pub trait UpdateScheduler {
    /// Register `target` to receive one `on_update` call on the next tick.
    ///
    /// The scheduler holds the target weakly; dropping the owner cancels any
    /// pending update.
    fn request_update_on_next_tick(&self, target: Weak<dyn Updatable>);
}

/// A headless frame loop that owns the clock and dispatches queued updates.
///
/// Requests made while a tick is being dispatched land on the following tick.
/// A target requested several times before a tick is updated once.
pub struct FrameScheduler {
    clock: Clock,
    next_tick: RefCell<Vec<Weak<dyn Updatable>>>,
    queued: RefCell<FxHashSet<usize>>,
    frame: Cell<u64>,
}

impl FrameScheduler {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            next_tick: RefCell::new(Vec::new()),
            queued: RefCell::new(FxHashSet::default()),
            frame: Cell::new(0),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Number of ticks run so far
    pub fn frame(&self) -> u64 {
        self.frame.get()
    }

    /// Whether any update is queued for the next tick
    pub fn has_pending(&self) -> bool {
        !self.next_tick.borrow().is_empty()
    }

    /// Number of distinct targets queued for the next tick
    pub fn pending_count(&self) -> usize {
        self.next_tick.borrow().len()
    }

    /// Advance the clock by `dt_ms` and dispatch every queued update.
    ///
    /// Returns the number of targets that were updated.
    pub fn tick(&self, dt_ms: f64) -> usize {
        self.clock.advance(dt_ms);
        let frame = self.frame.get() + 1;
        self.frame.set(frame);

        let due = std::mem::take(&mut *self.next_tick.borrow_mut());
        self.queued.borrow_mut().clear();

        let now = self.clock.now();
        let mut dispatched = 0;
        for target in due {
            if let Some(target) = target.upgrade() {
                target.on_update(now);
                dispatched += 1;
            }
        }

        tracing::trace!(frame, now, dispatched, "frame tick");
        dispatched
    }

    /// Tick at a fixed step until nothing is queued or `max_frames` is hit.
    ///
    /// Returns the number of ticks run.
    pub fn run_until_idle(&self, frame_ms: f64, max_frames: usize) -> usize {
        let mut frames = 0;
        while self.has_pending() && frames < max_frames {
            self.tick(frame_ms);
            frames += 1;
        }

        if self.has_pending() {
            tracing::warn!(
                max_frames,
                pending = self.pending_count(),
                "frame budget exhausted with updates still queued"
            );
        }
        frames
    }
}

impl UpdateScheduler for FrameScheduler {
    fn request_update_on_next_tick(&self, target: Weak<dyn Updatable>) {
        let key = target.as_ptr() as *const () as usize;
        if self.queued.borrow_mut().insert(key) {
            self.next_tick.borrow_mut().push(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    /// Records every update and optionally re-arms itself
    struct Counter {
        scheduler: Weak<FrameScheduler>,
        this: Weak<Counter>,
        updates: RefCell<Vec<f64>>,
        rearm_until: Cell<usize>,
    }

    impl Counter {
        fn new(scheduler: &Rc<FrameScheduler>, rearm_until: usize) -> Rc<Self> {
            Rc::new_cyclic(|this| Counter {
                scheduler: Rc::downgrade(scheduler),
                this: this.clone(),
                updates: RefCell::new(Vec::new()),
                rearm_until: Cell::new(rearm_until),
            })
        }

        fn request(&self) {
            if let Some(scheduler) = self.scheduler.upgrade() {
                let target: Weak<dyn Updatable> = self.this.clone();
                scheduler.request_update_on_next_tick(target);
            }
        }
    }

    impl Updatable for Counter {
        fn on_update(&self, time: f64) {
            self.updates.borrow_mut().push(time);
            if self.updates.borrow().len() < self.rearm_until.get() {
                self.request();
            }
        }
    }

    #[test]
    fn test_single_update_per_request() {
        let scheduler = Rc::new(FrameScheduler::new(Clock::new()));
        let counter = Counter::new(&scheduler, 0);

        counter.request();
        assert!(scheduler.has_pending());

        assert_eq!(scheduler.tick(16.0), 1);
        assert_eq!(scheduler.tick(16.0), 0);
        assert_eq!(*counter.updates.borrow(), vec![16.0]);
    }

    #[test]
    fn test_duplicate_requests_are_coalesced() {
        let scheduler = Rc::new(FrameScheduler::new(Clock::new()));
        let counter = Counter::new(&scheduler, 0);

        counter.request();
        counter.request();
        counter.request();
        assert_eq!(scheduler.pending_count(), 1);

        scheduler.tick(10.0);
        assert_eq!(counter.updates.borrow().len(), 1);
    }

    #[test]
    fn test_rearm_during_dispatch_lands_on_next_tick() {
        let scheduler = Rc::new(FrameScheduler::new(Clock::new()));
        let counter = Counter::new(&scheduler, 3);

        counter.request();
        let frames = scheduler.run_until_idle(10.0, 100);

        assert_eq!(frames, 3);
        assert_eq!(*counter.updates.borrow(), vec![10.0, 20.0, 30.0]);
        assert_eq!(scheduler.frame(), 3);
    }

    #[test]
    fn test_dropped_target_is_skipped() {
        let scheduler = Rc::new(FrameScheduler::new(Clock::new()));
        let counter = Counter::new(&scheduler, 0);

        counter.request();
        drop(counter);

        assert_eq!(scheduler.tick(16.0), 0);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_run_until_idle_respects_frame_budget() {
        let scheduler = Rc::new(FrameScheduler::new(Clock::new()));
        let counter = Counter::new(&scheduler, usize::MAX);

        counter.request();
        let frames = scheduler.run_until_idle(1.0, 5);

        assert_eq!(frames, 5);
        assert!(scheduler.has_pending());
        assert_eq!(scheduler.clock().now(), 5.0);
    }
}
