//! Fumaso Core Runtime
//!
//! The engine-facing primitives a timeline needs to run:
//!
//! - **Clock**: A shared frame clock, advanced by whoever drives the frames
//! - **Update Scheduling**: Pull-based "call me on the next tick" registration
//! - **Transitionable**: An animatable scalar with timed, eased transitions
//!
//! # Example
//!
//! ```rust
//! use fumaso_core::{Clock, Transition, Transitionable};
//!
//! let clock = Clock::new();
//! let value = Transitionable::new(clock.clone(), 0.0);
//!
//! value.set(100.0, Some(Transition::new(1000.0)), None);
//! clock.advance(250.0);
//! assert_eq!(value.get(), 25.0);
//!
//! clock.advance(750.0);
//! assert_eq!(value.get(), 100.0);
//! assert!(!value.is_active());
//! ```

pub mod clock;
pub mod scheduler;
pub mod transitionable;

pub use clock::Clock;
pub use scheduler::{FrameScheduler, Updatable, UpdateScheduler};
pub use transitionable::{CompletionCallback, Transition, TransitionCurve, Transitionable};
