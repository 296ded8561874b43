//! Executors walk a machine from its start state until exit.
//!
//! There is one executor core, configured along three independent axes:
//! - blocking on failure: an executor flag, combined with the machine's own
//! - observers: any number of read-only [`Observer`] taps
//! - drive mode: [`Executor::execute`], [`Executor::advance`] /
//!   [`Executor::steps`], or [`BackgroundExecutor::execute`]
//!
//! Each loop iteration runs the current state's action. On success the
//! first matching transition (globals first) picks the next state. On
//! failure the walk either aborts (blocking) or follows the first matching
//! exception transition. No matching transition means exit.

mod background;
mod error;
mod nested;
mod observer;
mod runner;
mod walk;

pub use background::{BackgroundExecutor, WalkHandle};
pub use error::ExecutionError;
pub use nested::nested;
pub use observer::{Observer, TimingObserver};
pub use runner::{Executor, Status, Steps};
