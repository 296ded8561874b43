//! Read-only taps on a walk.
//!
//! An [`Observer`] is told about every phase of a walk. It only receives
//! shared references, so it cannot change which state runs next. Observers
//! that keep data use interior mutability.

use super::error::ExecutionError;
use crate::core::{ActionError, State};
use crate::graph::Transition;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Hooks called during a walk. Every hook defaults to doing nothing.
#[allow(unused_variables)]
pub trait Observer<C>: Send + Sync {
    /// Once, before the first action runs.
    fn before_loop(&self, context: &C) {}

    fn before_action(&self, state: &State<C>, context: &C) {}

    /// After an action returned successfully.
    fn after_action(&self, state: &State<C>, context: &C) {}

    /// With every transition about to be considered, in priority order.
    fn before_selection(&self, state: &State<C>, candidates: &[&Transition<C>], context: &C) {}

    /// With every exception transition about to be considered.
    fn before_exception_selection(
        &self,
        state: &State<C>,
        candidates: &[&Transition<C>],
        error: &ActionError,
        context: &C,
    ) {
    }

    /// After the next state was chosen. `None` means the walk exits.
    fn next_selected(&self, current: &State<C>, next: Option<&State<C>>, context: &C) {}

    /// Once, after the walk reached exit.
    fn after_loop(&self, context: &C) {}

    /// When an action failed, before the failure is handled.
    fn caught_failure(&self, state: &State<C>, error: &ActionError, context: &C) {}

    /// When the walk ended with an error instead of reaching exit.
    fn walk_aborted(&self, error: &ExecutionError) {}
}

#[derive(Default)]
struct Timings {
    walk_started: Option<Instant>,
    action_started: Option<Instant>,
    total: Option<Duration>,
    states: Vec<(String, Duration)>,
}

/// Measures the whole walk and every action.
///
/// # Example
///
/// ```rust
/// use gameflow::builder::MachineBuilder;
/// use gameflow::core::State;
/// use gameflow::executor::{Executor, TimingObserver};
/// use gameflow::graph::EXIT;
/// use std::sync::Arc;
///
/// let mut builder = MachineBuilder::<()>::new();
/// let only = builder.add_new_starting_state(State::new("Only").with_action(|_| Ok(())));
/// builder.add_direct_transition(only, EXIT);
///
/// let timing = Arc::new(TimingObserver::new());
/// let mut executor = Executor::new()
///     .with_machine(builder.build())
///     .with_context(())
///     .with_observer(timing.clone());
/// executor.execute().unwrap();
///
/// assert!(timing.total().is_some());
/// assert_eq!(timing.state_timings()[0].0, "Only.001");
/// ```
#[derive(Default)]
pub struct TimingObserver {
    timings: Mutex<Timings>,
}

impl TimingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration of the last completed walk.
    pub fn total(&self) -> Option<Duration> {
        self.timings.lock().total
    }

    /// Action durations of the last walk, in visiting order.
    pub fn state_timings(&self) -> Vec<(String, Duration)> {
        self.timings.lock().states.clone()
    }

    fn finish_action<C>(&self, state: &State<C>) {
        let mut timings = self.timings.lock();
        if let Some(started) = timings.action_started.take() {
            timings.states.push((state.identifier(), started.elapsed()));
        }
    }
}

impl<C> Observer<C> for TimingObserver {
    fn before_loop(&self, _context: &C) {
        let mut timings = self.timings.lock();
        *timings = Timings {
            walk_started: Some(Instant::now()),
            ..Timings::default()
        };
    }

    fn before_action(&self, _state: &State<C>, _context: &C) {
        self.timings.lock().action_started = Some(Instant::now());
    }

    fn after_action(&self, state: &State<C>, _context: &C) {
        self.finish_action(state);
    }

    fn caught_failure(&self, state: &State<C>, _error: &ActionError, _context: &C) {
        self.finish_action(state);
    }

    fn after_loop(&self, _context: &C) {
        let mut timings = self.timings.lock();
        timings.total = timings.walk_started.map(|started| started.elapsed());
    }
}
