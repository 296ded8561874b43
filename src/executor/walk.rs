//! The executor core shared by every drive mode.
//!
//! A walk has three phases: `begin` checks preconditions and picks the
//! start state, `process` runs one state and selects the next one, and
//! `end` closes the walk once no next state was selected.

use super::error::ExecutionError;
use super::observer::Observer;
use crate::core::{StateId, StepRecord, WalkHistory};
use crate::graph::Machine;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

pub(crate) struct Walk<'a, C> {
    machine: &'a Machine<C>,
    observers: &'a [Arc<dyn Observer<C>>],
    blocking: bool,
    run_id: Uuid,
}

impl<'a, C> Walk<'a, C> {
    pub(crate) fn new(
        machine: &'a Machine<C>,
        observers: &'a [Arc<dyn Observer<C>>],
        blocking: bool,
        run_id: Uuid,
    ) -> Self {
        Self {
            machine,
            observers,
            blocking,
            run_id,
        }
    }

    /// Either flag makes action failures abort the walk.
    fn is_blocking(&self) -> bool {
        self.blocking || self.machine.is_blocking()
    }

    pub(crate) fn begin(&self, context: &C) -> Result<StateId, ExecutionError> {
        let start = self.machine.start().ok_or(ExecutionError::StartStateMissing)?;
        let state = self
            .machine
            .state(start)
            .ok_or(ExecutionError::UnknownState(start))?;

        info!(run_id = %self.run_id, start = %state, "Walk started");
        for observer in self.observers {
            observer.before_loop(context);
        }
        Ok(start)
    }

    /// Run one state's action and select the state to run next.
    pub(crate) fn process(
        &self,
        current: StateId,
        context: &mut C,
        history: &mut WalkHistory,
    ) -> Result<Option<StateId>, ExecutionError> {
        let state = self
            .machine
            .state(current)
            .ok_or(ExecutionError::UnknownState(current))?;

        info!(run_id = %self.run_id, state = %state, "Entering state");
        for observer in self.observers {
            observer.before_action(state, context);
        }

        let (next, failure) = match state.execute(context) {
            Ok(()) => {
                for observer in self.observers {
                    observer.after_action(state, context);
                }
                let candidates = self.machine.candidates(current);
                debug!(state = %state, candidates = candidates.len(), "Selecting next state");
                for observer in self.observers {
                    observer.before_selection(state, &candidates, context);
                }
                let chosen = candidates.into_iter().find(|t| t.matches(context));
                (chosen.and_then(|t| t.result), None)
            }
            Err(err) => {
                error!(
                    run_id = %self.run_id,
                    state = %state,
                    tag = err.tag(),
                    error = %err,
                    "Action failed"
                );
                for observer in self.observers {
                    observer.caught_failure(state, &err, context);
                }
                if self.is_blocking() {
                    return Err(ExecutionError::ActionFailed {
                        state: state.identifier(),
                        source: err,
                    });
                }
                let candidates = self.machine.exception_candidates(current);
                debug!(state = %state, candidates = candidates.len(), "Selecting recovery state");
                for observer in self.observers {
                    observer.before_exception_selection(state, &candidates, &err, context);
                }
                let chosen = candidates.into_iter().find(|t| t.catches(&err));
                (chosen.and_then(|t| t.result), Some((err.tag(), chosen.is_some())))
            }
        };

        let next_state = match next {
            Some(id) => Some(
                self.machine
                    .state(id)
                    .ok_or(ExecutionError::UnknownState(id))?,
            ),
            None => None,
        };
        for observer in self.observers {
            observer.next_selected(state, next_state, context);
        }
        match next_state {
            Some(next_state) => debug!(state = %state, next = %next_state, "Next state selected"),
            None => debug!(state = %state, "No transition applies, exiting"),
        }

        let mut record = StepRecord::new(current, next);
        if let Some((tag, recovered)) = failure {
            record = record.with_failure(tag, recovered);
        }
        history.push(record);

        info!(run_id = %self.run_id, state = %state, "Exiting state");
        Ok(next)
    }

    pub(crate) fn end(&self, context: &C) {
        for observer in self.observers {
            observer.after_loop(context);
        }
        info!(run_id = %self.run_id, "Walk finished");
    }

    pub(crate) fn abort(&self, err: &ExecutionError) {
        error!(run_id = %self.run_id, code = err.code(), error = %err, "Walk aborted");
        for observer in self.observers {
            observer.walk_aborted(err);
        }
    }

    /// Walk from the start state until exit.
    pub(crate) fn run(&self, context: &mut C, history: &mut WalkHistory) -> Result<(), ExecutionError> {
        let result = self.run_to_exit(context, history);
        if let Err(err) = &result {
            self.abort(err);
        }
        result
    }

    fn run_to_exit(&self, context: &mut C, history: &mut WalkHistory) -> Result<(), ExecutionError> {
        let mut current = Some(self.begin(context)?);
        while let Some(id) = current {
            current = self.process(id, context, history)?;
        }
        self.end(context);
        Ok(())
    }
}
