//! Execution error types.

use crate::core::{codes, ActionError, StateId};
use thiserror::Error;

/// Errors that end a walk.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Executor has no machine attached")]
    MachineMissing,

    #[error("Executor has no context attached")]
    ContextMissing,

    #[error("Machine has no start state")]
    StartStateMissing,

    #[error("State #{0} is not registered in the machine")]
    UnknownState(StateId),

    /// An action failed while the walk was blocking on failures.
    #[error("Action of state {state} failed: {source}")]
    ActionFailed {
        state: String,
        #[source]
        source: ActionError,
    },

    #[error("Background worker is unavailable")]
    WorkerUnavailable,

    #[error("Failed to spawn background worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

impl ExecutionError {
    pub fn code(&self) -> u32 {
        match self {
            ExecutionError::MachineMissing => codes::MACHINE_MISSING,
            ExecutionError::ContextMissing => codes::CONTEXT_MISSING,
            ExecutionError::StartStateMissing => codes::START_STATE_MISSING,
            ExecutionError::UnknownState(_) => codes::UNKNOWN_STATE,
            ExecutionError::ActionFailed { .. } => codes::EXECUTION,
            ExecutionError::WorkerUnavailable | ExecutionError::WorkerSpawn(_) => {
                codes::WORKER_UNAVAILABLE
            }
        }
    }

    /// The action failure that aborted the walk, if any.
    pub fn action_error(&self) -> Option<&ActionError> {
        match self {
            ExecutionError::ActionFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
