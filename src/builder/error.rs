//! Build errors for machine and transition builders.

use crate::core::codes;
use thiserror::Error;

/// Problems that make a machine unsafe to walk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Start state not specified. Call .add_starting_state(id) before .build()")]
    MissingStartState,

    #[error("Start state {state} is not in the machine's node list")]
    StartNotInMachine { state: String },

    #[error("State #{seq} was never declared in this builder")]
    UnregisteredState { seq: u32 },

    #[error("No state named '{name}' was built before it was referenced")]
    UnknownStateName { name: String },

    #[error("{transition} has no source state")]
    TransitionSourceMissing { transition: String },

    #[error("{transition} references {state}, which is not in the machine's node list")]
    TransitionStateNotInMachine { transition: String, state: String },

    #[error("{transition} is always taken but is not the last transition of its source")]
    DirectTransitionNotLast { transition: String },

    #[error("{transition} is always taken and cannot be global")]
    DirectTransitionInGlobals { transition: String },

    #[error("No state was added yet. Add a state before using a *_from_last call")]
    NoLastState,

    #[error("Transition result not specified. Call .to(id) or .to_exit()")]
    MissingResult,

    #[error("Transition kind not specified. Call .when(..), .always() or .catching(tag)")]
    MissingKind,
}

impl BuildError {
    pub fn code(&self) -> u32 {
        match self {
            BuildError::StartNotInMachine { .. } => codes::START_STATE_NOT_IN_MACHINE,
            BuildError::TransitionSourceMissing { .. } => codes::TRANSITION_SOURCE_MISSING,
            BuildError::UnregisteredState { .. }
            | BuildError::UnknownStateName { .. }
            | BuildError::TransitionStateNotInMachine { .. } => {
                codes::TRANSITION_STATE_NOT_IN_MACHINE
            }
            BuildError::DirectTransitionNotLast { .. } => codes::DIRECT_TRANSITION_NOT_LAST,
            BuildError::DirectTransitionInGlobals { .. } => codes::DIRECT_TRANSITION_IN_GLOBALS,
            BuildError::MissingStartState
            | BuildError::NoLastState
            | BuildError::MissingResult
            | BuildError::MissingKind => codes::MACHINE_BUILDING,
        }
    }
}

/// Issues that are tolerated but probably unintended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildWarning {
    #[error("State {state} appears {occurrences} times in the node list")]
    DuplicateState { state: String, occurrences: usize },
}

/// Returned by strict builds when any rule is violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Machine is invalid ({} error(s)): {}", .errors.len(), first(.errors))]
pub struct InvalidMachine {
    pub errors: Vec<BuildError>,
}

impl InvalidMachine {
    pub fn code(&self) -> u32 {
        self.errors
            .first()
            .map(BuildError::code)
            .unwrap_or(codes::MACHINE_BUILDING)
    }
}

fn first(errors: &[BuildError]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}
