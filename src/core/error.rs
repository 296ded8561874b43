//! Action failures and the numeric error-code catalogue.
//!
//! Every error raised by the engine carries a stable numeric code. Actions
//! raise [`ActionError`], whose `tag` is matched by exception transitions.

use std::fmt::Display;
use thiserror::Error;

/// Stable numeric codes for engine errors.
///
/// Codes in the 91xx range are construction problems, 92xx are execution
/// problems and 93xx come from context storage.
pub mod codes {
    /// Generic machine building failure.
    pub const MACHINE_BUILDING: u32 = 9100;
    /// The start state is not in the machine's node list.
    pub const START_STATE_NOT_IN_MACHINE: u32 = 9101;
    /// An ordinary transition has no source state.
    pub const TRANSITION_SOURCE_MISSING: u32 = 9102;
    /// A transition endpoint is not in the machine's node list.
    pub const TRANSITION_STATE_NOT_IN_MACHINE: u32 = 9103;
    /// An always-true transition is followed by other transitions.
    pub const DIRECT_TRANSITION_NOT_LAST: u32 = 9104;
    /// An always-true transition sits among the global transitions.
    pub const DIRECT_TRANSITION_IN_GLOBALS: u32 = 9105;
    /// A name collides with a reserved marker (GOTO, CATCH, EXIT).
    pub const RESERVED_NAME: u32 = 9106;

    /// Generic execution failure. Default tag of untagged action errors.
    pub const EXECUTION: u32 = 9200;
    /// The executor has no machine attached.
    pub const MACHINE_MISSING: u32 = 9201;
    /// The executor has no context attached.
    pub const CONTEXT_MISSING: u32 = 9202;
    /// The machine has no start state.
    pub const START_STATE_MISSING: u32 = 9203;
    /// A state id is not registered in the machine.
    pub const UNKNOWN_STATE: u32 = 9204;
    /// The background worker cannot accept work.
    pub const WORKER_UNAVAILABLE: u32 = 9205;

    /// Generic context failure (missing key).
    pub const CONTEXT: u32 = 9300;
    /// A context value has a different type than requested.
    pub const CONTEXT_TYPE_MISMATCH: u32 = 9301;
}

/// Failure raised by a state's action.
///
/// The `tag` is an explicit, serializable error kind. Exception transitions
/// match on it, so two failures with the same tag are handled identically.
///
/// # Example
///
/// ```rust
/// use gameflow::core::ActionError;
///
/// let err = ActionError::new(9999, "reel jammed");
/// assert_eq!(err.tag(), 9999);
/// assert_eq!(err.to_string(), "[Error tag: 9999] reel jammed");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[Error tag: {tag}] {message}")]
pub struct ActionError {
    tag: u32,
    message: String,
}

impl ActionError {
    /// Create a failure with an explicit tag.
    pub fn new(tag: u32, message: impl Into<String>) -> Self {
        Self {
            tag,
            message: message.into(),
        }
    }

    /// Create an untagged failure. It carries [`codes::EXECUTION`].
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(codes::EXECUTION, message)
    }

    /// Wrap any displayable error under the given tag.
    pub fn from_error(tag: u32, error: impl Display) -> Self {
        Self::new(tag, error.to_string())
    }

    /// The tag exception transitions match on.
    pub fn tag(&self) -> u32 {
        self.tag
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
