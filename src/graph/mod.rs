//! The state graph: transitions and the machine that owns them.

mod machine;
mod transition;

pub use machine::Machine;
pub use transition::{Transition, TransitionKind};

use crate::core::StateId;

/// Result of a transition that ends the walk.
pub const EXIT: Option<StateId> = None;
