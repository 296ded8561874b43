//! Builder API for machine construction.
//!
//! Two dialects produce the same [`Machine`](crate::graph::Machine):
//! - [`MachineBuilder`]: declare states, then add edges between them
//! - [`StateTree`]: each state carries its own outgoing branches
//!
//! Both end in the same validation pass.

pub mod error;
pub mod machine;
pub mod transition;
pub mod tree;

pub use error::{BuildError, BuildWarning, InvalidMachine};
pub use machine::MachineBuilder;
pub use transition::TransitionBuilder;
pub use tree::StateTree;
