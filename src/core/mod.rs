//! Core engine types.
//!
//! This module contains the values a machine is built from:
//! - States and their actions
//! - Guard predicates over the execution context
//! - The context storage contract
//! - Action failures and the error-code catalogue
//! - Walk history

mod context;
mod error;
mod guard;
mod history;
mod state;

pub use context::{Context, ContextError, SimpleContext};
pub use error::{codes, ActionError};
pub use guard::Guard;
pub use history::{StepRecord, WalkHistory};
pub use state::{Action, State, StateId};
