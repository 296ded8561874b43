//! Gameflow: a state-machine execution engine for game flows
//!
//! A game round is a graph of named states. Each state runs one action
//! against a shared context; after the action, the first transition whose
//! guard holds picks the next state. A walk ends when no transition
//! applies or the chosen transition has no result state.
//!
//! # Core Concepts
//!
//! - **State**: a named node with an action, identified by a sequence number
//! - **Transition**: a guarded, always-taken or failure-catching edge
//! - **Machine**: the validated graph, built with [`MachineBuilder`] or [`StateTree`]
//! - **Executor**: walks a machine synchronously, one phase at a time, or on
//!   a background worker
//!
//! # Example
//!
//! ```rust
//! use gameflow::{Executor, Guard, MachineBuilder, State, EXIT};
//!
//! #[derive(Default)]
//! struct Round {
//!     free_spins: u32,
//!     spins: u32,
//! }
//!
//! let mut builder = MachineBuilder::new();
//! let load = builder.add_new_starting_state(State::new("Load").with_action(|round: &mut Round| {
//!     round.free_spins = 2;
//!     Ok(())
//! }));
//! let spin = builder.add_new_state(State::new("Spin").with_action(|round: &mut Round| {
//!     round.free_spins -= 1;
//!     round.spins += 1;
//!     Ok(())
//! }));
//! let free_spins_left = Guard::new(|round: &Round| round.free_spins > 0);
//! builder
//!     .add_direct_transition(load, spin)
//!     .add_transition("fs>0", free_spins_left, spin, spin)
//!     .add_direct_transition(spin, EXIT);
//!
//! let mut executor = Executor::new()
//!     .with_machine(builder.build())
//!     .with_context(Round::default());
//! executor.execute().unwrap();
//!
//! assert_eq!(executor.context().map(|round| round.spins), Some(2));
//! assert_eq!(executor.history().visited().len(), 3);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod describe;
pub mod executor;
pub mod graph;
pub mod validation;

// Re-export commonly used types
pub use builder::{MachineBuilder, StateTree};
pub use crate::core::{Action, ActionError, Context, Guard, SimpleContext, State, StateId};
pub use executor::{BackgroundExecutor, Executor, Observer};
pub use graph::{Machine, Transition, EXIT};
