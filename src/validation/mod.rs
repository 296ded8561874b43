//! Build-time validation of machines.
//!
//! Rules use stillwater's `Validation` so that every violation is
//! collected in one pass instead of stopping at the first one.
//!
//! # Example
//!
//! ```rust
//! use gameflow::builder::{BuildError, MachineBuilder};
//! use gameflow::core::State;
//! use gameflow::graph::EXIT;
//!
//! let mut builder = MachineBuilder::<()>::new();
//! let a = builder.add_new_state(State::new("A"));
//! builder.add_direct_transition(a, EXIT);
//! builder.add_direct_transition(a, a);
//!
//! // no start state, and the first direct transition is not last
//! let report = builder.build().validate();
//! assert_eq!(report.errors.len(), 2);
//! assert!(report.errors.contains(&BuildError::MissingStartState));
//! ```

pub mod rules;

use crate::builder::{BuildError, BuildWarning};
use crate::graph::Machine;
use stillwater::validation::Validation;

/// Every violation and warning found in a machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<BuildError>,
    pub warnings: Vec<BuildWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run every build rule against the machine.
pub fn validate<C>(machine: &Machine<C>) -> ValidationReport {
    let checks = vec![
        rules::start_state(machine),
        rules::no_direct_globals(machine),
        rules::direct_is_last(machine),
        rules::transition_sources(machine),
        rules::endpoints_in_machine(machine),
    ];

    let errors = match Validation::all_vec(checks) {
        Validation::Success(_) => Vec::new(),
        Validation::Failure(errors) => errors.into_vec(),
    };

    ValidationReport {
        errors,
        warnings: rules::duplicate_states(machine),
    }
}
