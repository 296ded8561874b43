//! Individual build rules.
//!
//! Each rule inspects the machine and returns every violation it finds.

use crate::builder::{BuildError, BuildWarning};
use crate::core::StateId;
use crate::graph::Machine;
use std::collections::HashMap;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Outcome of a single rule.
pub type RuleResult = Validation<(), NonEmptyVec<BuildError>>;

fn collect(errors: Vec<BuildError>) -> RuleResult {
    match NonEmptyVec::from_vec(errors) {
        Some(errors) => Validation::Failure(errors),
        None => Validation::success(()),
    }
}

/// The start state is set and is in the node list.
pub fn start_state<C>(machine: &Machine<C>) -> RuleResult {
    match machine.start() {
        None => Validation::fail(BuildError::MissingStartState),
        Some(id) if !machine.contains(id) => Validation::fail(BuildError::StartNotInMachine {
            state: machine.render_state(Some(id), "none"),
        }),
        Some(_) => Validation::success(()),
    }
}

/// No global transition is always taken.
pub fn no_direct_globals<C>(machine: &Machine<C>) -> RuleResult {
    collect(
        machine
            .globals()
            .iter()
            .filter(|t| t.is_direct())
            .map(|t| BuildError::DirectTransitionInGlobals {
                transition: machine.describe_transition(t),
            })
            .collect(),
    )
}

/// An always-taken transition is the last ordinary transition of its
/// source. Exception transitions do not count.
pub fn direct_is_last<C>(machine: &Machine<C>) -> RuleResult {
    let mut last: HashMap<StateId, usize> = HashMap::new();
    for (index, t) in machine.transitions().iter().enumerate() {
        if let (Some(source), false) = (t.source, t.is_exception()) {
            last.insert(source, index);
        }
    }

    collect(
        machine
            .transitions()
            .iter()
            .enumerate()
            .filter(|(index, t)| {
                t.is_direct()
                    && t.source
                        .and_then(|source| last.get(&source))
                        .is_some_and(|last| last != index)
            })
            .map(|(_, t)| BuildError::DirectTransitionNotLast {
                transition: machine.describe_transition(t),
            })
            .collect(),
    )
}

/// Every ordinary transition has a source state.
pub fn transition_sources<C>(machine: &Machine<C>) -> RuleResult {
    collect(
        machine
            .transitions()
            .iter()
            .filter(|t| t.is_global())
            .map(|t| BuildError::TransitionSourceMissing {
                transition: machine.describe_transition(t),
            })
            .collect(),
    )
}

/// Every transition endpoint is in the node list.
pub fn endpoints_in_machine<C>(machine: &Machine<C>) -> RuleResult {
    let mut errors = Vec::new();
    for t in machine.transitions().iter().chain(machine.globals()) {
        for endpoint in [t.source, t.result].into_iter().flatten() {
            if !machine.contains(endpoint) {
                errors.push(BuildError::TransitionStateNotInMachine {
                    transition: machine.describe_transition(t),
                    state: machine.render_state(Some(endpoint), "none"),
                });
            }
        }
    }
    collect(errors)
}

/// States listed more than once in the node list.
pub fn duplicate_states<C>(machine: &Machine<C>) -> Vec<BuildWarning> {
    let mut counts: Vec<(StateId, usize)> = Vec::new();
    for &id in machine.nodes() {
        match counts.iter_mut().find(|(seen, _)| *seen == id) {
            Some((_, count)) => *count += 1,
            None => counts.push((id, 1)),
        }
    }

    counts
        .into_iter()
        .filter(|(_, occurrences)| *occurrences > 1)
        .map(|(id, occurrences)| BuildWarning::DuplicateState {
            state: machine.render_state(Some(id), "none"),
            occurrences,
        })
        .collect()
}
