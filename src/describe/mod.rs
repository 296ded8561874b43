//! Machines from declarative descriptions.
//!
//! A [`GraphDescription`] names states, their implementations and their
//! outgoing transitions as plain strings. It derives serde, so it can come
//! from any format serde reads. A [`Resolver`] turns the strings into
//! closures:
//!
//! - `implementation` strings become [`Action`]s
//! - transition `expression`s become [`Guard`]s, except for two markers:
//!   `GOTO` (always taken) and `CATCH:<tag>` (taken when the source's
//!   action fails with `tag`)
//! - the target `EXIT` ends the walk
//!
//! Markers are matched case-insensitively and cannot be used as state or
//! implementation names. The first state listed is the starting state.

use crate::builder::{InvalidMachine, MachineBuilder};
use crate::checkpoint::Bindings;
use crate::core::{codes, Action, Guard, StateId, State};
use crate::graph::Machine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

const GOTO: &str = "GOTO";
const CATCH: &str = "CATCH";
const EXIT: &str = "EXIT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDescription {
    /// Name of the context type the machine expects.
    #[serde(default)]
    pub context: String,
    pub states: Vec<StateDescription>,
    #[serde(default)]
    pub globals: Vec<TransitionDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDescription {
    pub name: String,
    pub implementation: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub transitions: Vec<TransitionDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDescription {
    pub expression: String,
    pub target: String,
}

/// Turns the strings of a description into closures.
pub trait Resolver<C> {
    fn action(&self, implementation: &str) -> Option<Action<C>>;

    fn guard(&self, expression: &str) -> Option<Guard<C>>;
}

/// Implementations resolve as action keys, expressions as guard labels.
impl<C> Resolver<C> for Bindings<C> {
    fn action(&self, implementation: &str) -> Option<Action<C>> {
        self.get_action(implementation).cloned()
    }

    fn guard(&self, expression: &str) -> Option<Guard<C>> {
        self.get_guard(expression).cloned()
    }
}

#[derive(Debug, Error)]
pub enum DescribeError {
    #[error("'{name}' is a reserved keyword (GOTO, CATCH, EXIT) and cannot name a state or implementation")]
    ReservedName { name: String },

    #[error("State '{name}' is described more than once")]
    DuplicateState { name: String },

    #[error("The description has no states")]
    NoStates,

    #[error("Transition of '{state}' targets unknown state '{target}'")]
    UnknownTarget { state: String, target: String },

    #[error("Expression '{expression}' does not resolve to a guard")]
    UnresolvedExpression { expression: String },

    #[error("Implementation '{implementation}' does not resolve to an action")]
    UnresolvedImplementation { implementation: String },

    #[error("'{expression}' is not a valid catch marker, expected CATCH:<tag>")]
    InvalidCatchTag { expression: String },

    #[error("GOTO to '{target}' cannot be global")]
    DirectGlobal { target: String },

    #[error(transparent)]
    Invalid(#[from] InvalidMachine),
}

impl DescribeError {
    pub fn code(&self) -> u32 {
        match self {
            DescribeError::ReservedName { .. } => codes::RESERVED_NAME,
            DescribeError::UnknownTarget { .. } => codes::TRANSITION_STATE_NOT_IN_MACHINE,
            DescribeError::DirectGlobal { .. } => codes::DIRECT_TRANSITION_IN_GLOBALS,
            DescribeError::Invalid(invalid) => invalid.code(),
            DescribeError::DuplicateState { .. }
            | DescribeError::NoStates
            | DescribeError::UnresolvedExpression { .. }
            | DescribeError::UnresolvedImplementation { .. }
            | DescribeError::InvalidCatchTag { .. } => codes::MACHINE_BUILDING,
        }
    }
}

/// What a transition expression asks for.
#[derive(Debug, PartialEq, Eq)]
enum Expression<'a> {
    Goto,
    Catch(u32),
    Guarded(&'a str),
}

fn is_reserved(name: &str) -> bool {
    [GOTO, CATCH, EXIT]
        .iter()
        .any(|marker| name.trim().eq_ignore_ascii_case(marker))
}

fn parse_expression(expression: &str) -> Result<Expression<'_>, DescribeError> {
    let trimmed = expression.trim();
    if trimmed.eq_ignore_ascii_case(GOTO) {
        return Ok(Expression::Goto);
    }

    let marker = trimmed
        .get(..CATCH.len())
        .filter(|head| head.eq_ignore_ascii_case(CATCH))
        .map(|_| trimmed[CATCH.len()..].trim_start());
    // `catches>0` is an ordinary expression
    if let Some(rest) = marker.filter(|rest| rest.is_empty() || rest.starts_with(':')) {
        let invalid = || DescribeError::InvalidCatchTag {
            expression: expression.to_string(),
        };
        let tag = rest.strip_prefix(':').ok_or_else(invalid)?;
        return tag.trim().parse().map(Expression::Catch).map_err(|_| invalid());
    }

    Ok(Expression::Guarded(trimmed))
}

fn check_name(name: &str) -> Result<(), DescribeError> {
    if is_reserved(name) {
        Err(DescribeError::ReservedName {
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

impl<C: 'static> MachineBuilder<C> {
    /// Declare every described state and transition in a new builder.
    ///
    /// Only the description itself is checked here; graph rules run when
    /// the builder is built.
    pub fn from_description(
        description: &GraphDescription,
        resolver: &impl Resolver<C>,
    ) -> Result<Self, DescribeError> {
        if description.states.is_empty() {
            return Err(DescribeError::NoStates);
        }
        if !description.context.is_empty() && !std::any::type_name::<C>().ends_with(&description.context) {
            warn!(
                described = %description.context,
                actual = std::any::type_name::<C>(),
                "Described context type differs from the machine's"
            );
        }

        let mut builder = MachineBuilder::new();
        let mut ids: HashMap<&str, StateId> = HashMap::new();

        for (index, state) in description.states.iter().enumerate() {
            check_name(&state.name)?;
            check_name(&state.implementation)?;
            let action = resolver.action(&state.implementation).ok_or_else(|| {
                DescribeError::UnresolvedImplementation {
                    implementation: state.implementation.clone(),
                }
            })?;

            let declared = State::new(state.name.clone())
                .with_description(state.description.clone())
                .with_bound_action(action);
            let id = if index == 0 {
                builder.add_new_starting_state(declared)
            } else {
                builder.add_new_state(declared)
            };
            if ids.insert(state.name.as_str(), id).is_some() {
                return Err(DescribeError::DuplicateState {
                    name: state.name.clone(),
                });
            }
        }

        let target_of = |state: &str, target: &str| -> Result<Option<StateId>, DescribeError> {
            if target.trim().eq_ignore_ascii_case(EXIT) {
                return Ok(None);
            }
            ids.get(target.trim()).copied().map(Some).ok_or_else(|| {
                DescribeError::UnknownTarget {
                    state: state.to_string(),
                    target: target.to_string(),
                }
            })
        };
        let guard_of = |expression: &str| {
            resolver
                .guard(expression)
                .ok_or_else(|| DescribeError::UnresolvedExpression {
                    expression: expression.to_string(),
                })
        };

        for state in &description.states {
            let source = ids[state.name.as_str()];
            for transition in &state.transitions {
                let result = target_of(&state.name, &transition.target)?;
                match parse_expression(&transition.expression)? {
                    Expression::Goto => builder.add_direct_transition(source, result),
                    Expression::Catch(tag) => {
                        builder.add_exception_transition(transition.expression.trim(), tag, source, result)
                    }
                    Expression::Guarded(expression) => {
                        builder.add_transition(expression, guard_of(expression)?, source, result)
                    }
                };
            }
        }

        for global in &description.globals {
            let result = target_of("GLOBAL", &global.target)?;
            match parse_expression(&global.expression)? {
                Expression::Goto => {
                    return Err(DescribeError::DirectGlobal {
                        target: global.target.clone(),
                    })
                }
                Expression::Catch(tag) => {
                    builder.add_global_exception_transition(global.expression.trim(), tag, result)
                }
                Expression::Guarded(expression) => {
                    builder.add_global_transition(expression, guard_of(expression)?, result)
                }
            };
        }

        debug!(
            states = description.states.len(),
            globals = description.globals.len(),
            "Description loaded"
        );
        Ok(builder)
    }
}

/// Build a machine from a description, rejecting invalid graphs.
pub fn load<C: 'static>(
    description: &GraphDescription,
    resolver: &impl Resolver<C>,
) -> Result<Machine<C>, DescribeError> {
    Ok(MachineBuilder::from_description(description, resolver)?.try_build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ActionError;
    use crate::executor::Executor;

    #[derive(Debug, Default)]
    struct Reels {
        free_spins: i32,
        spins: u32,
        paid: bool,
    }

    fn resolver() -> Bindings<Reels> {
        Bindings::new()
            .action("load", Action::new(|_: &mut Reels| Ok(())))
            .action(
                "spin",
                Action::new(|reels: &mut Reels| {
                    reels.spins += 1;
                    reels.free_spins -= 1;
                    Ok(())
                }),
            )
            .action(
                "pay",
                Action::new(|reels: &mut Reels| {
                    reels.paid = true;
                    Ok(())
                }),
            )
            .action(
                "jam",
                Action::new(|_: &mut Reels| Err(ActionError::new(9999, "reels jammed"))),
            )
            .guard("fs>0", Guard::new(|reels: &Reels| reels.free_spins > 0))
            .guard("fs<0", Guard::new(|reels: &Reels| reels.free_spins < 0))
    }

    fn transition(expression: &str, target: &str) -> TransitionDescription {
        TransitionDescription {
            expression: expression.to_string(),
            target: target.to_string(),
        }
    }

    fn state(name: &str, implementation: &str, transitions: Vec<TransitionDescription>) -> StateDescription {
        StateDescription {
            name: name.to_string(),
            implementation: implementation.to_string(),
            description: String::new(),
            transitions,
        }
    }

    fn slot() -> GraphDescription {
        GraphDescription {
            context: "Reels".to_string(),
            states: vec![
                state("Load", "load", vec![transition("fs>0", "Spin"), transition("goto", "Pay")]),
                state("Spin", "spin", vec![transition("fs>0", "Spin"), transition("GOTO", "Pay")]),
                state("Pay", "pay", vec![transition("Goto", "exit")]),
            ],
            globals: vec![transition("fs<0", "EXIT")],
        }
    }

    #[test]
    fn markers_are_case_insensitive() {
        assert_eq!(parse_expression("goto").unwrap(), Expression::Goto);
        assert_eq!(parse_expression(" GoTo ").unwrap(), Expression::Goto);
        assert_eq!(parse_expression("catch:12").unwrap(), Expression::Catch(12));
        assert_eq!(parse_expression("CATCH : 9999").unwrap(), Expression::Catch(9999));
        assert_eq!(parse_expression("fs>0").unwrap(), Expression::Guarded("fs>0"));
    }

    #[test]
    fn malformed_catch_is_rejected() {
        for expression in ["CATCH", "catch:", "CATCH:abc", "catch:-1"] {
            let err = parse_expression(expression).unwrap_err();
            assert!(matches!(err, DescribeError::InvalidCatchTag { .. }), "{expression}");
        }
    }

    #[test]
    fn described_machine_walks() {
        let machine = load(&slot(), &resolver()).unwrap();
        assert_eq!(machine.start_state().map(State::name), Some("Load"));
        assert_eq!(machine.nodes().len(), 3);
        assert_eq!(machine.globals().len(), 1);

        let mut executor = Executor::new()
            .with_machine(machine)
            .with_context(Reels {
                free_spins: 3,
                ..Reels::default()
            });
        executor.execute().unwrap();
        let reels = executor.context().unwrap();
        assert_eq!(reels.spins, 3);
        assert!(reels.paid);
    }

    #[test]
    fn description_reads_from_json() {
        let json = r#"{
            "context": "Reels",
            "states": [
                { "name": "Jam", "implementation": "jam",
                  "transitions": [ { "expression": "CATCH:9999", "target": "Pay" } ] },
                { "name": "Pay", "implementation": "pay",
                  "transitions": [ { "expression": "GOTO", "target": "EXIT" } ] }
            ]
        }"#;
        let description: GraphDescription = serde_json::from_str(json).unwrap();
        let machine = load(&description, &resolver()).unwrap();

        let mut executor = Executor::new().with_machine(machine).with_context(Reels::default());
        executor.execute().unwrap();
        assert!(executor.context().unwrap().paid);
        assert_eq!(executor.history().recovered_failures(), 1);
    }

    #[test]
    fn reserved_names_are_rejected() {
        let mut description = slot();
        description.states[1].name = "Exit".to_string();
        let err = MachineBuilder::from_description(&description, &resolver()).unwrap_err();
        assert_eq!(err.code(), codes::RESERVED_NAME);

        let mut description = slot();
        description.states[2].implementation = "catch".to_string();
        let err = MachineBuilder::from_description(&description, &resolver()).unwrap_err();
        assert!(matches!(err, DescribeError::ReservedName { .. }));
    }

    #[test]
    fn unresolved_strings_are_reported() {
        let mut description = slot();
        description.states[0].transitions[0].expression = "fs>9".to_string();
        assert!(matches!(
            MachineBuilder::from_description(&description, &resolver()),
            Err(DescribeError::UnresolvedExpression { .. })
        ));

        let mut description = slot();
        description.states[0].implementation = "reload".to_string();
        assert!(matches!(
            MachineBuilder::from_description(&description, &resolver()),
            Err(DescribeError::UnresolvedImplementation { .. })
        ));
    }

    #[test]
    fn unknown_target_is_reported() {
        let mut description = slot();
        description.states[0].transitions[0].target = "Bonus".to_string();
        let err = MachineBuilder::from_description(&description, &resolver()).unwrap_err();
        assert!(matches!(err, DescribeError::UnknownTarget { ref target, .. } if target == "Bonus"));
    }

    #[test]
    fn goto_cannot_be_global() {
        let mut description = slot();
        description.globals.push(transition("GOTO", "Pay"));
        assert!(matches!(
            MachineBuilder::from_description(&description, &resolver()),
            Err(DescribeError::DirectGlobal { .. })
        ));
    }

    #[test]
    fn graph_rules_apply_on_load() {
        let mut description = slot();
        description.states[0].transitions.reverse();
        let err = load(&description, &resolver()).unwrap_err();
        assert_eq!(err.code(), codes::DIRECT_TRANSITION_NOT_LAST);
    }

    #[test]
    fn duplicate_and_empty_descriptions_are_rejected() {
        let mut description = slot();
        description.states[2].name = "Spin".to_string();
        assert!(matches!(
            MachineBuilder::from_description(&description, &resolver()),
            Err(DescribeError::DuplicateState { .. })
        ));

        let empty = GraphDescription {
            context: String::new(),
            states: Vec::new(),
            globals: Vec::new(),
        };
        assert!(matches!(
            MachineBuilder::<Reels>::from_description(&empty, &resolver()),
            Err(DescribeError::NoStates)
        ));
    }
}
