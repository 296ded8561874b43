//! Builder for constructing machines.

use crate::builder::error::{BuildError, InvalidMachine};
use crate::builder::transition::TransitionBuilder;
use crate::config::MachineConfig;
use crate::core::{Guard, State, StateId};
use crate::graph::{Machine, Transition};
use crate::validation::ValidationReport;
use tracing::{error, info, warn};

/// Incremental, fluent construction of a [`Machine`].
///
/// States are declared first, which assigns their sequence numbers, and
/// then added to the node list. Transitions reference states by id.
/// Problems are only detected when the machine is built.
///
/// # Example
///
/// ```rust
/// use gameflow::builder::MachineBuilder;
/// use gameflow::core::{Guard, State};
/// use gameflow::graph::EXIT;
///
/// let mut builder = MachineBuilder::<i32>::new();
/// let load = builder.add_new_state(State::new("Load"));
/// let spin = builder.add_new_state(State::new("Spin"));
///
/// builder
///     .add_starting_state(load)
///     .add_direct_transition(load, spin)
///     .add_transition("n>0", Guard::new(|n: &i32| *n > 0), spin, spin)
///     .add_direct_transition(spin, EXIT);
///
/// let machine = builder.try_build().unwrap();
/// assert_eq!(machine.start(), Some(load));
/// assert_eq!(machine.transitions_of(spin).count(), 2);
/// ```
#[derive(Debug)]
pub struct MachineBuilder<C> {
    machine: Machine<C>,
    last: Option<StateId>,
    pending: Vec<BuildError>,
}

impl<C: 'static> MachineBuilder<C> {
    /// Create a builder for an empty machine.
    pub fn new() -> Self {
        Self {
            machine: Machine::new(),
            last: None,
            pending: Vec::new(),
        }
    }

    /// Re-open a built machine for further construction.
    pub fn edit(machine: Machine<C>) -> Self {
        let last = machine.nodes().last().copied();
        Self {
            machine,
            last,
            pending: Vec::new(),
        }
    }

    pub fn with_config(&mut self, config: &MachineConfig) -> &mut Self {
        self.blocking_on_failure(config.blocking_on_failure)
    }

    /// Make every action failure abort walks of this machine.
    pub fn blocking_on_failure(&mut self, blocking: bool) -> &mut Self {
        self.machine.set_blocking(blocking);
        self
    }

    /// Register a state and assign its sequence number without adding it
    /// to the node list.
    pub fn declare(&mut self, state: State<C>) -> StateId {
        self.machine.register(state)
    }

    /// Append a declared state to the node list.
    pub fn add_state(&mut self, id: StateId) -> &mut Self {
        if self.check_registered(id) {
            self.machine.nodes.push(id);
            self.last = Some(id);
        }
        self
    }

    /// Declare a state and append it to the node list.
    pub fn add_new_state(&mut self, state: State<C>) -> StateId {
        let id = self.declare(state);
        self.add_state(id);
        id
    }

    /// Designate the start state, adding it at the head of the node list
    /// if it is not there yet.
    pub fn add_starting_state(&mut self, id: StateId) -> &mut Self {
        if self.check_registered(id) {
            if !self.machine.contains(id) {
                self.machine.nodes.insert(0, id);
            }
            self.machine.start = Some(id);
            self.last = Some(id);
        }
        self
    }

    /// Declare a state and make it the start state.
    pub fn add_new_starting_state(&mut self, state: State<C>) -> StateId {
        let id = self.declare(state);
        self.add_starting_state(id);
        id
    }

    /// The most recently added state.
    pub fn last_state(&self) -> Option<StateId> {
        self.last
    }

    /// Mutable access to a declared state's name, description or action.
    pub fn state_mut(&mut self, id: StateId) -> Option<&mut State<C>> {
        self.machine.state_mut(id)
    }

    /// The machine under construction.
    pub fn machine(&self) -> &Machine<C> {
        &self.machine
    }

    pub fn add_transition(
        &mut self,
        label: impl Into<String>,
        guard: Guard<C>,
        source: StateId,
        result: impl Into<Option<StateId>>,
    ) -> &mut Self {
        self.add(Transition::guarded(
            label,
            guard,
            Some(source),
            result.into(),
        ))
    }

    pub fn add_transition_from_last(
        &mut self,
        label: impl Into<String>,
        guard: Guard<C>,
        result: impl Into<Option<StateId>>,
    ) -> &mut Self {
        match self.last {
            Some(source) => self.add_transition(label, guard, source, result),
            None => self.defer(BuildError::NoLastState),
        }
    }

    /// Add an always-taken transition. It must stay the last ordinary
    /// transition of its source.
    pub fn add_direct_transition(
        &mut self,
        source: StateId,
        result: impl Into<Option<StateId>>,
    ) -> &mut Self {
        self.add(Transition::direct(Some(source), result.into()))
    }

    pub fn add_direct_transition_from_last(
        &mut self,
        result: impl Into<Option<StateId>>,
    ) -> &mut Self {
        match self.last {
            Some(source) => self.add_direct_transition(source, result),
            None => self.defer(BuildError::NoLastState),
        }
    }

    /// Add a transition taken when `source`'s action fails with `tag`.
    pub fn add_exception_transition(
        &mut self,
        label: impl Into<String>,
        tag: u32,
        source: StateId,
        result: impl Into<Option<StateId>>,
    ) -> &mut Self {
        self.add(Transition::catching(label, tag, Some(source), result.into()))
    }

    pub fn add_exception_transition_from_last(
        &mut self,
        label: impl Into<String>,
        tag: u32,
        result: impl Into<Option<StateId>>,
    ) -> &mut Self {
        match self.last {
            Some(source) => self.add_exception_transition(label, tag, source, result),
            None => self.defer(BuildError::NoLastState),
        }
    }

    /// Add a guarded transition considered from every state.
    pub fn add_global_transition(
        &mut self,
        label: impl Into<String>,
        guard: Guard<C>,
        result: impl Into<Option<StateId>>,
    ) -> &mut Self {
        self.add_global(Transition::guarded(label, guard, None, result.into()))
    }

    /// Add an exception transition considered from every state.
    pub fn add_global_exception_transition(
        &mut self,
        label: impl Into<String>,
        tag: u32,
        result: impl Into<Option<StateId>>,
    ) -> &mut Self {
        self.add_global(Transition::catching(label, tag, None, result.into()))
    }

    /// Append a transition to the ordinary list as is.
    pub fn add(&mut self, transition: Transition<C>) -> &mut Self {
        self.machine.push_transition(transition);
        self
    }

    /// Append a transition to the global list as is.
    pub fn add_global(&mut self, transition: Transition<C>) -> &mut Self {
        self.machine.globals.push(transition);
        self
    }

    /// Add a transition from a [`TransitionBuilder`]. Transitions without a
    /// source go to the global list.
    pub fn transition(&mut self, builder: TransitionBuilder<C>) -> Result<&mut Self, BuildError> {
        let transition = builder.build()?;
        if transition.is_global() {
            Ok(self.add_global(transition))
        } else {
            Ok(self.add(transition))
        }
    }

    /// Every problem found so far, without building.
    pub fn report(&self) -> ValidationReport {
        let mut report = self.machine.validate();
        let mut errors = self.pending.clone();
        errors.append(&mut report.errors);
        report.errors = errors;
        report
    }

    /// Validate and return the machine.
    ///
    /// Violations are logged and the machine is returned anyway. Use
    /// [`try_build`](Self::try_build) to reject invalid machines.
    pub fn build(self) -> Machine<C> {
        let report = self.report();
        log_report(&report);
        self.machine
    }

    /// Validate and return the machine only if no rule is violated.
    pub fn try_build(self) -> Result<Machine<C>, InvalidMachine> {
        let report = self.report();
        log_report(&report);
        if report.is_valid() {
            Ok(self.machine)
        } else {
            Err(InvalidMachine {
                errors: report.errors,
            })
        }
    }

    fn check_registered(&mut self, id: StateId) -> bool {
        if self.machine.state(id).is_some() {
            true
        } else {
            self.pending
                .push(BuildError::UnregisteredState { seq: id.seq() });
            false
        }
    }

    pub(crate) fn defer(&mut self, error: BuildError) -> &mut Self {
        self.pending.push(error);
        self
    }
}

impl<C: 'static> Default for MachineBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn log_report(report: &ValidationReport) {
    info!("Building machine");
    for err in &report.errors {
        error!(code = err.code(), error = %err, "Machine validation failed");
    }
    for warning in &report.warnings {
        warn!(warning = %warning, "Machine validation warning");
    }
    info!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Machine built"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EXIT;

    #[test]
    fn starting_state_is_moved_to_head() {
        let mut builder = MachineBuilder::<()>::new();
        let a = builder.add_new_state(State::new("A"));
        let b = builder.declare(State::new("B"));
        builder.add_starting_state(b);

        let machine = builder.build();
        assert_eq!(machine.nodes(), &[b, a]);
        assert_eq!(machine.start(), Some(b));
    }

    #[test]
    fn starting_state_already_listed_is_not_duplicated() {
        let mut builder = MachineBuilder::<()>::new();
        let a = builder.add_new_state(State::new("A"));
        builder.add_starting_state(a);
        assert_eq!(builder.machine().nodes(), &[a]);
    }

    #[test]
    fn from_last_uses_most_recent_state() {
        let mut builder = MachineBuilder::<()>::new();
        let a = builder.add_new_starting_state(State::new("A"));
        let b = builder.add_new_state(State::new("B"));
        builder
            .add_direct_transition_from_last(a)
            .add_exception_transition_from_last("jam", 3, EXIT);

        let machine = builder.try_build().unwrap();
        assert_eq!(machine.transitions_of(b).count(), 1);
        assert_eq!(machine.exception_transitions_of(b).count(), 1);
        assert_eq!(machine.transitions_of(a).count(), 0);
    }

    #[test]
    fn from_last_without_states_is_reported() {
        let mut builder = MachineBuilder::<()>::new();
        builder.add_direct_transition_from_last(EXIT);
        let report = builder.report();
        assert!(report.errors.contains(&BuildError::NoLastState));
    }

    #[test]
    fn build_logs_but_returns_invalid_machine() {
        let mut builder = MachineBuilder::<()>::new();
        let a = builder.add_new_state(State::new("A"));
        builder.add_global(Transition::direct(None, Some(a)));

        let machine = builder.build();
        let report = machine.validate();
        assert!(report.errors.contains(&BuildError::MissingStartState));
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn try_build_rejects_invalid_machine() {
        let mut builder = MachineBuilder::<()>::new();
        let a = builder.add_new_starting_state(State::new("A"));
        builder
            .add_direct_transition(a, EXIT)
            .add_direct_transition(a, a);

        let err = builder.try_build().unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.code(), 9104);
    }

    #[test]
    fn undeclared_state_is_reported() {
        let mut other = MachineBuilder::<()>::new();
        other.declare(State::new("X"));
        let foreign = other.declare(State::new("Y"));

        let mut builder = MachineBuilder::<()>::new();
        builder.add_state(foreign);
        assert!(builder
            .report()
            .errors
            .contains(&BuildError::UnregisteredState { seq: 2 }));
    }

    #[test]
    fn transition_builder_routes_globals() {
        let mut builder = MachineBuilder::<i32>::new();
        let a = builder.add_new_starting_state(State::new("A"));
        builder
            .transition(TransitionBuilder::new().label("neg").when(|n: &i32| *n < 0).to_exit())
            .unwrap()
            .transition(TransitionBuilder::new().from(a).always().to(a))
            .unwrap();

        let machine = builder.try_build().unwrap();
        assert_eq!(machine.globals().len(), 1);
        assert_eq!(machine.transitions().len(), 1);
    }

    #[test]
    fn edit_reopens_machine() {
        let mut builder = MachineBuilder::<()>::new();
        let a = builder.add_new_starting_state(State::new("A"));
        let machine = builder.build();

        let mut builder = MachineBuilder::edit(machine);
        assert_eq!(builder.last_state(), Some(a));
        let b = builder.add_new_state(State::new("B"));
        builder.add_direct_transition(a, b);
        let machine = builder.try_build().unwrap();
        assert_eq!(b.seq(), 2);
        assert_eq!(machine.select_next(a, &()).unwrap().result, Some(b));
    }

    #[test]
    fn blocking_flag_comes_from_config() {
        let mut builder = MachineBuilder::<()>::new();
        builder.with_config(&MachineConfig {
            blocking_on_failure: true,
        });
        assert!(builder.build().is_blocking());
    }

    #[test]
    fn state_mut_edits_declared_state() {
        let mut builder = MachineBuilder::<()>::new();
        let a = builder.add_new_starting_state(State::new("A"));
        builder.state_mut(a).unwrap().set_description("first");
        assert_eq!(builder.build().state(a).unwrap().description(), "first");
    }
}
