//! Machine: the state graph walked by executors.

use super::transition::Transition;
use crate::core::{ActionError, State, StateId};
use crate::validation::{self, ValidationReport};
use std::collections::HashMap;
use std::fmt;

/// A built state graph.
///
/// States live in an arena indexed by their [`StateId`]. The node list
/// records which registered states belong to the machine, in insertion
/// order. Ordinary transitions are indexed by source state, so selection
/// never scans edges of unrelated states. Global transitions are kept in
/// their own list and are considered before the local ones.
///
/// Machines are produced by [`MachineBuilder`](crate::builder::MachineBuilder)
/// or restored from a [`GraphSnapshot`](crate::checkpoint::GraphSnapshot).
pub struct Machine<C> {
    pub(crate) start: Option<StateId>,
    pub(crate) arena: Vec<Option<State<C>>>,
    pub(crate) nodes: Vec<StateId>,
    pub(crate) transitions: Vec<Transition<C>>,
    pub(crate) globals: Vec<Transition<C>>,
    pub(crate) by_source: HashMap<StateId, Vec<usize>>,
    pub(crate) blocking: bool,
}

impl<C> Default for Machine<C> {
    fn default() -> Self {
        Self {
            start: None,
            arena: Vec::new(),
            nodes: Vec::new(),
            transitions: Vec::new(),
            globals: Vec::new(),
            by_source: HashMap::new(),
            blocking: false,
        }
    }
}

impl<C> Machine<C> {
    /// Create an empty machine with no states.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state in the arena and assign its sequence number.
    ///
    /// Registration does not add the state to the node list.
    pub(crate) fn register(&mut self, mut state: State<C>) -> StateId {
        let id = StateId::new(self.arena.len() as u32 + 1);
        state.register(id);
        self.arena.push(Some(state));
        id
    }

    pub(crate) fn push_transition(&mut self, transition: Transition<C>) {
        let index = self.transitions.len();
        if let Some(source) = transition.source {
            self.by_source.entry(source).or_default().push(index);
        }
        self.transitions.push(transition);
    }

    pub(crate) fn reindex(&mut self) {
        self.by_source.clear();
        for (index, transition) in self.transitions.iter().enumerate() {
            if let Some(source) = transition.source {
                self.by_source.entry(source).or_default().push(index);
            }
        }
    }

    pub fn start(&self) -> Option<StateId> {
        self.start
    }

    pub fn start_state(&self) -> Option<&State<C>> {
        self.start.and_then(|id| self.state(id))
    }

    /// Look up a registered state.
    pub fn state(&self, id: StateId) -> Option<&State<C>> {
        id.index()
            .and_then(|index| self.arena.get(index))
            .and_then(Option::as_ref)
    }

    pub fn state_mut(&mut self, id: StateId) -> Option<&mut State<C>> {
        id.index()
            .and_then(move |index| self.arena.get_mut(index))
            .and_then(Option::as_mut)
    }

    /// First registered state with the given name.
    pub fn find(&self, name: &str) -> Option<&State<C>> {
        self.states().find(|state| state.name() == name)
    }

    /// Every registered state, in registration order.
    pub fn states(&self) -> impl Iterator<Item = &State<C>> {
        self.arena.iter().flatten()
    }

    /// The node list, in insertion order. Duplicates are kept.
    pub fn nodes(&self) -> &[StateId] {
        &self.nodes
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.nodes.contains(&id)
    }

    /// All ordinary transitions, in insertion order.
    pub fn transitions(&self) -> &[Transition<C>] {
        &self.transitions
    }

    pub fn globals(&self) -> &[Transition<C>] {
        &self.globals
    }

    fn local(&self, id: StateId) -> impl Iterator<Item = &Transition<C>> {
        self.by_source
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(move |&index| self.transitions.get(index))
    }

    /// Ordinary, non-exception transitions leaving a state.
    pub fn transitions_of(&self, id: StateId) -> impl Iterator<Item = &Transition<C>> {
        self.local(id).filter(|t| !t.is_exception())
    }

    /// Exception transitions leaving a state.
    pub fn exception_transitions_of(&self, id: StateId) -> impl Iterator<Item = &Transition<C>> {
        self.local(id).filter(|t| t.is_exception())
    }

    /// Transitions considered after a successful action, in priority
    /// order: globals first, then the state's own transitions.
    pub fn candidates(&self, id: StateId) -> Vec<&Transition<C>> {
        self.globals
            .iter()
            .filter(|t| !t.is_exception())
            .chain(self.transitions_of(id))
            .collect()
    }

    /// Transitions considered after a failed action, in priority order.
    pub fn exception_candidates(&self, id: StateId) -> Vec<&Transition<C>> {
        self.globals
            .iter()
            .filter(|t| t.is_exception())
            .chain(self.exception_transitions_of(id))
            .collect()
    }

    /// First candidate whose guard holds. `None` means no transition
    /// applies and the walk exits.
    pub fn select_next(&self, id: StateId, context: &C) -> Option<&Transition<C>> {
        self.candidates(id)
            .into_iter()
            .find(|t| t.matches(context))
    }

    /// First exception candidate that catches the failure.
    pub fn select_on_failure(&self, id: StateId, error: &ActionError) -> Option<&Transition<C>> {
        self.exception_candidates(id)
            .into_iter()
            .find(|t| t.catches(error))
    }

    /// Whether action failures abort every walk of this machine.
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    pub fn set_blocking(&mut self, blocking: bool) {
        self.blocking = blocking;
    }

    /// Re-run the build rules against the machine as it stands.
    pub fn validate(&self) -> ValidationReport {
        validation::validate(self)
    }

    /// Render a state for messages, or `fallback` when absent.
    pub(crate) fn render_state(&self, id: Option<StateId>, fallback: &str) -> String {
        match id {
            Some(id) => self
                .state(id)
                .map(State::identifier)
                .unwrap_or_else(|| format!("?.{id}")),
            None => fallback.to_string(),
        }
    }

    /// Render an edge as `[Transition: Load.001 -> fs>0 -> Spin.002]`.
    ///
    /// Global sources render as `GLOBAL` and exit results as `EXIT`.
    pub fn describe_transition(&self, transition: &Transition<C>) -> String {
        format!(
            "[Transition: {} -> {} -> {}]",
            self.render_state(transition.source, "GLOBAL"),
            transition.display_label(),
            self.render_state(transition.result, "EXIT"),
        )
    }
}

impl<C> Clone for Machine<C> {
    fn clone(&self) -> Self {
        Self {
            start: self.start,
            arena: self.arena.clone(),
            nodes: self.nodes.clone(),
            transitions: self.transitions.clone(),
            globals: self.globals.clone(),
            by_source: self.by_source.clone(),
            blocking: self.blocking,
        }
    }
}

impl<C> fmt::Debug for Machine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("start", &self.render_state(self.start, "none"))
            .field("nodes", &self.nodes.len())
            .field("transitions", &self.transitions.len())
            .field("globals", &self.globals.len())
            .field("blocking", &self.blocking)
            .finish()
    }
}
