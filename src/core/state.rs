//! States: named units of work executed by a walk.
//!
//! A [`State`] pairs a name and description with an [`Action`]. States are
//! registered in a machine, which assigns each one a [`StateId`] sequence
//! number. The rendered identifier `name.NNN` is the state's identity.

use super::error::ActionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Sequence number assigned to a state when it is registered in a machine.
///
/// Sequence numbers start at 1 and are scoped to one machine. They are
/// stable across snapshot and reload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(u32);

impl StateId {
    pub(crate) const UNREGISTERED: StateId = StateId(0);

    pub(crate) fn new(seq: u32) -> Self {
        StateId(seq)
    }

    /// The raw sequence number.
    pub fn seq(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

type ActionFn<C> = dyn Fn(&mut C) -> Result<(), ActionError> + Send + Sync;

/// Side-effecting unit of work run against the execution context.
///
/// Actions signal failure by returning an [`ActionError`]. They are cheap to
/// clone, so the same action can be bound to several machines.
///
/// # Example
///
/// ```rust
/// use gameflow::core::{Action, ActionError};
///
/// let bump = Action::new(|count: &mut u32| {
///     *count += 1;
///     Ok(())
/// });
///
/// let mut count = 0;
/// bump.run(&mut count).unwrap();
/// assert_eq!(count, 1);
///
/// let fail = Action::new(|_: &mut u32| Err(ActionError::new(7, "no coins")));
/// assert_eq!(fail.run(&mut count).unwrap_err().tag(), 7);
/// ```
pub struct Action<C> {
    run: Arc<ActionFn<C>>,
}

impl<C> Action<C> {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        Self {
            run: Arc::new(action),
        }
    }

    /// Placeholder action that only logs a warning when it runs.
    pub fn unimplemented(state_name: impl Into<String>) -> Self
    where
        C: 'static,
    {
        let state_name = state_name.into();
        Self::new(move |_: &mut C| {
            warn!(state = %state_name, "Unimplemented action");
            Ok(())
        })
    }

    pub fn run(&self, context: &mut C) -> Result<(), ActionError> {
        (self.run)(context)
    }
}

impl<C> Clone for Action<C> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<C> fmt::Debug for Action<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

/// A named unit of work in a machine.
///
/// Equality is by rendered identifier (`name.NNN`), so two instances with
/// the same name and the same sequence number compare equal regardless of
/// their actions.
///
/// # Example
///
/// ```rust
/// use gameflow::core::State;
///
/// let spin: State<()> = State::new("Spin")
///     .with_description("Spins the reels")
///     .with_action(|_| Ok(()));
///
/// assert_eq!(spin.name(), "Spin");
/// assert!(!spin.is_registered());
/// ```
pub struct State<C> {
    id: StateId,
    name: String,
    description: String,
    action: Action<C>,
}

impl<C: 'static> State<C> {
    /// Create an unregistered state whose action only logs a warning.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: StateId::UNREGISTERED,
            action: Action::unimplemented(name.clone()),
            description: String::new(),
            name,
        }
    }
}

impl<C> State<C> {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.action = Action::new(action);
        self
    }

    /// Bind an existing action value.
    pub fn with_bound_action(mut self, action: Action<C>) -> Self {
        self.action = action;
        self
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn is_registered(&self) -> bool {
        self.id != StateId::UNREGISTERED
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn action(&self) -> &Action<C> {
        &self.action
    }

    /// Rendered identity, `name.NNN`.
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.name, self.id)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_action(&mut self, action: Action<C>) {
        self.action = action;
    }

    pub(crate) fn register(&mut self, id: StateId) {
        self.id = id;
    }

    /// Run this state's action.
    pub fn execute(&self, context: &mut C) -> Result<(), ActionError> {
        self.action.run(context)
    }
}

impl<C> Clone for State<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            action: self.action.clone(),
        }
    }
}

impl<C> PartialEq for State<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl<C> Eq for State<C> {}

impl<C> fmt::Debug for State<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.identifier())
            .field("description", &self.description)
            .finish()
    }
}

impl<C> fmt::Display for State<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_renders_name_and_padded_sequence() {
        let mut state: State<()> = State::new("Spin");
        state.register(StateId::new(7));
        assert_eq!(state.identifier(), "Spin.007");
        assert_eq!(state.to_string(), "Spin.007");
    }

    #[test]
    fn states_with_same_name_and_sequence_are_equal() {
        let mut a: State<()> = State::new("Load").with_action(|_| Ok(()));
        let mut b: State<()> = State::new("Load").with_description("other");
        a.register(StateId::new(1));
        b.register(StateId::new(1));
        assert_eq!(a, b);

        b.register(StateId::new(2));
        assert_ne!(a, b);
    }

    #[test]
    fn new_state_is_unregistered_and_runs_placeholder() {
        let state: State<u32> = State::new("Idle");
        assert!(!state.is_registered());

        let mut ctx = 5;
        assert!(state.execute(&mut ctx).is_ok());
        assert_eq!(ctx, 5);
    }

    #[test]
    fn action_mutates_context() {
        let state: State<Vec<&'static str>> = State::new("Log").with_action(|log: &mut Vec<&'static str>| {
            log.push("ran");
            Ok(())
        });

        let mut log = Vec::new();
        state.execute(&mut log).unwrap();
        assert_eq!(log, vec!["ran"]);
    }

    #[test]
    fn state_id_index_is_zero_based() {
        assert_eq!(StateId::new(1).index(), Some(0));
        assert_eq!(StateId::UNREGISTERED.index(), None);
    }
}
