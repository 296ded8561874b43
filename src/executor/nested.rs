//! Machines used as the action of another machine's state.

use super::error::ExecutionError;
use super::walk::Walk;
use crate::core::{Action, ActionError, WalkHistory};
use crate::graph::Machine;
use std::sync::Arc;
use uuid::Uuid;

/// An action that walks `machine` to completion on the outer context.
///
/// The nested walk always blocks on failures. A failing inner action
/// surfaces as the outer action's failure with the same tag, so the outer
/// machine can catch it with an exception transition.
///
/// # Example
///
/// ```rust
/// use gameflow::builder::MachineBuilder;
/// use gameflow::core::State;
/// use gameflow::executor::{nested, Executor};
/// use gameflow::graph::EXIT;
/// use std::sync::Arc;
///
/// let mut inner = MachineBuilder::<Vec<&'static str>>::new();
/// let step = inner.add_new_starting_state(State::new("Inner").with_action(|log: &mut Vec<&'static str>| {
///     log.push("inner");
///     Ok(())
/// }));
/// inner.add_direct_transition(step, EXIT);
///
/// let mut outer = MachineBuilder::new();
/// let host = outer.add_new_starting_state(
///     State::new("Host").with_bound_action(nested(Arc::new(inner.build()))),
/// );
/// outer.add_direct_transition(host, EXIT);
///
/// let mut executor = Executor::new().with_machine(outer.build()).with_context(Vec::new());
/// executor.execute().unwrap();
/// assert_eq!(executor.context(), Some(&vec!["inner"]));
/// ```
pub fn nested<C: 'static>(machine: Arc<Machine<C>>) -> Action<C> {
    Action::new(move |context: &mut C| {
        let walk = Walk::new(&machine, &[], true, Uuid::new_v4());
        let mut history = WalkHistory::new();
        walk.run(context, &mut history).map_err(|err| match err {
            ExecutionError::ActionFailed { source, .. } => source,
            other => ActionError::from_error(other.code(), &other),
        })
    })
}
