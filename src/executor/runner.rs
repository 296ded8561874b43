//! Executor: run-to-completion and single-step drive modes.

use super::error::ExecutionError;
use super::observer::Observer;
use super::walk::Walk;
use crate::config::ExecutorConfig;
use crate::core::{StateId, WalkHistory};
use crate::graph::Machine;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Start,
    Loop,
    End,
    Done,
}

/// Where an executor is in its walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    NotStarted,
    Running,
    Finished,
}

/// Walks a machine over a context.
///
/// The same executor serves both drive modes: [`execute`](Self::execute)
/// runs the walk to completion, while [`advance`](Self::advance) and
/// [`steps`](Self::steps) perform one phase at a time.
///
/// # Example
///
/// ```rust
/// use gameflow::builder::MachineBuilder;
/// use gameflow::core::{Guard, State};
/// use gameflow::executor::{Executor, Status};
/// use gameflow::graph::EXIT;
///
/// let mut builder = MachineBuilder::<u32>::new();
/// let count = builder.add_new_starting_state(State::new("Count").with_action(|n: &mut u32| {
///     *n += 1;
///     Ok(())
/// }));
/// builder
///     .add_transition("n<3", Guard::new(|n: &u32| *n < 3), count, count)
///     .add_direct_transition(count, EXIT);
///
/// let mut executor = Executor::new().with_machine(builder.build()).with_context(0);
/// executor.execute().unwrap();
///
/// assert_eq!(executor.context(), Some(&3));
/// assert_eq!(executor.history().len(), 3);
/// assert_eq!(executor.status(), Status::Finished);
/// ```
pub struct Executor<C> {
    machine: Option<Arc<Machine<C>>>,
    context: Option<C>,
    blocking: bool,
    observers: Vec<Arc<dyn Observer<C>>>,
    stage: Stage,
    current: Option<StateId>,
    history: WalkHistory,
    run_id: Uuid,
}

impl<C> Default for Executor<C> {
    fn default() -> Self {
        Self {
            machine: None,
            context: None,
            blocking: false,
            observers: Vec::new(),
            stage: Stage::Start,
            current: None,
            history: WalkHistory::new(),
            run_id: Uuid::new_v4(),
        }
    }
}

impl<C> Executor<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_machine(mut self, machine: impl Into<Arc<Machine<C>>>) -> Self {
        self.machine = Some(machine.into());
        self
    }

    pub fn with_context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    /// Abort walks on the first action failure, whatever the machine says.
    pub fn with_blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer<C>>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_config(self, config: &ExecutorConfig) -> Self {
        self.with_blocking(config.blocking_on_failure)
    }

    pub fn machine(&self) -> Option<&Arc<Machine<C>>> {
        self.machine.as_ref()
    }

    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut C> {
        self.context.as_mut()
    }

    /// Swap in a new context, returning the previous one.
    pub fn replace_context(&mut self, context: C) -> Option<C> {
        self.context.replace(context)
    }

    pub fn into_context(self) -> Option<C> {
        self.context
    }

    /// The state that runs on the next loop iteration.
    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    pub fn history(&self) -> &WalkHistory {
        &self.history
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn status(&self) -> Status {
        match self.stage {
            Stage::Start => Status::NotStarted,
            Stage::Loop | Stage::End => Status::Running,
            Stage::Done => Status::Finished,
        }
    }

    /// Run the walk until exit.
    ///
    /// A finished executor is restarted first. A walk that was advanced
    /// part of the way continues from its current state.
    pub fn execute(&mut self) -> Result<(), ExecutionError> {
        if self.stage == Stage::Done {
            self.restart();
        }
        while self.stage != Stage::Done {
            self.advance()?;
        }
        Ok(())
    }

    /// Perform exactly one phase of the walk: the start, one loop
    /// iteration, or the end. Returns the current state afterwards.
    ///
    /// An error ends the walk; the executor is then finished.
    pub fn advance(&mut self) -> Result<Option<StateId>, ExecutionError> {
        if self.stage == Stage::Done {
            return Ok(None);
        }
        let observers = self.observers.as_slice();
        let Some(machine) = self.machine.as_deref() else {
            return Err(finish(&mut self.stage, observers, ExecutionError::MachineMissing));
        };
        let walk = Walk::new(machine, observers, self.blocking, self.run_id);
        let Some(context) = self.context.as_mut() else {
            let err = ExecutionError::ContextMissing;
            walk.abort(&err);
            self.stage = Stage::Done;
            return Err(err);
        };

        let phase = match self.stage {
            Stage::Start => walk.begin(context).map(|start| {
                self.history.clear();
                self.current = Some(start);
                self.stage = Stage::Loop;
            }),
            Stage::Loop => match self.current {
                Some(id) => walk.process(id, context, &mut self.history).map(|next| {
                    self.current = next;
                    if next.is_none() {
                        self.stage = Stage::End;
                    }
                }),
                None => {
                    self.stage = Stage::End;
                    Ok(())
                }
            },
            Stage::End => {
                walk.end(context);
                self.stage = Stage::Done;
                Ok(())
            }
            Stage::Done => Ok(()),
        };

        match phase {
            Ok(()) => Ok(self.current),
            Err(err) => {
                walk.abort(&err);
                self.stage = Stage::Done;
                Err(err)
            }
        }
    }

    /// Reset to the state before the walk began. The machine, context and
    /// observers stay attached.
    pub fn restart(&mut self) {
        self.stage = Stage::Start;
        self.current = None;
        self.history.clear();
        self.run_id = Uuid::new_v4();
    }

    /// Iterate the remaining phases of the walk.
    ///
    /// The iterator ends after the end phase or after the first error.
    pub fn steps(&mut self) -> Steps<'_, C> {
        Steps { executor: self }
    }
}

fn finish<C>(
    stage: &mut Stage,
    observers: &[Arc<dyn Observer<C>>],
    err: ExecutionError,
) -> ExecutionError {
    for observer in observers {
        observer.walk_aborted(&err);
    }
    *stage = Stage::Done;
    err
}

/// Iterator over the phases of a walk, see [`Executor::steps`].
pub struct Steps<'a, C> {
    executor: &'a mut Executor<C>,
}

impl<C> Iterator for Steps<'_, C> {
    type Item = Result<Option<StateId>, ExecutionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.executor.stage == Stage::Done {
            None
        } else {
            Some(self.executor.advance())
        }
    }
}
