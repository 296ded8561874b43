//! Tree-construction dialect.
//!
//! Instead of listing states and edges separately, each [`StateTree`] node
//! carries its own outgoing branches. Sub-trees are shared through `Arc`,
//! so a state reached from several branches is built once and becomes a
//! single node. Branches back to an earlier state are expressed by name
//! with [`StateTree::back_to`], since an `Arc` tree cannot hold cycles.
//!
//! # Example
//!
//! ```rust
//! use gameflow::builder::{MachineBuilder, StateTree};
//! use gameflow::core::{Guard, State};
//!
//! let update = StateTree::new(State::<i32>::new("Update")).shared();
//! let bonus = StateTree::new(State::new("Bonus")).then(update.clone()).shared();
//! let spin = StateTree::new(State::new("Spin"))
//!     .branch("n>0", Guard::new(|n: &i32| *n > 0), bonus)
//!     .then(update)
//!     .shared();
//!
//! let machine = MachineBuilder::from_tree(&spin).try_build().unwrap();
//! assert_eq!(machine.nodes().len(), 3);
//! assert_eq!(machine.start_state().unwrap().name(), "Spin");
//! ```

use crate::builder::error::BuildError;
use crate::builder::machine::MachineBuilder;
use crate::core::{Guard, State, StateId};
use crate::graph::{Transition, TransitionKind};
use std::collections::HashMap;
use std::sync::Arc;

enum Target<C> {
    Tree(Arc<StateTree<C>>),
    Named(String),
    Exit,
}

struct Branch<C> {
    label: Option<String>,
    kind: TransitionKind<C>,
    target: Target<C>,
}

/// A state together with its outgoing branches.
pub struct StateTree<C> {
    state: State<C>,
    branches: Vec<Branch<C>>,
}

impl<C: 'static> StateTree<C> {
    pub fn new(state: State<C>) -> Self {
        Self {
            state,
            branches: Vec::new(),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn push(mut self, label: Option<String>, kind: TransitionKind<C>, target: Target<C>) -> Self {
        self.branches.push(Branch {
            label,
            kind,
            target,
        });
        self
    }

    /// Go to `next` when the guard holds.
    pub fn branch(self, label: impl Into<String>, guard: Guard<C>, next: Arc<StateTree<C>>) -> Self {
        self.push(
            Some(label.into()),
            TransitionKind::Guarded(guard),
            Target::Tree(next),
        )
    }

    /// Always go to `next`. Must be the last ordinary branch.
    pub fn then(self, next: Arc<StateTree<C>>) -> Self {
        self.push(None, TransitionKind::Always, Target::Tree(next))
    }

    /// Go to `next` when this state's action fails with `tag`.
    pub fn catching(self, label: impl Into<String>, tag: u32, next: Arc<StateTree<C>>) -> Self {
        self.push(
            Some(label.into()),
            TransitionKind::Catch(tag),
            Target::Tree(next),
        )
    }

    /// Go back to an already built state, found by name, when the guard holds.
    pub fn back_to(self, label: impl Into<String>, guard: Guard<C>, name: impl Into<String>) -> Self {
        self.push(
            Some(label.into()),
            TransitionKind::Guarded(guard),
            Target::Named(name.into()),
        )
    }

    /// End the walk when the guard holds.
    pub fn exit_when(self, label: impl Into<String>, guard: Guard<C>) -> Self {
        self.push(Some(label.into()), TransitionKind::Guarded(guard), Target::Exit)
    }

    pub fn state(&self) -> &State<C> {
        &self.state
    }
}

impl<C: 'static> MachineBuilder<C> {
    /// Flatten a tree into a builder. The root becomes the start state.
    ///
    /// States are numbered in depth-first order of first appearance.
    pub fn from_tree(root: &Arc<StateTree<C>>) -> Self {
        let mut builder = Self::new();
        let mut ids: HashMap<*const StateTree<C>, StateId> = HashMap::new();
        let mut order: Vec<(&StateTree<C>, StateId)> = Vec::new();

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let key = Arc::as_ptr(node);
            if ids.contains_key(&key) {
                continue;
            }
            let id = builder.declare(node.state.clone());
            if order.is_empty() {
                builder.add_starting_state(id);
            } else {
                builder.add_state(id);
            }
            ids.insert(key, id);
            order.push((node.as_ref(), id));

            for branch in node.branches.iter().rev() {
                if let Target::Tree(next) = &branch.target {
                    stack.push(next);
                }
            }
        }

        for (node, source) in order {
            for branch in &node.branches {
                let result = match &branch.target {
                    Target::Tree(next) => ids.get(&Arc::as_ptr(next)).copied(),
                    Target::Named(name) => {
                        let found = builder.machine().find(name).map(State::id);
                        if found.is_none() {
                            builder.defer(BuildError::UnknownStateName { name: name.clone() });
                            continue;
                        }
                        found
                    }
                    Target::Exit => None,
                };
                builder.add(Transition {
                    label: branch.label.clone(),
                    source: Some(source),
                    result,
                    kind: branch.kind.clone(),
                });
            }
        }

        builder
    }
}
