//! Snapshot and restore of machine graphs.
//!
//! A [`GraphSnapshot`] holds exactly what makes up a machine's graph: the
//! start state, the node list, the ordinary transitions and the global
//! transitions. Actions and guards are closures and cannot be serialized,
//! so they are re-attached on restore from [`Bindings`]: actions by state
//! identifier or name, guards by transition position or label.

use crate::core::{Action, Guard, State, StateId};
use crate::graph::{Machine, Transition, TransitionKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub mod error;
pub mod store;

pub use error::CheckpointError;
pub use store::{FileStore, SnapshotStore, SNAPSHOT_EXTENSION};

/// Version identifier for the snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub id: StateId,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KindRecord {
    Guarded,
    Always,
    Catch { tag: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub label: Option<String>,
    pub source: Option<StateId>,
    pub result: Option<StateId>,
    pub kind: KindRecord,
}

/// Serializable graph of a machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub start: Option<StateId>,
    /// Node list in order, duplicates included.
    pub nodes: Vec<StateRecord>,
    pub transitions: Vec<TransitionRecord>,
    pub globals: Vec<TransitionRecord>,
    /// Registered states that are not in the node list.
    #[serde(default)]
    pub detached: Vec<StateRecord>,
}

/// Versioned envelope written to storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Snapshot format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When the checkpoint was created
    pub timestamp: DateTime<Utc>,

    pub graph: GraphSnapshot,
}

impl Checkpoint {
    pub fn new(graph: GraphSnapshot) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            graph,
        }
    }

    /// Reject envelopes written by an unknown format version.
    pub fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version == SNAPSHOT_VERSION {
            Ok(())
        } else {
            Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            })
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, CheckpointError> {
        serde_json::to_vec_pretty(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_slice(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }
}

/// Position of a transition in one of the machine's two lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum EdgeSlot {
    Ordinary(usize),
    Global(usize),
}

/// Actions and guards to re-attach when restoring a snapshot.
///
/// Bindings taken from a machine also remember where each guard sat, so a
/// transition found at the same position with the same record gets its
/// own guard back even when its label is shared.
pub struct Bindings<C> {
    actions: HashMap<String, Action<C>>,
    guards: HashMap<String, Guard<C>>,
    edges: HashMap<EdgeSlot, (TransitionRecord, Guard<C>)>,
    ambiguous: HashSet<String>,
}

impl<C> Default for Bindings<C> {
    fn default() -> Self {
        Self {
            actions: HashMap::new(),
            guards: HashMap::new(),
            edges: HashMap::new(),
            ambiguous: HashSet::new(),
        }
    }
}

impl<C> Bindings<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an action to a state name (`Spin`) or identifier (`Spin.002`).
    /// Identifiers take precedence over names.
    pub fn action(mut self, key: impl Into<String>, action: Action<C>) -> Self {
        self.actions.insert(key.into(), action);
        self
    }

    /// Bind a guard to a transition label, replacing any earlier one.
    pub fn guard(mut self, label: impl Into<String>, guard: Guard<C>) -> Self {
        let label = label.into();
        self.ambiguous.remove(&label);
        self.guards.insert(label, guard);
        self
    }

    fn bind_edge(&mut self, slot: EdgeSlot, transition: &Transition<C>) {
        let TransitionKind::Guarded(guard) = &transition.kind else {
            return;
        };
        if let Some(label) = &transition.label {
            match self.guards.get(label) {
                Some(bound) if !bound.same(guard) => {
                    self.ambiguous.insert(label.clone());
                }
                Some(_) => {}
                None => {
                    self.guards.insert(label.clone(), guard.clone());
                }
            }
        }
        self.edges.insert(slot, (record_of(transition), guard.clone()));
    }

    pub fn get_action(&self, key: &str) -> Option<&Action<C>> {
        self.actions.get(key)
    }

    pub fn get_guard(&self, label: &str) -> Option<&Guard<C>> {
        self.guards.get(label)
    }

    fn action_for(&self, record: &StateRecord) -> Option<Action<C>> {
        let identifier = format!("{}.{}", record.name, record.id);
        self.actions
            .get(&identifier)
            .or_else(|| self.actions.get(&record.name))
            .cloned()
    }

    fn guard_for(&self, slot: EdgeSlot, record: &TransitionRecord) -> Result<Guard<C>, CheckpointError> {
        if let Some((bound, guard)) = self.edges.get(&slot) {
            if bound == record {
                return Ok(guard.clone());
            }
        }
        let label = record.label.clone().unwrap_or_default();
        if self.ambiguous.contains(&label) {
            return Err(CheckpointError::AmbiguousGuard { label });
        }
        self.guards
            .get(&label)
            .cloned()
            .ok_or(CheckpointError::UnboundGuard { label })
    }
}

fn known<C>(machine: &Machine<C>, id: Option<StateId>) -> Result<Option<StateId>, CheckpointError> {
    match id {
        Some(id) if machine.state(id).is_none() => Err(CheckpointError::UnknownState { seq: id.seq() }),
        _ => Ok(id),
    }
}

fn state_record<C>(state: &State<C>) -> StateRecord {
    StateRecord {
        id: state.id(),
        name: state.name().to_string(),
        description: state.description().to_string(),
    }
}

fn record_of<C>(transition: &Transition<C>) -> TransitionRecord {
    let kind = match transition.kind {
        TransitionKind::Guarded(_) => KindRecord::Guarded,
        TransitionKind::Always => KindRecord::Always,
        TransitionKind::Catch(tag) => KindRecord::Catch { tag },
    };
    TransitionRecord {
        label: transition.label.clone(),
        source: transition.source,
        result: transition.result,
        kind,
    }
}

impl<C: 'static> Machine<C> {
    /// Capture the graph of this machine.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            start: self.start,
            nodes: self
                .nodes
                .iter()
                .filter_map(|&id| self.state(id))
                .map(state_record)
                .collect(),
            transitions: self.transitions.iter().map(record_of).collect(),
            globals: self.globals.iter().map(record_of).collect(),
            detached: self
                .states()
                .filter(|state| !self.nodes.contains(&state.id()))
                .map(state_record)
                .collect(),
        }
    }

    /// The actions and guards of this machine, keyed for restoring its
    /// own snapshots.
    pub fn bindings(&self) -> Bindings<C> {
        let mut bindings = Bindings::new();
        for state in self.states() {
            bindings = bindings.action(state.identifier(), state.action().clone());
        }
        for (index, transition) in self.transitions.iter().enumerate() {
            bindings.bind_edge(EdgeSlot::Ordinary(index), transition);
        }
        for (index, transition) in self.globals.iter().enumerate() {
            bindings.bind_edge(EdgeSlot::Global(index), transition);
        }
        bindings
    }

    /// Rebuild a machine from a snapshot.
    ///
    /// States without a bound action get one that only logs a warning.
    /// Guarded transitions without a bound guard are an error.
    ///
    /// Sequence numbers must not exceed the number of distinct states the
    /// snapshot lists, as they do in every snapshot a machine produces.
    pub fn from_snapshot(
        snapshot: &GraphSnapshot,
        bindings: &Bindings<C>,
    ) -> Result<Self, CheckpointError> {
        let mut machine = Machine::new();
        let listed: HashSet<StateId> = snapshot
            .nodes
            .iter()
            .chain(&snapshot.detached)
            .map(|record| record.id)
            .collect();

        for (record, in_node_list) in snapshot
            .nodes
            .iter()
            .map(|record| (record, true))
            .chain(snapshot.detached.iter().map(|record| (record, false)))
        {
            let index = record
                .id
                .index()
                .filter(|&index| index < listed.len())
                .ok_or(CheckpointError::UnknownState { seq: record.id.seq() })?;
            if machine.arena.len() <= index {
                machine.arena.resize_with(index + 1, || None);
            }
            if machine.arena[index].is_none() {
                let mut state = State::new(record.name.clone()).with_description(record.description.clone());
                if let Some(action) = bindings.action_for(record) {
                    state.set_action(action);
                }
                state.register(record.id);
                machine.arena[index] = Some(state);
            }
            if in_node_list {
                machine.nodes.push(record.id);
            }
        }

        machine.start = known(&machine, snapshot.start)?;
        for (records, global) in [(&snapshot.transitions, false), (&snapshot.globals, true)] {
            for (index, record) in records.iter().enumerate() {
                let slot = if global {
                    EdgeSlot::Global(index)
                } else {
                    EdgeSlot::Ordinary(index)
                };
                let kind = match record.kind {
                    KindRecord::Guarded => TransitionKind::Guarded(bindings.guard_for(slot, record)?),
                    KindRecord::Always => TransitionKind::Always,
                    KindRecord::Catch { tag } => TransitionKind::Catch(tag),
                };
                let transition = Transition {
                    label: record.label.clone(),
                    source: known(&machine, record.source)?,
                    result: known(&machine, record.result)?,
                    kind,
                };
                if global {
                    machine.globals.push(transition);
                } else {
                    machine.transitions.push(transition);
                }
            }
        }
        machine.reindex();

        Ok(machine)
    }

    /// Replace start state, nodes, transitions and globals with the
    /// snapshot's, re-attaching this machine's own actions and guards.
    ///
    /// The blocking flag is kept.
    pub fn reload(&mut self, snapshot: &GraphSnapshot) -> Result<(), CheckpointError> {
        let mut restored = Machine::from_snapshot(snapshot, &self.bindings())?;
        restored.blocking = self.blocking;
        *self = restored;
        Ok(())
    }
}
