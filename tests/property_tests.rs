//! Property-based tests for machine construction and traversal.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated graphs.

use gameflow::builder::{BuildError, MachineBuilder};
use gameflow::checkpoint::GraphSnapshot;
use gameflow::core::{Guard, State, StateId};
use gameflow::executor::Executor;
use gameflow::graph::{Machine, Transition, EXIT};
use proptest::prelude::*;

/// Guarded edge `source -> target` taken when the context exceeds
/// `threshold`. A target equal to the graph size means exit.
#[derive(Clone, Debug)]
struct Edge {
    source: usize,
    target: usize,
    threshold: i32,
}

prop_compose! {
    fn arbitrary_graph()(size in 1..6usize)(
        size in Just(size),
        edges in prop::collection::vec((0..size, 0..=size, -5..5i32), 0..12),
    ) -> (usize, Vec<Edge>) {
        let edges = edges
            .into_iter()
            .map(|(source, target, threshold)| Edge { source, target, threshold })
            .collect();
        (size, edges)
    }
}

fn build(size: usize, edges: &[Edge]) -> (Machine<i32>, Vec<StateId>) {
    let mut builder = MachineBuilder::new();
    let ids: Vec<StateId> = (0..size)
        .map(|index| {
            let state = State::new(format!("S{index}"));
            if index == 0 {
                builder.add_new_starting_state(state)
            } else {
                builder.add_new_state(state)
            }
        })
        .collect();

    for edge in edges {
        let threshold = edge.threshold;
        builder.add_transition(
            format!("x>{threshold}"),
            Guard::new(move |x: &i32| *x > threshold),
            ids[edge.source],
            ids.get(edge.target).copied(),
        );
    }
    for &id in &ids {
        builder.add_direct_transition(id, EXIT);
    }
    (builder.build(), ids)
}

fn expected_next(edges: &[Edge], ids: &[StateId], source: usize, x: i32) -> Option<StateId> {
    edges
        .iter()
        .find(|edge| edge.source == source && x > edge.threshold)
        .and_then(|edge| ids.get(edge.target).copied())
}

proptest! {
    #[test]
    fn generated_graphs_are_valid((size, edges) in arbitrary_graph()) {
        let (machine, _) = build(size, &edges);
        prop_assert!(machine.validate().is_valid());
    }

    #[test]
    fn selection_is_deterministic_first_match((size, edges) in arbitrary_graph(), x in -10..10i32) {
        let (machine, ids) = build(size, &edges);
        for (index, &id) in ids.iter().enumerate() {
            let first = machine.select_next(id, &x).map(|t| t.result);
            let second = machine.select_next(id, &x).map(|t| t.result);
            prop_assert_eq!(first, second);
            // the trailing direct transition always applies
            prop_assert_eq!(first, Some(expected_next(&edges, &ids, index, x)));
        }
    }

    #[test]
    fn direct_transition_must_be_last(guarded in 1..5usize, position in 0..5usize) {
        let position = position.min(guarded);
        let mut builder = MachineBuilder::<i32>::new();
        let a = builder.add_new_starting_state(State::new("A"));
        for index in 0..=guarded {
            if index == position {
                builder.add_direct_transition(a, EXIT);
            }
            if index < guarded {
                builder.add_transition(format!("g{index}"), Guard::new(|_: &i32| false), a, EXIT);
            }
        }
        let report = builder.report();
        let flagged = report
            .errors
            .iter()
            .any(|e| matches!(e, BuildError::DirectTransitionNotLast { .. }));
        prop_assert_eq!(flagged, position < guarded);
    }

    #[test]
    fn direct_globals_are_rejected((size, edges) in arbitrary_graph(), target in 0..6usize) {
        let (machine, ids) = build(size, &edges);
        let mut builder = MachineBuilder::edit(machine);
        builder.add_global(Transition::direct(None, ids.get(target).copied()));
        let report = builder.report();
        let flagged = report
            .errors
            .iter()
            .any(|e| matches!(e, BuildError::DirectTransitionInGlobals { .. }));
        prop_assert!(flagged);
    }

    #[test]
    fn rebuilding_is_idempotent((size, edges) in arbitrary_graph()) {
        let (machine, _) = build(size, &edges);
        let before = machine.validate();
        let snapshot = machine.snapshot();
        let rebuilt = MachineBuilder::edit(machine).build();
        prop_assert_eq!(rebuilt.validate(), before);
        prop_assert_eq!(rebuilt.snapshot(), snapshot);
    }

    #[test]
    fn snapshot_round_trip_preserves_graph((size, edges) in arbitrary_graph(), x in -10..10i32) {
        let (machine, ids) = build(size, &edges);
        let snapshot = machine.snapshot();
        let restored = Machine::from_snapshot(&snapshot, &machine.bindings()).unwrap();

        prop_assert_eq!(restored.snapshot(), snapshot.clone());
        prop_assert_eq!(restored.start(), machine.start());
        for &id in &ids {
            prop_assert_eq!(
                restored.select_next(id, &x).map(|t| t.result),
                machine.select_next(id, &x).map(|t| t.result)
            );
        }

        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: GraphSnapshot = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(decoded, snapshot);
    }

    #[test]
    fn counting_walk_visits_limit_states(limit in 1..20u32) {
        let mut builder = MachineBuilder::new();
        let count = builder.add_new_starting_state(State::new("Count").with_action(|n: &mut u32| {
            *n += 1;
            Ok(())
        }));
        builder
            .add_transition("below", Guard::new(move |n: &u32| *n < limit), count, count)
            .add_direct_transition(count, EXIT);

        let mut executor = Executor::new().with_machine(builder.build()).with_context(0);
        executor.execute().unwrap();
        prop_assert_eq!(executor.context().copied(), Some(limit));
        prop_assert_eq!(executor.history().visited().len(), limit as usize);
    }
}
