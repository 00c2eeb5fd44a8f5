//! Invariants that hold for every reachable belief map.

use std::f64::consts::TAU;

use beliefmap_core::{
    layout, BeliefId, BeliefStatus, GraphState, GraphStore, Mode, NewBelief, Verdict,
    HISTORY_CAPACITY,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    /// Insert under the nth existing belief (modulo count), or the default.
    Insert(Option<usize>),
    Classify(usize, Verdict),
    Select(Option<usize>),
    Undo,
}

fn verdict_strategy() -> impl Strategy<Value = Verdict> {
    prop::sample::select(Verdict::ALL.to_vec())
}

fn op_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            4 => prop::option::of(0usize..64).prop_map(Op::Insert),
            3 => (0usize..64, verdict_strategy()).prop_map(|(n, v)| Op::Classify(n, v)),
            1 => prop::option::of(0usize..64).prop_map(Op::Select),
            1 => Just(Op::Undo),
        ],
        0..80,
    )
}

fn mode_strategy() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::Sandbox), Just(Mode::Professional)]
}

fn nth_id(state: &GraphState, n: usize) -> BeliefId {
    let mut ids: Vec<BeliefId> = state.nodes().map(|b| b.id).collect();
    ids.sort();
    ids[n % ids.len()]
}

fn run(mode: Mode, ops: &[Op]) -> GraphStore {
    let mut store = GraphStore::in_memory();
    store
        .initialize(mode, "Core belief text", None, None)
        .expect("initialize");
    for (i, op) in ops.iter().enumerate() {
        match op {
            Op::Insert(parent) => {
                let parent = parent.map(|n| nth_id(store.state(), n));
                if store.state().can_grow() {
                    store
                        .insert_pending(NewBelief::new(format!("Belief {i}"), 50), parent)
                        .expect("insert");
                }
            }
            Op::Classify(n, verdict) => {
                let id = nth_id(store.state(), *n);
                store.apply_classification(id, *verdict, None, None);
            }
            Op::Select(n) => {
                let id = n.map(|n| nth_id(store.state(), n));
                store.select_active(id);
            }
            Op::Undo => {
                store.undo().expect("undo");
            }
        }
        store.state().check_invariants().expect("invariants after op");
    }
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_belief_reaches_the_core(mode in mode_strategy(), ops in op_strategy()) {
        let store = run(mode, &ops);
        let state = store.state();
        let core = state.core_id().expect("core");
        for node in state.nodes() {
            let mut current = node.id;
            let mut seen = std::collections::HashSet::new();
            let mut steps = 0;
            while current != core {
                prop_assert!(seen.insert(current), "cycle through {current}");
                current = state.node(current).and_then(|n| n.parent_id).expect("parent");
                steps += 1;
                prop_assert!(steps <= state.node_count());
            }
        }
    }

    #[test]
    fn exactly_one_protected_belief(mode in mode_strategy(), ops in op_strategy()) {
        let store = run(mode, &ops);
        let state = store.state();
        let protected: Vec<_> = state
            .nodes()
            .filter(|n| n.status == BeliefStatus::Protected)
            .map(|n| n.id)
            .collect();
        prop_assert_eq!(protected, vec![state.core_id().expect("core")]);
    }

    #[test]
    fn blocker_is_always_flagged(ops in op_strategy()) {
        let store = run(Mode::Professional, &ops);
        let state = store.state();
        if let Some(blocker) = state.blocked_by() {
            let status = state.node(blocker).expect("blocker exists").status;
            prop_assert!(status.is_flagged(), "blocker has status {status}");
        }
    }

    #[test]
    fn sandbox_is_never_blocked(ops in op_strategy()) {
        let store = run(Mode::Sandbox, &ops);
        prop_assert_eq!(store.state().blocked_by(), None);
    }

    #[test]
    fn history_never_exceeds_capacity(inserts in 0usize..120) {
        let mut store = GraphStore::in_memory();
        store
            .initialize(Mode::Sandbox, "Core belief text", None, None)
            .expect("initialize");
        for i in 0..inserts {
            store
                .insert_pending(NewBelief::new(format!("Belief {i}"), 50), None)
                .expect("insert");
            prop_assert!(store.state().history().len() <= HISTORY_CAPACITY);
        }
    }

    #[test]
    fn insert_then_undo_restores(ops in op_strategy(), parent in prop::option::of(0usize..64)) {
        let mut store = run(Mode::Sandbox, &ops);
        let before = store.state().clone();
        let parent = parent.map(|n| nth_id(&before, n));
        store
            .insert_pending(NewBelief::new("One more belief", 50), parent)
            .expect("insert");
        prop_assert!(store.undo().expect("undo"));
        let after = store.state();
        prop_assert_eq!(after.without_history(), before.without_history());
        prop_assert_eq!(after.active_upstream_id(), before.active_upstream_id());
        prop_assert_eq!(after.blocked_by(), before.blocked_by());
    }

    #[test]
    fn layout_places_every_belief_on_its_ring(
        mode in mode_strategy(),
        ops in op_strategy(),
        width in 100.0f64..2000.0,
        height in 100.0f64..2000.0,
    ) {
        let store = run(mode, &ops);
        let state = store.state();
        let placed = layout(state, width, height).expect("layout");
        prop_assert_eq!(placed.len(), state.node_count());

        for node in state.nodes() {
            let p = placed.get(node.id).expect("placement");
            prop_assert!((0.0..TAU).contains(&p.theta), "theta {} out of range", p.theta);
            prop_assert_eq!(Some(p.depth), state.depth(node.id));
            let ring = placed.r0 + p.depth as f64 * placed.r_step;
            prop_assert!((p.radius - ring).abs() < 1e-9, "radius {} != {ring}", p.radius);
            prop_assert!((p.x.hypot(p.y) - p.radius).abs() < 1e-6);
        }
        prop_assert!(placed.r_step >= 60.0);

        let again = layout(state, width, height).expect("layout");
        prop_assert_eq!(again, placed);
    }
}
