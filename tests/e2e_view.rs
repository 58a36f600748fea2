//! End-to-end tests for view materialization.
//!
//! Each test loads a small graph straight into a MemoryStore, then selects
//! a root through the engine and inspects the resulting State.

use pretty_assertions::assert_eq;
use thoughtweb::{
    ConnectionRecord, ConnectionType, GraphEngine, MemoryStore, MemoryTextStore, SequentialIds,
    State, ThoughtId, ThoughtRecord,
};

use ConnectionType::{Child, Link};

fn t(id: u64) -> ThoughtId {
    ThoughtId(id)
}

fn sorted(ids: &[ThoughtId]) -> Vec<u64> {
    let mut v: Vec<u64> = ids.iter().map(|id| id.0).collect();
    v.sort_unstable();
    v
}

fn engine_over(
    thoughts: &[(u64, &str)],
    edges: &[(u64, u64, ConnectionType)],
) -> GraphEngine<MemoryStore> {
    let store = MemoryStore::with_records(
        thoughts.iter().map(|&(id, name)| ThoughtRecord::new(t(id), name)),
        edges.iter().map(|&(a, b, kind)| ConnectionRecord::new(t(a), t(b), kind)),
    )
    .unwrap();
    GraphEngine::with_id_generator(store, MemoryTextStore::new(), Box::new(SequentialIds::default()))
        .unwrap()
}

// ============================================================================
// Helper: the reference fixture.
//
//        1 Parent 1        2 Parent 2
//       /    |    \          |      \
//  3 Sibling 0 Brain 4 Link1  0      5 Link 2 (link)
//            0 ~~ 4, 0 ~~ 5 (links)
// ============================================================================

fn fixture() -> GraphEngine<MemoryStore> {
    engine_over(
        &[
            (0, "Brain"),
            (1, "Parent 1"),
            (2, "Parent 2"),
            (3, "Sibling"),
            (4, "Link 1"),
            (5, "Link 2"),
        ],
        &[
            (0, 4, Link),
            (0, 5, Link),
            (1, 0, Child),
            (1, 3, Child),
            (1, 4, Child),
            (2, 0, Child),
            (2, 5, Link),
        ],
    )
}

fn select(engine: &mut GraphEngine<MemoryStore>, id: u64) -> State {
    engine.select(t(id)).unwrap().clone()
}

// ============================================================================
// 1. Fixture: root 0
// ============================================================================

#[test]
fn test_fixture_center_of_brain() {
    let mut engine = fixture();
    let state = select(&mut engine, 0);

    assert_eq!(state.root_id, t(0));
    assert_eq!(state.center.name, "Brain");
    assert_eq!(sorted(&state.center.links), vec![4, 5]);
    assert_eq!(sorted(&state.center.parents), vec![1, 2]);
    assert!(state.center.children.is_empty());
    assert!(state.center.has_parents);
    assert!(state.center.has_links);
    assert!(!state.center.has_children);
}

#[test]
fn test_fixture_parent_nodes() {
    let mut engine = fixture();
    let state = select(&mut engine, 0);

    let p1 = &state.neighborhood[&t(1)];
    assert_eq!(sorted(&p1.children), vec![0, 3, 4]);
    assert!(p1.parents.is_empty());

    let p2 = &state.neighborhood[&t(2)];
    assert_eq!(sorted(&p2.children), vec![0]);
    assert_eq!(sorted(&p2.links), vec![5]);
}

#[test]
fn test_fixture_neighborhood_membership() {
    let mut engine = fixture();
    let state = select(&mut engine, 0);

    let mut visible: Vec<u64> = state.neighborhood.keys().map(|id| id.0).collect();
    visible.sort_unstable();
    assert_eq!(visible, vec![1, 2, 3, 4, 5]);
    assert_eq!(state.visible_count(), 6);

    // Link 1 is also a child of Parent 1, but shows up once, as a link.
    let link1 = &state.neighborhood[&t(4)];
    assert!(link1.has_parents);
    assert_eq!(sorted(&link1.links), vec![0]);

    let link2 = &state.neighborhood[&t(5)];
    assert_eq!(sorted(&link2.links), vec![0, 2]);
}

// ============================================================================
// 2. Fixture: reselect root 4
// ============================================================================

#[test]
fn test_fixture_reselect_link() {
    let mut engine = fixture();
    select(&mut engine, 0);
    let state = select(&mut engine, 4);

    assert_eq!(state.root_id, t(4));
    assert_eq!(sorted(&state.center.parents), vec![1]);
    assert_eq!(sorted(&state.center.links), vec![0]);

    // 3 is a sibling through Parent 1; 0 is a link, not a sibling.
    assert!(state.contains(t(3)));
    assert!(state.contains(t(0)));
    assert!(!state.contains(t(2)));
    assert!(!state.contains(t(5)));
}

// ============================================================================
// 3. Tiered cross-link suppression
// ============================================================================

#[test]
fn test_link_tier_keeps_cross_link_over_sibling() {
    // R=10, P=11, L=12, S=13; S child of P; S ~~ L.
    let mut engine = engine_over(
        &[(10, "R"), (11, "P"), (12, "L"), (13, "S")],
        &[(11, 10, Child), (10, 12, Link), (11, 13, Child), (13, 12, Link)],
    );
    let state = select(&mut engine, 10);

    assert!(state.neighborhood[&t(12)].links.contains(&t(13)));
    assert!(!state.neighborhood[&t(13)].links.contains(&t(12)));
}

#[test]
fn test_children_always_shown_in_full() {
    // Child 2 of root has children 3 and 4; 4 is also linked to root.
    let mut engine = engine_over(
        &[(1, "R"), (2, "C"), (3, "GC"), (4, "L")],
        &[(1, 2, Child), (2, 3, Child), (2, 4, Child), (1, 4, Link)],
    );
    let state = select(&mut engine, 1);
    assert_eq!(sorted(&state.neighborhood[&t(2)].children), vec![3, 4]);
}

#[test]
fn test_only_center_carries_parents() {
    let mut engine = fixture();
    let state = select(&mut engine, 0);
    for node in state.neighborhood.values() {
        assert!(node.parents.is_empty(), "node {} has parents", node.id);
    }
}

// ============================================================================
// 4. State is rebuilt, never patched
// ============================================================================

#[test]
fn test_mutation_rebuilds_view() {
    let mut engine = fixture();
    select(&mut engine, 0);

    let before = engine.state().unwrap().clone();
    engine.connect_thoughts(t(3), t(0), Link).unwrap();
    let after = engine.state().unwrap();

    assert_ne!(&before, after);
    // 3 moved from the sibling row to the link row.
    assert_eq!(sorted(&after.center.links), vec![3, 4, 5]);
    assert!(after.neighborhood[&t(3)].has_links);
}

#[test]
fn test_state_serializes() {
    let mut engine = fixture();
    let state = select(&mut engine, 0);
    let json = serde_json::to_string(&state).unwrap();
    let back: State = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
}
