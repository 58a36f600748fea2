//! End-to-end tests against SqliteStore: the same view semantics as the
//! in-memory store, plus durability across reopen and transactional rollback.

#![cfg(feature = "sqlite")]

use pretty_assertions::assert_eq;
use thoughtweb::export::{import_snapshot, read_snapshot, write_snapshot};
use thoughtweb::{
    open_store, ConnectionRecord, ConnectionType, EngineConfig, Error, GraphEngine, IdStrategy,
    MemoryTextStore, SequentialIds, SqliteStore, Store, StoreConfig, ThoughtId,
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

fn load_fixture(store: &SqliteStore) {
    for (id, name) in [
        (0, "Brain"),
        (1, "Parent 1"),
        (2, "Parent 2"),
        (3, "Sibling"),
        (4, "Link 1"),
        (5, "Link 2"),
    ] {
        store.insert_thought(t(id), name).unwrap();
    }
    for (a, b, kind) in [
        (0, 4, Link),
        (0, 5, Link),
        (1, 0, Child),
        (1, 3, Child),
        (1, 4, Child),
        (2, 0, Child),
        (2, 5, Link),
    ] {
        store.insert_connection(t(a), t(b), kind).unwrap();
    }
}

fn engine(store: SqliteStore) -> GraphEngine<SqliteStore> {
    GraphEngine::with_id_generator(store, MemoryTextStore::new(), Box::new(SequentialIds::default()))
        .unwrap()
}

// ============================================================================
// 1. Fixture on SQLite
// ============================================================================

#[test]
fn test_fixture_on_sqlite() {
    let store = SqliteStore::open_in_memory().unwrap();
    load_fixture(&store);
    let mut e = engine(store);

    let state = e.select(t(0)).unwrap();
    assert_eq!(sorted(&state.center.links), vec![4, 5]);
    assert_eq!(sorted(&state.center.parents), vec![1, 2]);
    assert_eq!(sorted(&state.neighborhood[&t(1)].children), vec![0, 3, 4]);
    assert_eq!(sorted(&state.neighborhood[&t(2)].children), vec![0]);
    assert_eq!(sorted(&state.neighborhood[&t(2)].links), vec![5]);

    let state = e.select(t(4)).unwrap();
    assert_eq!(sorted(&state.center.parents), vec![1]);
    assert_eq!(sorted(&state.center.links), vec![0]);
}

#[test]
fn test_sqlite_and_memory_agree() {
    let sqlite = SqliteStore::open_in_memory().unwrap();
    load_fixture(&sqlite);

    let mut buf = Vec::new();
    write_snapshot(&sqlite, &mut buf).unwrap();
    let memory = thoughtweb::MemoryStore::new();
    import_snapshot(&memory, &read_snapshot(&mut buf.as_slice()).unwrap()).unwrap();

    let mut a = engine(sqlite);
    let mut b = GraphEngine::with_id_generator(
        memory,
        MemoryTextStore::new(),
        Box::new(SequentialIds::default()),
    )
    .unwrap();
    for root in 0..6 {
        assert_eq!(a.select(t(root)).unwrap(), b.select(t(root)).unwrap(), "root {root}");
    }
}

// ============================================================================
// 2. Durability
// ============================================================================

#[test]
fn test_reopen_keeps_graph_and_continues_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("brain.sqlite");
    let config = EngineConfig { id_strategy: IdStrategy::Sequential { start: 1 } };

    let (root, child) = {
        let mut e = GraphEngine::new(SqliteStore::open(&path).unwrap(), MemoryTextStore::new(), &config)
            .unwrap();
        let root = e.create_detached_thought("Brain").unwrap();
        let child = e.create_thought(root, Child, false, "Idea").unwrap();
        (root, child)
    };

    let mut e = GraphEngine::new(SqliteStore::open(&path).unwrap(), MemoryTextStore::new(), &config)
        .unwrap();
    let state = e.select(root).unwrap();
    assert_eq!(state.center.name, "Brain");
    assert_eq!(state.center.children.as_slice(), &[child]);

    let next = e.create_detached_thought("Later").unwrap();
    assert!(next > child);
}

#[test]
fn test_open_store_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::Sqlite { path: dir.path().join("x.sqlite") };
    let store = open_store(&config).unwrap();
    store.insert_thought(t(1), "boxed").unwrap();
    assert_eq!(store.thought_count().unwrap(), 1);

    let mut e = engine_boxed(store);
    assert_eq!(e.select(t(1)).unwrap().center.name, "boxed");
}

fn engine_boxed(store: Box<dyn Store>) -> GraphEngine<Box<dyn Store>> {
    GraphEngine::with_id_generator(store, MemoryTextStore::new(), Box::new(SequentialIds::default()))
        .unwrap()
}

// ============================================================================
// 3. Transactions
// ============================================================================

#[test]
fn test_failed_create_rolls_back_on_sqlite() {
    let store = SqliteStore::open_in_memory().unwrap();
    load_fixture(&store);
    let mut e = engine(store);
    e.select(t(0)).unwrap();

    let err = e.create_thought(t(99), Child, false, "Orphan").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(e.search("orphan").unwrap().is_empty());
    assert_eq!(e.store().thought_count().unwrap(), 6);
}

#[test]
fn test_connect_replaces_on_sqlite() {
    let store = SqliteStore::open_in_memory().unwrap();
    load_fixture(&store);
    let mut e = engine(store);
    e.select(t(0)).unwrap();

    e.connect_thoughts(t(0), t(4), Child).unwrap();
    assert_eq!(
        e.store().connection_between(t(4), t(0)).unwrap(),
        Some(ConnectionRecord::new(t(0), t(4), Child))
    );
    let state = e.state().unwrap();
    assert_eq!(sorted(&state.center.links), vec![5]);
    assert_eq!(sorted(&state.center.children), vec![4]);
}

#[test]
fn test_tx_misuse_rejected() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tx = store.begin_tx().unwrap();
    assert!(matches!(store.begin_tx(), Err(Error::TxError(_))));
    store.rollback_tx(tx).unwrap();
    assert!(matches!(store.commit_tx(tx), Err(Error::TxError(_))));
}

#[test]
fn test_delete_cascade_on_sqlite() {
    let store = SqliteStore::open_in_memory().unwrap();
    load_fixture(&store);
    let mut e = engine(store);
    e.select(t(0)).unwrap();

    e.delete_thought(t(1)).unwrap();
    let state = e.state().unwrap();
    assert_eq!(sorted(&state.center.parents), vec![2]);
    assert!(!state.contains(t(3)));
    assert_eq!(e.store().connection_count().unwrap(), 4);
}
