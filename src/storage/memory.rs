//! In-memory store.
//!
//! This is the reference implementation of `Store`: a thought map plus a
//! connection vector behind one `RwLock`.
//!
//! ## Transactions
//!
//! `begin_tx()` snapshots both tables; `rollback_tx()` restores the snapshot,
//! `commit_tx()` drops it. Only one transaction may be open at a time.
//!
//! Use this store for:
//! - Testing the engine and the view materialization
//! - Embedding the notebook in applications that don't need persistence
//! - Scratch brains that get exported with `export::write_snapshot`

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::{Mutex, RwLock};

use crate::model::*;
use crate::tx::TxId;
use crate::{Error, Result};
use super::Store;

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory notebook storage.
///
/// Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    tables: RwLock<Tables>,
    /// Snapshot taken by the open transaction, if any.
    open_tx: Mutex<Option<(TxId, Tables)>>,
    next_tx_id: AtomicU64,
}

#[derive(Clone, Default)]
struct Tables {
    thoughts: HashMap<ThoughtId, ThoughtRecord>,
    /// Insertion order is the enumeration order.
    connections: Vec<ConnectionRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw records, bypassing the engine.
    ///
    /// Connections are checked the same way `insert_connection` checks them.
    pub fn with_records(
        thoughts: impl IntoIterator<Item = ThoughtRecord>,
        connections: impl IntoIterator<Item = ConnectionRecord>,
    ) -> Result<Self> {
        let store = Self::new();
        for t in thoughts {
            store.insert_thought(t.id, &t.name)?;
        }
        for c in connections {
            store.insert_connection(c.from, c.to, c.kind)?;
        }
        Ok(store)
    }
}

// ============================================================================
// Store impl
// ============================================================================

impl Store for MemoryStore {
    fn begin_tx(&self) -> Result<TxId> {
        let mut open = self.inner.open_tx.lock();
        if let Some((id, _)) = open.as_ref() {
            return Err(Error::TxError(format!("{id} is still open")));
        }
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed) + 1);
        *open = Some((id, self.inner.tables.read().clone()));
        Ok(id)
    }

    fn commit_tx(&self, tx: TxId) -> Result<()> {
        let mut open = self.inner.open_tx.lock();
        match open.take() {
            Some((id, _)) if id == tx => Ok(()),
            other => {
                let msg = format!("commit of {tx} which is not the open transaction");
                *open = other;
                Err(Error::TxError(msg))
            }
        }
    }

    fn rollback_tx(&self, tx: TxId) -> Result<()> {
        let mut open = self.inner.open_tx.lock();
        match open.take() {
            Some((id, snapshot)) if id == tx => {
                *self.inner.tables.write() = snapshot;
                Ok(())
            }
            other => {
                let msg = format!("rollback of {tx} which is not the open transaction");
                *open = other;
                Err(Error::TxError(msg))
            }
        }
    }

    // ========================================================================
    // Thought CRUD
    // ========================================================================

    fn get_thought(&self, id: ThoughtId) -> Result<Option<ThoughtRecord>> {
        Ok(self.inner.tables.read().thoughts.get(&id).cloned())
    }

    fn insert_thought(&self, id: ThoughtId, name: &str) -> Result<()> {
        if !id.is_valid() {
            return Err(Error::InvalidArgument("cannot store the invalid thought id".into()));
        }
        let mut tables = self.inner.tables.write();
        if tables.thoughts.contains_key(&id) {
            return Err(Error::StorageError(format!("Thought {id} already exists")));
        }
        tables.thoughts.insert(id, ThoughtRecord::new(id, name));
        Ok(())
    }

    fn rename_thought(&self, id: ThoughtId, name: &str) -> Result<()> {
        let mut tables = self.inner.tables.write();
        let thought = tables.thoughts.get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Thought {id}")))?;
        thought.name = name.to_string();
        Ok(())
    }

    fn delete_thought(&self, id: ThoughtId) -> Result<bool> {
        Ok(self.inner.tables.write().thoughts.remove(&id).is_some())
    }

    fn list_thoughts(&self) -> Result<Vec<ThoughtRecord>> {
        let mut all: Vec<ThoughtRecord> = self.inner.tables.read().thoughts.values().cloned().collect();
        all.sort_by_key(|t| t.id);
        Ok(all)
    }

    // ========================================================================
    // Connection CRUD
    // ========================================================================

    fn get_connections(&self, filter: ConnectionFilter) -> Result<Vec<ConnectionRecord>> {
        Ok(self.inner.tables.read().connections.iter()
            .filter(|c| filter.matches(c))
            .copied()
            .collect())
    }

    fn insert_connection(&self, from: ThoughtId, to: ThoughtId, kind: ConnectionType) -> Result<()> {
        if from == to {
            return Err(Error::InvalidArgument(format!("Thought {from} cannot connect to itself")));
        }
        let mut tables = self.inner.tables.write();
        if !tables.thoughts.contains_key(&from) {
            return Err(Error::NotFound(format!("Source thought {from}")));
        }
        if !tables.thoughts.contains_key(&to) {
            return Err(Error::NotFound(format!("Target thought {to}")));
        }
        tables.connections.push(ConnectionRecord::new(from, to, kind));
        Ok(())
    }

    fn delete_connection(&self, a: ThoughtId, b: ThoughtId) -> Result<bool> {
        let mut tables = self.inner.tables.write();
        let before = tables.connections.len();
        tables.connections.retain(|c| !c.joins(a, b));
        Ok(tables.connections.len() != before)
    }

    fn detach_delete_thought(&self, id: ThoughtId) -> Result<bool> {
        let mut tables = self.inner.tables.write();
        tables.connections.retain(|c| !c.touches(id));
        Ok(tables.thoughts.remove(&id).is_some())
    }

    fn thought_count(&self) -> Result<u64> {
        Ok(self.inner.tables.read().thoughts.len() as u64)
    }

    fn connection_count(&self) -> Result<u64> {
        Ok(self.inner.tables.read().connections.len() as u64)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(ids: &[u64]) -> MemoryStore {
        let db = MemoryStore::new();
        for &id in ids {
            db.insert_thought(ThoughtId(id), &format!("T{id}")).unwrap();
        }
        db
    }

    #[test]
    fn test_insert_and_get_thought() {
        let db = MemoryStore::new();
        db.insert_thought(ThoughtId(7), "Ada").unwrap();

        let t = db.get_thought(ThoughtId(7)).unwrap().unwrap();
        assert_eq!(t.name, "Ada");
        assert!(db.get_thought(ThoughtId(8)).unwrap().is_none());
    }

    #[test]
    fn test_insert_rejects_taken_and_invalid_ids() {
        let db = store_with(&[1]);
        assert!(matches!(db.insert_thought(ThoughtId(1), "again"), Err(Error::StorageError(_))));
        assert!(matches!(db.insert_thought(ThoughtId::INVALID, "x"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_rename_missing_thought() {
        let db = MemoryStore::new();
        assert!(matches!(db.rename_thought(ThoughtId(1), "x"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_connection_checks_endpoints() {
        let db = store_with(&[1, 2]);
        assert!(matches!(
            db.insert_connection(ThoughtId(1), ThoughtId(1), ConnectionType::Link),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            db.insert_connection(ThoughtId(1), ThoughtId(3), ConnectionType::Child),
            Err(Error::NotFound(_))
        ));
        db.insert_connection(ThoughtId(1), ThoughtId(2), ConnectionType::Child).unwrap();
        assert_eq!(db.connection_count().unwrap(), 1);
    }

    #[test]
    fn test_delete_connection_either_direction() {
        let db = store_with(&[1, 2, 3]);
        db.insert_connection(ThoughtId(1), ThoughtId(2), ConnectionType::Child).unwrap();
        db.insert_connection(ThoughtId(3), ThoughtId(1), ConnectionType::Link).unwrap();

        assert!(db.delete_connection(ThoughtId(2), ThoughtId(1)).unwrap());
        assert!(!db.delete_connection(ThoughtId(2), ThoughtId(1)).unwrap());
        assert_eq!(
            db.connection_between(ThoughtId(1), ThoughtId(3)).unwrap(),
            Some(ConnectionRecord::new(ThoughtId(3), ThoughtId(1), ConnectionType::Link))
        );
    }

    #[test]
    fn test_detach_delete_thought() {
        let db = store_with(&[1, 2, 3]);
        db.insert_connection(ThoughtId(1), ThoughtId(2), ConnectionType::Child).unwrap();
        db.insert_connection(ThoughtId(3), ThoughtId(1), ConnectionType::Link).unwrap();
        db.insert_connection(ThoughtId(2), ThoughtId(3), ConnectionType::Link).unwrap();

        assert!(db.detach_delete_thought(ThoughtId(1)).unwrap());
        assert!(db.get_thought(ThoughtId(1)).unwrap().is_none());
        assert!(db.get_connections(ConnectionFilter::Touching(ThoughtId(1))).unwrap().is_empty());
        assert_eq!(db.connection_count().unwrap(), 1);
    }

    #[test]
    fn test_rollback_restores_tables() {
        let db = store_with(&[1, 2]);
        let tx = db.begin_tx().unwrap();
        db.insert_thought(ThoughtId(3), "temp").unwrap();
        db.insert_connection(ThoughtId(1), ThoughtId(3), ConnectionType::Child).unwrap();
        db.rename_thought(ThoughtId(1), "renamed").unwrap();
        db.rollback_tx(tx).unwrap();

        assert!(db.get_thought(ThoughtId(3)).unwrap().is_none());
        assert_eq!(db.get_thought(ThoughtId(1)).unwrap().unwrap().name, "T1");
        assert_eq!(db.connection_count().unwrap(), 0);
    }

    #[test]
    fn test_commit_keeps_writes() {
        let db = store_with(&[1]);
        let tx = db.begin_tx().unwrap();
        db.insert_thought(ThoughtId(2), "kept").unwrap();
        db.commit_tx(tx).unwrap();
        assert_eq!(db.thought_count().unwrap(), 2);
    }

    #[test]
    fn test_nested_and_foreign_tx_rejected() {
        let db = MemoryStore::new();
        let tx = db.begin_tx().unwrap();
        assert!(matches!(db.begin_tx(), Err(Error::TxError(_))));
        assert!(matches!(db.commit_tx(TxId(9999)), Err(Error::TxError(_))));
        // The real transaction is still open and can be committed.
        db.commit_tx(tx).unwrap();
        assert!(db.begin_tx().is_ok());
    }

    #[test]
    fn test_list_and_search() {
        let db = MemoryStore::new();
        db.insert_thought(ThoughtId(2), "Rust Book").unwrap();
        db.insert_thought(ThoughtId(1), "rusty nail").unwrap();
        db.insert_thought(ThoughtId(3), "Go").unwrap();

        let ids: Vec<_> = db.list_thoughts().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![ThoughtId(1), ThoughtId(2), ThoughtId(3)]);

        let hits = db.search_thoughts("RUST").unwrap();
        assert_eq!(hits.len(), 2);
    }
}
