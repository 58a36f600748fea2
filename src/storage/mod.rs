//! # Store Trait
//!
//! This is THE contract between the graph engine and any persistence layer.
//! The engine never knows which backend it is talking to.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryStore` | `memory` | In-memory tables, snapshot rollback |
//! | `SqliteStore` | `sqlite` | Durable relational tables (feature `sqlite`) |

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::tx::TxId;
use crate::Result;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

// ============================================================================
// Store Configuration
// ============================================================================

/// Which store a host wants to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-memory (no persistence)
    Memory,

    /// SQLite database file (requires feature `sqlite`)
    Sqlite { path: PathBuf },
}

// ============================================================================
// Store Trait
// ============================================================================

/// The storage contract consumed by `GraphEngine`.
///
/// Stores are plain record keepers: they do not enforce the one-connection
/// per pair rule (the engine does, by deleting before inserting), but they
/// do refuse self-connections and connections to unknown thoughts.
pub trait Store: Send + Sync {
    // ========================================================================
    // Transactions
    // ========================================================================

    /// Begin a transaction. Fails with `TxError` if one is already open.
    fn begin_tx(&self) -> Result<TxId>;

    /// Make every write since `begin_tx` permanent.
    fn commit_tx(&self, tx: TxId) -> Result<()>;

    /// Undo every write since `begin_tx`.
    fn rollback_tx(&self, tx: TxId) -> Result<()>;

    // ========================================================================
    // Thought CRUD
    // ========================================================================

    /// Get a thought by id. Returns `None` if not found.
    fn get_thought(&self, id: ThoughtId) -> Result<Option<ThoughtRecord>>;

    /// Insert a new thought. Fails if the id is invalid or already taken.
    fn insert_thought(&self, id: ThoughtId, name: &str) -> Result<()>;

    /// Rename a thought. Fails with `NotFound` if it does not exist.
    fn rename_thought(&self, id: ThoughtId, name: &str) -> Result<()>;

    /// Delete a thought record (connections are left alone). Returns true if it existed.
    fn delete_thought(&self, id: ThoughtId) -> Result<bool>;

    /// Every stored thought, in backend enumeration order.
    fn list_thoughts(&self) -> Result<Vec<ThoughtRecord>>;

    // ========================================================================
    // Connection CRUD
    // ========================================================================

    /// Connections selected by `filter`, in backend enumeration order.
    fn get_connections(&self, filter: ConnectionFilter) -> Result<Vec<ConnectionRecord>>;

    /// Store `from -> to` of the given type.
    fn insert_connection(&self, from: ThoughtId, to: ThoughtId, kind: ConnectionType) -> Result<()>;

    /// Remove every connection between the unordered pair `{a, b}`.
    /// Returns true if anything was removed.
    fn delete_connection(&self, a: ThoughtId, b: ThoughtId) -> Result<bool>;

    // ========================================================================
    // Derived operations (overridable)
    // ========================================================================

    /// The connection between `{a, b}`, if any.
    fn connection_between(&self, a: ThoughtId, b: ThoughtId) -> Result<Option<ConnectionRecord>> {
        Ok(self
            .get_connections(ConnectionFilter::Touching(a))?
            .into_iter()
            .find(|c| c.joins(a, b)))
    }

    /// Delete a thought and every connection touching it.
    ///
    /// Default: delete each neighbor pair, then the record.
    fn detach_delete_thought(&self, id: ThoughtId) -> Result<bool> {
        for conn in self.get_connections(ConnectionFilter::Touching(id))? {
            if let Some(other) = conn.other_end(id) {
                self.delete_connection(id, other)?;
            }
        }
        self.delete_thought(id)
    }

    /// Thoughts whose name contains `term`, ignoring case.
    ///
    /// Default scans `list_thoughts`.
    fn search_thoughts(&self, term: &str) -> Result<Vec<ThoughtRecord>> {
        Ok(self
            .list_thoughts()?
            .into_iter()
            .filter(|t| t.name_contains(term))
            .collect())
    }

    /// Total number of thoughts.
    fn thought_count(&self) -> Result<u64> {
        Ok(self.list_thoughts()?.len() as u64)
    }

    /// Total number of connections.
    fn connection_count(&self) -> Result<u64>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn begin_tx(&self) -> Result<TxId> { (**self).begin_tx() }
    fn commit_tx(&self, tx: TxId) -> Result<()> { (**self).commit_tx(tx) }
    fn rollback_tx(&self, tx: TxId) -> Result<()> { (**self).rollback_tx(tx) }
    fn get_thought(&self, id: ThoughtId) -> Result<Option<ThoughtRecord>> { (**self).get_thought(id) }
    fn insert_thought(&self, id: ThoughtId, name: &str) -> Result<()> { (**self).insert_thought(id, name) }
    fn rename_thought(&self, id: ThoughtId, name: &str) -> Result<()> { (**self).rename_thought(id, name) }
    fn delete_thought(&self, id: ThoughtId) -> Result<bool> { (**self).delete_thought(id) }
    fn list_thoughts(&self) -> Result<Vec<ThoughtRecord>> { (**self).list_thoughts() }
    fn get_connections(&self, filter: ConnectionFilter) -> Result<Vec<ConnectionRecord>> {
        (**self).get_connections(filter)
    }
    fn insert_connection(&self, from: ThoughtId, to: ThoughtId, kind: ConnectionType) -> Result<()> {
        (**self).insert_connection(from, to, kind)
    }
    fn delete_connection(&self, a: ThoughtId, b: ThoughtId) -> Result<bool> { (**self).delete_connection(a, b) }
    fn connection_between(&self, a: ThoughtId, b: ThoughtId) -> Result<Option<ConnectionRecord>> {
        (**self).connection_between(a, b)
    }
    fn detach_delete_thought(&self, id: ThoughtId) -> Result<bool> { (**self).detach_delete_thought(id) }
    fn search_thoughts(&self, term: &str) -> Result<Vec<ThoughtRecord>> { (**self).search_thoughts(term) }
    fn thought_count(&self) -> Result<u64> { (**self).thought_count() }
    fn connection_count(&self) -> Result<u64> { (**self).connection_count() }
}

/// Open the store described by `config`.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn Store>> {
    match config {
        StoreConfig::Memory => Ok(Box::new(MemoryStore::new())),
        #[cfg(feature = "sqlite")]
        StoreConfig::Sqlite { path } => Ok(Box::new(SqliteStore::open(path)?)),
        #[cfg(not(feature = "sqlite"))]
        StoreConfig::Sqlite { path } => Err(crate::Error::StorageError(format!(
            "cannot open {}: sqlite support not compiled in",
            path.display()
        ))),
    }
}
