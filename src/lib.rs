//! # thoughtweb: Graph View Engine for a Knowledge-Graph Notebook
//!
//! Thoughts are named nodes with an attached document. They are joined by
//! connections: `Child` (directed parent → child) or `Link` (symmetric).
//! Between two thoughts there is never more than one connection.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `Store` is the contract between engine and persistence
//! 2. **Clean DTOs**: `ThoughtRecord`, `ConnectionRecord`, `ViewNode`, `State` cross all boundaries
//! 3. **Rebuild, don't patch**: every select and mutation materializes a fresh `State`
//! 4. **All or nothing**: a failed operation leaves store and view untouched
//!
//! ## Quick Start
//!
//! ```rust
//! use thoughtweb::{ConnectionType, GraphEngine};
//!
//! # fn example() -> thoughtweb::Result<()> {
//! let mut brain = GraphEngine::open_memory()?;
//! let root = brain.create_detached_thought("Brain")?;
//! brain.select(root)?;
//!
//! let idea = brain.create_thought(root, ConnectionType::Child, false, "Idea")?;
//! let state = brain.state().expect("root is selected");
//! assert_eq!(state.center.children.as_slice(), &[idea]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Stores
//!
//! | Store | Feature | Description |
//! |-------|---------|-------------|
//! | `MemoryStore` | (always) | In-memory tables for testing/embedding |
//! | `SqliteStore` | `sqlite` (default) | Durable relational tables |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod storage;
pub mod text;
pub mod tx;
pub mod ids;
pub mod config;
pub mod engine;
pub mod export;
#[cfg(feature = "sqlite")]
pub mod catalog;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    ThoughtId, ThoughtRecord, ConnectionType, ConnectionRecord, ConnectionFilter,
    ViewNode, State, NeighborList,
};

// ============================================================================
// Re-exports: Storage, text, engine
// ============================================================================

pub use storage::{Store, StoreConfig, MemoryStore, open_store};
#[cfg(feature = "sqlite")]
pub use storage::SqliteStore;
pub use text::{TextStore, MemoryTextStore, FileTextStore};
pub use tx::TxId;
pub use ids::{IdGenerator, ClockIds, SequentialIds};
pub use config::{EngineConfig, IdStrategy, CatalogConfig};
pub use engine::{GraphEngine, Tier};
pub use export::BrainSnapshot;
#[cfg(feature = "sqlite")]
pub use catalog::{Catalog, Brain};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Transaction error: {0}")]
    TxError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::StorageError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
