//! Graph engine: the single owner of the current view.
//!
//! Every operation runs to completion before returning:
//!
//! ```text
//! begin_tx → mutate store → materialize(root) → commit_tx → install State
//!                  └────────── any error ──────────► rollback_tx, keep old State
//! ```
//!
//! The engine is single-threaded by design of its callers: one logical
//! caller drives one `GraphEngine` at a time.

pub mod materialize;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::ids::IdGenerator;
use crate::model::*;
use crate::storage::{MemoryStore, Store};
use crate::text::{MemoryTextStore, TextStore};
use crate::{Error, Result};

pub use materialize::{materialize, Tier};

/// Drives a store and a text store, and holds the materialized `State`.
pub struct GraphEngine<S: Store, T: TextStore = MemoryTextStore> {
    store: S,
    texts: T,
    ids: Box<dyn IdGenerator>,
    root: Option<ThoughtId>,
    state: Option<State>,
}

impl<S: Store, T: TextStore> GraphEngine<S, T> {
    /// Create an engine over `store` and `texts`. No root is selected yet.
    pub fn new(store: S, texts: T, config: &EngineConfig) -> Result<Self> {
        Self::with_id_generator(store, texts, config.id_strategy.generator())
    }

    /// Create an engine with an explicit id source.
    ///
    /// The generator is seeded with the highest id already in the store.
    pub fn with_id_generator(store: S, texts: T, mut ids: Box<dyn IdGenerator>) -> Result<Self> {
        if let Some(highest) = store.list_thoughts()?.iter().map(|t| t.id).max() {
            ids.seed(highest);
        }
        Ok(Self { store, texts, ids, root: None, state: None })
    }

    /// Access the underlying store (for advanced use).
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn texts(&self) -> &T {
        &self.texts
    }

    /// Currently selected root, if any.
    pub fn root(&self) -> Option<ThoughtId> {
        self.root
    }

    /// The current view. `None` until the first `select`, and after the
    /// root thought itself was deleted.
    pub fn state(&self) -> Option<&State> {
        self.state.as_ref()
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Focus the view on `id`. On failure the previous view stays in place.
    pub fn select(&mut self, id: ThoughtId) -> Result<&State> {
        let state = materialize(&self.store, id)?;
        self.root = Some(id);
        debug!(root = %id, "selected");
        Ok(self.state.insert(state))
    }

    /// Rebuild the view for the current root, e.g. after the store was
    /// changed behind the engine's back.
    pub fn reload(&mut self) -> Result<Option<&State>> {
        match self.root {
            Some(root) => self.select(root).map(Some),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Rename a thought (and, through the text store, its document).
    pub fn update_thought(&mut self, id: ThoughtId, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("thought name must not be empty".into()));
        }
        self.apply(self.root, "update_thought", |store, texts| {
            let current = store
                .get_thought(id)?
                .ok_or_else(|| Error::NotFound(format!("Thought {id}")))?;
            texts.rename_text(id, &current.name, name)?;
            if let Err(e) = store.rename_thought(id, name) {
                if let Err(revert) = texts.rename_text(id, name, &current.name) {
                    warn!(%id, error = %revert, "document rename could not be reverted");
                }
                return Err(e);
            }
            Ok(())
        })?;
        info!(%id, name, "renamed thought");
        Ok(())
    }

    /// Create a thought connected to `from`.
    ///
    /// With `incoming` the new connection runs `new → from`, otherwise
    /// `from → new`. Returns the new id.
    pub fn create_thought(
        &mut self,
        from: ThoughtId,
        kind: ConnectionType,
        incoming: bool,
        name: &str,
    ) -> Result<ThoughtId> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("thought name must not be empty".into()));
        }
        let id = self.ids.next_id()?;
        let (src, dst) = if incoming { (id, from) } else { (from, id) };
        self.apply(self.root, "create_thought", |store, _| {
            store.insert_thought(id, name)?;
            store.insert_connection(src, dst, kind)
        })?;
        info!(%id, %from, %kind, incoming, "created thought");
        Ok(id)
    }

    /// Create a thought with no connections, e.g. the first thought of a brain.
    pub fn create_detached_thought(&mut self, name: &str) -> Result<ThoughtId> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("thought name must not be empty".into()));
        }
        let id = self.ids.next_id()?;
        self.apply(self.root, "create_detached_thought", |store, _| store.insert_thought(id, name))?;
        info!(%id, "created detached thought");
        Ok(id)
    }

    /// Connect `a → b`, replacing whatever connection the pair had before.
    pub fn connect_thoughts(&mut self, a: ThoughtId, b: ThoughtId, kind: ConnectionType) -> Result<()> {
        if a == b {
            return Err(Error::InvalidArgument(format!("Thought {a} cannot connect to itself")));
        }
        self.apply(self.root, "connect_thoughts", |store, _| {
            store.delete_connection(a, b)?;
            store.insert_connection(a, b, kind)
        })?;
        info!(from = %a, to = %b, %kind, "connected thoughts");
        Ok(())
    }

    /// Remove the connection between `a` and `b`. Returns false, without
    /// touching the view, if there was none.
    pub fn disconnect_thoughts(&mut self, a: ThoughtId, b: ThoughtId) -> Result<bool> {
        if self.store.connection_between(a, b)?.is_none() {
            return Ok(false);
        }
        let removed = self.apply(self.root, "disconnect_thoughts", |store, _| store.delete_connection(a, b))?;
        info!(%a, %b, "disconnected thoughts");
        Ok(removed)
    }

    /// Delete a thought, every connection touching it, and its document.
    ///
    /// If it was the root, the engine is left without a view and the caller
    /// must `select` again.
    ///
    /// Unlike `update_thought`, a text store failure does not fail the call:
    /// the document is removed after the store commit, so by then the thought
    /// is gone for good. The failure is logged and the document is left
    /// orphaned.
    pub fn delete_thought(&mut self, id: ThoughtId) -> Result<()> {
        if self.store.get_thought(id)?.is_none() {
            return Err(Error::NotFound(format!("Thought {id}")));
        }
        let next_root = self.root.filter(|&root| root != id);
        self.apply(next_root, "delete_thought", |store, _| store.detach_delete_thought(id).map(|_| ()))?;

        // The store change is committed; a stale document is only clutter.
        if let Err(e) = self.texts.delete_text(id) {
            warn!(%id, error = %e, "thought deleted but its document was not");
        }
        info!(%id, root_cleared = next_root.is_none(), "deleted thought");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Thoughts whose name contains `term`, ignoring case. Unranked.
    pub fn search(&self, term: &str) -> Result<Vec<ThoughtRecord>> {
        self.store.search_thoughts(term)
    }

    /// The document attached to `id`.
    pub fn text(&self, id: ThoughtId) -> Result<String> {
        self.require(id)?;
        self.texts.get_text(id)
    }

    /// Replace the document attached to `id`.
    pub fn save_text(&self, id: ThoughtId, text: &str) -> Result<()> {
        self.require(id)?;
        self.texts.save_text(id, text)
    }

    fn require(&self, id: ThoughtId) -> Result<ThoughtRecord> {
        self.store
            .get_thought(id)?
            .ok_or_else(|| Error::NotFound(format!("Thought {id}")))
    }

    // ========================================================================
    // Transaction plumbing
    // ========================================================================

    /// Run `mutate`, rebuild the view for `next_root`, and commit; or roll
    /// everything back and leave the engine as it was.
    fn apply<R>(
        &mut self,
        next_root: Option<ThoughtId>,
        op: &'static str,
        mutate: impl FnOnce(&S, &T) -> Result<R>,
    ) -> Result<R> {
        let tx = self.store.begin_tx()?;

        let outcome = mutate(&self.store, &self.texts).and_then(|value| {
            let state = next_root.map(|root| materialize(&self.store, root)).transpose()?;
            Ok((value, state))
        });

        let (value, state) = match outcome {
            Ok(done) => done,
            Err(err) => {
                warn!(op, error = %err, "rolling back");
                if let Err(rb) = self.store.rollback_tx(tx) {
                    warn!(op, error = %rb, "rollback failed");
                }
                return Err(err);
            }
        };

        if let Err(err) = self.store.commit_tx(tx) {
            warn!(op, error = %err, "commit failed, rolling back");
            if let Err(rb) = self.store.rollback_tx(tx) {
                warn!(op, error = %rb, "rollback failed");
            }
            return Err(err);
        }

        self.root = next_root;
        self.state = state;
        debug!(op, "committed");
        Ok(value)
    }
}

/// In-memory engine for testing and embedding.
impl GraphEngine<MemoryStore, MemoryTextStore> {
    pub fn open_memory() -> Result<Self> {
        Self::new(MemoryStore::new(), MemoryTextStore::new(), &EngineConfig::default())
    }
}
