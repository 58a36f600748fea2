//! Attached text documents.
//!
//! Every thought owns one document, addressed by the thought's id. Documents
//! are independent of graph topology; the engine only touches them on rename
//! and delete.

pub mod file;

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::model::ThoughtId;
use crate::Result;

pub use file::FileTextStore;

/// Document storage contract.
pub trait TextStore: Send + Sync {
    /// The document for `id`, or an empty string if none was ever saved.
    fn get_text(&self, id: ThoughtId) -> Result<String>;

    /// Replace the document for `id`.
    fn save_text(&self, id: ThoughtId, text: &str) -> Result<()>;

    /// Remove the document for `id`. Missing documents are not an error.
    fn delete_text(&self, id: ThoughtId) -> Result<()>;

    /// Called before a thought is renamed. A failure aborts the rename.
    ///
    /// Default: documents are keyed by id only, nothing to do.
    fn rename_text(&self, _id: ThoughtId, _old_name: &str, _new_name: &str) -> Result<()> {
        Ok(())
    }
}

impl<T: TextStore + ?Sized> TextStore for Box<T> {
    fn get_text(&self, id: ThoughtId) -> Result<String> { (**self).get_text(id) }
    fn save_text(&self, id: ThoughtId, text: &str) -> Result<()> { (**self).save_text(id, text) }
    fn delete_text(&self, id: ThoughtId) -> Result<()> { (**self).delete_text(id) }
    fn rename_text(&self, id: ThoughtId, old_name: &str, new_name: &str) -> Result<()> {
        (**self).rename_text(id, old_name, new_name)
    }
}

/// Documents held in a map.
#[derive(Default)]
pub struct MemoryTextStore {
    docs: RwLock<HashMap<ThoughtId, String>>,
}

impl MemoryTextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

impl TextStore for MemoryTextStore {
    fn get_text(&self, id: ThoughtId) -> Result<String> {
        Ok(self.docs.read().get(&id).cloned().unwrap_or_default())
    }

    fn save_text(&self, id: ThoughtId, text: &str) -> Result<()> {
        self.docs.write().insert(id, text.to_string());
        Ok(())
    }

    fn delete_text(&self, id: ThoughtId) -> Result<()> {
        self.docs.write().remove(&id);
        Ok(())
    }
}
