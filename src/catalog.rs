//! Brain catalog: named notebooks on disk.
//!
//! ```text
//! <root>/
//!   <brain name>/
//!     brain.sqlite      thoughts + connections (SqliteStore)
//!     texts/<id>.md     documents (FileTextStore)
//! ```
//!
//! Names are directory names, so they must be non-empty and free of path
//! separators. Two brains never share a name.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::CatalogConfig;
use crate::engine::GraphEngine;
use crate::storage::{SqliteStore, Store};
use crate::text::FileTextStore;
use crate::{Error, Result};

const DB_FILE: &str = "brain.sqlite";
const TEXT_DIR: &str = "texts";

/// A durable notebook: SQLite store plus a directory of documents.
pub type Brain = GraphEngine<SqliteStore, FileTextStore>;

/// Directory of brains.
#[derive(Debug, Clone)]
pub struct Catalog {
    config: CatalogConfig,
}

impl Catalog {
    /// Use `config.root`, creating it if needed.
    pub fn open(config: CatalogConfig) -> Result<Self> {
        fs::create_dir_all(&config.root)?;
        Ok(Self { config })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    fn brain_dir(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.config.root.join(name))
    }

    /// True if a brain called `name` exists.
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.brain_dir(name)?.join(DB_FILE).is_file())
    }

    /// Names of all brains, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config.root)? {
            let entry = entry?;
            if !entry.path().join(DB_FILE).is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => warn!(?raw, "skipping brain directory with a non UTF-8 name"),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Create a brain whose first thought carries the brain's name, and
    /// return it with that thought selected.
    pub fn create(&self, name: &str) -> Result<Brain> {
        let dir = self.brain_dir(name)?;
        if dir.exists() {
            return Err(Error::Duplicate(format!("Brain '{name}' already exists")));
        }
        fs::create_dir_all(&dir)?;

        let built: Result<Brain> = (|| {
            let mut brain = self.load(&dir)?;
            let root = brain.create_detached_thought(name)?;
            brain.select(root)?;
            Ok(brain)
        })();

        match built {
            Ok(brain) => {
                info!(name, "created brain");
                Ok(brain)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&dir) {
                    warn!(name, error = %cleanup, "could not remove half-created brain");
                }
                Err(e)
            }
        }
    }

    /// Open an existing brain with its lowest-id thought selected.
    pub fn open_brain(&self, name: &str) -> Result<Brain> {
        if !self.exists(name)? {
            return Err(Error::NotFound(format!("Brain '{name}'")));
        }
        let mut brain = self.load(&self.brain_dir(name)?)?;
        let first = brain.store().list_thoughts()?.into_iter().map(|t| t.id).min();
        if let Some(root) = first {
            brain.select(root)?;
        }
        info!(name, "opened brain");
        Ok(brain)
    }

    /// Rename a brain. Its thoughts keep their names.
    pub fn rename(&self, old: &str, new: &str) -> Result<()> {
        if !self.exists(old)? {
            return Err(Error::NotFound(format!("Brain '{old}'")));
        }
        let target = self.brain_dir(new)?;
        if target.exists() {
            return Err(Error::Duplicate(format!("Brain '{new}' already exists")));
        }
        fs::rename(self.brain_dir(old)?, target)?;
        info!(old, new, "renamed brain");
        Ok(())
    }

    /// Delete a brain with all of its documents.
    pub fn delete(&self, name: &str) -> Result<()> {
        if !self.exists(name)? {
            return Err(Error::NotFound(format!("Brain '{name}'")));
        }
        fs::remove_dir_all(self.brain_dir(name)?)?;
        info!(name, "deleted brain");
        Ok(())
    }

    fn load(&self, dir: &Path) -> Result<Brain> {
        let store = SqliteStore::open(dir.join(DB_FILE))?;
        let texts = FileTextStore::open(dir.join(TEXT_DIR))?;
        GraphEngine::new(store, texts, &self.config.engine)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.starts_with('.')
        || name.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
    if bad {
        return Err(Error::InvalidArgument(format!("'{name}' is not a usable brain name")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Work").is_ok());
        assert!(validate_name("My Brain 2").is_ok());
        for bad in ["", ".", "..", ".hidden", "a/b", "a\\b", "nul\0"] {
            assert!(matches!(validate_name(bad), Err(Error::InvalidArgument(_))), "{bad:?}");
        }
    }

    #[test]
    fn test_list_ignores_stray_directories() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::open(CatalogConfig::new(dir.path())).unwrap();
        fs::create_dir_all(dir.path().join("not-a-brain")).unwrap();
        catalog.create("Real").unwrap();
        assert_eq!(catalog.list().unwrap(), vec!["Real".to_string()]);
    }
}
