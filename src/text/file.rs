//! Documents as files: `<dir>/<id>.md`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::model::ThoughtId;
use crate::{Error, Result};
use super::TextStore;

/// One markdown file per thought inside a directory.
///
/// Writes go to a temporary sibling file first and are renamed into place,
/// so a reader never sees a half-written document.
#[derive(Debug, Clone)]
pub struct FileTextStore {
    dir: PathBuf,
}

impl FileTextStore {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for `id`.
    pub fn path_for(&self, id: ThoughtId) -> Result<PathBuf> {
        if !id.is_valid() {
            return Err(Error::InvalidArgument("invalid thought id has no document".into()));
        }
        Ok(self.dir.join(format!("{}.md", id.0)))
    }
}

impl TextStore for FileTextStore {
    fn get_text(&self, id: ThoughtId) -> Result<String> {
        match fs::read_to_string(self.path_for(id)?) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save_text(&self, id: ThoughtId, text: &str) -> Result<()> {
        let path = self.path_for(id)?;
        let tmp = path.with_extension("md.tmp");
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(text.as_bytes())?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete_text(&self, id: ThoughtId) -> Result<()> {
        match fs::remove_file(self.path_for(id)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
