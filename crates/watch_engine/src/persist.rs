use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use watch_core::SeenSet;
use watch_logging::{watch_info, watch_warn};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("path has no file name: {0:?}")]
    NoFileName(PathBuf),
    #[error("failed to encode seen ids: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Loads and stores the set of already announced listing ids.
pub trait SeenStore: Send + Sync {
    /// Never fails; unreadable state yields an empty set.
    fn load(&self) -> SeenSet;
    fn save(&self, seen: &SeenSet) -> Result<(), PersistError>;
}

/// Seen ids kept as a flat JSON array of strings.
#[derive(Debug, Clone)]
pub struct JsonSeenStore {
    path: PathBuf,
}

impl JsonSeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_load(&self) -> Result<SeenSet, String> {
        let content = fs::read_to_string(&self.path).map_err(|err| err.to_string())?;
        let ids: Vec<String> = serde_json::from_str(&content).map_err(|err| err.to_string())?;
        Ok(ids.into_iter().collect())
    }
}

impl SeenStore for JsonSeenStore {
    fn load(&self) -> SeenSet {
        match self.try_load() {
            Ok(seen) => {
                watch_info!("Loaded {} seen ads from {:?}", seen.len(), self.path);
                seen
            }
            Err(err) => {
                watch_warn!("Could not load seen ads ({}). Starting fresh.", err);
                SeenSet::new()
            }
        }
    }

    fn save(&self, seen: &SeenSet) -> Result<(), PersistError> {
        let ids: Vec<&str> = seen.iter().collect();
        let content = serde_json::to_string(&ids)?;
        AtomicFileWriter::write(&self.path, &content)?;
        watch_info!("Saved {} seen ads to {:?}", seen.len(), self.path);
        Ok(())
    }
}

/// Writes a file by filling a temp file next to it and renaming it into
/// place, so readers see either the old or the new content.
pub struct AtomicFileWriter;

impl AtomicFileWriter {
    pub fn write(target: &Path, content: &str) -> Result<(), PersistError> {
        if target.file_name().is_none() {
            return Err(PersistError::NoFileName(target.to_path_buf()));
        }
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(target).map_err(|e| PersistError::Io(e.error))?;
        Ok(())
    }
}
