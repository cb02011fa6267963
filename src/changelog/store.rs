use super::ChangelogDocument;
use crate::error::{ReleaseError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Reads and writes the changelog file
#[derive(Debug, Clone)]
pub struct ChangelogStore {
    path: PathBuf,
}

impl ChangelogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ChangelogStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<ChangelogDocument> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            ReleaseError::changelog(format!("Cannot read {}: {}", self.path.display(), e))
        })?;
        Ok(ChangelogDocument::parse(&text))
    }

    /// Replace the file with the rendered document
    ///
    /// The content goes to a temp file in the same directory which is then
    /// renamed over the target; on any failure the original is untouched.
    pub fn save(&self, doc: &ChangelogDocument) -> Result<()> {
        atomic_write(&self.path, doc.render().as_bytes())?;
        debug!(path = %self.path.display(), "changelog written");
        Ok(())
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
