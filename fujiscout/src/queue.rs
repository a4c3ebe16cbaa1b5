//! Persisted queue of folders still to be scanned.
//!
//! The queue lives in a plain text file, one folder per line in scan order,
//! with `/` as the separator. A missing file is an empty queue. Every change
//! rewrites the whole file through a temporary file in the same directory and
//! an atomic rename, so a crash leaves either the old or the new queue on disk.
//!
//! The engine only ever removes a folder after scanning it completely
//! ([`WorkQueue::commit_front`]), so a run that is cancelled or crashes
//! resumes at the folder it was working on.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::errors::{ScanError, ScanResult};

/// What a fresh queue is seeded with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedMode {
    /// Every immediate subfolder of the root
    #[default]
    Subfolders,
    /// The root folder alone
    Folder,
}

/// A work queue backed by a text file
#[derive(Debug, Clone)]
pub struct WorkQueue {
    path: PathBuf,
}

impl WorkQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a persisted queue exists on disk
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replaces any existing queue with the folders to scan under `root`.
    ///
    /// Subfolders are sorted by name so that the scan order does not depend on
    /// the platform's directory listing order. Returns the number of folders
    /// queued.
    pub fn seed(&self, root: &Path, mode: SeedMode) -> ScanResult<usize> {
        let folders = match mode {
            SeedMode::Folder => vec![root.to_path_buf()],
            SeedMode::Subfolders => list_subfolders(root)?,
        };

        self.write_items(&folders)?;
        info!(
            "Seeded work queue {} with {} folder(s) from {}",
            self.path.display(),
            folders.len(),
            root.display()
        );
        Ok(folders.len())
    }

    /// Reads every queued folder, in order
    pub fn items(&self) -> ScanResult<Vec<PathBuf>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ScanError::persistence(&self.path, e)),
        };

        Ok(content
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(PathBuf::from)
            .collect())
    }

    /// Returns the first queued folder without removing it
    pub fn peek_front(&self) -> ScanResult<Option<PathBuf>> {
        Ok(self.items()?.into_iter().next())
    }

    /// Removes the first queued folder and persists the rest.
    ///
    /// Returns the removed folder, or `None` if the queue was already empty.
    pub fn commit_front(&self) -> ScanResult<Option<PathBuf>> {
        let mut items = self.items()?;
        if items.is_empty() {
            return Ok(None);
        }
        let front = items.remove(0);
        self.write_items(&items)?;
        debug!(
            "Committed {} ({} folder(s) left)",
            front.display(),
            items.len()
        );
        Ok(Some(front))
    }

    /// Appends a folder to the end of the queue
    pub fn push_back(&self, folder: &Path) -> ScanResult<()> {
        let mut items = self.items()?;
        items.push(folder.to_path_buf());
        self.write_items(&items)
    }

    pub fn len(&self) -> ScanResult<usize> {
        Ok(self.items()?.len())
    }

    pub fn is_empty(&self) -> ScanResult<bool> {
        Ok(self.items()?.is_empty())
    }

    /// Deletes the persisted queue
    pub fn dispose(&self) -> ScanResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed work queue {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ScanError::persistence(&self.path, e)),
        }
    }

    fn write_items(&self, items: &[PathBuf]) -> ScanResult<()> {
        let persist_err = |e: io::Error| ScanError::persistence(&self.path, e);

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(persist_err)?;
                parent.to_path_buf()
            }
            _ => PathBuf::from("."),
        };

        // Write to a temporary file first
        let mut tmp = NamedTempFile::new_in(&dir).map_err(persist_err)?;
        {
            let file = tmp.as_file_mut();
            for item in items {
                writeln!(file, "{}", normalize_separators(item)).map_err(persist_err)?;
            }
            file.sync_all().map_err(persist_err)?;
        }

        // Atomically rename the temporary file
        tmp.persist(&self.path).map_err(|e| persist_err(e.error))?;
        Ok(())
    }
}

/// Renders a path with forward slashes
pub fn normalize_separators(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn list_subfolders(root: &Path) -> ScanResult<Vec<PathBuf>> {
    let entries = fs::read_dir(root).map_err(|e| ScanError::file_access(root, e))?;

    let mut folders = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) if entry.path().is_dir() => folders.push(entry.path()),
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry in {}: {}", root.display(), e),
        }
    }
    folders.sort();
    Ok(folders)
}
