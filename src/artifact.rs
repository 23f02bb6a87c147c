//! Storage for the generated versions artifact
//!
//! The version registry persists its snapshot between build invocations so it
//! can skip regeneration when the property source has not changed. Storage is
//! abstracted behind [`ArtifactStore`] so the registry logic can be tested
//! without touching the disk.
//!
//! [`FileArtifactStore`] gives two guarantees:
//!
//! 1. **Atomic replacement**: contents are written to a temporary file in the
//!    target directory and renamed over the artifact, so readers only ever see
//!    the old or the new artifact.
//! 2. **Mutual exclusion**: callers hold an exclusive lock on a sibling
//!    `.lock` file for the whole read-compare-write sequence, so concurrent
//!    build invocations serialize their regeneration.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Persistent storage for a single generated artifact.
pub trait ArtifactStore: Send + Sync {
    /// Location reported in diagnostics.
    fn location(&self) -> &Path;

    /// Acquire exclusive access. Released when the returned guard drops.
    fn lock(&self) -> Result<StoreLock>;

    /// Read the current artifact, or `None` if it was never generated.
    fn read(&self) -> Result<Option<String>>;

    /// Replace the artifact in one step.
    ///
    /// On failure the previous artifact must remain readable and unchanged.
    fn replace(&self, contents: &str) -> Result<()>;
}

/// Guard for exclusive artifact access.
#[derive(Debug)]
pub struct StoreLock {
    file: Option<File>,
}

impl StoreLock {
    /// A guard that holds no OS resource, for stores that serialize internally.
    pub fn in_process() -> Self {
        Self { file: None }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
    }
}

/// Artifact stored on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    path: PathBuf,
}

impl FileArtifactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn failure(&self, message: impl Into<String>) -> Error {
        Error::RegenerationFailure {
            path: self.path.clone(),
            message: message.into(),
        }
    }
}

impl ArtifactStore for FileArtifactStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<StoreLock> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.failure(e.to_string()))?;
        }

        let file = File::create(&lock_path).map_err(|e| self.failure(e.to_string()))?;
        file.lock_exclusive()
            .map_err(|e| self.failure(format!("failed to lock {}: {}", lock_path.display(), e)))?;

        Ok(StoreLock { file: Some(file) })
    }

    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn replace(&self, contents: &str) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| self.failure(e.to_string()))?;

        // The temp file must live on the same filesystem for rename to be atomic
        let mut temp = NamedTempFile::new_in(&parent).map_err(|e| self.failure(e.to_string()))?;
        temp.write_all(contents.as_bytes())
            .map_err(|e| self.failure(e.to_string()))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| self.failure(e.to_string()))?;
        temp.persist(&self.path)
            .map_err(|e| self.failure(e.error.to_string()))?;

        Ok(())
    }
}

/// In-memory artifact store, used in tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    location: PathBuf,
    contents: Mutex<Option<String>>,
    writes: AtomicUsize,
    fail_writes: bool,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self {
            location: PathBuf::from("<memory>"),
            ..Self::default()
        }
    }

    /// A store whose every `replace` fails.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::new()
        }
    }

    /// A store that already holds `contents`.
    pub fn with_contents(contents: &str) -> Self {
        let store = Self::new();
        if let Ok(mut slot) = store.contents.lock() {
            *slot = Some(contents.to_string());
        }
        store
    }

    /// Number of successful replacements so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|slot| slot.clone())
    }

    fn poisoned(&self) -> Error {
        Error::RegenerationFailure {
            path: self.location.clone(),
            message: "artifact store lock poisoned".to_string(),
        }
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn location(&self) -> &Path {
        &self.location
    }

    fn lock(&self) -> Result<StoreLock> {
        Ok(StoreLock::in_process())
    }

    fn read(&self) -> Result<Option<String>> {
        let slot = self.contents.lock().map_err(|_| self.poisoned())?;
        Ok(slot.clone())
    }

    fn replace(&self, contents: &str) -> Result<()> {
        if self.fail_writes {
            return Err(Error::RegenerationFailure {
                path: self.location.clone(),
                message: "simulated write failure".to_string(),
            });
        }

        let mut slot = self.contents.lock().map_err(|_| self.poisoned())?;
        *slot = Some(contents.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
