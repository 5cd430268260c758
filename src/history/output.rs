//! Destinations for the persisted history document.
//!
//! A store hands its serialized document to an output exactly once, on
//! close. [`FileOutput`] replaces the target atomically so a crash mid-write
//! leaves the previous document intact.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::Result;

/// Sink for one serialized history document.
pub trait HistoryOutput {
    /// Persist `document`, replacing whatever was written before.
    fn write_document(&mut self, document: &[u8]) -> Result<()>;
}

impl<T: HistoryOutput + ?Sized> HistoryOutput for Box<T> {
    fn write_document(&mut self, document: &[u8]) -> Result<()> {
        (**self).write_document(document)
    }
}

/// RAII guard that removes a temporary file unless it was committed.
struct TempFileGuard {
    path: PathBuf,
    committed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.committed {
            // Best effort: the file may never have been created.
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Writes the document to a file via temp file, fsync and rename.
#[derive(Debug, Clone)]
pub struct FileOutput {
    path: PathBuf,
}

impl FileOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "history".to_string());
        let parent = self.path.parent().unwrap_or(Path::new("."));
        parent.join(format!(".{file_name}.{}.tmp", std::process::id()))
    }
}

impl HistoryOutput for FileOutput {
    fn write_document(&mut self, document: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut guard = TempFileGuard::new(self.temp_path());
        let mut file = File::create(&guard.path)?;
        file.write_all(document)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&guard.path, &self.path)?;
        guard.committed = true;
        Ok(())
    }
}

/// In-memory output shared between clones. Each write replaces the contents.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the last written document.
    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl HistoryOutput for SharedBuffer {
    fn write_document(&mut self, document: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.clear();
        inner.extend_from_slice(document);
        Ok(())
    }
}

/// Discards the document. Used when no history output is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOutput;

impl HistoryOutput for NullOutput {
    fn write_document(&mut self, _document: &[u8]) -> Result<()> {
        Ok(())
    }
}
