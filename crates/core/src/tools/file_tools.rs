//! # Workspace File Operations
//!
//! Filesystem access scoped to a single working root. Reads of
//! missing files yield empty content (a file the plan has not created
//! yet is normal, not an error); writes create intermediate
//! directories and fully overwrite.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::OrchestratorError;

/// The orchestrator's working root plus a write counter the Coder
/// uses to spot zero-write and multi-write steps.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    writes: AtomicUsize,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            writes: AtomicUsize::new(0),
        }
    }

    /// The workspace root all relative paths resolve against.
    pub fn current_dir(&self) -> &Path {
        &self.root
    }

    /// Read a file's contents. A missing file yields `Ok("")`; any
    /// other failure is an io error.
    pub fn read_file(&self, path: &str) -> Result<String, OrchestratorError> {
        let full = self.resolve(path)?;
        match fs::read_to_string(&full) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(self.io_error(path, e)),
        }
    }

    /// Create or fully overwrite the file at `path`, creating parent
    /// directories as needed.
    pub fn write_file(&self, path: &str, content: &str) -> Result<(), OrchestratorError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(path, e))?;
        }
        fs::write(&full, content).map_err(|e| self.io_error(path, e))?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Sorted entry names at `path`.
    pub fn list_files(&self, path: &str) -> Result<Vec<String>, OrchestratorError> {
        let full = self.resolve(path)?;
        let entries = fs::read_dir(&full).map_err(|e| self.io_error(path, e))?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Successful writes since the last [`Self::reset_writes`].
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Reset the write counter at the start of a step.
    pub fn reset_writes(&self) {
        self.writes.store(0, Ordering::Relaxed);
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, OrchestratorError> {
        let full = if path.is_empty() || path == "." {
            self.root.clone()
        } else {
            self.root.join(path)
        };
        // Absolute paths escape via join; relative traversal is left
        // to the operating environment, same trust boundary as any
        // local development tool.
        if !full.starts_with(&self.root) {
            return Err(self.io_error(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "path escapes workspace root"),
            ));
        }
        Ok(full)
    }

    fn io_error(&self, path: &str, source: io::Error) -> OrchestratorError {
        OrchestratorError::Io {
            path: path.to_string(),
            source,
        }
    }
}
