//! Exclusive owner of the snippet file on disk.
//!
//! Every raw file operation goes through one reader/writer lock, so a reload
//! in progress cannot interleave with a rewrite triggered by a mutation.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::{RwLock, RwLockWriteGuard};

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Failure touching the backing file.
#[derive(Debug, Error)]
#[error("failed to {action} snippet file {path}: {source}")]
pub struct FileError {
    action: &'static str,
    path: Utf8PathBuf,
    #[source]
    source: io::Error,
}

impl FileError {
    fn new(action: &'static str, path: &Utf8Path, source: io::Error) -> Self {
        Self {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The operation that failed, such as `open` or `truncate`.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        self.action
    }
}

/// Lock-guarded handle to the snippet file.
#[derive(Debug)]
pub struct BackingFile {
    path: Utf8PathBuf,
    file: RwLock<File>,
}

impl BackingFile {
    /// Opens `path` for reading and appending, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] when the file cannot be opened.
    pub fn open(path: impl Into<Utf8PathBuf>) -> Result<Self, FileError> {
        let path = path.into();
        let file = open_handle(&path)?;
        Ok(Self {
            path,
            file: RwLock::new(file),
        })
    }

    /// Path this handle owns.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Reads from the current position to the end of the file.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] when the read fails or the content is not
    /// UTF-8.
    pub fn read_to_string(&self) -> Result<String, FileError> {
        let guard = self
            .file
            .read()
            .map_err(|_| self.error("lock", poisoned()))?;
        let mut text = String::new();
        // `Read` is implemented for `&File`, so shared holders can read.
        (&*guard)
            .read_to_string(&mut text)
            .map_err(|source| self.error("read", source))?;
        Ok(text)
    }

    /// Appends bytes at the end of the file.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] when the write fails.
    pub fn append(&self, bytes: &[u8]) -> Result<(), FileError> {
        let mut file = self.lock()?;
        self.write_all(&mut file, bytes)
    }

    /// Empties the file and rewinds to its start.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] when truncation or seeking fails.
    pub fn truncate(&self) -> Result<(), FileError> {
        let mut file = self.lock()?;
        self.truncate_locked(&mut file)
    }

    /// Replaces the whole file content in a single locked section.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] when truncation or the write fails.
    pub fn rewrite(&self, bytes: &[u8]) -> Result<(), FileError> {
        let mut file = self.lock()?;
        self.truncate_locked(&mut file)?;
        self.write_all(&mut file, bytes)
    }

    /// Reopens the same path and positions the handle at its start.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] when the reopen or seek fails.
    pub fn reload(&self) -> Result<(), FileError> {
        let mut file = self.lock()?;
        let mut reopened = open_handle(&self.path)?;
        reopened
            .seek(SeekFrom::Start(0))
            .map_err(|source| self.error("seek", source))?;
        *file = reopened;
        Ok(())
    }

    /// Deletes the file from disk. The handle stays open until dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] when the removal fails.
    pub fn remove(&self) -> Result<(), FileError> {
        let _file = self.lock()?;
        fs::remove_file(&self.path).map_err(|source| self.error("remove", source))
    }

    fn lock(&self) -> Result<RwLockWriteGuard<'_, File>, FileError> {
        self.file
            .write()
            .map_err(|_| self.error("lock", poisoned()))
    }

    fn truncate_locked(&self, file: &mut File) -> Result<(), FileError> {
        file.set_len(0)
            .map_err(|source| self.error("truncate", source))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|source| self.error("seek", source))?;
        Ok(())
    }

    fn write_all(&self, file: &mut File, bytes: &[u8]) -> Result<(), FileError> {
        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|source| self.error("write", source))
    }

    fn error(&self, action: &'static str, source: io::Error) -> FileError {
        FileError::new(action, &self.path, source)
    }
}

fn open_handle(path: &Utf8Path) -> Result<File, FileError> {
    OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(|source| FileError::new("open", path, source))
}

fn poisoned() -> io::Error {
    io::Error::other("file lock poisoned")
}
