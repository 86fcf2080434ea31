// src/fs/mod.rs

//! Filesystem abstraction used by the store and the lock.
//!
//! Production code uses [`RealFileSystem`]; tests can swap in
//! [`mock::MockFileSystem`], which keeps everything in memory.

use std::fmt::Debug;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
///
/// Missing files are reported as `Ok(None)` / `Ok(false)` rather than errors;
/// callers decide what absence means.
pub trait FileSystem: Send + Sync + Debug {
    /// Read a UTF-8 file, `None` if it does not exist.
    fn read_optional(&self, path: &Path) -> Result<Option<String>>;

    /// Create or truncate `path` (and its parent directories) with `contents`.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Append to `path`, creating it (and its parents) if needed.
    fn append(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Exclusively create `path` with `contents`.
    ///
    /// Returns `false` if the file already exists.
    fn create_new(&self, path: &Path, contents: &[u8]) -> Result<bool>;

    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Remove a file. Returns `false` if it did not exist.
    fn remove_file(&self, path: &Path) -> Result<bool>;

    /// Remove a file or a directory tree. Absent paths are not an error.
    fn remove_all(&self, path: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Return a list of entries in a directory.
    /// Returns full paths; an absent directory yields an empty list.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
    }
    Ok(())
}

impl FileSystem for RealFileSystem {
    fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading file {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        ensure_parent(path)?;
        let mut file = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        file.write_all(contents).with_context(|| format!("writing to file {:?}", path))?;
        file.sync_all().with_context(|| format!("syncing file {:?}", path))?;
        Ok(())
    }

    fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        ensure_parent(path)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening file for append {:?}", path))?;
        file.write_all(contents).with_context(|| format!("appending to file {:?}", path))?;
        Ok(())
    }

    fn create_new(&self, path: &Path, contents: &[u8]) -> Result<bool> {
        ensure_parent(path)?;
        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(err) => return Err(err).with_context(|| format!("creating file {:?}", path)),
        };
        file.write_all(contents).with_context(|| format!("writing to file {:?}", path))?;
        Ok(true)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).with_context(|| format!("renaming {:?} to {:?}", from, to))
    }

    fn remove_file(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).with_context(|| format!("removing file {:?}", path)),
        }
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        match result {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let iter = match fs::read_dir(path) {
            Ok(iter) => iter,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err).with_context(|| format!("reading dir {:?}", path)),
        };
        let mut entries = Vec::new();
        for entry in iter {
            let entry = entry?;
            entries.push(entry.path());
        }
        entries.sort();
        Ok(entries)
    }
}
