//! Byte storage for intermediate job files.
//!
//! Keys are relative `/`-separated paths such as `<job-id>/frames/0.jpg`.
//! Deleting a key also deletes everything below it.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::debug;

pub trait ByteStorage {
    fn save(&self, path: &str, bytes: &[u8]) -> io::Result<()>;

    /// `Ok(None)` when nothing is stored under `path`.
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>>;

    /// Remove `path` and everything below it. Returns whether anything was
    /// removed.
    fn delete(&self, path: &str) -> io::Result<bool>;

    fn exists(&self, path: &str) -> io::Result<bool>;
}

impl<T: ByteStorage + ?Sized> ByteStorage for &T {
    fn save(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        (**self).save(path, bytes)
    }

    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        (**self).read(path)
    }

    fn delete(&self, path: &str) -> io::Result<bool> {
        (**self).delete(path)
    }

    fn exists(&self, path: &str) -> io::Result<bool> {
        (**self).exists(path)
    }
}

/// Join path segments into a storage key.
pub fn storage_key<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = String::new();
    for part in parts {
        let part = part.as_ref().trim_matches('/');
        if part.is_empty() {
            continue;
        }
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(part);
    }
    key
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored keys in lexicographic order.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

fn is_under(key: &str, prefix: &str) -> bool {
    key == prefix
        || key
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl ByteStorage for MemoryStorage {
    fn save(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        let key = storage_key([path]);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, bytes.to_vec());
        Ok(())
    }

    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        let key = storage_key([path]);
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned())
    }

    fn delete(&self, path: &str) -> io::Result<bool> {
        let prefix = storage_key([path]);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| !is_under(key, &prefix));
        Ok(entries.len() != before)
    }

    fn exists(&self, path: &str) -> io::Result<bool> {
        let prefix = storage_key([path]);
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .any(|key| is_under(key, &prefix)))
    }
}

/// Storage rooted at a local directory.
#[derive(Clone, Debug)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local filesystem path of a key. Keys escaping the root are rejected.
    pub fn local_path(&self, path: &str) -> io::Result<PathBuf> {
        let rel = Path::new(path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || path.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key {path:?}"),
            ));
        }
        Ok(self.root.join(rel))
    }
}

impl ByteStorage for FsStorage {
    fn save(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        let full = self.local_path(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, bytes)?;
        debug!("stored {} bytes at {}", bytes.len(), full.display());
        Ok(())
    }

    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.local_path(path)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn delete(&self, path: &str) -> io::Result<bool> {
        let full = self.local_path(path)?;
        let meta = match fs::symlink_metadata(&full) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if meta.is_dir() {
            fs::remove_dir_all(&full)?;
        } else {
            fs::remove_file(&full)?;
        }
        debug!("deleted {}", full.display());
        Ok(true)
    }

    fn exists(&self, path: &str) -> io::Result<bool> {
        self.local_path(path)?.try_exists()
    }
}
