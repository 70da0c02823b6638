//! Local tier: one JSON file per item under a root directory.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use piral_core::SharedDataItem;

use crate::error::{PersistError, Result};
use crate::store::ItemStore;

const EXTENSION: &str = "json";

pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    /// Use `root`, which must be an existing, writable directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let attr = fs::metadata(&root).map_err(|error| PersistError::RootPathInvalid {
            path: root.clone(),
            error,
        })?;

        if !attr.is_dir() {
            return Err(PersistError::RootPathInvalid {
                path: root,
                error: io::Error::other("root path must be a directory"),
            });
        }
        if attr.permissions().readonly() {
            return Err(PersistError::RootPathInvalid {
                path: root,
                error: io::Error::other("root directory must be writable"),
            });
        }

        match root.canonicalize() {
            Ok(root) => Ok(Self { root }),
            Err(error) => Err(PersistError::RootPathInvalid { path: root, error }),
        }
    }

    /// Like [`LocalDiskStore::new`], creating the directory first if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|error| PersistError::RootPathInvalid {
            path: root.clone(),
            error,
        })?;
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", encode_name(name), EXTENSION))
    }
}

impl ItemStore for LocalDiskStore {
    fn load_all(&self) -> Result<BTreeMap<String, SharedDataItem>> {
        let io_err = |source| PersistError::Io {
            path: self.root.clone(),
            source,
        };

        let mut items = BTreeMap::new();
        for entry in fs::read_dir(&self.root).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(name) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_name)
            else {
                tracing::warn!(path = %path.display(), "skipping file with undecodable name");
                continue;
            };

            tracing::debug!(path = %path.display(), "reading stored item");
            let json = fs::read_to_string(&path).map_err(|source| PersistError::Io {
                path: path.clone(),
                source,
            })?;
            match serde_json::from_str(&json) {
                Ok(item) => {
                    items.insert(name, item);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping malformed stored item");
                }
            }
        }
        Ok(items)
    }

    fn save(&self, name: &str, item: &SharedDataItem) -> Result<()> {
        let path = self.file_path(name);
        tracing::debug!(path = %path.display(), "writing stored item");
        let json = serde_json::to_string(item)?;
        fs::write(&path, json).map_err(|source| PersistError::Io { path, source })
    }

    fn remove(&self, name: &str) -> Result<()> {
        let path = self.file_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistError::Io { path, source }),
        }
    }
}

/// Map an item name to a file stem: `[A-Za-z0-9_-]` stay, every other byte
/// becomes `%XX`.
fn encode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn decode_name(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = stem.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
