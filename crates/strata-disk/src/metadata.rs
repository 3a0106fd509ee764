//! Marker persistence for out-of-band disk metadata.

use std::io::{Read, Write};
use std::sync::Arc;

use bytes::Bytes;
use strata_core::{path as lpath, DiskError};

use crate::disk::{Disk, ReadSettings, WriteMode, WriteSettings};

/// A store of marker entries addressed by logical paths.
///
/// A marker is a presence bit with an optional small payload. Stores must
/// provide per-key atomicity for each primitive; `create_marker` and
/// `remove_marker` are idempotent.
pub trait MetadataStore: Send + Sync {
    /// Returns true if a marker exists at `key`.
    fn exists(&self, key: &str) -> Result<bool, DiskError>;

    /// Creates an empty marker, succeeding when it already exists.
    fn create_marker(&self, key: &str) -> Result<(), DiskError>;

    /// Removes a marker, succeeding when it does not exist.
    fn remove_marker(&self, key: &str) -> Result<(), DiskError>;

    /// Reads a marker's payload.
    fn read_marker(&self, key: &str) -> Result<Bytes, DiskError>;

    /// Writes a marker's payload, creating the marker when missing.
    fn write_marker(&self, key: &str, contents: Bytes) -> Result<(), DiskError>;
}

/// Suffix appended to the final key component of every marker file.
///
/// Keys form a tree mirroring logical paths; the suffix keeps a key such as
/// `a` from colliding with the directory the store needs for `a/b`.
const MARKER_SUFFIX: &str = ".mark";

/// A metadata store persisting markers as files on a [`Disk`].
pub struct DiskMetadataStore {
    disk: Arc<dyn Disk>,
}

impl DiskMetadataStore {
    /// Creates a store persisting through `disk`.
    pub fn new(disk: Arc<dyn Disk>) -> Self {
        Self { disk }
    }

    fn marker_path(key: &str) -> Result<String, DiskError> {
        let normalized = lpath::normalize(key)?;
        if normalized.is_empty() {
            return Err(DiskError::InvalidPath(key.to_string()));
        }
        Ok(format!("{normalized}{MARKER_SUFFIX}"))
    }

    fn ensure_parent(&self, marker: &str) -> Result<(), DiskError> {
        if let Some(parent) = lpath::parent(marker) {
            if !parent.is_empty() {
                self.disk.create_directories(parent)?;
            }
        }
        Ok(())
    }
}

impl MetadataStore for DiskMetadataStore {
    fn exists(&self, key: &str) -> Result<bool, DiskError> {
        self.disk.exists(&Self::marker_path(key)?)
    }

    fn create_marker(&self, key: &str) -> Result<(), DiskError> {
        let marker = Self::marker_path(key)?;
        if self.disk.exists(&marker)? {
            return Ok(());
        }
        self.ensure_parent(&marker)?;
        match self.disk.create_file(&marker) {
            // Lost a race against another creator; the bit is set either way.
            Err(DiskError::AlreadyExists(_)) => Ok(()),
            other => other,
        }
    }

    fn remove_marker(&self, key: &str) -> Result<(), DiskError> {
        self.disk.remove_file_if_exists(&Self::marker_path(key)?)
    }

    fn read_marker(&self, key: &str) -> Result<Bytes, DiskError> {
        let marker = Self::marker_path(key)?;
        let mut stream = self
            .disk
            .read_file(&marker, ReadSettings::default(), None, None)?;
        let mut contents = Vec::new();
        stream.read_to_end(&mut contents)?;
        Ok(Bytes::from(contents))
    }

    fn write_marker(&self, key: &str, contents: Bytes) -> Result<(), DiskError> {
        let marker = Self::marker_path(key)?;
        self.ensure_parent(&marker)?;
        let mut stream = self.disk.write_file(
            &marker,
            contents.len().max(1),
            WriteMode::Rewrite,
            WriteSettings::default(),
        )?;
        stream.write_all(&contents)?;
        stream.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalDisk;
    use tempfile::TempDir;

    fn store() -> (TempDir, DiskMetadataStore) {
        let dir = TempDir::new().unwrap();
        let disk = Arc::new(LocalDisk::new("meta", dir.path()).unwrap());
        (dir, DiskMetadataStore::new(disk))
    }

    #[test]
    fn test_marker_presence() {
        let (_dir, store) = store();

        assert!(!store.exists("tombstone/a").unwrap());
        store.create_marker("tombstone/a").unwrap();
        assert!(store.exists("tombstone/a").unwrap());

        store.remove_marker("tombstone/a").unwrap();
        assert!(!store.exists("tombstone/a").unwrap());
    }

    #[test]
    fn test_marker_idempotence() {
        let (_dir, store) = store();

        store.create_marker("tracked/x").unwrap();
        store.create_marker("tracked/x").unwrap();
        assert!(store.exists("tracked/x").unwrap());

        store.remove_marker("tracked/x").unwrap();
        store.remove_marker("tracked/x").unwrap();
        assert!(!store.exists("tracked/x").unwrap());
    }

    #[test]
    fn test_payload_roundtrip() {
        let (_dir, store) = store();

        store
            .write_marker("renames/a/b", Bytes::from_static(b"d:phys/path"))
            .unwrap();
        assert_eq!(store.read_marker("renames/a/b").unwrap().as_ref(), b"d:phys/path");

        store
            .write_marker("renames/a/b", Bytes::from_static(b"b:other"))
            .unwrap();
        assert_eq!(store.read_marker("renames/a/b").unwrap().as_ref(), b"b:other");
    }

    #[test]
    fn test_dir_and_descendant_keys_coexist() {
        let (_dir, store) = store();

        store.create_marker("tombstone/a").unwrap();
        store.create_marker("tombstone/a/b").unwrap();
        assert!(store.exists("tombstone/a").unwrap());
        assert!(store.exists("tombstone/a/b").unwrap());
    }
}
