//! Rename indirection for logical destinations.
//!
//! When a file is moved or hard-linked across the overlay boundary, the
//! content may stay where it physically is while the logical name changes.
//! This index maps a logical destination to the physical source(s) serving
//! it; a missing entry means identity.

use std::sync::Arc;

use bytes::Bytes;
use strata_core::DiskError;
use strata_disk::MetadataStore;

/// Physical sources recorded for a renamed logical path.
///
/// A destination can simultaneously have a base part and a diff part: moving
/// a base file that had appended diff content moves the diff suffix on the
/// diff disk and re-aliases the base prefix without copying it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenameTarget {
    /// Physical path on the diff disk, when it differs from the logical path
    pub diff: Option<String>,
    /// Physical path on the base disk (recorded instead of a copy-up)
    pub base: Option<String>,
}

impl RenameTarget {
    /// A target aliasing base content at `path`.
    pub fn base_alias(path: impl Into<String>) -> Self {
        Self {
            diff: None,
            base: Some(path.into()),
        }
    }

    /// Returns true when the target records nothing (identity).
    pub fn is_identity(&self) -> bool {
        self.diff.is_none() && self.base.is_none()
    }

    fn encode(&self) -> Bytes {
        let mut out = String::new();
        if let Some(diff) = &self.diff {
            out.push_str("d:");
            out.push_str(diff);
            out.push('\n');
        }
        if let Some(base) = &self.base {
            out.push_str("b:");
            out.push_str(base);
            out.push('\n');
        }
        Bytes::from(out)
    }

    fn decode(contents: &[u8]) -> Result<Self, DiskError> {
        let text = std::str::from_utf8(contents)
            .map_err(|_| DiskError::Metadata("rename payload is not UTF-8".to_string()))?;
        let mut target = Self::default();
        for line in text.lines() {
            match line.split_once(':') {
                Some(("d", path)) => target.diff = Some(path.to_string()),
                Some(("b", path)) => target.base = Some(path.to_string()),
                _ => {
                    return Err(DiskError::Metadata(format!(
                        "bad rename payload line: {line}"
                    )))
                }
            }
        }
        Ok(target)
    }
}

/// Persistent map from logical destination to [`RenameTarget`].
pub struct RenameIndex {
    store: Arc<dyn MetadataStore>,
}

impl RenameIndex {
    /// Creates an index over `store`.
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Returns the recorded target for `path`, or `None` for identity.
    pub fn get(&self, path: &str) -> Result<Option<RenameTarget>, DiskError> {
        if path.is_empty() || !self.store.exists(path)? {
            return Ok(None);
        }
        let contents = self.store.read_marker(path)?;
        Ok(Some(RenameTarget::decode(&contents)?))
    }

    /// Records `target` for `path`. Identity targets are removed instead.
    pub fn set(&self, path: &str, target: &RenameTarget) -> Result<(), DiskError> {
        if target.is_identity() {
            return self.remove(path);
        }
        self.store.write_marker(path, target.encode())
    }

    /// Drops any mapping for `path`. Idempotent.
    pub fn remove(&self, path: &str) -> Result<(), DiskError> {
        if path.is_empty() {
            return Ok(());
        }
        self.store.remove_marker(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_disk::{DiskMetadataStore, LocalDisk};
    use tempfile::TempDir;

    fn map() -> (TempDir, RenameIndex) {
        let dir = TempDir::new().unwrap();
        let disk = Arc::new(LocalDisk::new("meta", dir.path()).unwrap());
        (dir, RenameIndex::new(Arc::new(DiskMetadataStore::new(disk))))
    }

    #[test]
    fn test_absent_means_identity() {
        let (_dir, map) = map();
        assert_eq!(map.get("x").unwrap(), None);
    }

    #[test]
    fn test_roundtrip_base_alias() {
        let (_dir, map) = map();

        let target = RenameTarget::base_alias("old/name");
        map.set("new/name", &target).unwrap();
        assert_eq!(map.get("new/name").unwrap(), Some(target));

        map.remove("new/name").unwrap();
        assert_eq!(map.get("new/name").unwrap(), None);
    }

    #[test]
    fn test_roundtrip_both_parts() {
        let (_dir, map) = map();

        let target = RenameTarget {
            diff: Some("suffix/file".to_string()),
            base: Some("prefix/file".to_string()),
        };
        map.set("f", &target).unwrap();
        assert_eq!(map.get("f").unwrap(), Some(target));
    }

    #[test]
    fn test_identity_is_not_persisted() {
        let (_dir, map) = map();

        map.set("f", &RenameTarget::default()).unwrap();
        assert_eq!(map.get("f").unwrap(), None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(RenameTarget::decode(b"x:path").is_err());
        assert!(RenameTarget::decode(b"no-tag").is_err());
    }
}
