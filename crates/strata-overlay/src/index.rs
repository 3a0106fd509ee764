//! Tombstone and tracking bits.
//!
//! Two marker namespaces share one metadata store:
//!
//! - `tombstone/<path>`: the path (and, for directories, its subtree) has
//!   been logically removed; the base copy stays untouched but hidden.
//! - `tracked/<path>`: the diff holds authoritative content for the path;
//!   the same-path base copy must not surface in listings or reads.
//!
//! All bits are idempotent presence markers. The root is never marked.

use std::sync::Arc;

use strata_core::{path as lpath, DiskError};
use strata_disk::MetadataStore;

const TOMBSTONE_PREFIX: &str = "tombstone";
const TRACKED_PREFIX: &str = "tracked";

/// Persistent tombstone and tracked sets.
pub struct OverlayIndex {
    store: Arc<dyn MetadataStore>,
}

impl OverlayIndex {
    /// Creates an index over `store`.
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    fn key(prefix: &str, path: &str) -> String {
        format!("{prefix}/{path}")
    }

    /// Returns true if `path` itself carries a tombstone.
    pub fn is_tombstoned(&self, path: &str) -> Result<bool, DiskError> {
        if path.is_empty() {
            return Ok(false);
        }
        self.store.exists(&Self::key(TOMBSTONE_PREFIX, path))
    }

    /// Returns true if `path` or any strict ancestor carries a tombstone.
    pub fn is_shadowed(&self, path: &str) -> Result<bool, DiskError> {
        for candidate in lpath::self_and_ancestors(path) {
            if self.is_tombstoned(candidate)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Marks `path` as removed. Idempotent.
    pub fn set_tombstone(&self, path: &str) -> Result<(), DiskError> {
        if path.is_empty() {
            return Ok(());
        }
        self.store.create_marker(&Self::key(TOMBSTONE_PREFIX, path))
    }

    /// Clears the tombstone on `path` itself.
    ///
    /// Descendant tombstones are left in place: re-creating a removed
    /// directory must not resurrect the files it used to contain.
    pub fn clear_tombstone(&self, path: &str) -> Result<(), DiskError> {
        if path.is_empty() {
            return Ok(());
        }
        self.store.remove_marker(&Self::key(TOMBSTONE_PREFIX, path))
    }

    /// Returns true if the diff copy of `path` shadows the base copy.
    pub fn is_tracked(&self, path: &str) -> Result<bool, DiskError> {
        if path.is_empty() {
            return Ok(false);
        }
        self.store.exists(&Self::key(TRACKED_PREFIX, path))
    }

    /// Marks the diff copy of `path` as authoritative. Idempotent.
    pub fn set_tracked(&self, path: &str) -> Result<(), DiskError> {
        if path.is_empty() {
            return Ok(());
        }
        self.store.create_marker(&Self::key(TRACKED_PREFIX, path))
    }

    /// Clears the tracked bit on `path`.
    pub fn clear_tracked(&self, path: &str) -> Result<(), DiskError> {
        if path.is_empty() {
            return Ok(());
        }
        self.store.remove_marker(&Self::key(TRACKED_PREFIX, path))
    }
}
