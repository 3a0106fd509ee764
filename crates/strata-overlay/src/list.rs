//! Unified directory listing.
//!
//! A directory's logical children are the union of its diff children and
//! its base children, with the base side filtered: tombstoned entries are
//! removed, tracked entries live authoritatively on the diff, and names the
//! diff already produced are deduplicated.

use std::collections::HashSet;

use strata_core::{path as lpath, DiskError};
use strata_disk::Disk;

use crate::index::OverlayIndex;
use crate::resolve::Location;

/// A merged directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DirEntry {
    /// Child name within the directory
    pub name: String,
    /// Whether the child is itself a directory
    pub is_dir: bool,
}

/// Merges the diff and base children of a resolved directory.
///
/// `dir` is the normalized logical path; `location` its resolution. Order
/// is unspecified; callers sort when they need determinism.
pub(crate) fn merged_children(
    base: &dyn Disk,
    diff: &dyn Disk,
    index: &OverlayIndex,
    dir: &str,
    location: &Location,
) -> Result<Vec<DirEntry>, DiskError> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    if let Some(diff_dir) = location.diff_path() {
        if !diff.is_directory(diff_dir)? {
            return Err(DiskError::NotADirectory(dir.to_string()));
        }
        for name in diff.list_files(diff_dir)? {
            let is_dir = diff.is_directory(&lpath::join(diff_dir, &name))?;
            seen.insert(name.clone());
            entries.push(DirEntry { name, is_dir });
        }
    }

    if let Some(base_dir) = location.base_path() {
        if !base.is_directory(base_dir)? {
            return Err(DiskError::NotADirectory(dir.to_string()));
        }
        for name in base.list_files(base_dir)? {
            if seen.contains(&name) {
                continue;
            }
            let logical = lpath::join(dir, &name);
            if index.is_tombstoned(&logical)? || index.is_tracked(&logical)? {
                continue;
            }
            let is_dir = base.is_directory(&lpath::join(base_dir, &name))?;
            entries.push(DirEntry { name, is_dir });
        }
    }

    Ok(entries)
}

/// Renders merged entries as full logical paths, directories with a `/`.
pub(crate) fn entry_paths(dir: &str, entries: Vec<DirEntry>) -> Vec<String> {
    entries
        .into_iter()
        .map(|entry| {
            let full = lpath::join(dir, &entry.name);
            if entry.is_dir {
                format!("{full}/")
            } else {
                full
            }
        })
        .collect()
}
