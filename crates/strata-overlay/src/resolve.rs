//! Effective-location resolution.
//!
//! For every logical path the overlay must decide which disk(s) serve it:
//! the base, the diff, both (an appended file), or neither. Tombstones hide
//! the base side of a subtree; the tracked bit hides the same-path base copy
//! behind an authoritative diff copy; the rename index redirects either side
//! to a different physical path.

use strata_core::DiskError;
use strata_disk::Disk;

use crate::index::OverlayIndex;
use crate::rename::RenameIndex;

/// Where a logical path's content physically lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Hidden by a tombstone, or never present
    Absent,
    /// Content only on the base disk
    Base {
        /// Physical base path (identity unless aliased by a rename)
        base_path: String,
    },
    /// Content only on the diff disk
    Diff {
        /// Physical diff path (identity unless renamed)
        diff_path: String,
    },
    /// A base prefix and an appended diff suffix, read as one stream
    Stacked {
        /// Physical base path serving the prefix
        base_path: String,
        /// Physical diff path serving the suffix
        diff_path: String,
    },
}

impl Location {
    /// Returns true for [`Location::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The base-disk physical path, when the base serves any content.
    pub fn base_path(&self) -> Option<&str> {
        match self {
            Self::Base { base_path } | Self::Stacked { base_path, .. } => Some(base_path),
            _ => None,
        }
    }

    /// The diff-disk physical path, when the diff serves any content.
    pub fn diff_path(&self) -> Option<&str> {
        match self {
            Self::Diff { diff_path } | Self::Stacked { diff_path, .. } => Some(diff_path),
            _ => None,
        }
    }
}

/// Resolves the effective location of a normalized logical path.
///
/// The diff candidate is the renamed diff path, defaulting to the logical
/// path. The base candidate is an alias when the rename index records one
/// (exempt from the tracked check: an alias exists precisely because the
/// diff is not authoritative for the content), otherwise the logical path
/// gated by the tombstone walk and the tracked bit.
pub(crate) fn resolve(
    base: &dyn Disk,
    diff: &dyn Disk,
    index: &OverlayIndex,
    rename: &RenameIndex,
    path: &str,
) -> Result<Location, DiskError> {
    let shadowed = index.is_shadowed(path)?;
    let target = rename.get(path)?.unwrap_or_default();

    let diff_candidate = target.diff.as_deref().unwrap_or(path);
    let diff_side = if diff.exists(diff_candidate)? {
        Some(diff_candidate.to_string())
    } else {
        None
    };

    let base_side = match target.base {
        Some(alias) => {
            if !shadowed && base.exists(&alias)? {
                Some(alias)
            } else {
                None
            }
        }
        None => {
            if !shadowed && !index.is_tracked(path)? && base.exists(path)? {
                Some(path.to_string())
            } else {
                None
            }
        }
    };

    Ok(match (base_side, diff_side) {
        (None, None) => Location::Absent,
        (Some(base_path), None) => Location::Base { base_path },
        (None, Some(diff_path)) => Location::Diff { diff_path },
        (Some(base_path), Some(diff_path)) => Location::Stacked {
            base_path,
            diff_path,
        },
    })
}
