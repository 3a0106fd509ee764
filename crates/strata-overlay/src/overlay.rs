//! The overlay disk.
//!
//! Mutation ordering inside every primitive is: diff content changes first,
//! rename map updates second, tombstone/tracked flips last. An interrupted
//! mutation therefore leaves a more restrictive but self-consistent view.

use std::sync::Arc;
use std::time::SystemTime;

use strata_core::{path as lpath, DiskError};
use strata_disk::{
    DirectoryIterator, Disk, MetadataStore, ReadSettings, ReadStream, WriteMode, WriteSettings,
    WriteStream,
};
use tracing::debug;

use crate::index::OverlayIndex;
use crate::list::{entry_paths, merged_children};
use crate::reader::OverlayReadStream;
use crate::rename::{RenameIndex, RenameTarget};
use crate::resolve::{self, Location};

/// A copy-on-write composition of a read-only base disk and a diff disk.
///
/// The overlay holds shared references to its four collaborators and adds
/// no locking of its own; it relies on each collaborator's per-path
/// atomicity. The base disk is never written to.
pub struct OverlayDisk {
    name: String,
    base: Arc<dyn Disk>,
    diff: Arc<dyn Disk>,
    index: OverlayIndex,
    rename: RenameIndex,
}

impl OverlayDisk {
    /// Composes an overlay from its four collaborators.
    ///
    /// `metadata` backs the rename map; `tracked_metadata` backs the
    /// tombstone and tracked sets.
    pub fn new(
        name: impl Into<String>,
        base: Arc<dyn Disk>,
        diff: Arc<dyn Disk>,
        metadata: Arc<dyn MetadataStore>,
        tracked_metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            name: name.into(),
            base,
            diff,
            index: OverlayIndex::new(tracked_metadata),
            rename: RenameIndex::new(metadata),
        }
    }

    /// Resolves the effective location of a logical path.
    pub fn resolve(&self, path: &str) -> Result<Location, DiskError> {
        let path = lpath::normalize(path)?;
        resolve::resolve(&*self.base, &*self.diff, &self.index, &self.rename, &path)
    }

    /// Returns true if the diff copy of `path` shadows the base copy.
    ///
    /// Exposed for tests and diagnostics.
    pub fn is_tracked(&self, path: &str) -> Result<bool, DiskError> {
        self.index.is_tracked(&lpath::normalize(path)?)
    }

    /// Materializes `dir` and its ancestors on the diff.
    ///
    /// Walks root-downward; ancestors already on the diff are skipped.
    /// Ancestors that only exist on the base are mirrored as empty diff
    /// directories, untracked, so listings stay unchanged.
    fn ensure_parents(&self, dir: &str) -> Result<(), DiskError> {
        for ancestor in lpath::self_and_ancestors_top_down(dir) {
            if !self.diff.exists(ancestor)? {
                self.diff.create_directory(ancestor)?;
            }
        }
        Ok(())
    }

    /// Materializes an empty diff suffix file for `path` if the diff has
    /// none, leaving logical content and size unchanged.
    fn ensure_file(&self, path: &str) -> Result<(), DiskError> {
        if let Some(parent) = lpath::parent(path) {
            self.ensure_parents(parent)?;
        }
        if !self.diff.exists(path)? {
            self.diff.create_file(path)?;
        }
        Ok(())
    }

    /// Checks that the parent of `path` is a logically present directory.
    fn require_parent_dir(&self, path: &str) -> Result<(), DiskError> {
        let Some(parent) = lpath::parent(path) else {
            return Err(DiskError::InvalidPath(path.to_string()));
        };
        if parent.is_empty() {
            return Ok(());
        }
        match self.resolve(parent)? {
            Location::Absent => Err(DiskError::NotFound(parent.to_string())),
            location => {
                if self.location_is_directory(&location)? {
                    Ok(())
                } else {
                    Err(DiskError::NotADirectory(parent.to_string()))
                }
            }
        }
    }

    fn location_is_directory(&self, location: &Location) -> Result<bool, DiskError> {
        if let Some(diff_path) = location.diff_path() {
            return self.diff.is_directory(diff_path);
        }
        if let Some(base_path) = location.base_path() {
            return self.base.is_directory(base_path);
        }
        Ok(false)
    }

    fn location_is_file(&self, location: &Location) -> Result<bool, DiskError> {
        if let Some(diff_path) = location.diff_path() {
            return self.diff.is_file(diff_path);
        }
        if let Some(base_path) = location.base_path() {
            return self.base.is_file(base_path);
        }
        Ok(false)
    }

    /// Resolves a path that must name a present directory, for listing.
    fn resolve_directory(&self, path: &str) -> Result<(String, Location), DiskError> {
        let normalized = lpath::normalize(path)?;
        let location = self.resolve(&normalized)?;
        if location.is_absent() {
            return Err(DiskError::NotFound(normalized));
        }
        if !self.location_is_directory(&location)? {
            return Err(DiskError::NotADirectory(normalized));
        }
        Ok((normalized, location))
    }

    /// Moves one file across the overlay, re-aliasing any base part.
    fn move_file_resolved(
        &self,
        from: &str,
        from_location: &Location,
        to: &str,
    ) -> Result<(), DiskError> {
        // 1. Diff content: physically move the diff part; a pure base
        //    source gets an empty placeholder so the destination shows up
        //    in diff enumeration. No base bytes are read.
        let base_source = from_location.base_path().map(str::to_string);
        match from_location.diff_path() {
            Some(diff_path) => self.diff.move_file(diff_path, to)?,
            None => self.diff.create_file(to)?,
        }

        // 2. Rename map.
        self.rename.remove(from)?;
        match &base_source {
            Some(source) => self.rename.set(to, &RenameTarget::base_alias(source.as_str()))?,
            None => self.rename.remove(to)?,
        }

        // 3. Presence flips.
        self.index.clear_tombstone(to)?;
        self.index.set_tracked(to)?;
        self.index.clear_tracked(from)?;
        self.index.set_tombstone(from)?;

        debug!(from = %from, to = %to, aliased = base_source.is_some(), "Moved file");
        Ok(())
    }

    fn move_directory_resolved(&self, from: &str, to: &str) -> Result<(), DiskError> {
        self.create_directory(to)?;

        let (from_dir, location) = self.resolve_directory(from)?;
        let children = merged_children(&*self.base, &*self.diff, &self.index, &from_dir, &location)?;
        for child in children {
            let child_from = lpath::join(&from_dir, &child.name);
            let child_to = lpath::join(to, &child.name);
            if child.is_dir {
                self.move_directory_resolved(&child_from, &child_to)?;
            } else {
                let child_location = self.resolve(&child_from)?;
                self.move_file_resolved(&child_from, &child_location, &child_to)?;
            }
        }

        // Children are gone; drop the leftover diff directory and hide the
        // base one.
        let emptied = self.resolve(&from_dir)?;
        if let Some(diff_path) = emptied.diff_path() {
            self.diff.remove_recursive(diff_path)?;
        }
        self.index.clear_tracked(&from_dir)?;
        self.index.set_tombstone(&from_dir)?;

        debug!(from = %from_dir, to = %to, "Moved directory");
        Ok(())
    }

    fn remove_recursive_resolved(&self, path: &str, location: &Location) -> Result<(), DiskError> {
        if self.location_is_file(location)? {
            return self.remove_file(path);
        }

        let children =
            merged_children(&*self.base, &*self.diff, &self.index, path, location)?;
        for child in children {
            let child_path = lpath::join(path, &child.name);
            let child_location = self.resolve(&child_path)?;
            self.remove_recursive_resolved(&child_path, &child_location)?;
        }

        if let Some(diff_path) = location.diff_path() {
            self.diff.remove_recursive(diff_path)?;
        }
        self.index.clear_tracked(path)?;
        self.index.set_tombstone(path)?;
        Ok(())
    }
}

impl Disk for OverlayDisk {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, path: &str) -> Result<bool, DiskError> {
        Ok(!self.resolve(path)?.is_absent())
    }

    fn is_file(&self, path: &str) -> Result<bool, DiskError> {
        let location = self.resolve(path)?;
        self.location_is_file(&location)
    }

    fn is_directory(&self, path: &str) -> Result<bool, DiskError> {
        let location = self.resolve(path)?;
        self.location_is_directory(&location)
    }

    fn file_size(&self, path: &str) -> Result<u64, DiskError> {
        let normalized = lpath::normalize(path)?;
        match self.resolve(&normalized)? {
            Location::Absent => Err(DiskError::NotFound(normalized)),
            Location::Base { base_path } => self.base.file_size(&base_path),
            Location::Diff { diff_path } => self.diff.file_size(&diff_path),
            Location::Stacked {
                base_path,
                diff_path,
            } => Ok(self.base.file_size(&base_path)? + self.diff.file_size(&diff_path)?),
        }
    }

    fn create_file(&self, path: &str) -> Result<(), DiskError> {
        let path = lpath::normalize(path)?;
        if !self.resolve(&path)?.is_absent() {
            return Err(DiskError::AlreadyExists(path));
        }
        self.require_parent_dir(&path)?;

        if let Some(parent) = lpath::parent(&path) {
            self.ensure_parents(parent)?;
        }
        self.diff.create_file(&path)?;
        self.rename.remove(&path)?;
        self.index.clear_tombstone(&path)?;
        self.index.set_tracked(&path)?;

        debug!(path = %path, "Created file");
        Ok(())
    }

    fn create_directory(&self, path: &str) -> Result<(), DiskError> {
        let path = lpath::normalize(path)?;
        if !self.resolve(&path)?.is_absent() {
            return Err(DiskError::AlreadyExists(path));
        }
        self.require_parent_dir(&path)?;

        if let Some(parent) = lpath::parent(&path) {
            self.ensure_parents(parent)?;
        }
        self.diff.create_directory(&path)?;
        self.index.clear_tombstone(&path)?;
        self.index.set_tracked(&path)?;

        debug!(path = %path, "Created directory");
        Ok(())
    }

    fn create_directories(&self, path: &str) -> Result<(), DiskError> {
        let path = lpath::normalize(path)?;
        for component in lpath::self_and_ancestors_top_down(&path) {
            let location = self.resolve(component)?;
            if location.is_absent() {
                self.create_directory(component)?;
            } else if !self.location_is_directory(&location)? {
                return Err(DiskError::NotADirectory(component.to_string()));
            }
        }
        Ok(())
    }

    fn clear_directory(&self, path: &str) -> Result<(), DiskError> {
        let (dir, location) = self.resolve_directory(path)?;
        let children = merged_children(&*self.base, &*self.diff, &self.index, &dir, &location)?;
        for child in children {
            let child_path = lpath::join(&dir, &child.name);
            let child_location = self.resolve(&child_path)?;
            self.remove_recursive_resolved(&child_path, &child_location)?;
        }
        Ok(())
    }

    fn move_file(&self, from: &str, to: &str) -> Result<(), DiskError> {
        let from = lpath::normalize(from)?;
        let to = lpath::normalize(to)?;

        let from_location = self.resolve(&from)?;
        if from_location.is_absent() {
            return Err(DiskError::NotFound(from));
        }
        if self.location_is_directory(&from_location)? {
            return Err(DiskError::IsADirectory(from));
        }
        if !self.resolve(&to)?.is_absent() {
            return Err(DiskError::AlreadyExists(to));
        }
        self.require_parent_dir(&to)?;
        if let Some(parent) = lpath::parent(&to) {
            self.ensure_parents(parent)?;
        }

        self.move_file_resolved(&from, &from_location, &to)
    }

    fn move_directory(&self, from: &str, to: &str) -> Result<(), DiskError> {
        let from = lpath::normalize(from)?;
        let to = lpath::normalize(to)?;

        let from_location = self.resolve(&from)?;
        if from_location.is_absent() {
            return Err(DiskError::NotFound(from));
        }
        if !self.location_is_directory(&from_location)? {
            return Err(DiskError::NotADirectory(from));
        }
        if !self.resolve(&to)?.is_absent() {
            return Err(DiskError::AlreadyExists(to));
        }

        self.move_directory_resolved(&from, &to)
    }

    fn replace_file(&self, from: &str, to: &str) -> Result<(), DiskError> {
        self.remove_file_if_exists(to)?;
        self.move_file(from, to)
    }

    fn list_files(&self, path: &str) -> Result<Vec<String>, DiskError> {
        let (dir, location) = self.resolve_directory(path)?;
        let children = merged_children(&*self.base, &*self.diff, &self.index, &dir, &location)?;
        Ok(children.into_iter().map(|entry| entry.name).collect())
    }

    fn iterate_directory(&self, path: &str) -> Result<DirectoryIterator, DiskError> {
        let (dir, location) = self.resolve_directory(path)?;
        let children = merged_children(&*self.base, &*self.diff, &self.index, &dir, &location)?;
        let paths = entry_paths(&dir, children);
        Ok(Box::new(paths.into_iter().map(Ok)))
    }

    fn read_file(
        &self,
        path: &str,
        settings: ReadSettings,
        read_hint: Option<u64>,
        file_size: Option<u64>,
    ) -> Result<Box<dyn ReadStream>, DiskError> {
        let normalized = lpath::normalize(path)?;
        match self.resolve(&normalized)? {
            Location::Absent => Err(DiskError::NotFound(normalized)),
            Location::Base { base_path } => {
                self.base.read_file(&base_path, settings, read_hint, file_size)
            }
            Location::Diff { diff_path } => {
                self.diff.read_file(&diff_path, settings, read_hint, file_size)
            }
            Location::Stacked {
                base_path,
                diff_path,
            } => {
                let base = self.base.read_file(&base_path, settings.clone(), None, None)?;
                let diff = self.diff.read_file(&diff_path, settings, None, None)?;
                Ok(Box::new(OverlayReadStream::new(base, diff)))
            }
        }
    }

    fn write_file(
        &self,
        path: &str,
        buf_size: usize,
        mode: WriteMode,
        settings: WriteSettings,
    ) -> Result<Box<dyn WriteStream>, DiskError> {
        let path = lpath::normalize(path)?;
        let location = self.resolve(&path)?;

        if mode == WriteMode::Append {
            match &location {
                // Keep the base prefix readable: the new diff file is a
                // suffix, so the path must stay untracked.
                Location::Base { .. } => {
                    if let Some(parent) = lpath::parent(&path) {
                        self.ensure_parents(parent)?;
                    }
                    debug!(path = %path, "Appending diff suffix to base file");
                    return self.diff.write_file(&path, buf_size, WriteMode::Append, settings);
                }
                Location::Diff { diff_path } | Location::Stacked { diff_path, .. } => {
                    let diff_path = diff_path.clone();
                    return self
                        .diff
                        .write_file(&diff_path, buf_size, WriteMode::Append, settings);
                }
                Location::Absent => {}
            }
        }

        // Rewrite, or append to an absent path: the diff copy at the
        // logical path becomes the whole file.
        if location.is_absent() {
            self.require_parent_dir(&path)?;
        }
        if let Some(parent) = lpath::parent(&path) {
            self.ensure_parents(parent)?;
        }
        // A rewrite orphans any renamed-away diff physical file.
        if let Some(target) = self.rename.get(&path)? {
            if let Some(old_diff) = target.diff {
                if old_diff != path {
                    self.diff.remove_file_if_exists(&old_diff)?;
                }
            }
        }
        let stream = self
            .diff
            .write_file(&path, buf_size, WriteMode::Rewrite, settings)?;
        self.rename.remove(&path)?;
        self.index.clear_tombstone(&path)?;
        self.index.set_tracked(&path)?;

        debug!(path = %path, "Opened rewrite stream");
        Ok(stream)
    }

    fn remove_file(&self, path: &str) -> Result<(), DiskError> {
        let path = lpath::normalize(path)?;
        let location = self.resolve(&path)?;
        if location.is_absent() {
            return Err(DiskError::NotFound(path));
        }
        if self.location_is_directory(&location)? {
            return Err(DiskError::IsADirectory(path));
        }

        if let Some(diff_path) = location.diff_path() {
            self.diff.remove_file(diff_path)?;
        }
        self.rename.remove(&path)?;
        self.index.clear_tracked(&path)?;
        self.index.set_tombstone(&path)?;

        debug!(path = %path, "Removed file");
        Ok(())
    }

    fn remove_file_if_exists(&self, path: &str) -> Result<(), DiskError> {
        match self.remove_file(path) {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        }
    }

    fn remove_directory(&self, path: &str) -> Result<(), DiskError> {
        let (dir, location) = self.resolve_directory(path)?;
        let children = merged_children(&*self.base, &*self.diff, &self.index, &dir, &location)?;
        if !children.is_empty() {
            return Err(DiskError::DirectoryNotEmpty(dir));
        }

        if let Some(diff_path) = location.diff_path() {
            self.diff.remove_directory(diff_path)?;
        }
        self.index.clear_tracked(&dir)?;
        self.index.set_tombstone(&dir)?;
        Ok(())
    }

    fn remove_recursive(&self, path: &str) -> Result<(), DiskError> {
        let path = lpath::normalize(path)?;
        let location = self.resolve(&path)?;
        if location.is_absent() {
            return Err(DiskError::NotFound(path));
        }
        self.remove_recursive_resolved(&path, &location)
    }

    fn set_last_modified(&self, path: &str, time: SystemTime) -> Result<(), DiskError> {
        let path = lpath::normalize(path)?;
        let location = self.resolve(&path)?;
        match location.diff_path() {
            Some(diff_path) => self.diff.set_last_modified(diff_path, time),
            None if location.is_absent() => Err(DiskError::NotFound(path)),
            None => {
                // Base-resident entry: materialize the diff side, then stamp
                // it there. Content and size are unaffected.
                if self.location_is_directory(&location)? {
                    self.ensure_parents(&path)?;
                } else {
                    self.ensure_file(&path)?;
                }
                self.diff.set_last_modified(&path, time)
            }
        }
    }

    fn get_last_modified(&self, path: &str) -> Result<SystemTime, DiskError> {
        let normalized = lpath::normalize(path)?;
        let location = self.resolve(&normalized)?;
        if let Some(diff_path) = location.diff_path() {
            return self.diff.get_last_modified(diff_path);
        }
        if let Some(base_path) = location.base_path() {
            return self.base.get_last_modified(base_path);
        }
        Err(DiskError::NotFound(normalized))
    }

    fn create_hard_link(&self, src: &str, dst: &str) -> Result<(), DiskError> {
        let src = lpath::normalize(src)?;
        let dst = lpath::normalize(dst)?;

        let src_location = self.resolve(&src)?;
        if src_location.is_absent() {
            return Err(DiskError::NotFound(src));
        }
        if self.location_is_directory(&src_location)? {
            return Err(DiskError::IsADirectory(src));
        }
        if !self.resolve(&dst)?.is_absent() {
            return Err(DiskError::AlreadyExists(dst));
        }
        self.require_parent_dir(&dst)?;
        if let Some(parent) = lpath::parent(&dst) {
            self.ensure_parents(parent)?;
        }

        // The diff part is a real hard link; a base part is aliased, with a
        // placeholder when there is no diff part to link.
        match src_location.diff_path() {
            Some(diff_path) => self.diff.create_hard_link(diff_path, &dst)?,
            None => self.diff.create_file(&dst)?,
        }
        match src_location.base_path() {
            Some(base_path) => self.rename.set(&dst, &RenameTarget::base_alias(base_path))?,
            None => self.rename.remove(&dst)?,
        }
        self.index.clear_tombstone(&dst)?;
        self.index.set_tracked(&dst)?;

        debug!(src = %src, dst = %dst, "Created hard link");
        Ok(())
    }

    fn supports_parallel_write(&self) -> bool {
        self.base.supports_parallel_write() && self.diff.supports_parallel_write()
    }

    fn is_remote(&self) -> bool {
        self.base.is_remote() || self.diff.is_remote()
    }
}
