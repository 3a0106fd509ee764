//! Test bed wiring a complete overlay out of temp-directory disks.

use std::io::{Read, Write};
use std::sync::Arc;

use strata_disk::{
    Disk, DiskMetadataStore, LocalDisk, ReadSettings, WriteMode, WriteSettings,
};
use strata_overlay::OverlayDisk;
use tempfile::TempDir;
use tracing::info;

/// A base disk, a diff disk, two metadata disks and the overlay over them,
/// all rooted inside one temporary directory.
pub struct TestBed {
    dir: TempDir,
    /// The read-only side; tests seed it directly.
    pub base: Arc<dyn Disk>,
    /// The mutable side; tests inspect it directly.
    pub diff: Arc<dyn Disk>,
    /// The overlay under test.
    pub overlay: Arc<OverlayDisk>,
}

impl TestBed {
    /// Builds a fresh test bed.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");

        let base: Arc<dyn Disk> =
            Arc::new(LocalDisk::new("base", dir.path().join("base")).expect("base disk"));
        let diff: Arc<dyn Disk> =
            Arc::new(LocalDisk::new("diff", dir.path().join("diff")).expect("diff disk"));

        let overlay = Arc::new(OverlayDisk::new(
            "overlay",
            Arc::clone(&base),
            Arc::clone(&diff),
            metadata_store(&dir, "meta"),
            metadata_store(&dir, "tracked"),
        ));

        info!(root = %dir.path().display(), "Built overlay test bed");
        Self {
            dir,
            base,
            diff,
            overlay,
        }
    }

    /// Builds a second overlay stacked on top of this one: the existing
    /// overlay becomes the read-only base of the returned overlay, whose
    /// diff and metadata live in fresh directories of the same temp root.
    pub fn stack(&self) -> Arc<OverlayDisk> {
        let upper_diff: Arc<dyn Disk> = Arc::new(
            LocalDisk::new("upper-diff", self.dir.path().join("upper-diff"))
                .expect("upper diff disk"),
        );
        Arc::new(OverlayDisk::new(
            "upper",
            Arc::clone(&self.overlay) as Arc<dyn Disk>,
            upper_diff,
            metadata_store(&self.dir, "upper-meta"),
            metadata_store(&self.dir, "upper-tracked"),
        ))
    }
}

impl Default for TestBed {
    fn default() -> Self {
        Self::new()
    }
}

fn metadata_store(dir: &TempDir, name: &str) -> Arc<DiskMetadataStore> {
    let disk: Arc<dyn Disk> =
        Arc::new(LocalDisk::new(name, dir.path().join(name)).expect("metadata disk"));
    Arc::new(DiskMetadataStore::new(disk))
}

/// Writes `data` to `path` on `disk` through a rewrite stream.
pub fn write_file(disk: &dyn Disk, path: &str, data: &[u8]) {
    let mut stream = disk
        .write_file(path, 4096, WriteMode::Rewrite, WriteSettings::default())
        .expect("open write stream");
    stream.write_all(data).expect("write");
    stream.finalize().expect("finalize");
}

/// Appends `data` to `path` on `disk`.
pub fn append_file(disk: &dyn Disk, path: &str, data: &[u8]) {
    let mut stream = disk
        .write_file(path, 4096, WriteMode::Append, WriteSettings::default())
        .expect("open append stream");
    stream.write_all(data).expect("append");
    stream.finalize().expect("finalize");
}

/// Reads the whole file at `path` on `disk`.
pub fn read_file(disk: &dyn Disk, path: &str) -> Vec<u8> {
    let mut stream = disk
        .read_file(path, ReadSettings::default(), None, None)
        .expect("open read stream");
    let mut out = Vec::new();
    stream.read_to_end(&mut out).expect("read");
    out
}

/// Lists a directory and sorts the names.
pub fn sorted_list(disk: &dyn Disk, dir: &str) -> Vec<String> {
    let mut names = disk.list_files(dir).expect("list");
    names.sort();
    names
}
