//! The ambient disks map configuration resolves collaborators from.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use strata_core::DiskError;
use tracing::debug;

use crate::disk::Disk;
use crate::local::LocalDisk;

/// Configuration for a [`LocalDisk`].
#[derive(Debug, Clone, Deserialize)]
pub struct LocalDiskConfig {
    /// Root directory of the disk
    pub path: PathBuf,
}

/// A named map of live disks.
///
/// Composite disks (overlays, and whatever stacks on top of them) resolve
/// their child disks from here by name.
#[derive(Default)]
pub struct DiskRegistry {
    disks: RwLock<HashMap<String, Arc<dyn Disk>>>,
}

impl DiskRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a disk under its own name, replacing any previous entry.
    pub fn register(&self, disk: Arc<dyn Disk>) {
        let name = disk.name().to_string();
        debug!(name = %name, "Registered disk");
        self.disks.write().insert(name, disk);
    }

    /// Builds and registers a local disk from its configuration.
    pub fn register_local(&self, name: &str, config: &LocalDiskConfig) -> Result<(), DiskError> {
        let disk = LocalDisk::new(name, config.path.clone())?;
        self.register(Arc::new(disk));
        Ok(())
    }

    /// Resolves a disk by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Disk>, DiskError> {
        self.disks
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| DiskError::Config(format!("unknown disk: {name}")))
    }

    /// Returns the registered disk names, unordered.
    pub fn names(&self) -> Vec<String> {
        self.disks.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_register_and_resolve() {
        let dir = TempDir::new().unwrap();
        let registry = DiskRegistry::new();

        registry
            .register_local(
                "scratch",
                &LocalDiskConfig {
                    path: dir.path().join("scratch"),
                },
            )
            .unwrap();

        assert_eq!(registry.get("scratch").unwrap().name(), "scratch");
        assert!(matches!(
            registry.get("missing"),
            Err(DiskError::Config(_))
        ));
    }
}
