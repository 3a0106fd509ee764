//! Overlay construction from configuration.

use std::sync::Arc;

use serde::Deserialize;
use strata_core::DiskError;
use strata_disk::{DiskMetadataStore, DiskRegistry};

use crate::overlay::OverlayDisk;

/// Names of the four collaborators backing an overlay.
///
/// All four are resolved from the ambient disks map; the two metadata
/// entries name disks that will carry marker files.
#[derive(Debug, Clone, Deserialize)]
pub struct OverlayConfig {
    /// Read-only content disk
    pub base: String,
    /// Mutable content disk
    pub diff: String,
    /// Disk persisting the rename map
    pub metadata: String,
    /// Disk persisting the tombstone and tracked sets
    pub tracked_metadata: String,
}

impl OverlayDisk {
    /// Builds an overlay from a configuration section and a registry.
    pub fn from_config(
        name: &str,
        config: &OverlayConfig,
        registry: &DiskRegistry,
    ) -> Result<Self, DiskError> {
        let base = registry.get(&config.base)?;
        let diff = registry.get(&config.diff)?;
        let metadata = Arc::new(DiskMetadataStore::new(registry.get(&config.metadata)?));
        let tracked_metadata = Arc::new(DiskMetadataStore::new(
            registry.get(&config.tracked_metadata)?,
        ));
        Ok(OverlayDisk::new(
            name,
            base,
            diff,
            metadata,
            tracked_metadata,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_disk::{Disk, LocalDiskConfig};
    use tempfile::TempDir;

    #[test]
    fn test_from_config() {
        let dir = TempDir::new().unwrap();
        let registry = DiskRegistry::new();
        for name in ["base", "diff", "meta", "tracked"] {
            registry
                .register_local(
                    name,
                    &LocalDiskConfig {
                        path: dir.path().join(name),
                    },
                )
                .unwrap();
        }

        let config = OverlayConfig {
            base: "base".to_string(),
            diff: "diff".to_string(),
            metadata: "meta".to_string(),
            tracked_metadata: "tracked".to_string(),
        };
        let overlay = OverlayDisk::from_config("over", &config, &registry).unwrap();
        assert_eq!(overlay.name(), "over");
        assert!(overlay.exists("").unwrap());
    }

    #[test]
    fn test_from_config_unknown_disk() {
        let registry = DiskRegistry::new();
        let config = OverlayConfig {
            base: "nope".to_string(),
            diff: "nope".to_string(),
            metadata: "nope".to_string(),
            tracked_metadata: "nope".to_string(),
        };
        assert!(matches!(
            OverlayDisk::from_config("over", &config, &registry),
            Err(DiskError::Config(_))
        ));
    }
}
