//! Tool settings
//!
//! Optional JSON file; every field has a default so an absent file or a
//! partial one both work. The location is, in order: an explicit path,
//! `$PCIMAP_CONFIG`, then `/etc/pcimap/settings.json`.

use pm_error::{PcimapError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{inventory, paths};
use crate::inventory::{InventoryFormat, LspciSource, SysfsIommuResolver};
use crate::store::MappingStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mapping file to reconcile
    pub mapping_file: PathBuf,
    /// Enumeration program
    pub lspci_program: String,
    /// Arguments passed to the enumeration program; unset means the
    /// arguments matching `inventory_format`
    pub lspci_args: Option<Vec<String>>,
    /// Shape of the enumeration output
    pub inventory_format: InventoryFormat,
    /// sysfs directory holding per-device `iommu_group` links
    pub pci_sysfs_root: PathBuf,
    /// Look up IOMMU groups the enumeration output lacks
    pub resolve_iommu_groups: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mapping_file: PathBuf::from(paths::MAPPING_FILE),
            lspci_program: inventory::LSPCI_PROGRAM.to_string(),
            lspci_args: None,
            inventory_format: InventoryFormat::Stanza,
            pci_sysfs_root: PathBuf::from(paths::PCI_SYSFS_ROOT),
            resolve_iommu_groups: true,
        }
    }
}

impl Settings {
    /// Reject values that cannot possibly work
    pub fn validate(&self) -> Result<()> {
        if self.mapping_file.as_os_str().is_empty() {
            return Err(PcimapError::invalid_config("mapping_file", "must not be empty"));
        }
        if self.mapping_file.file_name().is_none() {
            return Err(PcimapError::invalid_config(
                "mapping_file",
                format!("{} does not name a file", self.mapping_file.display()),
            ));
        }
        if self.lspci_program.trim().is_empty() {
            return Err(PcimapError::invalid_config("lspci_program", "must not be empty"));
        }
        Ok(())
    }

    pub fn mapping_store(&self) -> MappingStore {
        MappingStore::new(&self.mapping_file)
    }

    /// Configured arguments, or the ones producing `inventory_format`
    pub fn effective_lspci_args(&self) -> Vec<String> {
        match &self.lspci_args {
            Some(args) => args.clone(),
            None => {
                let defaults = match self.inventory_format {
                    InventoryFormat::Stanza => inventory::LSPCI_STANZA_ARGS,
                    InventoryFormat::Compact => inventory::LSPCI_COMPACT_ARGS,
                };
                defaults.iter().map(|arg| arg.to_string()).collect()
            }
        }
    }

    pub fn inventory_source(&self) -> LspciSource {
        LspciSource::new(self.lspci_program.clone(), self.effective_lspci_args())
    }

    pub fn iommu_resolver(&self) -> Option<SysfsIommuResolver> {
        self.resolve_iommu_groups
            .then(|| SysfsIommuResolver::new(&self.pci_sysfs_root))
    }
}

/// Settings file location for this process
pub fn get_settings_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(paths::SETTINGS_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(paths::SETTINGS_FILE),
    }
}

/// Load settings from `path`; a missing file yields the defaults
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No settings file at {:?}, using defaults", path);
            return Ok(Settings::default());
        }
        Err(e) => {
            return Err(PcimapError::config(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            )))
        }
    };

    let settings: Settings = serde_json::from_str(&content).map_err(|e| {
        PcimapError::config(format!(
            "Failed to parse settings JSON {}: {}",
            path.display(),
            e
        ))
    })?;
    settings.validate()?;

    debug!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Resolve the settings location and load it
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    load_settings_from(&get_settings_path(explicit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.mapping_file, PathBuf::from("/etc/pve/mapping/pci.cfg"));
        assert_eq!(settings.lspci_program, "lspci");
        assert_eq!(settings.lspci_args, None);
        assert_eq!(settings.effective_lspci_args(), vec!["-vmm", "-nn", "-D"]);
        assert_eq!(settings.inventory_format, InventoryFormat::Stanza);
        assert!(settings.resolve_iommu_groups);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "mapping_file": "/tmp/pci.cfg", "inventory_format": "compact" }"#,
        )
        .unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.mapping_file, PathBuf::from("/tmp/pci.cfg"));
        assert_eq!(settings.inventory_format, InventoryFormat::Compact);
        assert_eq!(settings.lspci_program, "lspci");
    }

    #[test]
    fn test_compact_format_gets_compact_args() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "inventory_format": "compact" }"#).unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.effective_lspci_args(), vec!["-Dnn"]);

        let listing = "0000:04:00.0 VGA compatible controller [0300]: NVIDIA Corporation AD104 [10de:2882] (rev a1)\n";
        let parsed = crate::inventory::parse_inventory(listing, settings.inventory_format, "pve1");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].vendor_device_id, "10de:2882");
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_explicit_args_win_over_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "inventory_format": "compact", "lspci_args": ["-Dnn", "-s", "04:"] }"#,
        )
        .unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.effective_lspci_args(), vec!["-Dnn", "-s", "04:"]);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_settings_from(&path).unwrap_err();
        assert!(matches!(err, PcimapError::Config(_)));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_validate_rejects_empty_program() {
        let settings = Settings {
            lspci_program: " ".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(PcimapError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_iommu_resolver_follows_flag() {
        let mut settings = Settings::default();
        assert!(settings.iommu_resolver().is_some());
        settings.resolve_iommu_groups = false;
        assert!(settings.iommu_resolver().is_none());
    }

    #[test]
    #[serial]
    fn test_settings_path_resolution() {
        std::env::remove_var("PCIMAP_CONFIG");
        assert_eq!(get_settings_path(None), PathBuf::from("/etc/pcimap/settings.json"));

        std::env::set_var("PCIMAP_CONFIG", "/custom/pcimap.json");
        assert_eq!(get_settings_path(None), PathBuf::from("/custom/pcimap.json"));
        assert_eq!(
            get_settings_path(Some(Path::new("/explicit.json"))),
            PathBuf::from("/explicit.json")
        );
        std::env::remove_var("PCIMAP_CONFIG");
    }
}
