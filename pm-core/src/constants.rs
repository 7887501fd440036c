//! Constants and default values for pcimap
//!
//! Paths, sentinels and attribute names used across the crate.

/// Filesystem locations
pub mod paths {
    /// Proxmox VE cluster-wide PCI mapping file
    pub const MAPPING_FILE: &str = "/etc/pve/mapping/pci.cfg";

    /// Default location of the pcimap settings file
    pub const SETTINGS_FILE: &str = "/etc/pcimap/settings.json";

    /// Environment variable overriding the settings file location
    pub const SETTINGS_ENV: &str = "PCIMAP_CONFIG";

    /// sysfs directory with one entry per PCI function
    pub const PCI_SYSFS_ROOT: &str = "/sys/bus/pci/devices";

    /// Hostname sources tried after uname(2)
    pub const HOSTNAME_FILES: &[&str] = &["/proc/sys/kernel/hostname", "/etc/hostname"];
}

/// Hardware enumeration defaults
pub mod inventory {
    /// Enumeration program
    pub const LSPCI_PROGRAM: &str = "lspci";

    /// Machine-readable stanzas with numeric ids and full domain addresses
    pub const LSPCI_STANZA_ARGS: &[&str] = &["-vmm", "-nn", "-D"];

    /// One line per device with numeric ids and full domain addresses
    pub const LSPCI_COMPACT_ARGS: &[&str] = &["-Dnn"];

    /// PCI domain assumed when a slot address omits it
    pub const DEFAULT_DOMAIN: &str = "0000";
}

/// Sentinel values written when a fact could not be determined
pub mod sentinel {
    /// Unknown hostname or IOMMU group
    pub const UNKNOWN: &str = "unknown";

    /// Numeric form of an unknown IOMMU group accepted on input
    pub const UNKNOWN_IOMMU_GROUP: i64 = -1;
}

/// Attribute names understood in mapping entries
pub mod attr {
    pub const ID: &str = "id";
    pub const IOMMU_GROUP: &str = "iommugroup";
    pub const NODE: &str = "node";
    pub const PATH: &str = "path";
    pub const SUBSYSTEM_ID: &str = "subsystem-id";
}

/// Recognized attributes, in the order they are written back
pub const DEVICE_ATTR_NAMES: [&str; 5] = [
    attr::ID,
    attr::IOMMU_GROUP,
    attr::NODE,
    attr::PATH,
    attr::SUBSYSTEM_ID,
];

/// Whether `name` is one of the attributes refreshed from hardware
pub fn is_device_attr(name: &str) -> bool {
    DEVICE_ATTR_NAMES.contains(&name)
}
