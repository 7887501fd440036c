//! Inventory data types

use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

use crate::constants::{inventory, sentinel};

/// IOMMU group of a PCI function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IommuGroup {
    Group(u32),
    #[default]
    Unknown,
}

impl IommuGroup {
    /// Parse a group number; anything that is not a non-negative integer
    /// (including the `-1` sentinel) is unknown.
    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<i64>() {
            Ok(sentinel::UNKNOWN_IOMMU_GROUP) | Err(_) => IommuGroup::Unknown,
            Ok(group) => u32::try_from(group)
                .map(IommuGroup::Group)
                .unwrap_or(IommuGroup::Unknown),
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, IommuGroup::Group(_))
    }
}

impl fmt::Display for IommuGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IommuGroup::Group(group) => write!(f, "{}", group),
            IommuGroup::Unknown => f.write_str(sentinel::UNKNOWN),
        }
    }
}

impl Serialize for IommuGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IommuGroup::Group(group) => serializer.serialize_u32(*group),
            IommuGroup::Unknown => serializer.serialize_str(sentinel::UNKNOWN),
        }
    }
}

/// A parsed `domain:bus:device.function` address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PciAddress {
    pub domain: String,
    pub bus: String,
    pub device: String,
    pub function: String,
}

fn pci_address_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^(?:([0-9a-fA-F]{4,}):)?([0-9a-fA-F]{2}):([0-9a-fA-F]{2})\.([0-7])$").ok()
        })
        .as_ref()
}

impl PciAddress {
    /// Parse a slot address; the domain defaults to 0000 when omitted and may
    /// be wider than four digits (VMD domains)
    pub fn parse(slot: &str) -> Option<Self> {
        let caps = pci_address_pattern()?.captures(slot.trim())?;
        Some(Self {
            domain: caps
                .get(1)
                .map(|m| m.as_str().to_ascii_lowercase())
                .unwrap_or_else(|| inventory::DEFAULT_DOMAIN.to_string()),
            bus: caps[2].to_ascii_lowercase(),
            device: caps[3].to_ascii_lowercase(),
            function: caps[4].to_string(),
        })
    }

    /// Token stored in the mapping file's `path` attribute
    ///
    /// The function number is dropped so the mapping covers the whole device:
    /// `0000:04:00.0` becomes `0000:0400`.
    pub fn path_token(&self) -> String {
        format!("{}:{}{}", self.domain, self.bus, self.device)
    }
}

impl fmt::Display for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}.{}", self.domain, self.bus, self.device, self.function)
    }
}

/// One PCI function observed in the current inventory snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    /// Bus address, e.g. "0000:04:00.0" (empty if the stanza had no slot)
    pub slot_path: String,
    /// "vendor:device" in lower-case hex (empty if unavailable)
    pub vendor_device_id: String,
    /// Human-readable description
    pub display_name: String,
    /// "svendor:sdevice", or the vendor/device id when unavailable
    pub subsystem_id: String,
    pub iommu_group: IommuGroup,
    /// Hostname of the machine the device was observed on
    pub node: String,
}

impl DeviceRecord {
    /// Whether the record carries both fields needed to refresh an entry
    pub fn is_matchable(&self) -> bool {
        !self.slot_path.is_empty() && !self.vendor_device_id.is_empty()
    }
}
