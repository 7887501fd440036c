//! IOMMU group lookup
//!
//! `lspci -vmm` only prints `IOMMUGroup` on newer pciutils. Records that
//! come back without one are looked up through an [`IommuResolver`].

use std::fs;
use std::path::PathBuf;
use tracing::{debug, trace};

use super::types::{DeviceRecord, IommuGroup};

/// Attribute provider for IOMMU groups
#[cfg_attr(test, mockall::automock)]
pub trait IommuResolver {
    /// Group of the function at `slot`, or `Unknown`
    fn group_for(&self, slot: &str) -> IommuGroup;
}

/// Reads `<root>/<slot>/iommu_group`, a symlink to `.../iommu_groups/<n>`
#[derive(Debug, Clone)]
pub struct SysfsIommuResolver {
    root: PathBuf,
}

impl SysfsIommuResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl IommuResolver for SysfsIommuResolver {
    fn group_for(&self, slot: &str) -> IommuGroup {
        let link = self.root.join(slot).join("iommu_group");
        match fs::read_link(&link) {
            Ok(target) => target
                .file_name()
                .and_then(|name| name.to_str())
                .map(IommuGroup::parse)
                .unwrap_or_default(),
            Err(e) => {
                trace!("No IOMMU group link at {:?}: {}", link, e);
                IommuGroup::Unknown
            }
        }
    }
}

/// Fill in unknown groups for records that have a slot
pub fn resolve_iommu_groups(records: &mut [DeviceRecord], resolver: &dyn IommuResolver) {
    let mut resolved = 0;
    for record in records
        .iter_mut()
        .filter(|r| !r.iommu_group.is_known() && !r.slot_path.is_empty())
    {
        record.iommu_group = resolver.group_for(&record.slot_path);
        if record.iommu_group.is_known() {
            resolved += 1;
        }
    }
    debug!("Resolved {} IOMMU group(s)", resolved);
}
