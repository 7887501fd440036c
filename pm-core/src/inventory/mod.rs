//! Hardware inventory: collection, parsing and enrichment
//!
//! Turns the output of the enumeration collaborator into [`DeviceRecord`]s.

mod iommu;
mod parser;
mod source;
mod types;

pub use iommu::{resolve_iommu_groups, IommuResolver, SysfsIommuResolver};
pub use parser::{parse_compact, parse_inventory, parse_stanzas, InventoryFormat, ParsedInventory};
pub use source::{InventorySource, LspciSource};
pub use types::{DeviceRecord, IommuGroup, PciAddress};

#[cfg(test)]
pub use iommu::MockIommuResolver;
#[cfg(test)]
pub use source::MockInventorySource;

use pm_error::Result;
use tracing::info;

/// Collect, parse and enrich the current inventory
///
/// Fails only when the source cannot produce output at all. Parse problems
/// come back as warnings inside [`ParsedInventory`].
pub fn collect_inventory(
    source: &dyn InventorySource,
    format: InventoryFormat,
    node: &str,
    resolver: Option<&dyn IommuResolver>,
) -> Result<ParsedInventory> {
    let text = source.collect()?;
    let mut parsed = parse_inventory(&text, format, node);

    if let Some(resolver) = resolver {
        resolve_iommu_groups(&mut parsed.records, resolver);
    }

    info!(
        "Inventory from {}: {} device(s)",
        source.name(),
        parsed.records.len()
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pm_error::PcimapError;

    #[test]
    fn test_collect_inventory_enriches_groups() {
        let mut source = MockInventorySource::new();
        source.expect_name().return_const("lspci".to_string());
        source
            .expect_collect()
            .returning(|| Ok("Slot:\t0000:04:00.0\nVendor:\t10de\nDevice:\t2882\n".to_string()));

        let mut resolver = MockIommuResolver::new();
        resolver.expect_group_for().return_const(IommuGroup::Group(9));

        let parsed =
            collect_inventory(&source, InventoryFormat::Stanza, "pve1", Some(&resolver)).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].iommu_group, IommuGroup::Group(9));
    }

    #[test]
    fn test_collect_inventory_surfaces_collection_failure() {
        let mut source = MockInventorySource::new();
        source.expect_name().return_const("lspci".to_string());
        source
            .expect_collect()
            .returning(|| Err(PcimapError::collection("lspci", "not installed")));

        let err = collect_inventory(&source, InventoryFormat::Stanza, "pve1", None).unwrap_err();
        assert!(err.is_collection_failure());
    }
}
