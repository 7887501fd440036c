//! pcimap Core Library
//!
//! Keeps a Proxmox VE PCI resource mapping file in step with the devices
//! actually present on the host.
//!
//! # Module Structure
//!
//! - `inventory/` - Enumeration output: collection, parsing, IOMMU lookup
//! - `store/` - Mapping file model, text codec, atomic persistence
//! - `reconcile/` - Correlating devices to entries and applying the result
//!
//! # Example
//!
//! ```no_run
//! use pm_core::{load_settings, Reconciler, Report, SystemHost};
//!
//! let settings = load_settings(None).unwrap();
//! let source = settings.inventory_source();
//! let host = SystemHost;
//! let mut report = Report::new();
//!
//! let outcome = Reconciler::new(&source, &host)
//!     .with_format(settings.inventory_format)
//!     .run(&settings.mapping_store(), true, &mut report)
//!     .unwrap();
//! print!("{}", outcome.preview.unwrap_or_default());
//! ```

// Grouped modules
pub mod inventory;
pub mod reconcile;
pub mod store;

// Standalone modules
pub mod constants;
pub mod report;
pub mod settings;
pub mod system;

pub use pm_error::{PcimapError, Result};

// Re-export inventory types and functions
pub use inventory::{
    collect_inventory, parse_compact, parse_inventory, parse_stanzas, resolve_iommu_groups,
    DeviceRecord, InventoryFormat, InventorySource, IommuGroup, IommuResolver, LspciSource,
    ParsedInventory, PciAddress, SysfsIommuResolver,
};

// Re-export mapping store types and functions
pub use store::{decode, encode, write_atomic, DecodedMapping, MappingEntry, MappingStore};

// Re-export reconciliation
pub use reconcile::{
    apply, commit, correlate, derive_path, diff, execute, merge, preview, reconcile, AttributeChange,
    Outcome, PlanRow, Reconciler, ReconciliationPlan,
};

pub use report::{Report, Warning};
pub use settings::{get_settings_path, load_settings, load_settings_from, Settings};
pub use system::{current_node, HostIdentity, SystemHost};
