//! Reconciliation of live inventory against the mapping file
//!
//! [`correlate`] builds the plan, [`engine`] applies it, and [`Reconciler`]
//! wires both to the collaborators for a full run.

mod correlate;
pub mod engine;

pub use correlate::{correlate, PlanRow, ReconciliationPlan};
pub use engine::{apply, commit, derive_path, diff, execute, merge, preview, AttributeChange, Outcome};

use pm_error::Result;
use tracing::info;

use crate::inventory::{collect_inventory, DeviceRecord, InventoryFormat, InventorySource, IommuResolver};
use crate::report::{Report, Warning};
use crate::store::MappingStore;
use crate::system::{current_node, HostIdentity};

/// Reconcile already-collected `records` against the store's contents
///
/// An empty or missing mapping file is reported as a warning and leaves the
/// file untouched.
pub fn reconcile(
    store: &MappingStore,
    records: &[DeviceRecord],
    dry_run: bool,
    report: &mut Report,
) -> Result<Outcome> {
    let decoded = store.load()?;
    report.extend(decoded.warnings);

    let (plan, warnings) = correlate(&decoded.entries, records);
    report.extend(warnings);

    if plan.is_empty() {
        report.push(Warning::EmptyMapping {
            path: store.path().to_path_buf(),
        });
    } else {
        info!(
            "Matched {} of {} mapping entries against {} device(s)",
            plan.matched(),
            plan.len(),
            records.len()
        );
    }

    execute(&plan, store, dry_run)
}

/// A full run: collect inventory through the collaborators, then reconcile
pub struct Reconciler<'a> {
    source: &'a dyn InventorySource,
    host: &'a dyn HostIdentity,
    iommu: Option<&'a dyn IommuResolver>,
    format: InventoryFormat,
}

impl<'a> Reconciler<'a> {
    pub fn new(source: &'a dyn InventorySource, host: &'a dyn HostIdentity) -> Self {
        Self {
            source,
            host,
            iommu: None,
            format: InventoryFormat::default(),
        }
    }

    /// Look up IOMMU groups the enumeration output did not include
    pub fn with_iommu(mut self, resolver: &'a dyn IommuResolver) -> Self {
        self.iommu = Some(resolver);
        self
    }

    pub fn with_format(mut self, format: InventoryFormat) -> Self {
        self.format = format;
        self
    }

    /// Current devices, stamped with this host's node name
    pub fn inventory(&self, report: &mut Report) -> Result<Vec<DeviceRecord>> {
        let node = current_node(self.host, report);
        let parsed = collect_inventory(self.source, self.format, &node, self.iommu)?;
        report.extend(parsed.warnings);
        Ok(parsed.records)
    }

    /// Collect and reconcile; a collection failure returns before the
    /// mapping file is read
    pub fn run(&self, store: &MappingStore, dry_run: bool, report: &mut Report) -> Result<Outcome> {
        let records = self.inventory(report)?;
        reconcile(store, &records, dry_run, report)
    }
}
