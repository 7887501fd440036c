//! Applying a reconciliation plan
//!
//! Matched entries get the five hardware attributes refreshed; everything
//! else on the entry, and every unmatched entry, is left exactly as read.

use pm_error::Result;
use serde::Serialize;
use std::fmt::Write as _;
use tracing::info;

use super::correlate::{PlanRow, ReconciliationPlan};
use crate::constants::attr;
use crate::inventory::{DeviceRecord, PciAddress};
use crate::store::{MappingEntry, MappingStore};

/// Mapping file `path` token for a slot address
///
/// `0000:04:00.0` becomes `0000:0400`. Slots that are not a PCI address are
/// written with the function separator removed.
pub fn derive_path(slot: &str) -> String {
    match PciAddress::parse(slot) {
        Some(addr) => addr.path_token(),
        None => slot.trim().replace('.', ""),
    }
}

/// Freshly observed values of the recognized attributes
pub fn refreshed_attributes(record: &DeviceRecord) -> [(&'static str, String); 5] {
    [
        (attr::ID, record.vendor_device_id.clone()),
        (attr::IOMMU_GROUP, record.iommu_group.to_string()),
        (attr::NODE, record.node.clone()),
        (attr::PATH, derive_path(&record.slot_path)),
        (attr::SUBSYSTEM_ID, record.subsystem_id.clone()),
    ]
}

/// `entry` with the recognized attributes replaced from `record`
pub fn merge(entry: &MappingEntry, record: &DeviceRecord) -> MappingEntry {
    let mut merged = entry.clone();
    for (key, value) in refreshed_attributes(record) {
        merged.set(key, value);
    }
    merged
}

/// A single attribute that would change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeChange {
    pub key: &'static str,
    pub old: Option<String>,
    pub new: String,
}

/// Attributes of `entry` that differ from what `record` reports
pub fn diff(entry: &MappingEntry, record: &DeviceRecord) -> Vec<AttributeChange> {
    refreshed_attributes(record)
        .into_iter()
        .filter(|(key, value)| entry.get(key) != Some(value.as_str()))
        .map(|(key, new)| AttributeChange {
            key,
            old: entry.get(key).map(str::to_string),
            new,
        })
        .collect()
}

fn row_changes(row: &PlanRow) -> Vec<AttributeChange> {
    row.device
        .as_ref()
        .map(|record| diff(&row.entry, record))
        .unwrap_or_default()
}

/// Updated entry set, same labels in the same order
pub fn apply(plan: &ReconciliationPlan) -> Vec<MappingEntry> {
    plan.rows()
        .iter()
        .map(|row| match &row.device {
            Some(record) => merge(&row.entry, record),
            None => row.entry.clone(),
        })
        .collect()
}

/// Number of entries that `apply` would modify
pub fn changed_entries(plan: &ReconciliationPlan) -> usize {
    plan.rows()
        .iter()
        .filter(|row| !row_changes(row).is_empty())
        .count()
}

/// Human-readable description of what `apply` would do
pub fn preview(plan: &ReconciliationPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} of {} entries would change",
        changed_entries(plan),
        plan.len()
    );

    for row in plan.rows() {
        match &row.device {
            None => {
                let id = row.entry.device_id().unwrap_or("none");
                let _ = writeln!(out, "{}: no matching device (id {}), unchanged", row.label(), id);
            }
            Some(record) => {
                let changes = diff(&row.entry, record);
                if changes.is_empty() {
                    let _ = writeln!(out, "{} ({}): up to date", row.label(), record.slot_path);
                    continue;
                }
                let _ = writeln!(
                    out,
                    "{} ({} {})",
                    row.label(),
                    record.slot_path,
                    record.display_name
                );
                for change in changes {
                    let _ = writeln!(
                        out,
                        "\t{}: {} -> {}",
                        change.key,
                        change.old.as_deref().unwrap_or("(unset)"),
                        change.new
                    );
                }
            }
        }
    }
    out
}

/// Result of running the engine over a plan
#[derive(Debug, Clone, Default, Serialize)]
pub struct Outcome {
    /// Entry set after merging, whether or not it was written
    pub entries: Vec<MappingEntry>,
    /// Entries whose attributes changed
    pub changed: usize,
    /// Whether the mapping file was rewritten
    pub written: bool,
    /// Dry-run rendering, present only in dry-run mode
    pub preview: Option<String>,
}

/// Write the merged entry set in place of the store's current contents
///
/// The replacement is atomic: on failure the previous file is left intact.
pub fn commit(entries: &[MappingEntry], store: &MappingStore) -> Result<()> {
    store.save(entries)
}

/// Apply the plan and either preview it or persist it
///
/// Dry runs never touch the store. A plan with no changes is not written,
/// which leaves the file (comments included) exactly as it was.
pub fn execute(plan: &ReconciliationPlan, store: &MappingStore, dry_run: bool) -> Result<Outcome> {
    let entries = apply(plan);
    let changed = changed_entries(plan);

    if dry_run {
        info!("Dry run: {} entry(ies) would change, nothing written", changed);
        return Ok(Outcome {
            entries,
            changed,
            written: false,
            preview: Some(preview(plan)),
        });
    }

    if changed == 0 {
        info!("{:?} is already up to date", store.path());
        return Ok(Outcome {
            entries,
            changed,
            written: false,
            preview: None,
        });
    }

    commit(&entries, store)?;
    Ok(Outcome {
        entries,
        changed,
        written: true,
        preview: None,
    })
}
