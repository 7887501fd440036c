//! Joining observed devices to existing mapping entries
//!
//! The join key is the vendor/device id. When identical cards are
//! installed, the first one in enumeration order wins and the others stay
//! unbound for this run.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::inventory::DeviceRecord;
use crate::report::Warning;
use crate::store::MappingEntry;

/// One existing entry and the device it was matched to, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanRow {
    pub entry: MappingEntry,
    pub device: Option<DeviceRecord>,
}

impl PlanRow {
    pub fn label(&self) -> &str {
        &self.entry.label
    }

    pub fn is_matched(&self) -> bool {
        self.device.is_some()
    }
}

/// One row per existing entry, in mapping file order
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationPlan {
    rows: Vec<PlanRow>,
}

impl ReconciliationPlan {
    pub fn rows(&self) -> &[PlanRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<PlanRow> {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Number of rows with a device attached
    pub fn matched(&self) -> usize {
        self.rows.iter().filter(|row| row.is_matched()).count()
    }
}

/// First record per id, plus the slots of later records sharing it
struct DeviceIndex<'a> {
    first: HashMap<String, &'a DeviceRecord>,
    shadowed: HashMap<String, Vec<&'a DeviceRecord>>,
}

impl<'a> DeviceIndex<'a> {
    fn build(records: &'a [DeviceRecord]) -> Self {
        let mut first: HashMap<String, &DeviceRecord> = HashMap::new();
        let mut shadowed: HashMap<String, Vec<&DeviceRecord>> = HashMap::new();

        for record in records.iter().filter(|r| r.is_matchable()) {
            let key = record.vendor_device_id.to_ascii_lowercase();
            if first.contains_key(&key) {
                shadowed.entry(key).or_default().push(record);
            } else {
                first.insert(key, record);
            }
        }

        Self { first, shadowed }
    }
}

/// Build the reconciliation plan for `entries` against `records`
///
/// Entries are never added or removed: every entry gets exactly one row,
/// and records that match no entry are ignored.
pub fn correlate(
    entries: &[MappingEntry],
    records: &[DeviceRecord],
) -> (ReconciliationPlan, Vec<Warning>) {
    let index = DeviceIndex::build(records);
    let mut warnings = Vec::new();
    let mut reported: HashSet<String> = HashSet::new();
    let mut rows = Vec::with_capacity(entries.len());

    for entry in entries {
        let key = entry.device_id().map(str::to_ascii_lowercase);
        let device = key.as_ref().and_then(|k| index.first.get(k).copied());

        if let (Some(key), Some(kept)) = (&key, device) {
            if let Some(others) = index.shadowed.get(key) {
                if reported.insert(key.clone()) {
                    warnings.extend(others.iter().map(|other| Warning::DuplicateDeviceId {
                        id: key.clone(),
                        kept_slot: kept.slot_path.clone(),
                        ignored_slot: other.slot_path.clone(),
                    }));
                }
            }
        }

        match device {
            Some(record) => debug!("{} -> {} ({})", entry.label, record.slot_path, record.vendor_device_id),
            None => debug!("{} has no matching device", entry.label),
        }

        rows.push(PlanRow {
            entry: entry.clone(),
            device: device.cloned(),
        });
    }

    (ReconciliationPlan { rows }, warnings)
}
