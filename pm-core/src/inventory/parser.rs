//! Inventory text parsing
//!
//! Two `lspci` output shapes are understood:
//!
//! 1. **Stanza** (`lspci -vmm -nn -D`): one `Key:<TAB>Value` line per field,
//!    devices separated by a blank line. `Key<TAB>Value` and `Key: Value`
//!    are accepted as well.
//! 2. **Compact** (`lspci -Dnn`): one device per line, ids in the last
//!    bracketed `vendor:device` token.
//!
//! Parsing never fails as a whole. Bad lines are skipped with a warning and
//! every stanza that yielded at least one field becomes a record, in the
//! order it appeared.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, trace};

use super::types::{DeviceRecord, IommuGroup, PciAddress};
use crate::report::Warning;

const SOURCE_NAME: &str = "inventory";

/// Shape of the enumeration output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryFormat {
    #[default]
    Stanza,
    Compact,
}

/// Records plus the warnings raised while parsing them
#[derive(Debug, Default, Clone)]
pub struct ParsedInventory {
    pub records: Vec<DeviceRecord>,
    pub warnings: Vec<Warning>,
}

/// Parse enumeration output in the given format
pub fn parse_inventory(text: &str, format: InventoryFormat, node: &str) -> ParsedInventory {
    match format {
        InventoryFormat::Stanza => parse_stanzas(text, node),
        InventoryFormat::Compact => parse_compact(text, node),
    }
}

/// A hex id with the optional name printed in front of it
#[derive(Debug, Default, Clone)]
struct IdField {
    id: Option<String>,
    name: Option<String>,
}

/// Split `Name [10de]`, `10de` or a bare name into id and name
fn parse_id_field(value: &str) -> IdField {
    let value = value.trim();

    if let Some(inner_end) = value.strip_suffix(']') {
        if let Some(open) = inner_end.rfind('[') {
            let inner = &inner_end[open + 1..];
            if is_hex_id(inner) {
                let name = inner_end[..open].trim();
                return IdField {
                    id: Some(inner.to_ascii_lowercase()),
                    name: (!name.is_empty()).then(|| name.to_string()),
                };
            }
        }
    }

    if is_hex_id(value) {
        return IdField {
            id: Some(value.to_ascii_lowercase()),
            name: None,
        };
    }

    IdField {
        id: None,
        name: (!value.is_empty()).then(|| value.to_string()),
    }
}

fn is_hex_id(value: &str) -> bool {
    value.len() == 4 && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Split a stanza line at its first separator (`:` or tab)
///
/// Returns `None` when there is no separator or the key is empty or
/// contains spaces.
fn split_field(line: &str) -> Option<(&str, &str)> {
    let pos = line.find([':', '\t'])?;
    let key = line[..pos].trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    let value = line[pos + 1..].trim_start_matches([':', '\t', ' ']).trim_end();
    Some((key, value))
}

/// Normalize a slot to full `domain:bus:device.function` form when possible
fn normalize_slot(slot: &str) -> String {
    match PciAddress::parse(slot) {
        Some(addr) => addr.to_string(),
        None => {
            debug!("Keeping unrecognized slot address {:?} as-is", slot);
            slot.trim().to_string()
        }
    }
}

fn join_ids(first: &Option<String>, second: &Option<String>) -> Option<String> {
    match (first, second) {
        (Some(a), Some(b)) => Some(format!("{}:{}", a, b)),
        _ => None,
    }
}

/// Fields accumulated for the stanza currently being read
#[derive(Debug, Default)]
struct StanzaBuilder {
    slot: Option<String>,
    vendor: IdField,
    device: IdField,
    subsystem_vendor: IdField,
    subsystem_device: IdField,
    iommu_group: Option<IommuGroup>,
    fields: usize,
}

impl StanzaBuilder {
    fn set(&mut self, key: &str, value: &str) {
        match key {
            "Slot" => self.slot = Some(normalize_slot(value)),
            "Vendor" => self.vendor = parse_id_field(value),
            "Device" => self.device = parse_id_field(value),
            "SVendor" => self.subsystem_vendor = parse_id_field(value),
            "SDevice" => self.subsystem_device = parse_id_field(value),
            "IOMMUGroup" => self.iommu_group = Some(IommuGroup::parse(value)),
            other => trace!("Ignoring inventory field {}", other),
        }
        self.fields += 1;
    }

    fn finish(self, stanza: usize, node: &str, warnings: &mut Vec<Warning>) -> DeviceRecord {
        let vendor_device_id = join_ids(&self.vendor.id, &self.device.id).unwrap_or_default();
        let subsystem_id = join_ids(&self.subsystem_vendor.id, &self.subsystem_device.id)
            .unwrap_or_else(|| vendor_device_id.clone());
        let slot_path = self.slot.unwrap_or_default();

        let names: Vec<String> = [self.vendor.name, self.device.name]
            .into_iter()
            .flatten()
            .collect();
        let display_name = if !names.is_empty() {
            names.join(" ")
        } else if !vendor_device_id.is_empty() {
            vendor_device_id.clone()
        } else {
            slot_path.clone()
        };

        let mut missing = Vec::new();
        if slot_path.is_empty() {
            missing.push("slot");
        }
        if vendor_device_id.is_empty() {
            missing.push("vendor/device id");
        }
        if !missing.is_empty() {
            warnings.push(Warning::IncompleteDevice {
                stanza,
                missing: missing.join(" or "),
            });
        }

        DeviceRecord {
            slot_path,
            vendor_device_id,
            display_name,
            subsystem_id,
            iommu_group: self.iommu_group.unwrap_or_default(),
            node: node.to_string(),
        }
    }
}

/// Parse blank-line separated stanzas
pub fn parse_stanzas(text: &str, node: &str) -> ParsedInventory {
    let mut parsed = ParsedInventory::default();
    let mut current = StanzaBuilder::default();
    let mut stanza_count = 0;

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            if current.fields > 0 {
                stanza_count += 1;
                let builder = std::mem::take(&mut current);
                parsed
                    .records
                    .push(builder.finish(stanza_count, node, &mut parsed.warnings));
            }
            continue;
        }

        match split_field(line) {
            Some((key, value)) => current.set(key, value),
            None => parsed.warnings.push(Warning::Parse {
                source: SOURCE_NAME.to_string(),
                line: index + 1,
                content: line.to_string(),
                reason: "missing key/value separator".to_string(),
            }),
        }
    }

    if current.fields > 0 {
        stanza_count += 1;
        parsed
            .records
            .push(current.finish(stanza_count, node, &mut parsed.warnings));
    }

    debug!(
        "Parsed {} device stanza(s) with {} warning(s)",
        parsed.records.len(),
        parsed.warnings.len()
    );
    parsed
}

fn compact_id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\[([0-9a-fA-F]{4}):([0-9a-fA-F]{4})\]").ok())
        .as_ref()
}

/// Parse the one-line-per-device listing
pub fn parse_compact(text: &str, node: &str) -> ParsedInventory {
    let mut parsed = ParsedInventory::default();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (slot, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let slot_path = normalize_slot(slot);

        let ids = compact_id_pattern().and_then(|re| re.captures_iter(rest).last());
        let (vendor_device_id, description) = match ids {
            Some(caps) => {
                let id = format!("{}:{}", &caps[1], &caps[2]).to_ascii_lowercase();
                let start = caps.get(0).map(|m| m.start()).unwrap_or(rest.len());
                (id, &rest[..start])
            }
            None => {
                parsed.warnings.push(Warning::Parse {
                    source: SOURCE_NAME.to_string(),
                    line: index + 1,
                    content: line.to_string(),
                    reason: "no [vendor:device] id found".to_string(),
                });
                (String::new(), rest)
            }
        };

        // Drop the "Class name [0300]: " prefix when present
        let description = description
            .split_once("]: ")
            .map(|(_, name)| name)
            .unwrap_or(description)
            .trim();
        let display_name = if description.is_empty() {
            vendor_device_id.clone()
        } else {
            description.to_string()
        };

        parsed.records.push(DeviceRecord {
            slot_path,
            subsystem_id: vendor_device_id.clone(),
            vendor_device_id,
            display_name,
            iommu_group: IommuGroup::Unknown,
            node: node.to_string(),
        });
    }

    debug!("Parsed {} compact device line(s)", parsed.records.len());
    parsed
}
