//! Mapping file text format
//!
//! ```text
//! gpu0
//! 	id=10de:2882
//! 	iommugroup=13
//! 	node=pve1
//! 	path=0000:0400
//! 	subsystem-id=1458:4102
//!
//! nic1
//! 	id=8086:1533
//! ```
//!
//! A label sits at column 0; indented `key=value` lines belong to the last
//! label. Blank lines and `#` comments are skipped on read and are not
//! written back.

use std::collections::HashMap;
use tracing::{debug, warn};

use super::entry::MappingEntry;
use crate::report::Warning;

/// Entries plus the warnings raised while decoding them
#[derive(Debug, Default, Clone)]
pub struct DecodedMapping {
    pub entries: Vec<MappingEntry>,
    pub warnings: Vec<Warning>,
}

fn parse_warning(source: &str, line: usize, content: &str, reason: &str) -> Warning {
    Warning::Parse {
        source: source.to_string(),
        line,
        content: content.to_string(),
        reason: reason.to_string(),
    }
}

/// Decode mapping file text, keeping entries in file order
///
/// `source` names the input in warnings (usually the file path).
pub fn decode(text: &str, source: &str) -> DecodedMapping {
    let mut decoded = DecodedMapping::default();
    let mut index_by_label: HashMap<String, usize> = HashMap::new();
    let mut current: Option<usize> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if !raw.starts_with([' ', '\t']) {
            let label = trimmed.to_string();
            let existing = index_by_label.get(&label).copied();
            current = Some(match existing {
                Some(existing) => {
                    decoded.warnings.push(Warning::DuplicateLabel {
                        label,
                        line: line_no,
                    });
                    existing
                }
                None => {
                    index_by_label.insert(label.clone(), decoded.entries.len());
                    decoded.entries.push(MappingEntry::new(label));
                    decoded.entries.len() - 1
                }
            });
            continue;
        }

        let Some(entry_index) = current else {
            decoded
                .warnings
                .push(parse_warning(source, line_no, raw, "attribute before any label"));
            continue;
        };

        match trimmed.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                decoded.entries[entry_index].set(key.trim(), value.trim());
            }
            _ => decoded
                .warnings
                .push(parse_warning(source, line_no, raw, "expected key=value")),
        }
    }

    debug!("Decoded {} mapping entries from {}", decoded.entries.len(), source);
    decoded
}

/// Whether `label` reads back as the same label after `encode`
///
/// A label starting with `#` reads back as a comment, and one starting with
/// whitespace as an attribute line, so either entry would be lost on the
/// next run.
pub fn label_is_encodable(label: &str) -> bool {
    !label.trim().is_empty()
        && !label.starts_with('#')
        && !label.starts_with([' ', '\t'])
        && !label.contains(['\n', '\r'])
}

/// Append one entry's lines to `out`
///
/// Labels failing [`label_is_encodable`] are still written, with a warning.
pub fn encode_entry(entry: &MappingEntry, out: &mut String) {
    if !label_is_encodable(&entry.label) {
        warn!(
            "Label {:?} will not read back as a label, the entry is lost on the next run",
            entry.label
        );
    }
    out.push_str(&entry.label);
    out.push('\n');
    for (key, value) in entry.ordered_attributes() {
        out.push('\t');
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
}

/// Encode entries in the given order, one blank line between entries
pub fn encode(entries: &[MappingEntry]) -> String {
    let mut out = String::new();
    for (index, entry) in entries.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        encode_entry(entry, &mut out);
    }
    out
}
