//! Mapping entry type

use serde::Serialize;
use std::collections::BTreeMap;

use crate::constants::{attr, is_device_attr, DEVICE_ATTR_NAMES};

/// One user-labelled device binding from the mapping file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MappingEntry {
    /// User-chosen name, unique within the file
    pub label: String,
    /// All `key=value` pairs, recognized or not
    pub attributes: BTreeMap<String, String>,
}

impl MappingEntry {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Stored vendor/device id used for correlation
    pub fn device_id(&self) -> Option<&str> {
        self.get(attr::ID).map(str::trim).filter(|id| !id.is_empty())
    }

    /// Attributes in write order: recognized names first, in their fixed
    /// order, then every other key sorted by name
    pub fn ordered_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        let recognized = DEVICE_ATTR_NAMES
            .iter()
            .filter_map(|name| self.get(name).map(|value| (*name, value)));
        let extra = self
            .attributes
            .iter()
            .filter(|(key, _)| !is_device_attr(key))
            .map(|(key, value)| (key.as_str(), value.as_str()));
        recognized.chain(extra)
    }
}
