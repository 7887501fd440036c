//! Non-fatal diagnostics collected during a run
//!
//! Every warning is logged through `tracing` as soon as it is recorded and
//! kept in a [`Report`] so callers can print a summary or assert on it.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// A recoverable problem found while collecting, parsing or reconciling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A single input line could not be parsed and was skipped
    Parse {
        /// Which input the line came from ("inventory" or a file path)
        source: String,
        /// 1-based line number
        line: usize,
        content: String,
        reason: String,
    },
    /// The mapping file was empty or absent, nothing can be updated
    EmptyMapping { path: PathBuf },
    /// Several devices share an id; only the first one is used
    DuplicateDeviceId {
        id: String,
        kept_slot: String,
        ignored_slot: String,
    },
    /// A label appeared more than once in the mapping file
    DuplicateLabel { label: String, line: usize },
    /// A device stanza lacked fields needed for matching
    IncompleteDevice { stanza: usize, missing: String },
    /// The hostname could not be read and the sentinel was used
    HostnameUnavailable { reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Parse {
                source,
                line,
                content,
                reason,
            } => write!(f, "{}:{}: {} (skipped line {:?})", source, line, reason, content),
            Warning::EmptyMapping { path } => write!(
                f,
                "mapping file {} has no entries, nothing will be updated",
                path.display()
            ),
            Warning::DuplicateDeviceId {
                id,
                kept_slot,
                ignored_slot,
            } => write!(
                f,
                "device id {} found at {} and {}, only {} is used",
                id, kept_slot, ignored_slot, kept_slot
            ),
            Warning::DuplicateLabel { label, line } => write!(
                f,
                "label {:?} repeated at line {}, attributes merged into the first entry",
                label, line
            ),
            Warning::IncompleteDevice { stanza, missing } => write!(
                f,
                "device stanza {} has no {}, it cannot be matched",
                stanza, missing
            ),
            Warning::HostnameUnavailable { reason } => {
                write!(f, "hostname unavailable ({}), using \"unknown\"", reason)
            }
        }
    }
}

/// Ordered collection of warnings from one run
#[derive(Debug, Default, Clone, Serialize)]
pub struct Report {
    warnings: Vec<Warning>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and record a warning
    pub fn push(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Append warnings produced by another stage
    pub fn extend(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        for warning in warnings {
            self.push(warning);
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Whether the run was a guaranteed no-op because the mapping was empty
    pub fn has_empty_mapping(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, Warning::EmptyMapping { .. }))
    }
}
