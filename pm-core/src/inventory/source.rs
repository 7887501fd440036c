//! Hardware enumeration collaborator
//!
//! The parser only ever sees text. Where that text comes from is behind
//! [`InventorySource`] so tests can feed canned `lspci` output.

use pm_error::{PcimapError, Result};
use std::process::Command;
use tracing::{debug, info};

use crate::constants::inventory;

/// Provider of raw enumeration output
#[cfg_attr(test, mockall::automock)]
pub trait InventorySource {
    /// Human-readable name used in error messages
    fn name(&self) -> String;

    /// Run the enumeration and return its complete output
    fn collect(&self) -> Result<String>;
}

/// Runs `lspci` (or a configured replacement) and captures stdout
#[derive(Debug, Clone)]
pub struct LspciSource {
    program: String,
    args: Vec<String>,
}

impl LspciSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Default for LspciSource {
    fn default() -> Self {
        Self::new(
            inventory::LSPCI_PROGRAM,
            inventory::LSPCI_STANZA_ARGS
                .iter()
                .map(|arg| arg.to_string())
                .collect(),
        )
    }
}

impl InventorySource for LspciSource {
    fn name(&self) -> String {
        self.program.clone()
    }

    fn collect(&self) -> Result<String> {
        debug!("Running {} {}", self.program, self.args.join(" "));

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| PcimapError::collection(&self.program, format!("cannot run: {}", e)))?;

        if !output.status.success() {
            return Err(PcimapError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| {
            PcimapError::collection(&self.program, format!("output is not UTF-8: {}", e))
        })?;

        info!("Collected {} bytes of inventory from {}", stdout.len(), self.program);
        Ok(stdout)
    }
}
