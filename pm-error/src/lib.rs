//! Unified error handling for pcimap
//!
//! A single error type shared by the core library and the CLI.
//! Only fatal conditions live here; recoverable problems (a bad stanza line,
//! an empty mapping file) are reported as warnings by the core instead.

use std::io;
use std::path::PathBuf;

/// Result type alias using PcimapError
pub type Result<T> = std::result::Result<T, PcimapError>;

/// Unified error type for all pcimap operations
#[derive(thiserror::Error, Debug)]
pub enum PcimapError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Inventory Collection Errors
    // ============================================================================
    #[error("Failed to collect inventory from {tool}: {reason}")]
    Collection {
        tool: String,
        reason: String,
    },

    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),
}

impl PcimapError {
    /// Create a collection error for the given tool
    pub fn collection(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Collection {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid config value error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a generic error from a string
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// True when the inventory could not be obtained at all
    pub fn is_collection_failure(&self) -> bool {
        matches!(self, Self::Collection { .. } | Self::CommandFailed { .. })
    }

    /// Process exit code for this error
    ///
    /// 2: inventory collection, 3: writing the mapping file, 4: configuration,
    /// 1: anything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Collection { .. } | Self::CommandFailed { .. } => 2,
            Self::FileWrite { .. } => 3,
            Self::Config(_) | Self::InvalidConfig { .. } | Self::JsonParse(_) => 4,
            Self::Io(_) | Self::FileRead { .. } | Self::Generic(_) => 1,
        }
    }
}

// Allow converting from String to PcimapError
impl From<String> for PcimapError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to PcimapError
impl From<&str> for PcimapError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}
