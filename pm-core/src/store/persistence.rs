//! Loading and atomically saving the mapping file

use pm_error::{PcimapError, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::codec::{decode, encode, DecodedMapping};
use super::entry::MappingEntry;

/// Mapping file at an explicit path
#[derive(Debug, Clone)]
pub struct MappingStore {
    path: PathBuf,
}

impl MappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw file text; a missing file reads as empty
    pub fn read_text(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No mapping file at {:?}, treating as empty", self.path);
                Ok(String::new())
            }
            Err(e) => Err(PcimapError::FileRead {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// Load and decode the mapping file
    pub fn load(&self) -> Result<DecodedMapping> {
        let text = self.read_text()?;
        let decoded = decode(&text, &self.path.to_string_lossy());
        info!("Loaded {} mapping entries from {:?}", decoded.entries.len(), self.path);
        Ok(decoded)
    }

    /// Encode and replace the mapping file in one rename
    pub fn save(&self, entries: &[MappingEntry]) -> Result<()> {
        write_atomic(&self.path, &encode(entries))?;
        info!("Wrote {} mapping entries to {:?}", entries.len(), self.path);
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mapping".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Write `contents` to a sibling temp file, sync it, then rename it over
/// `path`. On any failure the temp file is removed and `path` is untouched.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PcimapError::FileWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let temp_path = temp_path_for(path);
    let result = write_and_rename(&temp_path, path, contents);
    if result.is_err() && temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            warn!("Failed to remove temp file {:?}: {}", temp_path, e);
        }
    }
    result
}

fn write_and_rename(temp_path: &Path, path: &Path, contents: &str) -> Result<()> {
    let write_err = |e| PcimapError::FileWrite {
        path: temp_path.to_path_buf(),
        source: e,
    };

    let mut file = fs::File::create(temp_path).map_err(write_err)?;
    file.write_all(contents.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(temp_path, path).map_err(|e| PcimapError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!("Atomically replaced {:?}", path);
    Ok(())
}
