//! Host identity
//!
//! The `node` attribute of every refreshed entry is the local hostname.
//! Lookup goes through [`HostIdentity`] so tests can pin a name.

use pm_error::{PcimapError, Result};
use std::ffi::CStr;
use std::fs;
use tracing::debug;

use crate::constants::{paths, sentinel};
use crate::report::{Report, Warning};

/// Provider of the current node name
#[cfg_attr(test, mockall::automock)]
pub trait HostIdentity {
    fn hostname(&self) -> Result<String>;
}

/// Reads the nodename from uname(2), then the kernel/hostname files
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl HostIdentity for SystemHost {
    fn hostname(&self) -> Result<String> {
        if let Some(name) = uname_nodename() {
            return Ok(name);
        }

        for path in paths::HOSTNAME_FILES {
            match fs::read_to_string(path) {
                Ok(contents) => {
                    let name = contents.trim();
                    if !name.is_empty() {
                        return Ok(name.to_string());
                    }
                }
                Err(e) => debug!("Cannot read {}: {}", path, e),
            }
        }

        Err(PcimapError::generic("no hostname from uname or hostname files"))
    }
}

fn uname_nodename() -> Option<String> {
    // SAFETY: utsname is plain old data, so an all-zero value is valid, and
    // uname only writes into the struct we pass it.
    let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut uts) } != 0 {
        return None;
    }
    // SAFETY: on success nodename is a NUL-terminated string inside `uts`.
    let name = unsafe { CStr::from_ptr(uts.nodename.as_ptr()) };
    let name = name.to_string_lossy().trim().to_string();
    (!name.is_empty()).then_some(name)
}

/// Hostname for this run, or the `unknown` sentinel with a warning
pub fn current_node(host: &dyn HostIdentity, report: &mut Report) -> String {
    match host.hostname() {
        Ok(name) => name,
        Err(e) => {
            report.push(Warning::HostnameUnavailable {
                reason: e.to_string(),
            });
            sentinel::UNKNOWN.to_string()
        }
    }
}
