/*
 * This file is part of pcimap.
 *
 * Copyright (C) 2025 pcimap contributors
 *
 * pcimap is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * pcimap is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with pcimap. If not, see <https://www.gnu.org/licenses/>.
 */

//! Command Line Interface

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "pcimap")]
#[command(version)]
#[command(about = "Refresh Proxmox VE PCI resource mappings from lspci")]
#[command(long_about = "pcimap - Refresh Proxmox VE PCI resource mappings

Reads the current PCI inventory, matches each existing mapping entry to a
device by vendor:device id, and rewrites the slot path, IOMMU group,
subsystem id and node of every matched entry. Entries are never added or
removed, and unmatched entries are left as they are.

EXAMPLES:
    pcimap                                 Refresh /etc/pve/mapping/pci.cfg
    pcimap --dry-run                       Show what would change
    pcimap --print-pci-info                List detected devices
    pcimap --print-pci-info --format json  Dump detected devices as JSON
    pcimap --mapping-file ./pci.cfg -v     Work on a copy, with progress logs

ENVIRONMENT VARIABLES:
    PCIMAP_LOG=debug       Log filter (overridden by -v/-vv)
    PCIMAP_CONFIG=PATH     Settings file location

FILES:
    /etc/pve/mapping/pci.cfg       PCI resource mapping file
    /etc/pcimap/settings.json      Optional settings

EXIT STATUS:
    0  success, including runs that only produced warnings
    2  the PCI inventory could not be collected
    3  the mapping file could not be written
    4  invalid settings")]
pub struct Cli {
    /// Preview the changes without writing the mapping file
    #[arg(long)]
    pub dry_run: bool,

    /// Print the detected PCI devices and exit
    #[arg(long)]
    pub print_pci_info: bool,

    /// Output format for --print-pci-info
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Mapping file to update (overrides the settings file)
    #[arg(long, value_name = "PATH")]
    pub mapping_file: Option<PathBuf>,

    /// Settings file to load
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["pcimap"]);
        assert!(!cli.dry_run);
        assert!(!cli.print_pci_info);
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.verbose, 0);
        assert!(cli.mapping_file.is_none());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "pcimap",
            "--dry-run",
            "--mapping-file",
            "/tmp/pci.cfg",
            "--format",
            "json",
            "-vv",
        ]);
        assert!(cli.dry_run);
        assert_eq!(cli.mapping_file, Some(PathBuf::from("/tmp/pci.cfg")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["pcimap", "--format", "yaml"]).is_err());
    }
}
