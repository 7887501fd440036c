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

//! One invocation of the tool, from parsed arguments to printed output

use anyhow::Context;
use std::io::Write;
use tracing::{info, Level};

use pm_core::{
    DeviceRecord, HostIdentity, InventorySource, IommuResolver, PcimapError, Reconciler, Report,
    Settings, SystemHost,
};

use crate::cli::{Cli, OutputFormat};

/// Settings file plus command line overrides
pub fn effective_settings(cli: &Cli) -> pm_core::Result<Settings> {
    let mut settings = pm_core::load_settings(cli.config.as_deref())?;
    if let Some(path) = &cli.mapping_file {
        settings.mapping_file = path.clone();
    }
    settings.validate()?;
    Ok(settings)
}

/// Render the inventory for `--print-pci-info`
pub fn format_inventory(records: &[DeviceRecord], format: OutputFormat) -> pm_core::Result<String> {
    match format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(records)?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Text => {
            let mut out = String::from("Detected PCI Devices:\n");
            for record in records {
                out.push_str(&format!(
                    "{} - {} [{}] (IOMMU group {})\n",
                    record.slot_path, record.display_name, record.vendor_device_id, record.iommu_group
                ));
            }
            Ok(out)
        }
    }
}

/// Run against explicit collaborators, writing user-facing output to `out`
pub fn run_with(
    cli: &Cli,
    settings: &Settings,
    source: &dyn InventorySource,
    host: &dyn HostIdentity,
    iommu: Option<&dyn IommuResolver>,
    out: &mut dyn Write,
) -> anyhow::Result<Report> {
    let mut report = Report::new();
    let mut reconciler = Reconciler::new(source, host).with_format(settings.inventory_format);
    if let Some(resolver) = iommu {
        reconciler = reconciler.with_iommu(resolver);
    }

    if cli.print_pci_info {
        let records = reconciler.inventory(&mut report)?;
        out.write_all(format_inventory(&records, cli.format)?.as_bytes())?;
        return Ok(report);
    }

    let store = settings.mapping_store();
    let outcome = reconciler
        .run(&store, cli.dry_run, &mut report)
        .with_context(|| format!("Failed to update {}", store.path().display()))?;

    if let Some(preview) = &outcome.preview {
        out.write_all(preview.as_bytes())?;
    } else if outcome.written {
        writeln!(
            out,
            "Updated {} of {} entries in {}",
            outcome.changed,
            outcome.entries.len(),
            store.path().display()
        )?;
    } else if !outcome.entries.is_empty() {
        writeln!(out, "{} is up to date", store.path().display())?;
    }

    if !report.is_empty() {
        info!("Finished with {} warning(s)", report.len());
    }
    Ok(report)
}

/// Run with the real host collaborators and stdout
pub fn run(cli: &Cli) -> anyhow::Result<Report> {
    let settings = effective_settings(cli).context("Failed to load settings")?;
    let source = settings.inventory_source();
    let resolver = settings.iommu_resolver();
    let iommu = resolver.as_ref().map(|r| r as &dyn IommuResolver);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with(cli, &settings, &source, &SystemHost, iommu, &mut out)
}

/// Whether the log filter lets `Report` warnings through to stderr
pub fn warnings_are_logged() -> bool {
    tracing::enabled!(target: "pm_core::report", Level::WARN)
}

/// Recap of a run's warnings, one per line, or `None` when there were none
pub fn warning_summary(report: &Report) -> Option<String> {
    if report.is_empty() {
        return None;
    }
    let mut out = format!("{} warning(s):\n", report.len());
    for warning in report.warnings() {
        out.push_str(&format!("  - {}\n", warning));
    }
    Some(out)
}

/// Process exit code for a failed run
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<PcimapError>()
        .map(PcimapError::exit_code)
        .unwrap_or(1)
}
