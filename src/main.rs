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

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use pcimap::{app, cli::Cli, logger};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logging(cli.verbose);
    debug!("Arguments: {:?}", cli);

    match app::run(&cli) {
        Ok(report) => {
            // Filtered-out warnings still reach the operator
            if !app::warnings_are_logged() {
                if let Some(summary) = app::warning_summary(&report) {
                    eprint!("{}", summary);
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(app::exit_code_for(&err))
        }
    }
}
