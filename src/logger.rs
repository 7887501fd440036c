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

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PCIMAP_LOG";
const DEFAULT_LEVEL: &str = "warn";

/// Filter directive for the given `-v` count and `PCIMAP_LOG` value
///
/// Any `-v` wins over the environment.
pub fn log_directive(verbose: u8, env: Option<&str>) -> String {
    match verbose {
        0 => env
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_LEVEL)
            .to_string(),
        1 => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Install the global subscriber. Logs go to stderr; stdout is for output.
pub fn init_logging(verbose: u8) {
    let env = std::env::var(LOG_ENV).ok();
    let directive = log_directive(verbose, env.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Invalid {} value {:?}: {}, using {}", LOG_ENV, directive, e, DEFAULT_LEVEL);
        EnvFilter::new(DEFAULT_LEVEL)
    });

    // A second init (tests) is not an error worth reporting
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
