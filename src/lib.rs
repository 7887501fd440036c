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

//! pcimap - Refresh Proxmox VE PCI resource mappings
//!
//! Command line front-end over `pm_core`: argument parsing, logging setup
//! and output rendering.

pub mod app;
pub mod cli;
pub mod logger;
