/*
 * This file is part of hwtree.
 *
 * Copyright (C) 2025 hwtree contributors
 *
 * hwtree is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * hwtree is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with hwtree. If not, see <https://www.gnu.org/licenses/>.
 */

//! Platform collaborators
//!
//! The tree never talks to hardware itself. Board identification and
//! Super-I/O chips come in through the types and traits below; real drivers
//! (LPC port I/O, lm-sensors) live outside this crate and implement them.

use std::fs;
use std::path::Path;

use hwtree_error::Result;
use tracing::{debug, trace};

/// DMI exports read by [`read_board_info`]
pub const DMI_ID_DIR: &str = "/sys/class/dmi/id";

/// Board identification strings as reported by the firmware
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardInfo {
    pub manufacturer_name: Option<String>,
    pub product_name: Option<String>,
    pub version: Option<String>,
}

impl BoardInfo {
    pub fn new(manufacturer_name: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            manufacturer_name: Some(manufacturer_name.into()),
            product_name: Some(product_name.into()),
            version: None,
        }
    }

    /// Report lines for the mainboard report
    pub fn report(&self) -> String {
        let mut r = String::new();
        r.push_str("Mainboard Manufacturer: ");
        r.push_str(self.manufacturer_name.as_deref().unwrap_or(""));
        r.push('\n');
        r.push_str("Mainboard Name: ");
        r.push_str(self.product_name.as_deref().unwrap_or(""));
        r.push('\n');
        r.push_str("Mainboard Version: ");
        r.push_str(self.version.as_deref().unwrap_or(""));
        r.push_str("\n\n");
        r
    }
}

/// One embedded controller handle produced by a [`SuperIoProbe`]
///
/// Channel readings are raw chip values; `None` marks an unconnected or
/// unreadable channel. Control channels are duty cycles in percent.
#[cfg_attr(test, mockall::automock)]
pub trait SuperIo {
    /// Stable, identifier-safe name of the chip (e.g. `nct6798d`)
    fn discriminator(&self) -> String;

    /// Human-readable chip name
    fn name(&self) -> String;

    fn voltages(&self) -> Vec<Option<f32>>;

    fn temperatures(&self) -> Vec<Option<f32>>;

    fn fans(&self) -> Vec<Option<f32>>;

    fn controls(&self) -> Vec<Option<f32>>;

    /// Refresh the channel readings
    fn update(&mut self);

    /// `None` returns the channel to hardware control, `Some` sets a raw duty (0-255)
    fn set_control(&mut self, index: usize, value: Option<u8>);

    fn report(&self) -> String;

    /// Release platform resources held by this handle
    fn close(&mut self);
}

/// Enumerates the Super-I/O chips present on the board
#[cfg_attr(test, mockall::automock)]
pub trait SuperIoProbe {
    /// Detected chips, in probe order
    fn detect(&mut self) -> Result<Vec<Box<dyn SuperIo>>>;

    fn report(&self) -> String;

    /// Release probe-level resources (bus handles, daemon connections)
    fn close(&mut self);
}

/// Probe for platforms without Super-I/O access
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProbe;

impl SuperIoProbe for NullProbe {
    fn detect(&mut self) -> Result<Vec<Box<dyn SuperIo>>> {
        Ok(Vec::new())
    }

    fn report(&self) -> String {
        String::new()
    }

    fn close(&mut self) {}
}

fn read_dmi_field(dir: &Path, field: &str) -> Option<String> {
    let path = dir.join(field);
    match fs::read_to_string(&path) {
        Ok(content) => {
            let value = content.trim();
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        }
        Err(e) => {
            trace!("Could not read {:?}: {}", path, e);
            None
        }
    }
}

/// Read board identification from a DMI sysfs directory
///
/// Returns `None` when neither vendor nor product is available, which the
/// mainboard reports as "Unknown".
pub fn read_board_info(dir: &Path) -> Option<BoardInfo> {
    let manufacturer_name = read_dmi_field(dir, "board_vendor");
    let product_name = read_dmi_field(dir, "board_name");
    let version = read_dmi_field(dir, "board_version");

    if manufacturer_name.is_none() && product_name.is_none() {
        debug!("No DMI board information in {:?}", dir);
        return None;
    }

    Some(BoardInfo {
        manufacturer_name,
        product_name,
        version,
    })
}
