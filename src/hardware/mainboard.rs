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

//! Mainboard node
//!
//! The root of the tree. It owns no sensors itself; its children are the
//! Super-I/O chips found by the platform probe, kept in probe order.

use tracing::{info, warn};

use super::{Hardware, HardwareType, SuperIoHardware};
use crate::identifier::Identifier;
use crate::platform::{BoardInfo, SuperIoProbe};
use crate::sensor::Sensor;
use crate::settings::{PersistedName, SharedSettings};

/// Name used when the firmware does not identify the board
pub const UNKNOWN: &str = "Unknown";

/// Fixed identifier segment of the mainboard
pub const MAINBOARD_ID: &str = "mainboard";

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Display name computed from board identification
pub fn default_name(board: Option<&BoardInfo>) -> String {
    let Some(board) = board else {
        return UNKNOWN.to_string();
    };
    let manufacturer = non_empty(board.manufacturer_name.as_deref());
    match (manufacturer, non_empty(board.product_name.as_deref())) {
        (Some(m), Some(p)) => format!("{} {}", m, p),
        (None, Some(p)) => p.to_string(),
        (Some(m), None) => m.to_string(),
        (None, None) => UNKNOWN.to_string(),
    }
}

pub struct Mainboard {
    identifier: Identifier,
    board: Option<BoardInfo>,
    name: PersistedName,
    probe: Box<dyn SuperIoProbe>,
    sub_hardware: Vec<Box<dyn Hardware>>,
    settings: SharedSettings,
    closed: bool,
}

impl Mainboard {
    /// Build the mainboard and wrap every chip the probe reports
    ///
    /// A failing probe leaves the board without children; it never aborts
    /// construction.
    pub fn new(board: Option<BoardInfo>, mut probe: Box<dyn SuperIoProbe>, settings: SharedSettings) -> Self {
        let identifier = Identifier::new([MAINBOARD_ID]);
        let name = PersistedName::restore(&identifier, default_name(board.as_ref()), &settings);

        let chips = probe.detect().unwrap_or_else(|e| {
            warn!("Super-I/O probe failed, continuing without sub-hardware: {}", e);
            Vec::new()
        });

        let sub_hardware: Vec<Box<dyn Hardware>> = chips
            .into_iter()
            .map(|chip| {
                let hw = SuperIoHardware::new(&identifier, chip, settings.clone());
                info!(chip = %hw.identifier(), sensors = hw.sensors().len(), "Found Super-I/O chip");
                Box::new(hw) as Box<dyn Hardware>
            })
            .collect();

        Self {
            identifier,
            board,
            name,
            probe,
            sub_hardware,
            settings,
            closed: false,
        }
    }

    pub fn board(&self) -> Option<&BoardInfo> {
        self.board.as_ref()
    }

    /// Name computed from board identification, the reset target of `set_name`
    pub fn default_name(&self) -> &str {
        self.name.default_name()
    }
}

impl Hardware for Mainboard {
    fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    fn name(&self) -> &str {
        self.name.get()
    }

    fn set_name(&mut self, name: &str) {
        self.name.set(name, &self.settings);
    }

    fn hardware_type(&self) -> HardwareType {
        HardwareType::Mainboard
    }

    fn parent(&self) -> Option<&Identifier> {
        None
    }

    fn sub_hardware(&self) -> &[Box<dyn Hardware>] {
        &self.sub_hardware
    }

    fn sub_hardware_mut(&mut self) -> &mut [Box<dyn Hardware>] {
        &mut self.sub_hardware
    }

    fn sensors(&self) -> &[Sensor] {
        &[]
    }

    fn sensors_mut(&mut self) -> &mut [Sensor] {
        Default::default()
    }

    fn report(&self) -> String {
        let mut r = String::new();
        r.push_str("Mainboard\n\n");
        if let Some(board) = &self.board {
            r.push_str(&board.report());
        }
        r.push_str(&self.probe.report());
        r
    }

    fn update(&mut self) {}

    fn close(&mut self) {
        if self.closed {
            return;
        }
        for hardware in self.sub_hardware.iter_mut() {
            hardware.close();
        }
        self.probe.close();
        self.closed = true;
    }
}
