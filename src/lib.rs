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

//! hwtree - hardware monitoring tree
//!
//! This library models a machine's monitoring hardware as a tree: a
//! mainboard owning Super-I/O chips, which own sensors, which own tunable
//! parameters and fan controls. User overrides are persisted in a flat
//! key/value settings store keyed by node identifiers.

pub mod identifier;
pub mod settings;
pub mod parameter;
pub mod control;
pub mod sensor;
pub mod hardware;
pub mod visitor;
pub mod platform;
pub mod config;
pub mod logger;

pub use control::{Control, ControlEvent, ControlMode, SubscriptionId};
pub use hardware::{Hardware, HardwareType, Mainboard, SuperIoHardware};
pub use hwtree_error::{HwtreeError, Result};
pub use identifier::Identifier;
pub use parameter::{Parameter, ParameterDescription};
pub use sensor::{Sensor, SensorType};
pub use settings::{SettingsStore, SharedSettings};
pub use visitor::{Node, Visitor};
