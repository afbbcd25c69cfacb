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

//! Hardware nodes
//!
//! Every device in the tree implements [`Hardware`]. Children are owned by
//! their parent (`sub_hardware`), while the back-reference to the parent is
//! only its [`Identifier`]. Walking the tree generically goes through
//! [`crate::visitor::Node`].

pub mod mainboard;
pub mod superio;

use std::fmt;

use crate::identifier::Identifier;
use crate::sensor::Sensor;

pub use mainboard::Mainboard;
pub use superio::SuperIoHardware;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareType {
    Mainboard,
    SuperIo,
}

impl fmt::Display for HardwareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareType::Mainboard => f.write_str("Mainboard"),
            HardwareType::SuperIo => f.write_str("SuperIO"),
        }
    }
}

/// Common contract of all hardware nodes
///
/// `update` and `close` exist on every variant so that a scheduler can drive
/// the tree without knowing what each node is.
pub trait Hardware {
    fn identifier(&self) -> &Identifier;

    fn name(&self) -> &str;

    /// Empty resets to the computed default name; the result is persisted
    fn set_name(&mut self, name: &str);

    fn hardware_type(&self) -> HardwareType;

    /// Identifier of the parent node, `None` at the top of the tree
    fn parent(&self) -> Option<&Identifier>;

    fn sub_hardware(&self) -> &[Box<dyn Hardware>];

    fn sub_hardware_mut(&mut self) -> &mut [Box<dyn Hardware>];

    fn sensors(&self) -> &[Sensor];

    fn sensors_mut(&mut self) -> &mut [Sensor];

    /// Diagnostic text for this node
    fn report(&self) -> String;

    /// Refresh per-cycle values
    fn update(&mut self);

    /// Release platform resources, children first
    fn close(&mut self);
}

impl fmt::Debug for dyn Hardware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hardware")
            .field("identifier", self.identifier())
            .field("name", &self.name())
            .field("hardware_type", &self.hardware_type())
            .field("sub_hardware", &self.sub_hardware())
            .field("sensors", &self.sensors())
            .finish()
    }
}

/// Depth-first search by identifier
pub fn find<'a>(root: &'a dyn Hardware, identifier: &Identifier) -> Option<&'a dyn Hardware> {
    if root.identifier() == identifier {
        return Some(root);
    }
    root.sub_hardware()
        .iter()
        .find_map(|child| find(child.as_ref(), identifier))
}

/// Mutable variant of [`find`]
pub fn find_mut<'a>(root: &'a mut dyn Hardware, identifier: &Identifier) -> Option<&'a mut dyn Hardware> {
    if root.identifier() == identifier {
        return Some(root);
    }
    root.sub_hardware_mut()
        .iter_mut()
        .find_map(|child| find_mut(child.as_mut(), identifier))
}
