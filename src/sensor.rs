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

//! Sensors owned by hardware nodes
//!
//! A sensor is identified as `<hardware>/<type>/<index>` and may own a set of
//! [`Parameter`]s and at most one [`Control`]. Its display name can be
//! overridden by the user and is persisted under `<sensor>/name`.

use std::fmt;

use crate::control::Control;
use crate::identifier::Identifier;
use crate::parameter::{Parameter, ParameterDescription};
use crate::settings::{PersistedName, SharedSettings};

/// Kind of quantity a sensor reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorType {
    Voltage,
    Clock,
    Temperature,
    Load,
    Fan,
    Flow,
    Control,
    Level,
    Factor,
    Power,
    Data,
}

impl SensorType {
    /// Identifier segment for this type
    pub fn key(self) -> &'static str {
        match self {
            SensorType::Voltage => "voltage",
            SensorType::Clock => "clock",
            SensorType::Temperature => "temperature",
            SensorType::Load => "load",
            SensorType::Fan => "fan",
            SensorType::Flow => "flow",
            SensorType::Control => "control",
            SensorType::Level => "level",
            SensorType::Factor => "factor",
            SensorType::Power => "power",
            SensorType::Data => "data",
        }
    }

    /// Unit suffix used in reports
    pub fn unit(self) -> &'static str {
        match self {
            SensorType::Voltage => "V",
            SensorType::Clock => "MHz",
            SensorType::Temperature => "°C",
            SensorType::Load | SensorType::Control | SensorType::Level => "%",
            SensorType::Fan => "RPM",
            SensorType::Flow => "L/h",
            SensorType::Factor => "",
            SensorType::Power => "W",
            SensorType::Data => "GB",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

pub struct Sensor {
    identifier: Identifier,
    hardware: Identifier,
    index: usize,
    sensor_type: SensorType,
    name: PersistedName,
    value: Option<f32>,
    min: Option<f32>,
    max: Option<f32>,
    parameters: Vec<Parameter>,
    control: Option<Control>,
    settings: SharedSettings,
}

impl Sensor {
    pub fn new(
        hardware: &Identifier,
        index: usize,
        sensor_type: SensorType,
        default_name: impl Into<String>,
        settings: SharedSettings,
    ) -> Self {
        let identifier = hardware.child([sensor_type.key().to_string(), index.to_string()]);
        let name = PersistedName::restore(&identifier, default_name.into(), &settings);

        Self {
            identifier,
            hardware: hardware.clone(),
            index,
            sensor_type,
            name,
            value: None,
            min: None,
            max: None,
            parameters: Vec::new(),
            control: None,
            settings,
        }
    }

    /// Attach parameters, restored against this sensor's identifier
    pub fn with_parameters<I>(mut self, descriptions: I) -> Self
    where
        I: IntoIterator<Item = ParameterDescription>,
    {
        for description in descriptions {
            let parameter = Parameter::new(description, &self.identifier, self.settings.clone());
            self.parameters.push(parameter);
        }
        self
    }

    /// Create this sensor's control, replacing any previous one
    pub fn attach_control(&mut self, min_software_value: f32, max_software_value: f32) -> &mut Control {
        let control = Control::new(&self.identifier, self.settings.clone(), min_software_value, max_software_value);
        self.control.insert(control)
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Identifier of the owning hardware node
    pub fn hardware(&self) -> &Identifier {
        &self.hardware
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    pub fn name(&self) -> &str {
        self.name.get()
    }

    pub fn default_name(&self) -> &str {
        self.name.default_name()
    }

    /// Empty resets to the default name; the result is always persisted
    pub fn set_name(&mut self, name: &str) {
        self.name.set(name, &self.settings);
    }

    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn min(&self) -> Option<f32> {
        self.min
    }

    pub fn max(&self) -> Option<f32> {
        self.max
    }

    /// Store a new reading and widen min/max to include it
    pub fn set_value(&mut self, value: Option<f32>) {
        self.value = value;
        if let Some(v) = value {
            self.min = Some(self.min.map_or(v, |m| m.min(v)));
            self.max = Some(self.max.map_or(v, |m| m.max(v)));
        }
    }

    pub fn reset_min(&mut self) {
        self.min = None;
    }

    pub fn reset_max(&mut self) {
        self.max = None;
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut [Parameter] {
        &mut self.parameters
    }

    /// Look up a parameter by display name
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.parameters.iter_mut().find(|p| p.name() == name)
    }

    pub fn control(&self) -> Option<&Control> {
        self.control.as_ref()
    }

    pub fn control_mut(&mut self) -> Option<&mut Control> {
        self.control.as_mut()
    }
}

impl fmt::Debug for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sensor")
            .field("identifier", &self.identifier)
            .field("name", &self.name.get())
            .field("value", &self.value)
            .field("parameters", &self.parameters)
            .field("control", &self.control)
            .finish()
    }
}
