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

//! Persisted sensor parameters
//!
//! A parameter is a named coefficient used when computing a sensor's value
//! (resistor ratios for voltage dividers, temperature offsets). A parameter
//! is either *default* (no settings entry) or *overridden* (entry present),
//! and the two states are kept distinct even when the numbers agree.

use tracing::debug;

use crate::identifier::Identifier;
use crate::settings::{self, SharedSettings};

/// Immutable name/description/default triple
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescription {
    pub name: String,
    pub description: String,
    pub default_value: f32,
}

impl ParameterDescription {
    pub fn new(name: impl Into<String>, description: impl Into<String>, default_value: f32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            default_value,
        }
    }
}

/// Key segment for a parameter name: spaces removed, lower-cased
///
/// Names differing only in case or spacing map to the same key on one
/// sensor. Existing settings files depend on this derivation.
pub fn normalize_name(name: &str) -> String {
    name.replace(' ', "").to_lowercase()
}

pub struct Parameter {
    identifier: Identifier,
    sensor: Identifier,
    description: ParameterDescription,
    value: f32,
    is_default: bool,
    settings: SharedSettings,
}

impl Parameter {
    /// Restore a parameter for the sensor identified by `sensor`
    pub fn new(description: ParameterDescription, sensor: &Identifier, settings: SharedSettings) -> Self {
        let identifier = sensor.child(["parameter".to_string(), normalize_name(&description.name)]);
        let key = identifier.to_string();

        let stored = settings::read(&settings, &key);
        let is_default = stored.is_none();
        let value = match stored {
            None => description.default_value,
            Some(raw) => settings::parse_f32(&raw).unwrap_or_else(|| {
                debug!(key = %key, raw = %raw, "unparsable parameter value, using default");
                description.default_value
            }),
        };

        Self {
            identifier,
            sensor: sensor.clone(),
            description,
            value,
            is_default,
            settings,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Identifier of the owning sensor
    pub fn sensor(&self) -> &Identifier {
        &self.sensor
    }

    pub fn name(&self) -> &str {
        &self.description.name
    }

    pub fn description(&self) -> &str {
        &self.description.description
    }

    pub fn default_value(&self) -> f32 {
        self.description.default_value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Record an explicit user choice
    ///
    /// Always persists, even when `value` equals the current one: writing a
    /// parameter is what moves it out of the default state.
    pub fn set_value(&mut self, value: f32) {
        self.is_default = false;
        self.value = value;
        settings::write(&self.settings, &self.identifier.to_string(), &settings::format_f32(value));
    }

    /// `true` restores the default and drops the settings entry.
    /// `false` only clears the flag; follow it with [`Parameter::set_value`].
    pub fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
        if is_default {
            self.value = self.description.default_value;
            settings::erase(&self.settings, &self.identifier.to_string());
        }
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("identifier", &self.identifier)
            .field("value", &self.value)
            .field("is_default", &self.is_default)
            .finish()
    }
}
