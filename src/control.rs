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

//! Software fan controls
//!
//! A [`Control`] holds the user's override for one actuator: either leave it
//! to the hardware ([`ControlMode::Default`]) or drive it from software at a
//! given percentage ([`ControlMode::Software`]). A freshly restored control
//! with nothing persisted is [`ControlMode::Undefined`], which no setter can
//! return to.
//!
//! # Notifications
//!
//! Subscribers run synchronously inside the setter, after the in-memory state
//! changed and before the settings write. They fire only on a real change.
//! Handlers see the control through a shared reference, so they cannot call
//! back into a setter while dispatch is running.
//!
//! # Bounds
//!
//! `min_software_value`/`max_software_value` are informational. The control
//! accepts and persists any value; clamping is the caller's job.

use tracing::debug;

use crate::identifier::Identifier;
use crate::settings::{self, SharedSettings};

/// Persisted control mode; the discriminant is the stored integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum ControlMode {
    #[default]
    Undefined = 0,
    Default = 1,
    Software = 2,
}

impl ControlMode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Undefined),
            1 => Some(Self::Default),
            2 => Some(Self::Software),
            _ => None,
        }
    }
}

/// What changed on a control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    ModeChanged,
    ValueChanged,
}

/// Handle returned by [`Control::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&Control, ControlEvent)>;

pub struct Control {
    identifier: Identifier,
    mode: ControlMode,
    software_value: f32,
    min_software_value: f32,
    max_software_value: f32,
    settings: SharedSettings,
    subscribers: Vec<(SubscriptionId, Handler)>,
    next_subscription: u64,
}

impl Control {
    /// Restore the control attached to the sensor identified by `sensor`
    pub fn new(sensor: &Identifier, settings: SharedSettings, min_software_value: f32, max_software_value: f32) -> Self {
        Self::with_identifier(sensor.child(["control"]), settings, min_software_value, max_software_value)
    }

    /// Restore a control whose own identifier is already known
    pub fn with_identifier(
        identifier: Identifier,
        settings: SharedSettings,
        min_software_value: f32,
        max_software_value: f32,
    ) -> Self {
        let value_key = identifier.child(["value"]).to_string();
        let mode_key = identifier.child(["mode"]).to_string();

        let software_value = settings::read(&settings, &value_key)
            .and_then(|raw| settings::parse_f32(&raw))
            .unwrap_or_default();

        let mode = settings::read(&settings, &mode_key)
            .and_then(|raw| settings::parse_i32(&raw))
            .and_then(ControlMode::from_code)
            .unwrap_or(ControlMode::Undefined);

        debug!(control = %identifier, ?mode, software_value, "restored control");

        Self {
            identifier,
            mode,
            software_value,
            min_software_value,
            max_software_value,
            settings,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn software_value(&self) -> f32 {
        self.software_value
    }

    pub fn min_software_value(&self) -> f32 {
        self.min_software_value
    }

    pub fn max_software_value(&self) -> f32 {
        self.max_software_value
    }

    /// Hand the actuator back to the hardware
    pub fn set_default(&mut self) {
        self.apply(ControlMode::Default, None);
    }

    /// Drive the actuator from software at `value`
    ///
    /// Mode and value change together: both are updated before any
    /// subscriber runs, so a `ModeChanged` handler already sees the new
    /// value. Each event fires only when its field really changed, compared
    /// with `==`; a NaN value therefore counts as a change on every call.
    pub fn set_software(&mut self, value: f32) {
        self.apply(ControlMode::Software, Some(value));
    }

    /// Register a change handler
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&Control, ControlEvent) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Drop a handler; `false` when it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn apply(&mut self, mode: ControlMode, value: Option<f32>) {
        let mode_changed = self.mode != mode;
        let value_changed = value.is_some_and(|v| self.software_value != v);
        self.mode = mode;
        if let Some(v) = value {
            self.software_value = v;
        }

        if mode_changed {
            self.notify(ControlEvent::ModeChanged);
        }
        if value_changed {
            self.notify(ControlEvent::ValueChanged);
        }

        if mode_changed {
            settings::write(
                &self.settings,
                &self.identifier.child(["mode"]).to_string(),
                &mode.code().to_string(),
            );
        }
        if value_changed {
            settings::write(
                &self.settings,
                &self.identifier.child(["value"]).to_string(),
                &settings::format_f32(self.software_value),
            );
        }
    }

    fn notify(&mut self, event: ControlEvent) {
        let mut subscribers = std::mem::take(&mut self.subscribers);
        for (_, handler) in subscribers.iter_mut() {
            handler(self, event);
        }
        self.subscribers = subscribers;
    }
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("identifier", &self.identifier)
            .field("mode", &self.mode)
            .field("software_value", &self.software_value)
            .field("min_software_value", &self.min_software_value)
            .field("max_software_value", &self.max_software_value)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
