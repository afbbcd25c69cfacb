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

//! Super-I/O chip node
//!
//! Wraps one chip handle from the platform probe and exposes its channels as
//! sensors:
//!
//! - voltages, corrected by the `Ri`/`Rf`/`Vf` divider parameters
//! - temperatures, shifted by an `Offset` parameter
//! - fans, reported as read
//! - fan controls, each carrying a [`Control`](crate::control::Control) that
//!   drives the chip's duty cycle through a change subscriber

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::{Hardware, HardwareType};
use crate::control::ControlMode;
use crate::identifier::Identifier;
use crate::parameter::ParameterDescription;
use crate::platform::SuperIo;
use crate::sensor::{Sensor, SensorType};
use crate::settings::{PersistedName, SharedSettings};

pub const RI: &str = "Ri [kΩ]";
pub const RF: &str = "Rf [kΩ]";
pub const VF: &str = "Vf [V]";
pub const OFFSET: &str = "Offset [°C]";

/// Control bounds in percent
pub const CONTROL_MIN: f32 = 0.0;
pub const CONTROL_MAX: f32 = 100.0;

const FORMULA: &str = "Voltage = value + (value - Vf) * Ri / Rf.";

type SharedChip = Rc<RefCell<Box<dyn SuperIo>>>;

/// Raw duty cycle (0-255) for a percentage
pub fn duty_from_percent(percent: f32) -> u8 {
    (percent * 2.55).round().clamp(0.0, 255.0) as u8
}

/// Divider-corrected voltage; `rf == 0` leaves the reading untouched
pub fn corrected_voltage(raw: f32, ri: f32, rf: f32, vf: f32) -> f32 {
    if rf == 0.0 {
        return raw;
    }
    raw + (raw - vf) * ri / rf
}

fn voltage_parameters() -> Vec<ParameterDescription> {
    vec![
        ParameterDescription::new(RI, format!("Input resistance.\n{}", FORMULA), 0.0),
        ParameterDescription::new(RF, format!("Reference resistance.\n{}", FORMULA), 1.0),
        ParameterDescription::new(VF, format!("Reference voltage.\n{}", FORMULA), 0.0),
    ]
}

fn temperature_parameters() -> Vec<ParameterDescription> {
    vec![ParameterDescription::new(
        OFFSET,
        "Temperature offset to be added to the actual value.",
        0.0,
    )]
}

/// Chip write for a control state; `None` leaves the channel untouched
fn channel_target(mode: ControlMode, value: f32) -> Option<Option<u8>> {
    match mode {
        ControlMode::Undefined => None,
        ControlMode::Default => Some(None),
        ControlMode::Software => Some(Some(duty_from_percent(value))),
    }
}

fn parameter_value(sensor: &Sensor, name: &str) -> f32 {
    sensor.parameter(name).map_or(0.0, |p| p.value())
}

pub struct SuperIoHardware {
    identifier: Identifier,
    parent: Identifier,
    name: PersistedName,
    chip: SharedChip,
    sensors: Vec<Sensor>,
    sub_hardware: Vec<Box<dyn Hardware>>,
    settings: SharedSettings,
    closed: bool,
}

impl SuperIoHardware {
    pub fn new(parent: &Identifier, chip: Box<dyn SuperIo>, settings: SharedSettings) -> Self {
        let identifier = Identifier::new(["lpc".to_string(), chip.discriminator()]);
        let name = PersistedName::restore(&identifier, chip.name(), &settings);

        let voltages = chip.voltages().len();
        let temperatures = chip.temperatures().len();
        let fans = chip.fans().len();
        let controls = chip.controls().len();
        let chip: SharedChip = Rc::new(RefCell::new(chip));

        let mut sensors = Vec::with_capacity(voltages + temperatures + fans + controls);
        for i in 0..voltages {
            sensors.push(
                Sensor::new(&identifier, i, SensorType::Voltage, format!("Voltage #{}", i + 1), settings.clone())
                    .with_parameters(voltage_parameters()),
            );
        }
        for i in 0..temperatures {
            sensors.push(
                Sensor::new(&identifier, i, SensorType::Temperature, format!("Temperature #{}", i + 1), settings.clone())
                    .with_parameters(temperature_parameters()),
            );
        }
        for i in 0..fans {
            sensors.push(Sensor::new(&identifier, i, SensorType::Fan, format!("Fan #{}", i + 1), settings.clone()));
        }
        for i in 0..controls {
            let mut sensor = Sensor::new(
                &identifier,
                i,
                SensorType::Control,
                format!("Fan Control #{}", i + 1),
                settings.clone(),
            );
            let control = sensor.attach_control(CONTROL_MIN, CONTROL_MAX);

            // restored overrides take effect right away
            let mut last = channel_target(control.mode(), control.software_value());
            if let Some(target) = last {
                chip.borrow_mut().set_control(i, target);
            }

            let handle = Rc::clone(&chip);
            control.subscribe(move |c, _| {
                let target = channel_target(c.mode(), c.software_value());
                if let Some(duty) = target {
                    if target != last {
                        handle.borrow_mut().set_control(i, duty);
                        last = target;
                    }
                }
            });
            debug!(control = %control.identifier(), mode = ?control.mode(), "wired fan control");
            sensors.push(sensor);
        }

        Self {
            identifier,
            parent: parent.clone(),
            name,
            chip,
            sensors,
            sub_hardware: Vec::new(),
            settings,
            closed: false,
        }
    }

    fn sensor_mut(&mut self, sensor_type: SensorType, index: usize) -> Option<&mut Sensor> {
        self.sensors
            .iter_mut()
            .find(|s| s.sensor_type() == sensor_type && s.index() == index)
    }

    /// Sensor of the given type and channel index
    pub fn sensor(&self, sensor_type: SensorType, index: usize) -> Option<&Sensor> {
        self.sensors
            .iter()
            .find(|s| s.sensor_type() == sensor_type && s.index() == index)
    }

    /// Control sensor for channel `index`, for fan-control logic
    pub fn control_sensor_mut(&mut self, index: usize) -> Option<&mut Sensor> {
        self.sensor_mut(SensorType::Control, index)
    }
}

impl Hardware for SuperIoHardware {
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
        HardwareType::SuperIo
    }

    fn parent(&self) -> Option<&Identifier> {
        Some(&self.parent)
    }

    fn sub_hardware(&self) -> &[Box<dyn Hardware>] {
        &self.sub_hardware
    }

    fn sub_hardware_mut(&mut self) -> &mut [Box<dyn Hardware>] {
        &mut self.sub_hardware
    }

    fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    fn sensors_mut(&mut self) -> &mut [Sensor] {
        &mut self.sensors
    }

    fn report(&self) -> String {
        self.chip.borrow().report()
    }

    fn update(&mut self) {
        let (voltages, temperatures, fans, controls) = {
            let mut chip = self.chip.borrow_mut();
            chip.update();
            (chip.voltages(), chip.temperatures(), chip.fans(), chip.controls())
        };

        for sensor in self.sensors.iter_mut() {
            let i = sensor.index();
            let value = match sensor.sensor_type() {
                SensorType::Voltage => voltages.get(i).copied().flatten().map(|raw| {
                    corrected_voltage(
                        raw,
                        parameter_value(sensor, RI),
                        parameter_value(sensor, RF),
                        parameter_value(sensor, VF),
                    )
                }),
                SensorType::Temperature => temperatures
                    .get(i)
                    .copied()
                    .flatten()
                    .map(|raw| raw + parameter_value(sensor, OFFSET)),
                SensorType::Fan => fans.get(i).copied().flatten(),
                SensorType::Control => controls.get(i).copied().flatten(),
                _ => None,
            };
            sensor.set_value(value);
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        let mut chip = self.chip.borrow_mut();
        for sensor in self.sensors.iter().filter(|s| s.sensor_type() == SensorType::Control) {
            chip.set_control(sensor.index(), None);
        }
        chip.close();
        drop(chip);
        self.closed = true;
    }
}
