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

//! Tree traversal
//!
//! Observers implement [`Visitor`] and walk the tree through [`Node`]:
//!
//! - [`Node::accept`] presents one node to the visitor (exactly one call)
//! - [`Node::traverse`] accepts each child in order and nothing else
//!
//! The traversal strategy lives in the visitor. A pre-order walk calls
//! `traverse` at the end of each `visit_*`; a post-order walk calls it
//! first; a filter simply does not call it.
//!
//! # Example
//!
//! ```no_run
//! use hwtree::sensor::Sensor;
//! use hwtree::visitor::{Node, Visitor};
//! # fn tree() -> hwtree::hardware::Mainboard { unimplemented!() }
//!
//! struct CountSensors(usize);
//!
//! impl Visitor for CountSensors {
//!     fn visit_hardware(&mut self, hardware: &dyn hwtree::hardware::Hardware) {
//!         Node::Hardware(hardware).traverse(self);
//!     }
//!     fn visit_sensor(&mut self, _sensor: &Sensor) {
//!         self.0 += 1;
//!     }
//! }
//!
//! let board = tree();
//! let mut counter = CountSensors(0);
//! Node::Hardware(&board).accept(&mut counter);
//! ```

use std::fmt::Write;

use crate::control::{Control, ControlMode};
use crate::hardware::Hardware;
use crate::identifier::Identifier;
use crate::parameter::Parameter;
use crate::sensor::Sensor;

/// One handler per node kind; unimplemented handlers ignore the node
pub trait Visitor {
    fn visit_hardware(&mut self, hardware: &dyn Hardware) {
        let _ = hardware;
    }

    fn visit_sensor(&mut self, sensor: &Sensor) {
        let _ = sensor;
    }

    fn visit_parameter(&mut self, parameter: &Parameter) {
        let _ = parameter;
    }

    fn visit_control(&mut self, control: &Control) {
        let _ = control;
    }
}

/// Borrowed view of any node in the tree
#[derive(Clone, Copy)]
pub enum Node<'a> {
    Hardware(&'a dyn Hardware),
    Sensor(&'a Sensor),
    Parameter(&'a Parameter),
    Control(&'a Control),
}

impl<'a> Node<'a> {
    /// Present this node to `visitor`
    pub fn accept(self, visitor: &mut dyn Visitor) {
        match self {
            Node::Hardware(hardware) => visitor.visit_hardware(hardware),
            Node::Sensor(sensor) => visitor.visit_sensor(sensor),
            Node::Parameter(parameter) => visitor.visit_parameter(parameter),
            Node::Control(control) => visitor.visit_control(control),
        }
    }

    /// Accept every child in order
    pub fn traverse(self, visitor: &mut dyn Visitor) {
        for child in self.children() {
            child.accept(visitor);
        }
    }

    /// Children in traversal order
    ///
    /// Hardware: sub-hardware, then sensors. Sensor: parameters, then its
    /// control. Parameters and controls are leaves.
    pub fn children(self) -> Vec<Node<'a>> {
        match self {
            Node::Hardware(hardware) => hardware
                .sub_hardware()
                .iter()
                .map(|h| Node::Hardware(&**h))
                .chain(hardware.sensors().iter().map(Node::Sensor))
                .collect(),
            Node::Sensor(sensor) => sensor
                .parameters()
                .iter()
                .map(Node::Parameter)
                .chain(sensor.control().map(Node::Control))
                .collect(),
            Node::Parameter(_) | Node::Control(_) => Vec::new(),
        }
    }

    pub fn identifier(self) -> &'a Identifier {
        match self {
            Node::Hardware(hardware) => hardware.identifier(),
            Node::Sensor(sensor) => sensor.identifier(),
            Node::Parameter(parameter) => parameter.identifier(),
            Node::Control(control) => control.identifier(),
        }
    }
}

impl<'a> From<&'a Sensor> for Node<'a> {
    fn from(sensor: &'a Sensor) -> Self {
        Node::Sensor(sensor)
    }
}

impl<'a> From<&'a Parameter> for Node<'a> {
    fn from(parameter: &'a Parameter) -> Self {
        Node::Parameter(parameter)
    }
}

impl<'a> From<&'a Control> for Node<'a> {
    fn from(control: &'a Control) -> Self {
        Node::Control(control)
    }
}

/// Run one update cycle: the node first, then its sub-hardware
pub fn update_all(hardware: &mut dyn Hardware) {
    hardware.update();
    for child in hardware.sub_hardware_mut() {
        update_all(child.as_mut());
    }
}

/// Collects the identifiers of every sensor below a node, pre-order
#[derive(Debug, Default)]
pub struct SensorCollector {
    pub sensors: Vec<Identifier>,
}

impl Visitor for SensorCollector {
    fn visit_hardware(&mut self, hardware: &dyn Hardware) {
        Node::Hardware(hardware).traverse(self);
    }

    fn visit_sensor(&mut self, sensor: &Sensor) {
        self.sensors.push(sensor.identifier().clone());
    }
}

/// Indented text outline of the tree
#[derive(Debug, Default)]
pub struct ReportVisitor {
    out: String,
    depth: usize,
}

impl ReportVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        for _ in 0..self.depth {
            self.out.push_str("|  ");
        }
        self.out.push_str("+- ");
        let _ = self.out.write_fmt(text);
        self.out.push('\n');
    }

    fn nested(&mut self, node: Node<'_>) {
        self.depth += 1;
        node.traverse(self);
        self.depth -= 1;
    }
}

fn format_value(value: Option<f32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}

impl Visitor for ReportVisitor {
    fn visit_hardware(&mut self, hardware: &dyn Hardware) {
        self.line(format_args!("{} ({})", hardware.name(), hardware.identifier()));
        self.nested(Node::Hardware(hardware));
    }

    fn visit_sensor(&mut self, sensor: &Sensor) {
        self.line(format_args!(
            "{:<20} : {:>10} {:>10} {:>10} {} ({})",
            sensor.name(),
            format_value(sensor.value()),
            format_value(sensor.min()),
            format_value(sensor.max()),
            sensor.sensor_type().unit(),
            sensor.identifier()
        ));
        self.nested(Node::Sensor(sensor));
    }

    fn visit_parameter(&mut self, parameter: &Parameter) {
        let marker = if parameter.is_default() { "" } else { " *" };
        self.line(format_args!(
            "{} = {}{} ({})",
            parameter.name(),
            parameter.value(),
            marker,
            parameter.identifier()
        ));
    }

    fn visit_control(&mut self, control: &Control) {
        match control.mode() {
            ControlMode::Software => self.line(format_args!(
                "Control: software {}% ({})",
                control.software_value(),
                control.identifier()
            )),
            mode => self.line(format_args!("Control: {:?} ({})", mode, control.identifier())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{HardwareType, Mainboard};
    use crate::parameter::ParameterDescription;
    use crate::platform::{MockSuperIo, MockSuperIoProbe, NullProbe, SuperIo};
    use crate::sensor::SensorType;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    type Store = Rc<RefCell<HashMap<String, String>>>;

    fn store() -> Store {
        Rc::new(RefCell::new(HashMap::new()))
    }

    fn chip(discriminator: &'static str, fans: usize) -> Box<dyn SuperIo> {
        let mut chip = MockSuperIo::new();
        chip.expect_discriminator().return_const(discriminator.to_string());
        chip.expect_name().return_const(discriminator.to_string());
        chip.expect_voltages().returning(Vec::new);
        chip.expect_temperatures().returning(Vec::new);
        chip.expect_fans().returning(move || vec![Some(900.0); fans]);
        chip.expect_controls().returning(Vec::new);
        chip.expect_update().return_const(());
        Box::new(chip)
    }

    fn board_with_chips() -> Mainboard {
        let mut probe = MockSuperIoProbe::new();
        probe
            .expect_detect()
            .returning(|| Ok(vec![chip("nct6798d", 2), chip("it8792e", 1), chip("it8688e", 0)]));
        Mainboard::new(None, Box::new(probe), store())
    }

    /// Records every call without recursing
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Visitor for Recorder {
        fn visit_hardware(&mut self, hardware: &dyn Hardware) {
            self.calls.push(format!("hardware:{}", hardware.identifier()));
        }

        fn visit_sensor(&mut self, sensor: &Sensor) {
            self.calls.push(format!("sensor:{}", sensor.identifier()));
        }

        fn visit_parameter(&mut self, parameter: &Parameter) {
            self.calls.push(format!("parameter:{}", parameter.identifier()));
        }

        fn visit_control(&mut self, control: &Control) {
            self.calls.push(format!("control:{}", control.identifier()));
        }
    }

    #[test]
    fn test_accept_calls_exactly_one_handler() {
        let board = Mainboard::new(None, Box::new(NullProbe), store());
        let mut recorder = Recorder::default();
        Node::Hardware(&board).accept(&mut recorder);
        assert_eq!(recorder.calls, vec!["hardware:mainboard"]);
    }

    #[test]
    fn test_traverse_dispatches_once_per_child_in_probe_order() {
        let board = board_with_chips();
        let mut recorder = Recorder::default();
        Node::Hardware(&board).traverse(&mut recorder);
        assert_eq!(
            recorder.calls,
            vec!["hardware:lpc/nct6798d", "hardware:lpc/it8792e", "hardware:lpc/it8688e"]
        );
    }

    #[test]
    fn test_leaf_traverse_is_noop() {
        let s = store();
        let sensor = Sensor::new(&Identifier::new(["lpc", "x"]), 0, SensorType::Temperature, "T", s)
            .with_parameters([ParameterDescription::new("Offset [°C]", "", 0.0)]);
        let parameter = &sensor.parameters()[0];

        let mut recorder = Recorder::default();
        Node::from(parameter).traverse(&mut recorder);
        assert!(recorder.calls.is_empty());

        Node::from(parameter).accept(&mut recorder);
        assert_eq!(recorder.calls, vec!["parameter:lpc/x/temperature/0/parameter/offset[°c]"]);
    }

    #[test]
    fn test_sensor_children_parameters_then_control() {
        let mut sensor = Sensor::new(&Identifier::new(["lpc", "x"]), 0, SensorType::Control, "C", store())
            .with_parameters([ParameterDescription::new("Gain", "", 1.0)]);
        sensor.attach_control(0.0, 100.0);

        let mut recorder = Recorder::default();
        Node::Sensor(&sensor).traverse(&mut recorder);
        assert_eq!(
            recorder.calls,
            vec!["parameter:lpc/x/control/0/parameter/gain", "control:lpc/x/control/0/control"]
        );
    }

    #[test]
    fn test_sensor_collector_walks_whole_tree() {
        let board = board_with_chips();
        let mut collector = SensorCollector::default();
        Node::Hardware(&board).accept(&mut collector);
        let ids: Vec<String> = collector.sensors.iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["lpc/nct6798d/fan/0", "lpc/nct6798d/fan/1", "lpc/it8792e/fan/0"]);
    }

    #[test]
    fn test_update_all_reaches_children() {
        let mut board = board_with_chips();
        update_all(&mut board);
        let fan = &board.sub_hardware()[0].sensors()[1];
        assert_eq!(fan.value(), Some(900.0));
        assert_eq!(board.sub_hardware()[0].hardware_type(), HardwareType::SuperIo);
    }

    #[test]
    fn test_report_outline() {
        let mut board = board_with_chips();
        update_all(&mut board);
        let mut report = ReportVisitor::new();
        Node::Hardware(&board).accept(&mut report);
        let text = report.into_string();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "+- Unknown (mainboard)");
        assert_eq!(lines[1], "|  +- nct6798d (lpc/nct6798d)");
        assert!(lines[2].starts_with("|  |  +- Fan #1"));
        assert!(lines[2].contains("900.000"));
        assert!(lines[2].contains("RPM (lpc/nct6798d/fan/0)"));
        assert_eq!(lines.len(), 7);
    }
}
