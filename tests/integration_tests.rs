/*
 * Integration tests for hwtree
 *
 * These tests build whole trees against an in-memory settings store and a
 * scripted Super-I/O probe, and check persistence across restarts.
 */

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use hwtree::config::{load_settings_file, save_settings_file, SettingsMap};
use hwtree::control::{Control, ControlMode};
use hwtree::hardware::{self, Hardware, Mainboard};
use hwtree::identifier::Identifier;
use hwtree::parameter::{Parameter, ParameterDescription};
use hwtree::platform::{BoardInfo, NullProbe, SuperIo, SuperIoProbe};
use hwtree::sensor::{Sensor, SensorType};
use hwtree::visitor::{update_all, Node, SensorCollector, Visitor};
use hwtree::HwtreeError;
use tempfile::TempDir;

type Store = Rc<RefCell<SettingsMap>>;
type Writes = Rc<RefCell<Vec<(String, usize, Option<u8>)>>>;

fn store() -> Store {
    Rc::new(RefCell::new(BTreeMap::new()))
}

fn store_with(entries: &[(&str, &str)]) -> Store {
    Rc::new(RefCell::new(
        entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    ))
}

/// Chip with fixed readings that records every control write
struct FakeChip {
    discriminator: String,
    voltages: Vec<Option<f32>>,
    temperatures: Vec<Option<f32>>,
    fans: Vec<Option<f32>>,
    controls: Vec<Option<f32>>,
    writes: Writes,
    closed: Rc<RefCell<Vec<String>>>,
}

impl SuperIo for FakeChip {
    fn discriminator(&self) -> String {
        self.discriminator.clone()
    }

    fn name(&self) -> String {
        self.discriminator.to_uppercase()
    }

    fn voltages(&self) -> Vec<Option<f32>> {
        self.voltages.clone()
    }

    fn temperatures(&self) -> Vec<Option<f32>> {
        self.temperatures.clone()
    }

    fn fans(&self) -> Vec<Option<f32>> {
        self.fans.clone()
    }

    fn controls(&self) -> Vec<Option<f32>> {
        self.controls.clone()
    }

    fn update(&mut self) {}

    fn set_control(&mut self, index: usize, value: Option<u8>) {
        self.writes.borrow_mut().push((self.discriminator.clone(), index, value));
        if let Some(slot) = self.controls.get_mut(index) {
            *slot = value.map(|v| f32::from(v) / 2.55);
        }
    }

    fn report(&self) -> String {
        format!("{}\n", self.name())
    }

    fn close(&mut self) {
        self.closed.borrow_mut().push(self.discriminator.clone());
    }
}

/// Probe that hands out the same chip layout on every detect
struct FakeProbe {
    chips: Vec<&'static str>,
    writes: Writes,
    closed: Rc<RefCell<Vec<String>>>,
}

impl FakeProbe {
    fn new(chips: &[&'static str]) -> Self {
        Self {
            chips: chips.to_vec(),
            writes: Rc::new(RefCell::new(Vec::new())),
            closed: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl SuperIoProbe for FakeProbe {
    fn detect(&mut self) -> hwtree::Result<Vec<Box<dyn SuperIo>>> {
        Ok(self
            .chips
            .iter()
            .map(|d| {
                Box::new(FakeChip {
                    discriminator: d.to_string(),
                    voltages: vec![Some(1.0), Some(3.3)],
                    temperatures: vec![Some(40.0)],
                    fans: vec![Some(1200.0), None],
                    controls: vec![Some(50.0)],
                    writes: self.writes.clone(),
                    closed: self.closed.clone(),
                }) as Box<dyn SuperIo>
            })
            .collect())
    }

    fn report(&self) -> String {
        String::from("Fake probe\n")
    }

    fn close(&mut self) {
        self.closed.borrow_mut().push("probe".to_string());
    }
}

struct FailingProbe;

impl SuperIoProbe for FailingProbe {
    fn detect(&mut self) -> hwtree::Result<Vec<Box<dyn SuperIo>>> {
        Err(HwtreeError::probe("no LPC access"))
    }

    fn report(&self) -> String {
        String::new()
    }

    fn close(&mut self) {}
}

#[derive(Default)]
struct CountAccepts {
    hardware: Vec<String>,
    parameters: usize,
    controls: usize,
}

impl Visitor for CountAccepts {
    fn visit_hardware(&mut self, hardware: &dyn Hardware) {
        self.hardware.push(hardware.identifier().to_string());
    }

    fn visit_parameter(&mut self, _parameter: &Parameter) {
        self.parameters += 1;
    }

    fn visit_control(&mut self, _control: &Control) {
        self.controls += 1;
    }
}

#[test]
fn test_identifier_structural_equality() {
    let a = Identifier::new(["lpc", "nct6798d"]).child(["fan", "0"]);
    let b = Identifier::new(["lpc", "nct6798d", "fan", "0"]);
    assert_eq!(a, b);
    assert_eq!(a.to_string(), b.to_string());
    assert_eq!(a.to_string(), a.to_string());
    assert_ne!(a, Identifier::new(["lpc", "nct6798d", "fan", "1"]));

    let parsed: Identifier = a.to_string().parse().unwrap();
    assert_eq!(parsed, a);
}

#[test]
fn test_parameter_round_trip_through_store() {
    let s = store();
    let sensor = Identifier::new(["lpc", "nct6798d", "temperature", "0"]);
    let desc = || ParameterDescription::new("Offset [°C]", "Temperature offset", 0.0);

    let mut p = Parameter::new(desc(), &sensor, s.clone());
    assert!(p.is_default());
    assert_eq!(p.value(), 0.0);
    p.set_value(-2.5);

    let restored = Parameter::new(desc(), &sensor, s.clone());
    assert_eq!(restored.value(), -2.5);
    assert!(!restored.is_default());
}

#[test]
fn test_parameter_set_default_is_idempotent() {
    let s = store();
    let sensor = Identifier::new(["lpc", "nct6798d", "voltage", "0"]);
    let mut p = Parameter::new(ParameterDescription::new("Vf [V]", "", 0.0), &sensor, s.clone());
    p.set_value(1.5);
    let key = p.identifier().to_string();
    assert!(s.borrow().contains_key(&key));

    p.set_default(true);
    assert!(!s.borrow().contains_key(&key));
    p.set_default(true);
    assert!(!s.borrow().contains_key(&key));
    assert!(p.is_default());
    assert_eq!(p.value(), 0.0);
}

#[test]
fn test_control_scenario_from_store() {
    let s = store_with(&[
        ("mainboard/control/0/mode", "2"),
        ("mainboard/control/0/value", "55.5"),
    ]);
    let control = Control::with_identifier(Identifier::new(["mainboard", "control", "0"]), s, 0.0, 100.0);
    assert_eq!(control.mode(), ControlMode::Software);
    assert_eq!(control.software_value(), 55.5);
}

#[test]
fn test_control_never_returns_to_undefined() {
    let s = store();
    let sensor = Identifier::new(["lpc", "nct6798d", "control", "0"]);
    let mut control = Control::new(&sensor, s, 0.0, 100.0);
    assert_eq!(control.mode(), ControlMode::Undefined);

    let changes = Rc::new(RefCell::new(0));
    let seen = changes.clone();
    control.subscribe(move |_, _| *seen.borrow_mut() += 1);

    control.set_software(30.0);
    let after_first = *changes.borrow();
    control.set_software(30.0);
    assert_eq!(*changes.borrow(), after_first);

    control.set_default();
    assert_eq!(control.mode(), ControlMode::Default);
    control.set_software(70.0);
    assert_ne!(control.mode(), ControlMode::Undefined);
}

#[test]
fn test_unknown_mainboard_name_scenario() {
    let s = store();
    let mut board = Mainboard::new(None, Box::new(NullProbe), s.clone());
    assert_eq!(board.name(), "Unknown");
    board.set_name("");
    assert_eq!(board.name(), "Unknown");
    assert_eq!(s.borrow().get("mainboard/name").map(String::as_str), Some("Unknown"));
}

#[test]
fn test_traverse_accepts_each_child_in_probe_order() {
    let board = Mainboard::new(None, Box::new(FakeProbe::new(&["nct6798d", "it8792e", "it8688e"])), store());
    let mut visitor = CountAccepts::default();
    Node::Hardware(&board).traverse(&mut visitor);
    assert_eq!(visitor.hardware, vec!["lpc/nct6798d", "lpc/it8792e", "lpc/it8688e"]);
}

#[test]
fn test_accept_on_parameter_calls_one_method() {
    let sensor = Sensor::new(&Identifier::new(["lpc", "x"]), 0, SensorType::Voltage, "V", store())
        .with_parameters([ParameterDescription::new("Ri [kΩ]", "", 0.0)]);
    let mut visitor = CountAccepts::default();
    Node::Parameter(&sensor.parameters()[0]).accept(&mut visitor);
    assert_eq!(visitor.parameters, 1);
    assert_eq!(visitor.controls, 0);
    assert!(visitor.hardware.is_empty());
}

#[test]
fn test_full_tree_layout_and_update() {
    let mut board = Mainboard::new(
        Some(BoardInfo::new("ASUSTeK COMPUTER INC.", "PRIME X570-P")),
        Box::new(FakeProbe::new(&["nct6798d"])),
        store(),
    );
    assert_eq!(board.name(), "ASUSTeK COMPUTER INC. PRIME X570-P");
    update_all(&mut board);

    let mut collector = SensorCollector::default();
    Node::Hardware(&board).accept(&mut collector);
    let ids: Vec<String> = collector.sensors.iter().map(|id| id.to_string()).collect();
    assert_eq!(
        ids,
        vec![
            "lpc/nct6798d/voltage/0",
            "lpc/nct6798d/voltage/1",
            "lpc/nct6798d/temperature/0",
            "lpc/nct6798d/fan/0",
            "lpc/nct6798d/fan/1",
            "lpc/nct6798d/control/0",
        ]
    );

    let chip = hardware::find(&board, &Identifier::new(["lpc", "nct6798d"])).unwrap();
    assert_eq!(chip.parent(), Some(board.identifier()));
    assert_eq!(chip.sensors()[2].value(), Some(40.0));
    assert_eq!(chip.sensors()[3].value(), Some(1200.0));
    assert_eq!(chip.sensors()[4].value(), None);
}

#[test]
fn test_probe_failure_yields_empty_board() {
    let board = Mainboard::new(None, Box::new(FailingProbe), store());
    assert!(board.sub_hardware().is_empty());
    assert_eq!(board.name(), "Unknown");
}

#[test]
fn test_close_releases_chips_before_probe() {
    let probe = FakeProbe::new(&["nct6798d", "it8792e"]);
    let closed = probe.closed.clone();
    let writes = probe.writes.clone();
    let mut board = Mainboard::new(None, Box::new(probe), store());
    board.close();

    assert_eq!(*closed.borrow(), vec!["nct6798d", "it8792e", "probe"]);
    // every control channel is handed back to the chip on close
    assert_eq!(
        *writes.borrow(),
        vec![
            ("nct6798d".to_string(), 0, None),
            ("it8792e".to_string(), 0, None),
        ]
    );
}

#[test]
fn test_overrides_survive_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hwtree").join("settings.json");
    let chip_id = Identifier::new(["lpc", "nct6798d"]);

    // first run: user customises names, a parameter and a fan control
    {
        let s: Store = Rc::new(RefCell::new(load_settings_file(&path).unwrap()));
        let mut board = Mainboard::new(None, Box::new(FakeProbe::new(&["nct6798d"])), s.clone());
        board.set_name("Workstation");

        let chip = hardware::find_mut(&mut board, &chip_id).unwrap();
        chip.set_name("Main SIO");
        let sensors = chip.sensors_mut();
        sensors[2].set_name("CPU");
        sensors[2].parameter_mut("Offset [°C]").unwrap().set_value(-3.0);
        sensors[5].control_mut().unwrap().set_software(40.0);

        board.close();
        save_settings_file(&path, &s.borrow()).unwrap();
    }

    // second run: everything comes back, and the fan override reaches the chip
    let s: Store = Rc::new(RefCell::new(load_settings_file(&path).unwrap()));
    assert_eq!(s.borrow().get("lpc/nct6798d/control/0/control/mode").map(String::as_str), Some("2"));

    let probe = FakeProbe::new(&["nct6798d"]);
    let writes = probe.writes.clone();
    let mut board = Mainboard::new(None, Box::new(probe), s);
    assert_eq!(board.name(), "Workstation");
    assert_eq!(*writes.borrow(), vec![("nct6798d".to_string(), 0, Some(102))]);

    update_all(&mut board);
    let chip = hardware::find(&board, &chip_id).unwrap();
    assert_eq!(chip.name(), "Main SIO");
    let cpu = &chip.sensors()[2];
    assert_eq!(cpu.name(), "CPU");
    assert_eq!(cpu.value(), Some(37.0));
    let control = chip.sensors()[5].control().unwrap();
    assert_eq!(control.mode(), ControlMode::Software);
    assert_eq!(control.software_value(), 40.0);
}

#[test]
fn test_corrupt_values_never_abort_startup() {
    let s = store_with(&[
        ("lpc/nct6798d/temperature/0/parameter/offset[°c]", "warm"),
        ("lpc/nct6798d/control/0/control/mode", "7"),
        ("lpc/nct6798d/control/0/control/value", "fast"),
    ]);
    let probe = FakeProbe::new(&["nct6798d"]);
    let writes = probe.writes.clone();
    let board = Mainboard::new(None, Box::new(probe), s);

    let chip = &board.sub_hardware()[0];
    let offset = chip.sensors()[2].parameter("Offset [°C]").unwrap();
    assert_eq!(offset.value(), offset.default_value());
    let control = chip.sensors()[5].control().unwrap();
    assert_eq!(control.mode(), ControlMode::Undefined);
    assert_eq!(control.software_value(), 0.0);
    assert!(writes.borrow().is_empty());
}

#[test]
fn test_default_to_software_is_a_single_chip_write() {
    let s = store_with(&[("lpc/nct6798d/control/0/control/mode", "1")]);
    let probe = FakeProbe::new(&["nct6798d"]);
    let writes = probe.writes.clone();
    let mut board = Mainboard::new(None, Box::new(probe), s);
    assert_eq!(*writes.borrow(), vec![("nct6798d".to_string(), 0, None)]);
    writes.borrow_mut().clear();

    let chip = hardware::find_mut(&mut board, &Identifier::new(["lpc", "nct6798d"])).unwrap();
    chip.sensors_mut()[5].control_mut().unwrap().set_software(60.0);
    assert_eq!(*writes.borrow(), vec![("nct6798d".to_string(), 0, Some(153))]);
}
