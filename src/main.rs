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

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;
use tracing::{debug, info};

use hwtree::config::{load_settings_file, save_settings_file, settings_path, validate_settings, SettingsMap};
use hwtree::hardware::{Hardware, Mainboard};
use hwtree::logger;
use hwtree::platform::{read_board_info, NullProbe, DMI_ID_DIR};
use hwtree::visitor::{update_all, Node, ReportVisitor};

const USAGE: &str = "usage: hwtree [report|tree|reset-names] [--settings PATH] [--logging]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Report,
    Tree,
    ResetNames,
}

struct Args {
    command: Command,
    settings: Option<PathBuf>,
    logging: bool,
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let mut command = Command::Report;
    let mut settings = None;
    let mut logging = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "report" => command = Command::Report,
            "tree" => command = Command::Tree,
            "reset-names" => command = Command::ResetNames,
            "--logging" => logging = true,
            "--settings" => {
                i += 1;
                let path = args.get(i).with_context(|| format!("--settings needs a path\n{}", USAGE))?;
                settings = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {:?}\n{}", other, USAGE),
        }
        i += 1;
    }

    Ok(Args { command, settings, logging })
}

/// Reset every hardware and sensor name below `hardware` to its default
fn reset_names(hardware: &mut dyn Hardware) {
    hardware.set_name("");
    for sensor in hardware.sensors_mut() {
        sensor.set_name("");
    }
    for child in hardware.sub_hardware_mut() {
        reset_names(child.as_mut());
    }
}

fn full_report(board: &Mainboard) -> String {
    let mut report = board.report();
    for child in board.sub_hardware() {
        report.push('\n');
        report.push_str(&child.report());
    }
    report
}

fn outline(board: &Mainboard) -> String {
    let mut visitor = ReportVisitor::new();
    Node::Hardware(board).accept(&mut visitor);
    visitor.into_string()
}

/// Load the settings file, discarding entries no node can own
fn load_store(path: &Path) -> anyhow::Result<Rc<RefCell<SettingsMap>>> {
    let mut loaded = load_settings_file(path).with_context(|| format!("loading {}", path.display()))?;
    let dropped = validate_settings(&mut loaded);
    debug!(path = %path.display(), keys = loaded.len(), dropped = dropped.len(), "Loaded settings");
    Ok(Rc::new(RefCell::new(loaded)))
}

fn run(args: &Args, path: &Path) -> anyhow::Result<()> {
    let store = load_store(path)?;

    let board_info = read_board_info(Path::new(DMI_ID_DIR));
    let mut board = Mainboard::new(board_info, Box::new(NullProbe), store.clone());
    info!(name = %board.name(), chips = board.sub_hardware().len(), "Built hardware tree");

    update_all(&mut board);

    match args.command {
        Command::Report => print!("{}", full_report(&board)),
        Command::Tree => print!("{}", outline(&board)),
        Command::ResetNames => {
            reset_names(&mut board);
            print!("{}", outline(&board));
        }
    }

    board.close();

    let settings = store.borrow();
    save_settings_file(path, &settings)?;
    info!(path = %path.display(), "Saved settings");
    if args.logging {
        logger::log_event(
            "settings_saved",
            serde_json::json!({ "path": path.display().to_string(), "keys": settings.len() }),
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let raw: Vec<String> = std::env::args().collect();
    let args = parse_args(&raw)?;

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(&log_level)
        .with_writer(std::io::stderr)
        .init();

    if args.logging {
        logger::init_logging();
        logger::log_event("startup", serde_json::json!({ "args": raw }));
    }

    let path = args.settings.clone().unwrap_or_else(settings_path);

    if let Err(err) = run(&args, &path) {
        eprintln!("error: {err:#}");
        if args.logging {
            logger::log_event("fatal_error", serde_json::json!({ "error": format!("{err:#}") }));
        }
        std::process::exit(1);
    }

    Ok(())
}
