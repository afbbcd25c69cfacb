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

//! Settings file on disk
//!
//! The in-memory store is a flat `BTreeMap<String, String>` keyed by
//! identifier strings; on disk it is a single pretty-printed JSON object.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hwtree_error::{HwtreeError, Result};
use tracing::warn;

/// Flat key/value map persisted between runs
pub type SettingsMap = BTreeMap<String, String>;

pub fn settings_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("hwtree").join("settings.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("hwtree")
            .join("settings.json");
    }
    PathBuf::from("/etc/hwtree/settings.json")
}

/// Read the settings file; a file that does not exist yet is an empty map
pub fn load_settings_file(path: &Path) -> Result<SettingsMap> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SettingsMap::new()),
        Err(e) => {
            return Err(HwtreeError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    if data.trim().is_empty() {
        return Ok(SettingsMap::new());
    }
    Ok(serde_json::from_str(&data)?)
}

pub fn save_settings_file(path: &Path, settings: &SettingsMap) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| HwtreeError::FileWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).map_err(|e| HwtreeError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(HwtreeError::invalid_key(key, "key is empty"));
    }
    if key.split('/').any(str::is_empty) {
        return Err(HwtreeError::invalid_key(key, "key has an empty segment"));
    }
    Ok(())
}

/// Drop keys that no identifier can produce and return them
///
/// Such keys are never looked up by the tree, so they are discarded with a
/// warning rather than failing the load.
pub fn validate_settings(settings: &mut SettingsMap) -> Vec<String> {
    let mut dropped = Vec::new();
    settings.retain(|key, _| match check_key(key) {
        Ok(()) => true,
        Err(e) => {
            warn!("Ignoring settings entry: {}", e);
            dropped.push(key.clone());
            false
        }
    });
    dropped
}
