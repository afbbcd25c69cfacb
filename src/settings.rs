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

//! Settings store contract and canonical number format
//!
//! Every node receives the session's store as a [`SharedSettings`] handle at
//! construction. The store is a flat string map keyed by
//! [`Identifier`](crate::identifier::Identifier) strings; loading and saving
//! it is the host's job (see [`crate::config`]).
//!
//! Numbers are written with Rust's `Display` for `f32`, which is
//! locale-independent and round-trips exactly. Parsing is lenient about
//! surrounding whitespace and never panics: corrupt settings must not stop
//! the tree from coming up.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tracing::debug;

use crate::identifier::Identifier;

/// String key/value store holding user overrides
pub trait SettingsStore {
    fn try_get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str);

    fn remove(&mut self, key: &str);

    fn contains(&self, key: &str) -> bool {
        self.try_get(key).is_some()
    }
}

/// Non-owning handle every node keeps to the session's store
pub type SharedSettings = Rc<RefCell<dyn SettingsStore>>;

/// Wrap a concrete store into a shareable handle
pub fn shared<S: SettingsStore + 'static>(store: S) -> SharedSettings {
    Rc::new(RefCell::new(store))
}

impl SettingsStore for HashMap<String, String> {
    fn try_get(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        HashMap::remove(self, key);
    }
}

impl SettingsStore for BTreeMap<String, String> {
    fn try_get(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        BTreeMap::remove(self, key);
    }
}

/// Read a key from the shared store
pub(crate) fn read(settings: &SharedSettings, key: &str) -> Option<String> {
    settings.borrow().try_get(key)
}

/// Write a key; the store borrow is released before returning
pub(crate) fn write(settings: &SharedSettings, key: &str, value: &str) {
    debug!(key, value, "settings write");
    settings.borrow_mut().set(key, value);
}

pub(crate) fn erase(settings: &SharedSettings, key: &str) {
    debug!(key, "settings remove");
    settings.borrow_mut().remove(key);
}

/// User-overridable display name persisted under `<node>/name`
///
/// The computed default is kept as the reset target. Every assignment is
/// written to the store, including resets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PersistedName {
    key: String,
    default: String,
    current: String,
}

impl PersistedName {
    pub(crate) fn restore(node: &Identifier, default: String, settings: &SharedSettings) -> Self {
        let key = node.child(["name"]).to_string();
        let current = read(settings, &key).unwrap_or_else(|| default.clone());
        Self { key, default, current }
    }

    pub(crate) fn get(&self) -> &str {
        &self.current
    }

    pub(crate) fn default_name(&self) -> &str {
        &self.default
    }

    /// Empty resets to the default
    pub(crate) fn set(&mut self, name: &str, settings: &SharedSettings) {
        self.current = if name.is_empty() {
            self.default.clone()
        } else {
            name.to_string()
        };
        write(settings, &self.key, &self.current);
    }
}

/// Canonical, locale-independent form of a float
pub fn format_f32(value: f32) -> String {
    value.to_string()
}

/// Parse a float written by [`format_f32`]; `None` on malformed input
pub fn parse_f32(s: &str) -> Option<f32> {
    s.trim().parse::<f32>().ok()
}

/// Parse a decimal integer; `None` on malformed input
pub fn parse_i32(s: &str) -> Option<i32> {
    s.trim().parse::<i32>().ok()
}
