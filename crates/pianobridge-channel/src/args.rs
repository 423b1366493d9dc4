// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed access to a command's argument map.
//
// A key that is absent, null or of the wrong type counts as missing.

use pianobridge_core::error::{BridgeError, Result};
use pianobridge_core::value::Value;

#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    value: &'a Value,
}

impl<'a> Args<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.value.get(key).filter(|v| !v.is_null())
    }

    fn missing(key: &str) -> BridgeError {
        BridgeError::MissingArgument(key.to_owned())
    }

    pub fn str(&self, key: &str) -> Result<&'a str> {
        self.opt_str(key).ok_or_else(|| Self::missing(key))
    }

    pub fn opt_str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn i32(&self, key: &str) -> Result<i32> {
        self.opt_i32(key).ok_or_else(|| Self::missing(key))
    }

    pub fn opt_i32(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(Value::as_i32)
    }

    pub fn opt_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn list(&self, key: &str) -> Result<&'a [Value]> {
        self.get(key)
            .and_then(Value::as_list)
            .ok_or_else(|| Self::missing(key))
    }

    /// List of strings; any non-string element makes the argument invalid.
    pub fn str_list(&self, key: &str) -> Result<Vec<&'a str>> {
        self.opt_str_list(key)?.ok_or_else(|| Self::missing(key))
    }

    /// Like [`Args::str_list`], but absence is `Ok(None)`.
    pub fn opt_str_list(&self, key: &str) -> Result<Option<Vec<&'a str>>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let items = value.as_list().ok_or_else(|| Self::missing(key))?;
        items
            .iter()
            .map(|item| item.as_str().ok_or_else(|| Self::missing(key)))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// String-to-string map; entries with a non-string key or value are
    /// skipped.
    pub fn str_map(&self, key: &str) -> Vec<(&'a str, &'a str)> {
        self.get(key)
            .and_then(Value::as_map)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(k, v)| Some((k.as_str()?, v.as_str()?)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
