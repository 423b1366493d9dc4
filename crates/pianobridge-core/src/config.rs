// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analytics configuration handed to the SDK at init.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{VisitorIdType, VisitorStorageMode};

/// Default lifetime of a stored visitor, in days.
pub const DEFAULT_VISITOR_STORAGE_LIFETIME: u32 = 395;

/// Default collection path appended to the collect domain.
pub const DEFAULT_PATH: &str = "event";

/// SDK configuration assembled from the `init` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Site identifier events are reported to.
    pub site: i32,
    /// Domain of the collection endpoint.
    pub collect_domain: String,
    /// Path of the collection endpoint.
    pub path: String,
    pub visitor_id_type: VisitorIdType,
    /// Visitor lifetime in days.
    pub visitor_storage_lifetime: u32,
    pub visitor_storage_mode: VisitorStorageMode,
    /// Use a random visitor id instead of "opt-out" when the user limits ad
    /// tracking and the advertising id is selected.
    pub ignore_limited_ad_tracking: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            site: 0,
            collect_domain: String::new(),
            path: DEFAULT_PATH.to_owned(),
            visitor_id_type: VisitorIdType::default(),
            visitor_storage_lifetime: DEFAULT_VISITOR_STORAGE_LIFETIME,
            visitor_storage_mode: VisitorStorageMode::default(),
            ignore_limited_ad_tracking: false,
        }
    }
}

impl Configuration {
    /// Full collection URL for this configuration.
    pub fn report_url(&self) -> String {
        format!("https://{}/{}?s={}", self.collect_domain, self.path, self.site)
    }
}

/// Custom HTTP headers and query parameters attached to every hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpParameters {
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
}

impl HttpParameters {
    /// Set a header, or remove it when `value` is `None`.
    pub fn set_header(&mut self, key: impl Into<String>, value: Option<String>) {
        set_or_remove(&mut self.headers, key.into(), value);
    }

    /// Set a query parameter, or remove it when `value` is `None`.
    pub fn set_query(&mut self, key: impl Into<String>, value: Option<String>) {
        set_or_remove(&mut self.query, key.into(), value);
    }
}

fn set_or_remove(map: &mut BTreeMap<String, String>, key: String, value: Option<String>) {
    match value {
        Some(v) => {
            map.insert(key, v);
        }
        None => {
            map.remove(&key);
        }
    }
}
