// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator contracts the bridge relies on.
//
// The analytics SDK owns event delivery, HTTP transport and on-device
// storage; the host supplies platform context at `init`. Both are plugged in
// by the embedding layer.

use pianobridge_core::config::{Configuration, HttpParameters};
use pianobridge_core::error::Result;
use pianobridge_core::types::{AdvertisingInfo, Event, User};
use pianobridge_engine::PrivacyRegistry;

/// Platform context captured once during `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    /// Human-readable platform name (e.g. "iOS 17", "Android 14").
    pub platform: String,
    /// Advertising id, when the platform exposes one.
    pub advertising: Option<AdvertisingInfo>,
}

/// Accessor for the host application context.
///
/// Called only while handling `init`; the returned snapshot is not retained
/// by the bridge.
pub trait HostContext: Send + Sync {
    /// Current host context, or `None` when no host is attached.
    fn attached(&self) -> Option<HostInfo>;
}

/// Everything the SDK needs to transmit one event batch.
#[derive(Debug, Clone, Copy)]
pub struct Transmission<'a> {
    pub events: &'a [Event],
    pub visitor_id: Option<&'a str>,
    pub user: Option<&'a User>,
    pub http: &'a HttpParameters,
    /// Rules the SDK evaluates against its current privacy mode.
    pub privacy: &'a PrivacyRegistry,
}

/// The wrapped analytics SDK.
pub trait AnalyticsSdk: Send + Sync {
    /// Start a session with the given configuration.
    fn start(&self, config: &Configuration, host: &HostInfo) -> Result<()>;

    /// Point an existing session at a new collection endpoint.
    fn update_endpoint(&self, collect_domain: &str, site: i32) -> Result<()>;

    /// Transmit one batch as a single unit.
    fn send(&self, transmission: Transmission<'_>) -> Result<()>;
}
