// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process collaborators for desktop/CI builds where no native SDK is
// linked. The recording SDK keeps every call so tests and tooling can inspect
// what would have been transmitted.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use pianobridge_core::config::{Configuration, HttpParameters};
use pianobridge_core::error::{BridgeError, Result};
use pianobridge_core::types::{AdvertisingInfo, Event, User};

use crate::traits::{AnalyticsSdk, HostContext, HostInfo, Transmission};

/// A batch as seen by the SDK.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSend {
    pub events: Vec<Event>,
    pub visitor_id: Option<String>,
    pub user: Option<User>,
    pub http: HttpParameters,
}

/// SDK double that records calls instead of transmitting.
#[derive(Debug, Default)]
pub struct RecordingSdk {
    starts: Mutex<Vec<(Configuration, HostInfo)>>,
    endpoints: Mutex<Vec<(String, i32)>>,
    sends: Mutex<Vec<RecordedSend>>,
    fail_sends: AtomicBool,
}

impl RecordingSdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `send` fail with an SDK error.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn starts(&self) -> Vec<(Configuration, HostInfo)> {
        self.starts.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn endpoints(&self) -> Vec<(String, i32)> {
        self.endpoints.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn sends(&self) -> Vec<RecordedSend> {
        self.sends.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl AnalyticsSdk for RecordingSdk {
    fn start(&self, config: &Configuration, host: &HostInfo) -> Result<()> {
        tracing::debug!(url = %config.report_url(), platform = %host.platform, "recording SDK start");
        if let Ok(mut starts) = self.starts.lock() {
            starts.push((config.clone(), host.clone()));
        }
        Ok(())
    }

    fn update_endpoint(&self, collect_domain: &str, site: i32) -> Result<()> {
        if let Ok(mut endpoints) = self.endpoints.lock() {
            endpoints.push((collect_domain.to_owned(), site));
        }
        Ok(())
    }

    fn send(&self, transmission: Transmission<'_>) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            tracing::warn!(events = transmission.events.len(), "recording SDK rejecting send");
            return Err(BridgeError::Sdk("send rejected".into()));
        }
        if let Ok(mut sends) = self.sends.lock() {
            sends.push(RecordedSend {
                events: transmission.events.to_vec(),
                visitor_id: transmission.visitor_id.map(str::to_owned),
                user: transmission.user.cloned(),
                http: transmission.http.clone(),
            });
        }
        Ok(())
    }
}

/// Host context with a fixed snapshot, or detached when `None`.
#[derive(Debug, Clone, Default)]
pub struct StaticHost(pub Option<HostInfo>);

impl StaticHost {
    /// Attached desktop host without an advertising id.
    pub fn desktop() -> Self {
        Self(Some(HostInfo {
            platform: "Desktop (stub)".into(),
            advertising: None,
        }))
    }

    pub fn with_advertising(advertising: AdvertisingInfo) -> Self {
        Self(Some(HostInfo {
            platform: "Desktop (stub)".into(),
            advertising: Some(advertising),
        }))
    }

    pub fn detached() -> Self {
        Self(None)
    }
}

impl HostContext for StaticHost {
    fn attached(&self) -> Option<HostInfo> {
        if self.0.is_none() {
            tracing::warn!("host context requested but none attached");
        }
        self.0.clone()
    }
}
