// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pianobridge-channel: the host-facing side of the analytics bridge.
//
// Decodes channel messages, dispatches commands to the engine and the wrapped
// SDK, and encodes replies. Native SDK and host integrations implement the
// traits in `traits`; `stub` provides in-process stand-ins for desktop/CI.

pub mod args;
pub mod codec;
pub mod dispatcher;
pub mod logging;
pub mod stub;
pub mod traits;

pub use codec::{MethodCall, Reply};
pub use dispatcher::{AnalyticsBridge, Command, CommandError};
pub use traits::{AnalyticsSdk, HostContext, HostInfo, Transmission};

use std::sync::Arc;

/// Bridge wired to the recording SDK and a desktop host, for builds without
/// a native SDK.
pub fn stub_bridge() -> (AnalyticsBridge, Arc<stub::RecordingSdk>) {
    let sdk = Arc::new(stub::RecordingSdk::new());
    let bridge = AnalyticsBridge::new(sdk.clone(), Arc::new(stub::StaticHost::desktop()));
    (bridge, sdk)
}
