// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Logging bootstrap for embedders.

/// Install a fmt subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Returns `false` when a global subscriber is already installed, in which
/// case the existing one is left in place.
pub fn init() -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("pianobridge logging initialised");
    }
    installed
}
