// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analytics bridge engine: turns untyped channel values into typed events,
// keeps the per-privacy-mode rule registry, and tracks visitor/user identity.
// Nothing in this crate performs I/O.

pub mod batch;
pub mod coerce;
pub mod identity;
pub mod privacy;

pub use batch::{build_event, build_events};
pub use coerce::coerce;
pub use identity::Identity;
pub use privacy::{ModeRules, PrivacyRegistry, RuleAction, RuleUpdate};
