// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Piano Analytics bridge: core types, boundary values and error definitions
// shared across all crates.

pub mod config;
pub mod error;
pub mod types;
pub mod value;

pub use config::{Configuration, HttpParameters};
pub use error::BridgeError;
pub use types::*;
pub use value::Value;
