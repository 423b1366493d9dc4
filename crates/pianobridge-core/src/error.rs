// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the analytics bridge.

use thiserror::Error;

/// Top-level error type for all bridge operations.
///
/// Every variant is surfaced to the host as a failed command result; none of
/// them is retried internally.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Command arguments --
    #[error("undefined argument \"{0}\"")]
    MissingArgument(String),

    #[error("invalid value for {kind} \"{value}\"")]
    InvalidEnumValue { kind: &'static str, value: String },

    #[error("invalid value \"{value}\" for argument \"{key}\"")]
    InvalidArgument { key: String, value: String },

    #[error("unknown method \"{0}\"")]
    UnknownMethod(String),

    // -- Event building --
    #[error("undefined event name")]
    MissingEventName,

    #[error("undefined property name in event \"{event}\"")]
    MissingPropertyName { event: String },

    #[error("undefined value of property \"{property}\" in event \"{event}\"")]
    MissingPropertyValue { event: String, property: String },

    #[error("invalid property name \"{0}\"")]
    InvalidPropertyName(String),

    #[error("invalid type of property \"{0}\"")]
    InvalidPropertyType(String),

    #[error("invalid array value type of property \"{0}\"")]
    InvalidArrayElementType(String),

    // -- Lifecycle --
    #[error("analytics is not initialized")]
    NotInitialized,

    #[error("host context not attached")]
    HostNotAttached,

    // -- Channel / collaborator --
    #[error("malformed channel message: {0}")]
    Codec(String),

    #[error("analytics SDK error: {0}")]
    Sdk(String),
}

impl BridgeError {
    /// Shorthand for an unresolvable enumeration name.
    pub fn invalid_enum(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidEnumValue {
            kind,
            value: value.into(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;
