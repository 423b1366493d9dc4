// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the analytics bridge.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Named consent state under which storage, event and property permissions
/// are evaluated by the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrivacyMode {
    OptIn,
    OptOut,
    Exempt,
    Custom,
    NoConsent,
    NoStorage,
}

impl PrivacyMode {
    /// Every mode, in declaration order.
    pub const ALL: [PrivacyMode; 6] = [
        Self::OptIn,
        Self::OptOut,
        Self::Exempt,
        Self::Custom,
        Self::NoConsent,
        Self::NoStorage,
    ];

    /// Wire name used by the host (e.g. `"opt-in"`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::OptIn => "opt-in",
            Self::OptOut => "opt-out",
            Self::Exempt => "exempt",
            Self::Custom => "custom",
            Self::NoConsent => "no-consent",
            Self::NoStorage => "no-storage",
        }
    }

    /// Resolve a wire name. Unknown names are an error.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == name)
            .ok_or_else(|| BridgeError::invalid_enum("privacy mode", name))
    }
}

impl std::fmt::Display for PrivacyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Category of on-device persistence gated by privacy rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageFeature {
    Visitor,
    Crash,
    Lifecycle,
    Privacy,
    User,
}

impl StorageFeature {
    pub const ALL: [StorageFeature; 5] = [
        Self::Visitor,
        Self::Crash,
        Self::Lifecycle,
        Self::Privacy,
        Self::User,
    ];

    /// Wire name used by the host (e.g. `"CRASH"`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Visitor => "VISITOR",
            Self::Crash => "CRASH",
            Self::Lifecycle => "LIFECYCLE",
            Self::Privacy => "PRIVACY",
            Self::User => "USER",
        }
    }

    /// Resolve a wire name. Unknown names are an error.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.name() == name)
            .ok_or_else(|| BridgeError::invalid_enum("storage feature", name))
    }
}

/// Source of the visitor identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitorIdType {
    #[default]
    Uuid,
    AdvertisingId,
    /// Visitor id supplied by the application.
    Custom,
}

impl VisitorIdType {
    /// Resolve a wire name. Anything unrecognised falls back to `Uuid`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ADID" => Self::AdvertisingId,
            "CUSTOM" => Self::Custom,
            _ => Self::Uuid,
        }
    }
}

/// How the visitor storage lifetime is counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitorStorageMode {
    /// Lifetime counted from the visitor's creation.
    #[default]
    Fixed,
    /// Lifetime extended on every visit.
    Relative,
}

impl VisitorStorageMode {
    /// Resolve a wire name. Anything other than `"relative"` is `Fixed`.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("relative") => Self::Relative,
            _ => Self::Fixed,
        }
    }
}

/// Advertising identifier reported by the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisingInfo {
    pub id: String,
    /// The user asked the platform to limit ad tracking.
    pub limit_ad_tracking: bool,
}

/// Authenticated user attached to subsequent events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub category: Option<String>,
    /// Whether the SDK may persist the user between sessions.
    pub should_be_stored: bool,
}

impl User {
    pub fn new(id: impl Into<String>, category: Option<String>, should_be_stored: bool) -> Self {
        Self {
            id: id.into(),
            category,
            should_be_stored,
        }
    }
}

/// Explicit serialization type for a property, overriding its natural type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForceType {
    Boolean,
    Integer,
    Float,
    String,
    Date,
    IntegerArray,
    FloatArray,
    StringArray,
}

impl ForceType {
    pub const ALL: [ForceType; 8] = [
        Self::Boolean,
        Self::Integer,
        Self::Float,
        Self::String,
        Self::Date,
        Self::IntegerArray,
        Self::FloatArray,
        Self::StringArray,
    ];

    /// Type prefix used on the wire (e.g. `"a:n"` for integer arrays).
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Boolean => "b",
            Self::Integer => "n",
            Self::Float => "f",
            Self::String => "s",
            Self::Date => "d",
            Self::IntegerArray => "a:n",
            Self::FloatArray => "a:f",
            Self::StringArray => "a:s",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.prefix() == prefix)
    }
}

/// Typed value of an event property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Date(DateTime<Utc>),
    IntArray(Vec<i32>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
}

impl PropertyValue {
    /// Serialization type implied by the in-memory representation.
    pub fn natural_type(&self) -> ForceType {
        match self {
            Self::Bool(_) => ForceType::Boolean,
            Self::Int(_) | Self::Long(_) => ForceType::Integer,
            Self::Double(_) => ForceType::Float,
            Self::String(_) => ForceType::String,
            Self::Date(_) => ForceType::Date,
            Self::IntArray(_) => ForceType::IntegerArray,
            Self::DoubleArray(_) => ForceType::FloatArray,
            Self::StringArray(_) => ForceType::StringArray,
        }
    }
}

/// A named, typed event property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    name: String,
    value: PropertyValue,
    force_type: Option<ForceType>,
}

impl Property {
    pub fn new(name: impl Into<String>, value: PropertyValue, force_type: Option<ForceType>) -> Self {
        Self {
            name: name.into(),
            value,
            force_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn force_type(&self) -> Option<ForceType> {
        self.force_type
    }

    /// Type the SDK serializes this property as: the forced type when one
    /// was requested, otherwise the value's natural type.
    pub fn serialized_type(&self) -> ForceType {
        self.force_type.unwrap_or_else(|| self.value.natural_type())
    }
}

/// An analytics event: a name plus a set of properties unique by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    name: String,
    properties: BTreeMap<String, Property>,
}

impl Event {
    /// Sentinel event name meaning "any event" in privacy rules.
    pub const ANY: &'static str = "*";
    pub const PAGE_DISPLAY: &'static str = "page.display";
    pub const CLICK_ACTION: &'static str = "click.action";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a property, replacing (and returning) any previous property with
    /// the same name.
    pub fn insert(&mut self, property: Property) -> Option<Property> {
        self.properties.insert(property.name.clone(), property)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Properties ordered by name.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
