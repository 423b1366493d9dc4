// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loosely-typed values as they cross the message channel.
//
// The host sends untyped maps and lists; everything the bridge consumes is
// first decoded into `Value` and only then converted into domain types.

use chrono::{DateTime, Utc};

/// A value received from (or returned to) the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(DateTime<Utc>),
    List(Vec<Value>),
    /// Entries in wire order. Keys are usually strings but the channel
    /// allows any value.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Short type label for log and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Date(_) => "date",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// 32-bit integer view; a `Long` is accepted when it fits.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Long(l) => i32::try_from(*l).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a string key in a map value. When the key appears more than
    /// once the last entry wins.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .rev()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Build a map value from string keys.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::String(k.into()), v))
                .collect(),
        )
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<i64> for Value {
    fn from(l: i64) -> Self {
        Self::Long(l)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

/// JSON numbers become `Int` when they fit 32 bits, `Long` when they fit 64
/// bits, and `Double` otherwise, mirroring how the host's codec sizes ints.
#[cfg(any(test, feature = "json"))]
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(l) = n.as_i64() {
                    i32::try_from(l).map_or(Self::Long(l), Self::Int)
                } else {
                    Self::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (Value::String(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_are_sized() {
        assert_eq!(Value::from(json!(7)), Value::Int(7));
        assert_eq!(Value::from(json!(5_000_000_000i64)), Value::Long(5_000_000_000));
        assert_eq!(Value::from(json!(1.5)), Value::Double(1.5));
    }

    #[test]
    fn map_lookup_by_key() {
        let value = Value::from(json!({"site": 123, "collectDomain": "x.pa-cd.com"}));
        assert_eq!(value.get("site").and_then(Value::as_i32), Some(123));
        assert_eq!(value.get("collectDomain").and_then(Value::as_str), Some("x.pa-cd.com"));
        assert!(value.get("missing").is_none());
    }

    #[test]
    fn duplicate_map_keys_resolve_to_last() {
        let value = Value::Map(vec![
            (Value::from("k"), Value::Int(1)),
            (Value::from("k"), Value::Int(2)),
        ]);
        assert_eq!(value.get("k"), Some(&Value::Int(2)));
    }

    #[test]
    fn long_narrows_only_when_it_fits() {
        assert_eq!(Value::Long(42).as_i32(), Some(42));
        assert_eq!(Value::Long(i64::MAX).as_i32(), None);
    }
}
