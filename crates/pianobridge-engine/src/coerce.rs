// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Property coercion: untyped `(name, value, forceType)` from the channel into
// a typed `Property`.
//
// The forced type is metadata only. It tells the SDK how to serialize the
// value and never re-casts what the host sent, so `{"value": "1",
// "forceType": "n"}` stays a string tagged as an integer.

use tracing::{debug, warn};

use pianobridge_core::error::{BridgeError, Result};
use pianobridge_core::types::{ForceType, Property, PropertyValue};
use pianobridge_core::value::Value;

/// Build a typed property from a raw channel value.
///
/// Unknown `force_type` tokens are ignored (with a warning) rather than
/// rejected, keeping the boundary lenient.
pub fn coerce(name: &str, raw: &Value, force_type: Option<&str>) -> Result<Property> {
    if name.is_empty() {
        return Err(BridgeError::InvalidPropertyName(name.to_owned()));
    }

    let value = match raw {
        Value::Bool(b) => PropertyValue::Bool(*b),
        Value::Int(i) => PropertyValue::Int(*i),
        Value::Long(l) => PropertyValue::Long(*l),
        Value::Double(d) => PropertyValue::Double(*d),
        Value::String(s) => PropertyValue::String(s.clone()),
        Value::Date(d) => PropertyValue::Date(*d),
        Value::List(items) => coerce_array(name, items)?,
        Value::Null | Value::Bytes(_) | Value::Map(_) => {
            return Err(BridgeError::InvalidPropertyType(name.to_owned()));
        }
    };

    Ok(Property::new(name, value, resolve_force_type(name, force_type)))
}

/// Arrays take the type of their first element. Elements of any other type
/// are dropped, not rejected.
fn coerce_array(name: &str, items: &[Value]) -> Result<PropertyValue> {
    let value = match items.first() {
        Some(Value::Int(_)) => PropertyValue::IntArray(
            items
                .iter()
                .filter_map(|v| match v {
                    Value::Int(i) => Some(*i),
                    _ => None,
                })
                .collect(),
        ),
        Some(Value::Double(_)) => PropertyValue::DoubleArray(
            items
                .iter()
                .filter_map(|v| match v {
                    Value::Double(d) => Some(*d),
                    _ => None,
                })
                .collect(),
        ),
        Some(Value::String(_)) => PropertyValue::StringArray(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect(),
        ),
        _ => return Err(BridgeError::InvalidArrayElementType(name.to_owned())),
    };

    let kept = match &value {
        PropertyValue::IntArray(v) => v.len(),
        PropertyValue::DoubleArray(v) => v.len(),
        PropertyValue::StringArray(v) => v.len(),
        _ => items.len(),
    };
    if kept < items.len() {
        warn!(
            property = name,
            dropped = items.len() - kept,
            "mixed array: elements not matching the first element's type were dropped"
        );
    }

    Ok(value)
}

fn resolve_force_type(name: &str, token: Option<&str>) -> Option<ForceType> {
    let token = token?;
    let resolved = ForceType::from_prefix(token);
    match resolved {
        Some(force_type) => debug!(property = name, ?force_type, "forced property type"),
        None => warn!(property = name, token, "unknown force type ignored"),
    }
    resolved
}
