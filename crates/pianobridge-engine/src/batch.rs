// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Event batch builder.
//
// Wire shape of one raw event:
//
// ```text
// { "name": "page.display",
//   "data": { "<property>": { "value": <any>, "forceType": "<prefix>"? }, ... } }
// ```
//
// A batch is all-or-nothing: the first malformed entry fails the whole
// batch, so nothing reaches the SDK.

use tracing::debug;

use pianobridge_core::error::{BridgeError, Result};
use pianobridge_core::types::Event;
use pianobridge_core::value::Value;

use crate::coerce::coerce;

/// Build every event of a batch, preserving input order.
pub fn build_events(raw_events: &[Value]) -> Result<Vec<Event>> {
    let events = raw_events
        .iter()
        .map(build_event)
        .collect::<Result<Vec<_>>>()?;
    debug!(count = events.len(), "event batch built");
    Ok(events)
}

/// Build a single event from its raw descriptor.
///
/// A missing or non-map `data` entry yields an event without properties.
/// Duplicate property names resolve to the last entry.
pub fn build_event(raw: &Value) -> Result<Event> {
    let name = raw
        .get("name")
        .and_then(Value::as_str)
        .ok_or(BridgeError::MissingEventName)?;

    let mut event = Event::new(name);
    let Some(data) = raw.get("data").and_then(Value::as_map) else {
        return Ok(event);
    };

    for (key, entry) in data {
        let property_name = key.as_str().ok_or_else(|| BridgeError::MissingPropertyName {
            event: name.to_owned(),
        })?;

        let value = entry
            .get("value")
            .filter(|v| !v.is_null())
            .ok_or_else(|| BridgeError::MissingPropertyValue {
                event: name.to_owned(),
                property: property_name.to_owned(),
            })?;
        let force_type = entry.get("forceType").and_then(Value::as_str);

        let property = coerce(property_name, value, force_type)?;
        if event.insert(property).is_some() {
            debug!(event = name, property = property_name, "duplicate property replaced");
        }
    }

    Ok(event)
}
