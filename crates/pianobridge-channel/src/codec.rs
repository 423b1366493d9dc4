// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flutter standard message codec, extended with a date type.
//
// Value encoding (one type byte, then the payload):
//
// ```text
//   0  null                        8  uint8[]  size + bytes
//   1  true                        9  int32[]  size, pad to 4, size*4 bytes
//   2  false                      10  int64[]  size, pad to 8, size*8 bytes
//   3  int32    4 bytes           11  f64[]    size, pad to 8, size*8 bytes
//   4  int64    8 bytes           12  list     size + values
//   6  float64  pad to 8, 8 bytes 13  map      size + (key, value) pairs
//   7  string   size + UTF-8      14  f32[]    size, pad to 4, size*4 bytes
// 128  date     8 bytes big-endian, milliseconds since the Unix epoch
// ```
//
// Sizes below 254 take one byte; 254 is followed by a u16 and 255 by a u32.
// Numbers and sizes are in host byte order, which is little-endian on every
// supported host; only the date payload is big-endian. Padding is zero bytes
// up to a multiple of the element width, counted from the start of the
// message.
//
// A method call is a string value (the method name) followed by one value
// (the arguments). A reply starts with 0 (success, then the result value)
// or 1 (error, then code, message and details values).

use chrono::{DateTime, TimeZone, Utc};

use pianobridge_core::error::{BridgeError, Result};
use pianobridge_core::value::Value;

pub const TYPE_NULL: u8 = 0;
pub const TYPE_TRUE: u8 = 1;
pub const TYPE_FALSE: u8 = 2;
pub const TYPE_INT32: u8 = 3;
pub const TYPE_INT64: u8 = 4;
pub const TYPE_FLOAT64: u8 = 6;
pub const TYPE_STRING: u8 = 7;
pub const TYPE_UINT8_LIST: u8 = 8;
pub const TYPE_INT32_LIST: u8 = 9;
pub const TYPE_INT64_LIST: u8 = 10;
pub const TYPE_FLOAT64_LIST: u8 = 11;
pub const TYPE_LIST: u8 = 12;
pub const TYPE_MAP: u8 = 13;
pub const TYPE_FLOAT32_LIST: u8 = 14;
/// Out-of-band tag for dates.
pub const TYPE_DATE: u8 = 128;

pub const REPLY_SUCCESS: u8 = 0;
pub const REPLY_ERROR: u8 = 1;

/// Deepest list/map nesting accepted when decoding.
const MAX_DEPTH: usize = 64;

/// A decoded method invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// A decoded reply envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Success(Value),
    Error {
        code: String,
        message: Option<String>,
        details: Value,
    },
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub fn encode_value(value: &Value) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    write_value(&mut buf, value);
    buf
}

pub fn encode_method_call(call: &MethodCall) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    write_string(&mut buf, &call.method);
    write_value(&mut buf, &call.arguments);
    buf
}

pub fn encode_success(result: &Value) -> Vec<u8> {
    let mut buf = vec![REPLY_SUCCESS];
    write_value(&mut buf, result);
    buf
}

/// Error envelope; details are always null.
pub fn encode_error(code: &str, message: &str) -> Vec<u8> {
    let mut buf = vec![REPLY_ERROR];
    write_string(&mut buf, code);
    write_string(&mut buf, message);
    buf.push(TYPE_NULL);
    buf
}

fn write_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => buf.push(TYPE_NULL),
        Value::Bool(true) => buf.push(TYPE_TRUE),
        Value::Bool(false) => buf.push(TYPE_FALSE),
        Value::Int(i) => {
            buf.push(TYPE_INT32);
            buf.extend_from_slice(&i.to_le_bytes());
        }
        Value::Long(l) => {
            buf.push(TYPE_INT64);
            buf.extend_from_slice(&l.to_le_bytes());
        }
        Value::Double(d) => {
            buf.push(TYPE_FLOAT64);
            write_padding(buf, 8);
            buf.extend_from_slice(&d.to_le_bytes());
        }
        Value::String(s) => write_string(buf, s),
        Value::Bytes(bytes) => {
            buf.push(TYPE_UINT8_LIST);
            write_size(buf, bytes.len());
            buf.extend_from_slice(bytes);
        }
        Value::Date(date) => {
            buf.push(TYPE_DATE);
            buf.extend_from_slice(&date.timestamp_millis().to_be_bytes());
        }
        Value::List(items) => {
            buf.push(TYPE_LIST);
            write_size(buf, items.len());
            for item in items {
                write_value(buf, item);
            }
        }
        Value::Map(entries) => {
            buf.push(TYPE_MAP);
            write_size(buf, entries.len());
            for (key, value) in entries {
                write_value(buf, key);
                write_value(buf, value);
            }
        }
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(TYPE_STRING);
    write_size(buf, s.len());
    buf.extend_from_slice(s.as_bytes());
}

fn write_size(buf: &mut Vec<u8>, size: usize) {
    if size < 254 {
        buf.push(size as u8);
    } else if let Ok(small) = u16::try_from(size) {
        buf.push(254);
        buf.extend_from_slice(&small.to_le_bytes());
    } else {
        buf.push(255);
        buf.extend_from_slice(&(size as u32).to_le_bytes());
    }
}

fn write_padding(buf: &mut Vec<u8>, alignment: usize) {
    let rem = buf.len() % alignment;
    if rem != 0 {
        buf.resize(buf.len() + alignment - rem, 0);
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode exactly one value; trailing bytes are an error.
pub fn decode_value(data: &[u8]) -> Result<Value> {
    let mut reader = Reader::new(data);
    let value = reader.read_value(0)?;
    reader.finish()?;
    Ok(value)
}

/// Decode a method call. Missing arguments decode as null.
pub fn decode_method_call(data: &[u8]) -> Result<MethodCall> {
    let mut reader = Reader::new(data);
    let method = match reader.read_value(0)? {
        Value::String(method) => method,
        other => {
            return Err(BridgeError::Codec(format!(
                "method name must be a string, got {}",
                other.type_name()
            )));
        }
    };
    let arguments = if reader.is_empty() {
        Value::Null
    } else {
        reader.read_value(0)?
    };
    reader.finish()?;
    Ok(MethodCall { method, arguments })
}

pub fn decode_reply(data: &[u8]) -> Result<Reply> {
    let mut reader = Reader::new(data);
    let reply = match reader.read_u8()? {
        REPLY_SUCCESS => Reply::Success(reader.read_value(0)?),
        REPLY_ERROR => {
            let code = match reader.read_value(0)? {
                Value::String(code) => code,
                other => {
                    return Err(BridgeError::Codec(format!(
                        "error code must be a string, got {}",
                        other.type_name()
                    )));
                }
            };
            let message = match reader.read_value(0)? {
                Value::String(message) => Some(message),
                _ => None,
            };
            let details = reader.read_value(0)?;
            Reply::Error {
                code,
                message,
                details,
            }
        }
        tag => return Err(BridgeError::Codec(format!("unknown reply envelope {tag}"))),
    };
    reader.finish()?;
    Ok(reply)
}

/// Cursor over an encoded message.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn finish(&self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(BridgeError::Codec(format!(
                "{} trailing bytes",
                self.data.len() - self.pos
            )))
        }
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                BridgeError::Codec(format!("truncated message: need {len} bytes at {}", self.pos))
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_size(&mut self) -> Result<usize> {
        match self.read_u8()? {
            254 => Ok(u16::from_le_bytes(self.read_array()?) as usize),
            255 => Ok(u32::from_le_bytes(self.read_array()?) as usize),
            small => Ok(small as usize),
        }
    }

    /// Skip padding up to the next multiple of `alignment`.
    fn align(&mut self, alignment: usize) -> Result<()> {
        let rem = self.pos % alignment;
        if rem != 0 {
            self.read_bytes(alignment - rem)?;
        }
        Ok(())
    }

    /// Read a size, the padding, then `count` fixed-width elements. The total
    /// length is checked before allocating.
    fn read_elements<T, const N: usize>(&mut self, from_le: fn([u8; N]) -> T) -> Result<Vec<T>> {
        let count = self.read_size()?;
        self.align(N)?;
        let total = count
            .checked_mul(N)
            .ok_or_else(|| BridgeError::Codec("typed list size overflow".into()))?;
        let bytes = self.read_bytes(total)?;
        Ok(bytes
            .chunks_exact(N)
            .map(|chunk| {
                let mut array = [0u8; N];
                array.copy_from_slice(chunk);
                from_le(array)
            })
            .collect())
    }

    fn read_value(&mut self, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(BridgeError::Codec(format!("nesting deeper than {MAX_DEPTH}")));
        }

        let value = match self.read_u8()? {
            TYPE_NULL => Value::Null,
            TYPE_TRUE => Value::Bool(true),
            TYPE_FALSE => Value::Bool(false),
            TYPE_INT32 => Value::Int(i32::from_le_bytes(self.read_array()?)),
            TYPE_INT64 => Value::Long(i64::from_le_bytes(self.read_array()?)),
            TYPE_FLOAT64 => {
                self.align(8)?;
                Value::Double(f64::from_le_bytes(self.read_array()?))
            }
            TYPE_STRING => {
                let len = self.read_size()?;
                let bytes = self.read_bytes(len)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|e| BridgeError::Codec(format!("invalid UTF-8 string: {e}")))?;
                Value::String(s.to_owned())
            }
            TYPE_UINT8_LIST => {
                let len = self.read_size()?;
                Value::Bytes(self.read_bytes(len)?.to_vec())
            }
            TYPE_INT32_LIST => Value::List(
                self.read_elements::<i32, 4>(i32::from_le_bytes)?
                    .into_iter()
                    .map(Value::Int)
                    .collect(),
            ),
            TYPE_INT64_LIST => Value::List(
                self.read_elements::<i64, 8>(i64::from_le_bytes)?
                    .into_iter()
                    .map(Value::Long)
                    .collect(),
            ),
            TYPE_FLOAT64_LIST => Value::List(
                self.read_elements::<f64, 8>(f64::from_le_bytes)?
                    .into_iter()
                    .map(Value::Double)
                    .collect(),
            ),
            TYPE_FLOAT32_LIST => Value::List(
                self.read_elements::<f32, 4>(f32::from_le_bytes)?
                    .into_iter()
                    .map(|f| Value::Double(f64::from(f)))
                    .collect(),
            ),
            TYPE_LIST => {
                let count = self.read_size()?;
                let mut items = Vec::with_capacity(count.min(self.data.len() - self.pos));
                for _ in 0..count {
                    items.push(self.read_value(depth + 1)?);
                }
                Value::List(items)
            }
            TYPE_MAP => {
                let count = self.read_size()?;
                let mut entries = Vec::with_capacity(count.min(self.data.len() - self.pos));
                for _ in 0..count {
                    let key = self.read_value(depth + 1)?;
                    let value = self.read_value(depth + 1)?;
                    entries.push((key, value));
                }
                Value::Map(entries)
            }
            TYPE_DATE => Value::Date(date_from_millis(i64::from_be_bytes(self.read_array()?))?),
            tag => return Err(BridgeError::Codec(format!("unsupported value type {tag}"))),
        };
        Ok(value)
    }
}

fn date_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| BridgeError::Codec(format!("date out of range: {millis} ms")))
}
