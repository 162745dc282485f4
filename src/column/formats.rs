use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::column::DecodeError;

/// Stock conversions for [`Column::format`](crate::column::Column::format).
///
/// Drivers disagree on how they hand back scalars (SQLite returns booleans as
/// integers, some drivers return numerics as strings); these normalise the
/// common cases.
pub struct Formats;

impl Formats {
    pub fn boolean(v: Value) -> Result<Value, DecodeError> {
        match &v {
            Value::Bool(_) => Ok(v),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(DecodeError::format(&v, "expected 0 or 1")),
            },
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "t" | "true" | "1" => Ok(Value::Bool(true)),
                "f" | "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(DecodeError::format(&v, "not a boolean")),
            },
            _ => Err(DecodeError::format(&v, "not a boolean")),
        }
    }

    pub fn integer(v: Value) -> Result<Value, DecodeError> {
        match &v {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(v),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.fract() != 0.0 => Err(DecodeError::format(&v, "not an integer")),
                Some(f) if f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(Value::from(f as i64)),
                _ => Err(DecodeError::format(&v, "out of range")),
            },
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| DecodeError::format(&v, e.to_string())),
            _ => Err(DecodeError::format(&v, "not an integer")),
        }
    }

    pub fn float(v: Value) -> Result<Value, DecodeError> {
        match &v {
            Value::Number(n) => n
                .as_f64()
                .map(Value::from)
                .ok_or_else(|| DecodeError::format(&v, "not a float")),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::from)
                .map_err(|e| DecodeError::format(&v, e.to_string())),
            _ => Err(DecodeError::format(&v, "not a float")),
        }
    }

    pub fn text(v: Value) -> Result<Value, DecodeError> {
        match v {
            Value::String(_) => Ok(v),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(DecodeError::format(&other, "not a scalar")),
        }
    }

    /// RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]` (taken as UTC) or epoch seconds,
    /// normalised to an RFC 3339 string.
    pub fn timestamp(v: Value) -> Result<Value, DecodeError> {
        let parsed: Option<DateTime<Utc>> = match &v {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                        .ok()
                        .map(|n| n.and_utc())
                }),
            Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
            _ => None,
        };
        parsed
            .map(|d| Value::String(d.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            .ok_or_else(|| DecodeError::format(&v, "not a timestamp"))
    }

    /// Parses a JSON document the driver returned as text.
    pub fn json(v: Value) -> Result<Value, DecodeError> {
        match &v {
            Value::String(s) => serde_json::from_str(s).map_err(|e| DecodeError::format(&v, e.to_string())),
            _ => Ok(v),
        }
    }
}
