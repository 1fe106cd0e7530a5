//! Scalar coercion rules.
//!
//! Exact types pass through. Safe conversions are applied:
//! - numeric strings to integers and floats
//! - integral floats to integers
//! - integers to floats
//! - `true/false/yes/no/on/off/1/0` strings and `0`/`1` numbers to booleans
//!
//! Everything else is rejected with a message naming the expected and found
//! types. Booleans never become numbers and numbers never become strings.

use serde_json::{Number, Value};

use crate::core::predicates::type_name;

fn mismatch(expected: &str, value: &Value) -> String {
    format!("expected {expected}, found {}", type_name(value))
}

pub fn to_string(value: &Value, strip_whitespace: bool) -> Result<Value, String> {
    match value {
        Value::String(s) if strip_whitespace => Ok(Value::String(s.trim().to_string())),
        Value::String(_) => Ok(value.clone()),
        _ => Err(mismatch("string", value)),
    }
}

pub fn to_integer(value: &Value) -> Result<Value, String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Value::from(i));
            }
            if n.is_u64() {
                return Err("integer out of range".to_string());
            }
            match n.as_f64() {
                Some(f) if !f.is_finite() || f.fract() != 0.0 => {
                    Err("expected integer, found number with a fractional part".to_string())
                }
                // i64::MAX as f64 rounds up to 2^63, which is out of range.
                Some(f) if f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(Value::from(f as i64)),
                _ => Err("integer out of range".to_string()),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("expected integer, unable to parse string '{s}'")),
        _ => Err(mismatch("integer", value)),
    }
}

pub fn to_float(value: &Value) -> Result<Value, String> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) => Some(f),
            Err(_) => return Err(format!("expected float, unable to parse string '{s}'")),
        },
        _ => return Err(mismatch("float", value)),
    };
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| "expected finite float".to_string())
}

pub fn to_boolean(value: &Value) -> Result<Value, String> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(Value::Bool(false)),
            Some(1) => Ok(Value::Bool(true)),
            _ => Err("expected boolean, only 0 and 1 convert from numbers".to_string()),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("expected boolean, unable to interpret string '{s}'")),
        },
        _ => Err(mismatch("boolean", value)),
    }
}
