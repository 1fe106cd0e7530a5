//! Custom predicates and the named built-ins usable from schema files.
//!
//! A predicate receives the coerced value and either rejects it with a
//! message or returns the value to store, which may be normalized.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

type PredicateFn = dyn Fn(Value) -> Result<Value, String> + Send + Sync;

/// Named custom check on a field value.
#[derive(Clone)]
pub struct Predicate {
    name: Arc<str>,
    func: Arc<PredicateFn>,
}

impl Predicate {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            func: Arc::new(func),
        }
    }

    /// Predicate over string values; non-strings are rejected.
    pub fn for_str<F>(name: &str, func: F) -> Self
    where
        F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
    {
        Self::new(name, move |value| match value {
            Value::String(s) => func(&s).map(Value::String),
            other => Err(format!("expected string, found {}", type_name(&other))),
        })
    }

    /// Predicate over integer values; non-integers are rejected.
    pub fn for_i64<F>(name: &str, func: F) -> Self
    where
        F: Fn(i64) -> Result<i64, String> + Send + Sync + 'static,
    {
        Self::new(name, move |value| match value.as_i64() {
            Some(n) => func(n).map(Value::from),
            None => Err(format!("expected integer, found {}", type_name(&value))),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, value: Value) -> Result<Value, String> {
        (self.func)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

/// Names accepted by [`builtin`].
pub const BUILTIN_NAMES: &[&str] = &[
    "trim",
    "lowercase",
    "uppercase",
    "title_case",
    "non_empty",
    "letters_and_spaces",
    "strong_password",
];

/// Look up a built-in predicate by name.
pub fn builtin(name: &str) -> Option<Predicate> {
    let predicate = match name {
        "trim" => Predicate::for_str(name, |s| Ok(s.trim().to_string())),
        "lowercase" => Predicate::for_str(name, |s| Ok(s.to_lowercase())),
        "uppercase" => Predicate::for_str(name, |s| Ok(s.to_uppercase())),
        "title_case" => Predicate::for_str(name, |s| Ok(title_case(s))),
        "non_empty" => Predicate::for_str(name, |s| {
            if s.trim().is_empty() {
                Err("must not be empty".to_string())
            } else {
                Ok(s.to_string())
            }
        }),
        "letters_and_spaces" => Predicate::for_str(name, |s| {
            let allowed = |c: char| c.is_ascii_alphabetic() || c.is_whitespace();
            if s.chars().all(allowed) {
                Ok(s.to_string())
            } else {
                Err("can only contain letters and spaces".to_string())
            }
        }),
        "strong_password" => Predicate::for_str(name, |s| {
            check_password_strength(s).map(|()| s.to_string())
        }),
        _ => return None,
    };
    Some(predicate)
}

const PASSWORD_SPECIALS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// At least 8 characters with upper, lower, digit and special character.
pub fn check_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("password must be at least 8 characters".to_string());
    }
    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if !(has_upper && has_lower && has_digit && has_special) {
        return Err(
            "password must contain uppercase, lowercase, digit, and special character".to_string(),
        );
    }
    Ok(())
}

/// Uppercase the first letter of every word, lowercase the rest.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for c in input.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
