//! Field constraints applied after coercion.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use crate::core::predicates::Predicate;
use crate::core::schema::FieldType;
use crate::core::violation::{ConstraintKind, Violation};

/// A single rule on a coerced field value.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Inclusive numeric bounds.
    Range { min: Option<f64>, max: Option<f64> },
    /// Inclusive bounds on character count (strings) or item count (lists).
    Length { min: Option<usize>, max: Option<usize> },
    /// Regular expression that must match somewhere in the string.
    Pattern(Regex),
    /// Enumerated allowed values.
    OneOf(Vec<Value>),
    /// Custom check that may also normalize the value.
    Predicate(Predicate),
}

impl Constraint {
    pub fn label(&self) -> &'static str {
        match self {
            Constraint::Range { .. } => "range",
            Constraint::Length { .. } => "length",
            Constraint::Pattern(_) => "pattern",
            Constraint::OneOf(_) => "enum",
            Constraint::Predicate(_) => "predicate",
        }
    }

    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Range { .. } => ConstraintKind::Range,
            Constraint::Length { .. } => ConstraintKind::Length,
            Constraint::Pattern(_) => ConstraintKind::Pattern,
            Constraint::OneOf(_) => ConstraintKind::Enum,
            Constraint::Predicate(_) => ConstraintKind::Predicate,
        }
    }

    /// True when the constraint can be evaluated on values of `ty`.
    pub fn applies_to(&self, ty: &FieldType) -> bool {
        match self {
            Constraint::Range { .. } => matches!(ty, FieldType::Integer | FieldType::Float),
            Constraint::Length { .. } => matches!(ty, FieldType::String | FieldType::List(_)),
            Constraint::Pattern(_) => matches!(ty, FieldType::String),
            Constraint::OneOf(_) => matches!(
                ty,
                FieldType::String
                    | FieldType::Integer
                    | FieldType::Float
                    | FieldType::Boolean
                    | FieldType::Any
            ),
            Constraint::Predicate(_) => true,
        }
    }

    /// Check `value`, returning it (possibly normalized) on success.
    ///
    /// `raw` is the original input, reported in the violation so callers see
    /// what they sent rather than the coerced form.
    pub fn check(&self, value: Value, raw: &Value, path: &str) -> Result<Value, Violation> {
        let reject = |message: String| Violation::constraint(path, raw, self.kind(), message);
        match self {
            Constraint::Range { min, max } => {
                if !value.is_number() {
                    return Err(reject("value is not a number".to_string()));
                }
                if let Some(min) = min
                    && compare_bound(&value, *min) == Some(Ordering::Less)
                {
                    return Err(reject(format!(
                        "must be greater than or equal to {}",
                        render_bound(*min)
                    )));
                }
                if let Some(max) = max
                    && compare_bound(&value, *max) == Some(Ordering::Greater)
                {
                    return Err(reject(format!(
                        "must be less than or equal to {}",
                        render_bound(*max)
                    )));
                }
                Ok(value)
            }
            Constraint::Length { min, max } => {
                let len = match &value {
                    Value::String(s) => s.chars().count(),
                    Value::Array(items) => items.len(),
                    _ => return Err(reject("value has no length".to_string())),
                };
                if let Some(min) = min
                    && len < *min
                {
                    return Err(reject(format!("length must be at least {min} (got {len})")));
                }
                if let Some(max) = max
                    && len > *max
                {
                    return Err(reject(format!("length must be at most {max} (got {len})")));
                }
                Ok(value)
            }
            Constraint::Pattern(regex) => match value.as_str() {
                Some(s) if regex.is_match(s) => Ok(value),
                _ => Err(reject(format!("must match pattern '{}'", regex.as_str()))),
            },
            Constraint::OneOf(allowed) => {
                if allowed.contains(&value) {
                    return Ok(value);
                }
                let choices = allowed
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(reject(format!("must be one of: {choices}")))
            }
            Constraint::Predicate(predicate) => predicate.apply(value).map_err(reject),
        }
    }
}

/// Order `value` against `bound` without rounding integers through `f64`.
fn compare_bound(value: &Value, bound: f64) -> Option<Ordering> {
    if let Some(int) = value.as_i64() {
        // 2^63 itself does not fit, hence the exclusive upper end.
        if bound.fract() == 0.0 && bound >= i64::MIN as f64 && bound < i64::MAX as f64 {
            return Some(int.cmp(&(bound as i64)));
        }
        if bound.is_nan() {
            return None;
        }
        // Integral bounds outside i64, or fractional bounds: the integer lies
        // on one side of them exactly.
        if bound >= i64::MAX as f64 {
            return Some(Ordering::Less);
        }
        if bound < i64::MIN as f64 {
            return Some(Ordering::Greater);
        }
        let floor = bound.floor() as i64;
        return Some(if int <= floor {
            Ordering::Less
        } else {
            Ordering::Greater
        });
    }
    value.as_f64()?.partial_cmp(&bound)
}

/// Render bounds without a trailing `.0` for whole numbers.
fn render_bound(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.abs() < 1e15 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}
