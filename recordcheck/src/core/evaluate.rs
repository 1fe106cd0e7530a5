//! The field pipeline: null handling, coercion, constraints, recursion.

use serde_json::{Map, Value};

use crate::core::coerce;
use crate::core::path::{field_path, index_path};
use crate::core::predicates::type_name;
use crate::core::schema::{ExtraPolicy, FieldSpec, FieldType, Schema};
use crate::core::violation::Violation;

/// Validate every declared field of `schema` against `input`.
///
/// Returns the final values in schema order, or every violation found. Never
/// stops at the first failing field.
pub(crate) fn validate_fields(
    schema: &Schema,
    input: &Map<String, Value>,
    prefix: &str,
) -> Result<Vec<Value>, Vec<Violation>> {
    let mut values = Vec::with_capacity(schema.fields().len());
    let mut violations = Vec::new();

    for spec in schema.fields() {
        let path = field_path(prefix, spec.name());
        let outcome = match input.get(spec.name()) {
            Some(raw) => evaluate_field(spec, raw, &path, schema.strips_whitespace()),
            None => match spec.default_value() {
                Some(default) => Ok(default.clone()),
                None => Err(vec![Violation::missing(path)]),
            },
        };
        match outcome {
            Ok(value) => values.push(value),
            Err(found) => violations.extend(found),
        }
    }

    if schema.extra() == ExtraPolicy::Forbid {
        for (key, raw) in input {
            if schema.position(key).is_none() {
                violations.push(Violation::unexpected(field_path(prefix, key), raw));
            }
        }
    }

    if violations.is_empty() {
        Ok(values)
    } else {
        Err(violations)
    }
}

/// Run one present value through null handling, coercion and constraints.
///
/// Constraints short-circuit: the first failing one is the only violation
/// reported for the field. Nested records and lists may report several.
pub(crate) fn evaluate_field(
    spec: &FieldSpec,
    raw: &Value,
    path: &str,
    strip_whitespace: bool,
) -> Result<Value, Vec<Violation>> {
    if raw.is_null() {
        if spec.is_nullable() {
            return Ok(Value::Null);
        }
        if !matches!(spec.ty(), FieldType::Any) {
            return Err(vec![Violation::type_mismatch(
                path,
                raw,
                format!("expected {}, found null", spec.ty()),
            )]);
        }
    }

    let mut value = coerce_value(spec.ty(), raw, path, strip_whitespace)?;
    for constraint in spec.constraints() {
        value = constraint.check(value, raw, path).map_err(|v| vec![v])?;
    }
    Ok(value)
}

/// Coerce `raw` to `ty`, recursing into records and lists.
pub(crate) fn coerce_value(
    ty: &FieldType,
    raw: &Value,
    path: &str,
    strip_whitespace: bool,
) -> Result<Value, Vec<Violation>> {
    let scalar = |result: Result<Value, String>| {
        result.map_err(|message| vec![Violation::type_mismatch(path, raw, message)])
    };
    match ty {
        FieldType::String => scalar(coerce::to_string(raw, strip_whitespace)),
        FieldType::Integer => scalar(coerce::to_integer(raw)),
        FieldType::Float => scalar(coerce::to_float(raw)),
        FieldType::Boolean => scalar(coerce::to_boolean(raw)),
        FieldType::Any => Ok(raw.clone()),
        FieldType::Record(schema) => match raw {
            Value::Object(map) => {
                let values = validate_fields(schema, map, path)?;
                Ok(Value::Object(into_map(schema, values)))
            }
            _ => Err(vec![Violation::type_mismatch(
                path,
                raw,
                format!("expected {}, found {}", ty, type_name(raw)),
            )]),
        },
        FieldType::List(items) => match raw {
            Value::Array(elements) => {
                let mut out = Vec::with_capacity(elements.len());
                let mut violations = Vec::new();
                for (idx, element) in elements.iter().enumerate() {
                    let element_path = index_path(path, idx);
                    match coerce_value(items, element, &element_path, strip_whitespace) {
                        Ok(value) => out.push(value),
                        Err(found) => violations.extend(found),
                    }
                }
                if violations.is_empty() {
                    Ok(Value::Array(out))
                } else {
                    Err(violations)
                }
            }
            _ => Err(vec![Violation::type_mismatch(
                path,
                raw,
                format!("expected {}, found {}", ty, type_name(raw)),
            )]),
        },
    }
}

/// Pair schema field names with validated values, preserving schema order.
pub(crate) fn into_map(schema: &Schema, values: Vec<Value>) -> Map<String, Value> {
    schema
        .fields()
        .iter()
        .map(|spec| spec.name().to_string())
        .zip(values)
        .collect()
}
