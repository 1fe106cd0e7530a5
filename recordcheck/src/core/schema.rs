//! Record schemas: ordered field specifications plus schema-level policies.
//!
//! A schema is built once through [`SchemaBuilder::build`], which checks the
//! definition itself (constraint applicability, bounds, defaults) so that
//! construction never has to second-guess it. Built schemas are shared as
//! `Arc<Schema>` and are read-only from then on.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::constraint::Constraint;
use crate::core::evaluate::{coerce_value, evaluate_field};

/// Declared semantic type of a field.
#[derive(Debug, Clone)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    /// Any JSON value, stored as given.
    Any,
    /// Nested record validated against its own schema.
    Record(Arc<Schema>),
    /// Ordered sequence whose elements share one type.
    List(Box<FieldType>),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("string"),
            FieldType::Integer => f.write_str("integer"),
            FieldType::Float => f.write_str("float"),
            FieldType::Boolean => f.write_str("boolean"),
            FieldType::Any => f.write_str("any"),
            FieldType::Record(schema) => write!(f, "record<{}>", schema.name()),
            FieldType::List(items) => write!(f, "list<{items}>"),
        }
    }
}

/// What construction does with input keys the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraPolicy {
    /// Drop undeclared keys silently.
    Ignore,
    /// Report each undeclared key as a violation.
    Forbid,
}

/// Whether built records accept `set_field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    /// Assignments re-run the field pipeline before replacing the value.
    #[default]
    Mutable,
    /// Every assignment fails.
    Frozen,
}

/// One named slot in a schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    ty: FieldType,
    default: Option<Value>,
    nullable: bool,
    constraints: Vec<Constraint>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            nullable: false,
            constraints: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Any)
    }

    pub fn record(name: impl Into<String>, schema: &Arc<Schema>) -> Self {
        Self::new(name, FieldType::Record(Arc::clone(schema)))
    }

    pub fn list(name: impl Into<String>, items: FieldType) -> Self {
        Self::new(name, FieldType::List(Box::new(items)))
    }

    /// Value used when the key is absent. Checked against the field when the
    /// schema is built.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Accept an explicit `null` and store it as-is.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Inclusive lower bound.
    pub fn ge(self, min: f64) -> Self {
        self.constrain(Constraint::Range {
            min: Some(min),
            max: None,
        })
    }

    /// Inclusive upper bound.
    pub fn le(self, max: f64) -> Self {
        self.constrain(Constraint::Range {
            min: None,
            max: Some(max),
        })
    }

    /// Inclusive range.
    pub fn between(self, min: f64, max: f64) -> Self {
        self.constrain(Constraint::Range {
            min: Some(min),
            max: Some(max),
        })
    }

    pub fn min_length(self, min: usize) -> Self {
        self.constrain(Constraint::Length {
            min: Some(min),
            max: None,
        })
    }

    pub fn max_length(self, max: usize) -> Self {
        self.constrain(Constraint::Length {
            min: None,
            max: Some(max),
        })
    }

    pub fn length(self, min: usize, max: usize) -> Self {
        self.constrain(Constraint::Length {
            min: Some(min),
            max: Some(max),
        })
    }

    pub fn pattern(self, regex: Regex) -> Self {
        self.constrain(Constraint::Pattern(regex))
    }

    pub fn one_of<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.constrain(Constraint::OneOf(values.into_iter().map(Into::into).collect()))
    }

    pub fn check(self, predicate: crate::core::predicates::Predicate) -> Self {
        self.constrain(Constraint::Predicate(predicate))
    }

    /// Append a constraint; constraints run in the order they were added.
    pub fn constrain(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// Errors in a schema definition.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema '{schema}' must declare at least one field")]
    Empty { schema: String },

    #[error("schema '{schema}' declares field '{field}' more than once")]
    DuplicateField { schema: String, field: String },

    #[error("field '{field}': {constraint} constraint does not apply to {ty} fields")]
    InapplicableConstraint {
        field: String,
        constraint: &'static str,
        ty: String,
    },

    #[error("field '{field}': {message}")]
    InvalidBounds { field: String, message: String },

    #[error("field '{field}': allowed value {value} is not a valid {ty}")]
    InvalidChoice {
        field: String,
        value: Value,
        ty: String,
    },

    #[error("field '{field}': default value rejected: {reason}")]
    InvalidDefault { field: String, reason: String },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("unknown predicate '{name}' (available: {available})")]
    UnknownPredicate { name: String, available: String },

    #[error("unknown schema '{0}' (schemas must be declared before they are referenced)")]
    UnknownSchema(String),
}

/// Ordered field specifications plus policies; immutable once built.
#[derive(Debug)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
    index: HashMap<String, usize>,
    extra: ExtraPolicy,
    mutability: Mutability,
    strip_whitespace: bool,
}

impl Schema {
    /// Start a schema definition. The extra-key policy has no default.
    pub fn builder(name: impl Into<String>, extra: ExtraPolicy) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            extra,
            mutability: Mutability::default(),
            strip_whitespace: false,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.position(name).map(|idx| &self.fields[idx])
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn extra(&self) -> ExtraPolicy {
        self.extra
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn is_frozen(&self) -> bool {
        self.mutability == Mutability::Frozen
    }

    pub fn strips_whitespace(&self) -> bool {
        self.strip_whitespace
    }
}

/// Collects fields and policies; see [`Schema::builder`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    extra: ExtraPolicy,
    mutability: Mutability,
    strip_whitespace: bool,
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn mutability(mut self, mutability: Mutability) -> Self {
        self.mutability = mutability;
        self
    }

    pub fn frozen(self) -> Self {
        self.mutability(Mutability::Frozen)
    }

    /// Trim surrounding whitespace from string inputs of string fields.
    pub fn strip_whitespace(mut self, strip: bool) -> Self {
        self.strip_whitespace = strip;
        self
    }

    /// Check the definition and freeze it.
    pub fn build(self) -> Result<Arc<Schema>, SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::Empty { schema: self.name });
        }

        let mut index = HashMap::with_capacity(self.fields.len());
        let mut fields = Vec::with_capacity(self.fields.len());
        for (position, spec) in self.fields.into_iter().enumerate() {
            if index.insert(spec.name.clone(), position).is_some() {
                return Err(SchemaError::DuplicateField {
                    schema: self.name,
                    field: spec.name,
                });
            }
            fields.push(prepare_field(spec, self.strip_whitespace)?);
        }

        Ok(Arc::new(Schema {
            name: self.name,
            fields,
            index,
            extra: self.extra,
            mutability: self.mutability,
            strip_whitespace: self.strip_whitespace,
        }))
    }
}

/// Check constraints against the field type, normalize enumerated values to
/// the field type, and replace the default with its validated form.
fn prepare_field(mut spec: FieldSpec, strip_whitespace: bool) -> Result<FieldSpec, SchemaError> {
    for constraint in &mut spec.constraints {
        if !constraint.applies_to(&spec.ty) {
            return Err(SchemaError::InapplicableConstraint {
                field: spec.name.clone(),
                constraint: constraint.label(),
                ty: spec.ty.to_string(),
            });
        }
        match constraint {
            Constraint::Range {
                min: Some(min),
                max: Some(max),
            } if *min > *max => {
                return Err(SchemaError::InvalidBounds {
                    field: spec.name.clone(),
                    message: format!("range minimum {min} exceeds maximum {max}"),
                });
            }
            Constraint::Length {
                min: Some(min),
                max: Some(max),
            } if *min > *max => {
                return Err(SchemaError::InvalidBounds {
                    field: spec.name.clone(),
                    message: format!("length minimum {min} exceeds maximum {max}"),
                });
            }
            Constraint::OneOf(values) => {
                for value in values.iter_mut() {
                    match coerce_value(&spec.ty, value, &spec.name, false) {
                        Ok(normalized) => *value = normalized,
                        Err(_) => {
                            return Err(SchemaError::InvalidChoice {
                                field: spec.name.clone(),
                                value: value.clone(),
                                ty: spec.ty.to_string(),
                            });
                        }
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(default) = spec.default.take() {
        match evaluate_field(&spec, &default, &spec.name, strip_whitespace) {
            Ok(normalized) => spec.default = Some(normalized),
            Err(violations) => {
                let reason = violations
                    .iter()
                    .map(|v| v.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(SchemaError::InvalidDefault {
                    field: spec.name,
                    reason,
                });
            }
        }
    }

    Ok(spec)
}
