//! Violation records produced by record construction and mutation.
//!
//! A violation names the qualified field path, the offending raw value (or its
//! absence), a stable reason code, and a human-readable message. Violations are
//! always collected in a deterministic order: schema field order first, then
//! unexpected keys in input order.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Which constraint rejected a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Range,
    Length,
    Pattern,
    Enum,
    Predicate,
}

/// Reason a candidate value failed its field specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// No input value and no default.
    MissingRequiredField,
    /// Value type incompatible with the declared type and not coercible.
    TypeMismatch,
    /// A declared constraint rejected the (coerced) value.
    Constraint(ConstraintKind),
    /// Input key not declared by a schema that forbids extras.
    UnexpectedField,
}

impl ViolationKind {
    /// Stable reason code used in reports.
    pub fn code(self) -> &'static str {
        match self {
            ViolationKind::MissingRequiredField => "missing",
            ViolationKind::TypeMismatch => "type_mismatch",
            ViolationKind::Constraint(ConstraintKind::Range) => "range",
            ViolationKind::Constraint(ConstraintKind::Length) => "length",
            ViolationKind::Constraint(ConstraintKind::Pattern) => "pattern",
            ViolationKind::Constraint(ConstraintKind::Enum) => "enum",
            ViolationKind::Constraint(ConstraintKind::Predicate) => "predicate",
            ViolationKind::UnexpectedField => "unexpected_field",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single reason a value was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Qualified path, e.g. `address.zip_code` or `contacts[1].name`.
    pub path: String,
    /// Raw input value; `None` when the value was absent.
    pub value: Option<Value>,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: None,
            kind: ViolationKind::MissingRequiredField,
            message: "field required".to_string(),
        }
    }

    pub fn type_mismatch(
        path: impl Into<String>,
        value: &Value,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            value: Some(value.clone()),
            kind: ViolationKind::TypeMismatch,
            message: message.into(),
        }
    }

    pub fn constraint(
        path: impl Into<String>,
        value: &Value,
        kind: ConstraintKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            value: Some(value.clone()),
            kind: ViolationKind::Constraint(kind),
            message: message.into(),
        }
    }

    pub fn unexpected(path: impl Into<String>, value: &Value) -> Self {
        Self {
            path: path.into(),
            value: Some(value.clone()),
            kind: ViolationKind::UnexpectedField,
            message: "extra fields not permitted".to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(
                f,
                "{}: {} [{}] (value: {})",
                self.path,
                self.message,
                self.code(),
                value
            ),
            None => write!(f, "{}: {} [{}]", self.path, self.message, self.code()),
        }
    }
}

impl Serialize for Violation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let len = if self.value.is_some() { 4 } else { 3 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("path", &self.path)?;
        map.serialize_entry("code", self.code())?;
        if let Some(value) = &self.value {
            map.serialize_entry("value", value)?;
        }
        map.serialize_entry("message", &self.message)?;
        map.end()
    }
}

/// Non-empty, ordered collection of violations from one construction attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Wrap a collected list; `None` when nothing was collected.
    pub fn from_vec(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self(violations))
        }
    }

    /// Wrap a list the pipeline guarantees to be non-empty.
    pub(crate) fn collected(violations: Vec<Violation>) -> Self {
        debug_assert!(
            !violations.is_empty(),
            "failed validation must report a violation"
        );
        Self(violations)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    pub fn first(&self) -> &Violation {
        &self.0[0]
    }

    /// Violations reported for exactly `path`.
    pub fn for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.0.iter().filter(move |v| v.path == path)
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.0.len() == 1 { "error" } else { "errors" };
        write!(f, "{} validation {}", self.0.len(), noun)?;
        for violation in &self.0 {
            write!(f, "\n- {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
