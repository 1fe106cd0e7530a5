//! Validated record instances.
//!
//! A [`Record`] only exists in validated form: [`Record::construct`] either
//! returns one with every field satisfying its specification, or the complete
//! list of violations. Mutation goes through [`Record::set_field`], which
//! re-runs the field pipeline and leaves the record untouched on failure.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::core::evaluate::{evaluate_field, into_map, validate_fields};
use crate::core::path::ROOT;
use crate::core::predicates::type_name;
use crate::core::schema::Schema;
use crate::core::violation::{Violation, Violations};

/// Errors from [`Record::set_field`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MutationError {
    #[error("cannot assign '{field}': record '{schema}' is frozen")]
    ImmutableRecord { schema: String, field: String },

    #[error("record '{schema}' has no field '{field}'")]
    UnknownField { schema: String, field: String },

    #[error("assignment to '{field}' rejected: {violations}")]
    Invalid {
        field: String,
        violations: Violations,
    },
}

/// Schema-conformant field values, in schema order.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Record {
    /// Validate `input` against `schema`.
    pub fn construct(schema: &Arc<Schema>, input: &Map<String, Value>) -> Result<Self, Violations> {
        match validate_fields(schema, input, "") {
            Ok(values) => Ok(Self {
                schema: Arc::clone(schema),
                values,
            }),
            Err(violations) => Err(into_violations(violations)),
        }
    }

    /// Validate an arbitrary JSON value; anything but an object is a single
    /// type mismatch at the root.
    pub fn from_value(schema: &Arc<Schema>, input: &Value) -> Result<Self, Violations> {
        match input {
            Value::Object(map) => Self::construct(schema, map),
            other => Err(into_violations(vec![Violation::type_mismatch(
                ROOT,
                other,
                format!("expected object, found {}", type_name(other)),
            )])),
        }
    }

    /// Validate an already-built record (possibly of another schema) against
    /// `schema`.
    pub fn from_record(schema: &Arc<Schema>, source: &Record) -> Result<Self, Violations> {
        Self::construct(schema, &source.to_map())
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.position(name).map(|idx| &self.values[idx])
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// `(name, value)` pairs in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .fields()
            .iter()
            .map(|spec| spec.name())
            .zip(self.values.iter())
    }

    /// Replace one field after re-validating it.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), MutationError> {
        if self.schema.is_frozen() {
            return Err(MutationError::ImmutableRecord {
                schema: self.schema.name().to_string(),
                field: name.to_string(),
            });
        }
        let Some(idx) = self.schema.position(name) else {
            return Err(MutationError::UnknownField {
                schema: self.schema.name().to_string(),
                field: name.to_string(),
            });
        };
        let spec = &self.schema.fields()[idx];
        match evaluate_field(spec, &value, name, self.schema.strips_whitespace()) {
            Ok(accepted) => {
                self.values[idx] = accepted;
                Ok(())
            }
            Err(violations) => Err(MutationError::Invalid {
                field: name.to_string(),
                violations: into_violations(violations),
            }),
        }
    }

    /// Field mapping in schema order.
    pub fn to_map(&self) -> Map<String, Value> {
        into_map(&self.schema, self.values.clone())
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }

    /// Compact JSON with keys in schema order.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    pub fn to_json_pretty(&self) -> String {
        format!("{:#}", self.to_value())
    }

    /// Convert into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.to_value())
    }
}

fn into_violations(violations: Vec<Violation>) -> Violations {
    Violations::collected(violations)
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.values == other.values
    }
}

impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// `User(name="Al", age=25)`.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.schema.name())?;
        for (idx, (name, value)) in self.fields().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::predicates::builtin;
    use crate::core::schema::{ExtraPolicy, FieldSpec, FieldType};
    use crate::core::violation::{ConstraintKind, ViolationKind};
    use crate::test_support::object;
    use regex::Regex;
    use serde_json::json;

    fn profile_schema(extra: ExtraPolicy) -> Arc<Schema> {
        Schema::builder("Profile", extra)
            .field(FieldSpec::string("name").length(2, 50))
            .field(FieldSpec::integer("age").between(0.0, 120.0))
            .field(
                FieldSpec::string("email")
                    .pattern(Regex::new(r"^[^@]+@[^@]+\.[^@]+$").expect("regex")),
            )
            .build()
            .expect("schema")
    }

    fn address_schema() -> Arc<Schema> {
        Schema::builder("Address", ExtraPolicy::Ignore)
            .field(FieldSpec::string("city"))
            .field(FieldSpec::string("zip").pattern(Regex::new(r"^\d{5}$").expect("regex")))
            .build()
            .expect("schema")
    }

    #[test]
    fn numeric_string_age_is_stored_as_integer() {
        let schema = profile_schema(ExtraPolicy::Ignore);
        let input = object(json!({"name": "Al", "age": "25", "email": "a@b.com"}));
        let record = Record::construct(&schema, &input).expect("valid");
        assert_eq!(record.get("age"), Some(&json!(25)));
        assert_eq!(record.get_i64("age"), Some(25));
    }

    #[test]
    fn reports_exactly_the_failing_fields() {
        let schema = profile_schema(ExtraPolicy::Ignore);
        let input = object(json!({"name": "Al", "age": 150, "email": "bad"}));
        let violations = Record::construct(&schema, &input).expect_err("invalid");
        let summary: Vec<_> = violations
            .iter()
            .map(|v| (v.path.as_str(), v.kind, v.value.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (
                    "age",
                    ViolationKind::Constraint(ConstraintKind::Range),
                    Some(json!(150))
                ),
                (
                    "email",
                    ViolationKind::Constraint(ConstraintKind::Pattern),
                    Some(json!("bad"))
                ),
            ]
        );
    }

    #[test]
    fn missing_fields_do_not_stop_validation() {
        let schema = profile_schema(ExtraPolicy::Ignore);
        let input = object(json!({"age": "not-a-number"}));
        let violations = Record::construct(&schema, &input).expect_err("invalid");
        let codes: Vec<_> = violations
            .iter()
            .map(|v| (v.path.as_str(), v.code()))
            .collect();
        assert_eq!(
            codes,
            vec![
                ("name", "missing"),
                ("age", "type_mismatch"),
                ("email", "missing")
            ]
        );
        assert_eq!(violations.first().value, None);
    }

    #[test]
    fn out_of_range_value_is_not_clamped() {
        let schema = profile_schema(ExtraPolicy::Ignore);
        let input = object(json!({"name": "Bob", "age": "-4", "email": "b@c.io"}));
        let violations = Record::construct(&schema, &input).expect_err("invalid");
        assert_eq!(violations.len(), 1);
        let age = violations.for_path("age").next().expect("age violation");
        assert_eq!(age.value, Some(json!("-4")));
        assert_eq!(age.code(), "range");
    }

    #[test]
    fn first_failing_constraint_wins() {
        let schema = Schema::builder("Username", ExtraPolicy::Ignore)
            .field(
                FieldSpec::string("username")
                    .min_length(3)
                    .pattern(Regex::new("^[a-z]+$").expect("regex")),
            )
            .build()
            .expect("schema");
        let input = object(json!({"username": "A1"}));
        let violations = Record::construct(&schema, &input).expect_err("invalid");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.first().code(), "length");
    }

    #[test]
    fn nested_violation_uses_qualified_path() {
        let address = address_schema();
        let schema = Schema::builder("Person", ExtraPolicy::Ignore)
            .field(FieldSpec::string("name"))
            .field(FieldSpec::record("address", &address))
            .build()
            .expect("schema");
        let input = object(json!({"name": "Ivy", "address": {"city": "X", "zip": "abc"}}));
        let violations = Record::construct(&schema, &input).expect_err("invalid");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.first().path, "address.zip");
        assert_eq!(violations.first().code(), "pattern");
    }

    #[test]
    fn list_of_records_reports_indexed_paths() {
        let address = address_schema();
        let schema = Schema::builder("Mailing", ExtraPolicy::Ignore)
            .field(FieldSpec::list("stops", FieldType::Record(address)))
            .field(FieldSpec::list("scores", FieldType::Float))
            .build()
            .expect("schema");
        let input = object(json!({
            "stops": [{"city": "A", "zip": "12345"}, {"zip": "1"}],
            "scores": [95.5, "87", "high"]
        }));
        let violations = Record::construct(&schema, &input).expect_err("invalid");
        let paths: Vec<_> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["stops[1].city", "stops[1].zip", "scores[2]"]);
    }

    #[test]
    fn defaults_fill_absent_fields() {
        let schema = Schema::builder("User", ExtraPolicy::Ignore)
            .field(FieldSpec::string("name"))
            .field(
                FieldSpec::string("nickname")
                    .nullable()
                    .with_default(Value::Null),
            )
            .field(FieldSpec::boolean("is_active").with_default(true))
            .field(FieldSpec::list("skills", FieldType::String).with_default(json!([])))
            .build()
            .expect("schema");
        let input = object(json!({"name": "Alice"}));
        let record = Record::construct(&schema, &input).expect("valid");
        assert_eq!(
            record.to_value(),
            json!({"name": "Alice", "nickname": null, "is_active": true, "skills": []})
        );
    }

    #[test]
    fn null_rejected_unless_nullable() {
        let schema = Schema::builder("User", ExtraPolicy::Ignore)
            .field(FieldSpec::string("name"))
            .field(FieldSpec::string("nickname").nullable())
            .build()
            .expect("schema");
        let input = object(json!({"name": null, "nickname": null}));
        let violations = Record::construct(&schema, &input).expect_err("invalid");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.first().message, "expected string, found null");
    }

    #[test]
    fn extra_keys_follow_schema_policy() {
        let input = object(json!({
            "name": "Frank", "age": 35, "email": "f@m.com", "nickname": "Frankie"
        }));

        let ignoring = profile_schema(ExtraPolicy::Ignore);
        let record = Record::construct(&ignoring, &input).expect("ignored");
        assert_eq!(record.get("nickname"), None);
        assert_eq!(record.to_map().len(), 3);

        let forbidding = profile_schema(ExtraPolicy::Forbid);
        let violations = Record::construct(&forbidding, &input).expect_err("forbidden");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.first().path, "nickname");
        assert_eq!(violations.first().kind, ViolationKind::UnexpectedField);
    }

    #[test]
    fn predicate_normalization_is_stored() {
        let schema = Schema::builder("Smart", ExtraPolicy::Ignore)
            .field(
                FieldSpec::string("name")
                    .check(builtin("trim").expect("trim"))
                    .check(builtin("title_case").expect("title_case")),
            )
            .build()
            .expect("schema");
        let input = object(json!({"name": "  alice smith  "}));
        let record = Record::construct(&schema, &input).expect("valid");
        assert_eq!(record.get_str("name"), Some("Alice Smith"));
    }

    #[test]
    fn strip_whitespace_runs_before_constraints() {
        let schema = Schema::builder("Configured", ExtraPolicy::Forbid)
            .strip_whitespace(true)
            .field(FieldSpec::string("name").max_length(9))
            .build()
            .expect("schema");
        let input = object(json!({"name": "  Eve Adams  "}));
        let record = Record::construct(&schema, &input).expect("valid");
        assert_eq!(record.get_str("name"), Some("Eve Adams"));
    }

    #[test]
    fn serialized_record_round_trips() {
        let address = address_schema();
        let schema = Schema::builder("Person", ExtraPolicy::Forbid)
            .field(FieldSpec::string("name"))
            .field(FieldSpec::float("score"))
            .field(FieldSpec::record("address", &address))
            .field(FieldSpec::list("tags", FieldType::String))
            .build()
            .expect("schema");
        let input = object(json!({
            "tags": ["a", "b"],
            "address": {"zip": "94105", "city": "SF"},
            "score": 42,
            "name": "Diana"
        }));
        let record = Record::construct(&schema, &input).expect("valid");
        assert_eq!(
            record.to_json(),
            r#"{"name":"Diana","score":42.0,"address":{"city":"SF","zip":"94105"},"tags":["a","b"]}"#
        );

        let reparsed: Value = serde_json::from_str(&record.to_json()).expect("parse");
        let again = Record::from_value(&schema, &reparsed).expect("round trip");
        assert_eq!(again, record);
        assert_eq!(
            serde_json::to_string(&again).expect("serialize"),
            record.to_json()
        );
    }

    #[test]
    fn from_record_revalidates_against_target_schema() {
        let loose = profile_schema(ExtraPolicy::Ignore);
        let record = Record::construct(
            &loose,
            &object(json!({"name": "Al", "age": 30, "email": "a@b.com"})),
        )
        .expect("valid");
        let strict = Schema::builder("Adult", ExtraPolicy::Ignore)
            .field(FieldSpec::integer("age").ge(40.0))
            .build()
            .expect("schema");
        let violations = Record::from_record(&strict, &record).expect_err("too young");
        assert_eq!(violations.first().path, "age");
    }

    #[test]
    fn non_object_input_is_a_root_type_mismatch() {
        let schema = profile_schema(ExtraPolicy::Ignore);
        let violations = Record::from_value(&schema, &json!([1, 2])).expect_err("not object");
        assert_eq!(violations.first().path, ROOT);
        assert_eq!(violations.first().message, "expected object, found list");
    }

    #[test]
    fn frozen_record_rejects_every_assignment() {
        let schema = Schema::builder("Frozen", ExtraPolicy::Forbid)
            .frozen()
            .field(FieldSpec::integer("age"))
            .build()
            .expect("schema");
        let mut record = Record::construct(&schema, &object(json!({"age": 28}))).expect("valid");
        let before = record.clone();

        let err = record.set_field("age", json!(29)).expect_err("frozen");
        assert!(matches!(err, MutationError::ImmutableRecord { .. }));
        let err = record
            .set_field("age", json!(28))
            .expect_err("frozen even if unchanged");
        assert!(matches!(err, MutationError::ImmutableRecord { .. }));
        assert_eq!(record, before);
    }

    #[test]
    fn mutable_record_revalidates_assignments() {
        let schema = profile_schema(ExtraPolicy::Ignore);
        let mut record = Record::construct(
            &schema,
            &object(json!({"name": "Al", "age": 30, "email": "a@b.com"})),
        )
        .expect("valid");

        record.set_field("age", json!("31")).expect("coerced");
        assert_eq!(record.get("age"), Some(&json!(31)));

        let before = record.clone();
        let err = record.set_field("age", json!(500)).expect_err("range");
        match err {
            MutationError::Invalid { field, violations } => {
                assert_eq!(field, "age");
                assert_eq!(violations.first().code(), "range");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(record, before);

        let err = record
            .set_field("nickname", json!("x"))
            .expect_err("unknown");
        assert!(matches!(err, MutationError::UnknownField { .. }));
    }

    #[test]
    fn nested_schema_applies_its_own_extra_policy() {
        let strict_address = Schema::builder("Address", ExtraPolicy::Forbid)
            .field(FieldSpec::string("city"))
            .build()
            .expect("schema");
        let lenient_user = Schema::builder("User", ExtraPolicy::Ignore)
            .field(FieldSpec::record("address", &strict_address))
            .build()
            .expect("schema");

        let input = object(json!({
            "address": {"city": "Boston", "extra": 1},
            "ignored": true
        }));
        let violations = Record::construct(&lenient_user, &input).expect_err("nested extra");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.first().path, "address.extra");
        assert_eq!(violations.first().code(), "unexpected_field");

        let strict_user = Schema::builder("User", ExtraPolicy::Forbid)
            .field(FieldSpec::record("address", &address_schema()))
            .build()
            .expect("schema");
        let input = object(json!({"address": {"city": "Boston", "zip": "02101", "extra": 1}}));
        let record = Record::construct(&strict_user, &input).expect("nested extra ignored");
        assert_eq!(
            record.get("address"),
            Some(&json!({"city": "Boston", "zip": "02101"}))
        );
    }

    #[test]
    fn nested_schema_applies_its_own_whitespace_policy() {
        let stripped = Schema::builder("Address", ExtraPolicy::Ignore)
            .strip_whitespace(true)
            .field(FieldSpec::string("city"))
            .build()
            .expect("schema");
        let user = Schema::builder("User", ExtraPolicy::Ignore)
            .field(FieldSpec::string("name"))
            .field(FieldSpec::record("address", &stripped))
            .build()
            .expect("schema");

        let input = object(json!({"name": " Ann ", "address": {"city": "  Boston  "}}));
        let record = Record::construct(&user, &input).expect("valid");
        assert_eq!(record.get_str("name"), Some(" Ann "));
        assert_eq!(record.get("address"), Some(&json!({"city": "Boston"})));
    }

    #[test]
    fn set_field_accepts_null_only_when_nullable() {
        let schema = Schema::builder("User", ExtraPolicy::Ignore)
            .field(FieldSpec::string("name"))
            .field(
                FieldSpec::string("nickname")
                    .nullable()
                    .with_default(Value::Null),
            )
            .build()
            .expect("schema");
        let input = object(json!({"name": "Ann", "nickname": "Annie"}));
        let mut record = Record::construct(&schema, &input).expect("valid");

        record.set_field("nickname", Value::Null).expect("nullable");
        assert_eq!(record.get("nickname"), Some(&Value::Null));

        let err = record
            .set_field("name", Value::Null)
            .expect_err("not nullable");
        match err {
            MutationError::Invalid { field, violations } => {
                assert_eq!(field, "name");
                assert_eq!(violations.first().code(), "type_mismatch");
                assert_eq!(violations.first().message, "expected string, found null");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(record.get_str("name"), Some("Ann"));
    }

    #[test]
    fn set_field_strips_whitespace_on_mutable_schema() {
        let schema = Schema::builder("Configured", ExtraPolicy::Ignore)
            .strip_whitespace(true)
            .field(FieldSpec::string("name").max_length(9))
            .build()
            .expect("schema");
        let input = object(json!({"name": "Eve"}));
        let mut record = Record::construct(&schema, &input).expect("valid");

        record
            .set_field("name", json!("  Eve Adams  "))
            .expect("stripped");
        assert_eq!(record.get_str("name"), Some("Eve Adams"));
    }

    #[test]
    fn display_mirrors_field_order() {
        let schema = profile_schema(ExtraPolicy::Ignore);
        let record = Record::construct(
            &schema,
            &object(json!({"email": "a@b.com", "age": 25, "name": "Al"})),
        )
        .expect("valid");
        assert_eq!(
            record.to_string(),
            r#"Profile(name="Al", age=25, email="a@b.com")"#
        );
    }

    #[test]
    fn deserializes_into_typed_struct() {
        #[derive(serde::Deserialize)]
        struct Profile {
            name: String,
            age: u8,
        }

        let schema = profile_schema(ExtraPolicy::Ignore);
        let record = Record::construct(
            &schema,
            &object(json!({"name": "Al", "age": "25", "email": "a@b.com"})),
        )
        .expect("valid");
        let typed: Profile = record.deserialize().expect("typed");
        assert_eq!(typed.name, "Al");
        assert_eq!(typed.age, 25);
    }
}
