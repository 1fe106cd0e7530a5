//! `recordcheck check`: validate one JSON input against a schema.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::catalog;
use crate::core::record::Record;
use crate::core::schema::Schema;
use crate::core::violation::Violations;
use crate::exit_codes;
use crate::io::input::read_input;
use crate::io::schema_file::load_schema_file;

/// Where the schema comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// A JSON schema document on disk.
    File(PathBuf),
    /// A built-in schema by catalog name.
    Catalog(String),
}

/// Result of checking one input.
#[derive(Debug)]
pub enum CheckOutcome {
    Accepted(Record),
    Rejected(Violations),
}

impl CheckOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CheckOutcome::Accepted(_))
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            CheckOutcome::Accepted(_) => exit_codes::OK,
            CheckOutcome::Rejected(_) => exit_codes::REJECTED,
        }
    }
}

/// Resolve `source` into a built schema.
pub fn load_schema(source: &SchemaSource) -> Result<Arc<Schema>> {
    match source {
        SchemaSource::File(path) => load_schema_file(path),
        SchemaSource::Catalog(name) => match catalog::by_name(name) {
            Some(built) => built.with_context(|| format!("build catalog schema '{name}'")),
            None => Err(anyhow!(
                "unknown catalog schema '{name}' (available: {})",
                catalog::NAMES.join(", ")
            )),
        },
    }
}

/// Validate `input` against `schema`.
pub fn check_input(schema: &Arc<Schema>, input: &Map<String, Value>) -> CheckOutcome {
    match Record::construct(schema, input) {
        Ok(record) => CheckOutcome::Accepted(record),
        Err(violations) => CheckOutcome::Rejected(violations),
    }
}

/// Load the schema and the input, then validate.
#[instrument(skip_all, fields(input = %input))]
pub fn run_check(source: &SchemaSource, input: &str) -> Result<(Arc<Schema>, CheckOutcome)> {
    let schema = load_schema(source)?;
    debug!(
        schema = schema.name(),
        fields = schema.fields().len(),
        "schema ready"
    );
    let raw = read_input(input)?;
    let outcome = check_input(&schema, &raw);
    match &outcome {
        CheckOutcome::Accepted(_) => info!(schema = schema.name(), "input accepted"),
        CheckOutcome::Rejected(violations) => {
            info!(
                schema = schema.name(),
                violations = violations.len(),
                "input rejected"
            );
        }
    }
    Ok((schema, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{object, write_file};
    use serde_json::json;

    const DOC: &str = r#"{
      "root": "Login",
      "schemas": [{
        "name": "Login",
        "extra": "forbid",
        "fields": [
          {
            "name": "user",
            "type": {"kind": "string"},
            "constraints": [{"kind": "check", "predicate": "lowercase"}]
          },
          {
            "name": "attempts",
            "type": {"kind": "integer"},
            "constraints": [{"kind": "range", "min": 0}]
          }
        ]
      }]
    }"#;

    #[test]
    fn accepts_valid_file_input() {
        let temp = tempfile::tempdir().expect("tempdir");
        let schema = write_file(temp.path(), "login.json", DOC);
        let input = write_file(
            temp.path(),
            "input.json",
            r#"{"user": "ADA", "attempts": "3"}"#,
        );

        let (schema, outcome) = run_check(
            &SchemaSource::File(schema),
            input.to_str().expect("utf-8 path"),
        )
        .expect("check");
        assert_eq!(schema.name(), "Login");
        assert_eq!(outcome.exit_code(), exit_codes::OK);
        let CheckOutcome::Accepted(record) = outcome else {
            panic!("expected acceptance");
        };
        assert_eq!(record.to_value(), json!({"user": "ada", "attempts": 3}));
    }

    #[test]
    fn rejection_maps_to_rejected_exit_code() {
        let source = SchemaSource::Catalog("user_profile".to_string());
        let schema = load_schema(&source).expect("schema");
        let outcome = check_input(&schema, &object(json!({"name": "A", "age": -1})));
        assert!(!outcome.is_accepted());
        assert_eq!(outcome.exit_code(), exit_codes::REJECTED);
        let CheckOutcome::Rejected(violations) = outcome else {
            panic!("expected rejection");
        };
        let codes: Vec<&str> = violations.iter().map(|v| v.code()).collect();
        assert_eq!(
            codes,
            vec!["length", "range", "missing", "missing", "missing"]
        );
    }

    #[test]
    fn unknown_catalog_name_lists_choices() {
        let err = load_schema(&SchemaSource::Catalog("nope".to_string())).expect_err("unknown");
        assert!(err.to_string().contains("unknown catalog schema 'nope'"));
        assert!(err.to_string().contains("smart_user"));
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("missing.json");
        let err = run_check(
            &SchemaSource::Catalog("user".to_string()),
            missing.to_str().expect("utf-8 path"),
        )
        .expect_err("missing input");
        assert!(format!("{err:#}").contains("read input"));
    }
}
