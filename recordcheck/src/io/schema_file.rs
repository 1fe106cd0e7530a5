//! Schema documents on disk.
//!
//! A document is JSON: `{"root": "User", "schemas": [...]}`. It is checked
//! against the embedded v1 JSON Schema first, then deserialized and compiled
//! into core [`Schema`]s. Record fields may only reference schemas declared
//! earlier in the list, so compilation is a single forward pass.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::core::constraint::Constraint;
use crate::core::predicates::{BUILTIN_NAMES, builtin};
use crate::core::schema::{ExtraPolicy, FieldSpec, FieldType, Mutability, Schema, SchemaError};

/// JSON Schema describing schema documents.
pub const DOCUMENT_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/record_schema/v1.schema.json"
));

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    root: String,
    schemas: Vec<SchemaDef>,
}

#[derive(Debug, Deserialize)]
struct SchemaDef {
    name: String,
    extra: ExtraPolicy,
    #[serde(default)]
    mutability: Mutability,
    #[serde(default)]
    strip_whitespace: bool,
    fields: Vec<FieldDef>,
}

#[derive(Debug, Deserialize)]
struct FieldDef {
    name: String,
    #[serde(rename = "type")]
    ty: TypeDef,
    /// `Some(Value::Null)` for an explicit `"default": null`.
    #[serde(default, deserialize_with = "present")]
    default: Option<Value>,
    #[serde(default)]
    nullable: bool,
    #[serde(default)]
    constraints: Vec<ConstraintDef>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TypeDef {
    String,
    Integer,
    Float,
    Boolean,
    Any,
    Record { schema: String },
    List { items: Box<TypeDef> },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ConstraintDef {
    Range { min: Option<f64>, max: Option<f64> },
    Length { min: Option<usize>, max: Option<usize> },
    Pattern { regex: String },
    OneOf { values: Vec<Value> },
    Check { predicate: String },
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Read, check and compile the schema document at `path`; returns the root schema.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_schema_file(path: &Path) -> Result<Arc<Schema>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read schema {}", path.display()))?;
    parse_schema_document(&contents).with_context(|| format!("load schema {}", path.display()))
}

/// Check and compile a schema document; returns the root schema.
pub fn parse_schema_document(raw: &str) -> Result<Arc<Schema>> {
    let value: Value = serde_json::from_str(raw).context("parse schema document json")?;
    validate_document_structure(&value)?;
    let document: SchemaDocument =
        serde_json::from_value(value).context("deserialize schema document")?;
    compile_document(document)
}

fn validate_document_structure(document: &Value) -> Result<()> {
    let meta: Value =
        serde_json::from_str(DOCUMENT_SCHEMA).context("parse embedded document schema")?;
    let compiled = validator_for(&meta).map_err(|err| anyhow!("invalid document schema: {err}"))?;
    let messages = compiled
        .iter_errors(document)
        .map(|err| err.to_string())
        .collect::<Vec<_>>();
    if !messages.is_empty() {
        return Err(anyhow!(
            "schema document is malformed:\n- {}",
            messages.join("\n- ")
        ));
    }
    Ok(())
}

fn compile_document(document: SchemaDocument) -> Result<Arc<Schema>> {
    let mut compiled: HashMap<String, Arc<Schema>> = HashMap::new();
    for def in document.schemas {
        if compiled.contains_key(&def.name) {
            return Err(anyhow!("schema '{}' is declared more than once", def.name));
        }
        let name = def.name.clone();
        let schema = compile_schema(def, &compiled)
            .with_context(|| format!("compile schema '{name}'"))?;
        debug!(schema = %name, fields = schema.fields().len(), "compiled schema");
        compiled.insert(name, schema);
    }
    compiled
        .remove(&document.root)
        .ok_or_else(|| anyhow!("root schema '{}' is not declared", document.root))
}

fn compile_schema(
    def: SchemaDef,
    known: &HashMap<String, Arc<Schema>>,
) -> Result<Arc<Schema>, SchemaError> {
    let mut builder = Schema::builder(def.name, def.extra)
        .mutability(def.mutability)
        .strip_whitespace(def.strip_whitespace);
    for field in def.fields {
        builder = builder.field(compile_field(field, known)?);
    }
    builder.build()
}

fn compile_field(
    def: FieldDef,
    known: &HashMap<String, Arc<Schema>>,
) -> Result<FieldSpec, SchemaError> {
    let mut spec = FieldSpec::new(def.name, compile_type(def.ty, known)?);
    if let Some(default) = def.default {
        spec = spec.with_default(default);
    }
    if def.nullable {
        spec = spec.nullable();
    }
    for constraint in def.constraints {
        spec = spec.constrain(compile_constraint(constraint)?);
    }
    Ok(spec)
}

fn compile_type(
    def: TypeDef,
    known: &HashMap<String, Arc<Schema>>,
) -> Result<FieldType, SchemaError> {
    Ok(match def {
        TypeDef::String => FieldType::String,
        TypeDef::Integer => FieldType::Integer,
        TypeDef::Float => FieldType::Float,
        TypeDef::Boolean => FieldType::Boolean,
        TypeDef::Any => FieldType::Any,
        TypeDef::Record { schema } => match known.get(&schema) {
            Some(nested) => FieldType::Record(Arc::clone(nested)),
            None => return Err(SchemaError::UnknownSchema(schema)),
        },
        TypeDef::List { items } => FieldType::List(Box::new(compile_type(*items, known)?)),
    })
}

fn compile_constraint(def: ConstraintDef) -> Result<Constraint, SchemaError> {
    Ok(match def {
        ConstraintDef::Range { min, max } => Constraint::Range { min, max },
        ConstraintDef::Length { min, max } => Constraint::Length { min, max },
        ConstraintDef::Pattern { regex } => Constraint::Pattern(Regex::new(&regex)?),
        ConstraintDef::OneOf { values } => Constraint::OneOf(values),
        ConstraintDef::Check { predicate } => match builtin(&predicate) {
            Some(found) => Constraint::Predicate(found),
            None => {
                return Err(SchemaError::UnknownPredicate {
                    name: predicate,
                    available: BUILTIN_NAMES.join(", "),
                });
            }
        },
    })
}
