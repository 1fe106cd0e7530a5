//! Ready-made schemas used by the lessons and by `recordcheck check --catalog`.
//!
//! Each constructor builds a fresh `Arc<Schema>`; nested schemas are built
//! first and shared by reference.

use std::sync::Arc;

use regex::Regex;
use serde_json::{Value, json};

use crate::core::predicates::{Predicate, builtin};
use crate::core::schema::{ExtraPolicy, FieldSpec, FieldType, Schema, SchemaError};

/// Names accepted by [`by_name`], in lesson order.
pub const NAMES: &[&str] = &[
    "user",
    "address_basic",
    "advanced_user_basic",
    "user_profile",
    "smart_user",
    "configured_user",
    "user_with_role",
    "address",
    "company",
    "advanced_user",
];

/// Look up a catalog schema by its snake_case name.
pub fn by_name(name: &str) -> Option<Result<Arc<Schema>, SchemaError>> {
    let built = match name {
        "user" => user(),
        "address_basic" => address_basic(),
        "advanced_user_basic" => advanced_user_basic(),
        "user_profile" => user_profile(),
        "smart_user" => smart_user(),
        "configured_user" => configured_user(),
        "user_with_role" => user_with_role(),
        "address" => address(),
        "company" => company(),
        "advanced_user" => advanced_user(),
        _ => return None,
    };
    Some(built)
}

/// Name, age and email with an optional nickname and an active flag.
pub fn user() -> Result<Arc<Schema>, SchemaError> {
    Schema::builder("User", ExtraPolicy::Ignore)
        .field(FieldSpec::string("name"))
        .field(FieldSpec::integer("age"))
        .field(FieldSpec::string("email"))
        .field(
            FieldSpec::string("nickname")
                .nullable()
                .with_default(Value::Null),
        )
        .field(FieldSpec::boolean("is_active").with_default(true))
        .build()
}

pub fn address_basic() -> Result<Arc<Schema>, SchemaError> {
    Schema::builder("Address", ExtraPolicy::Ignore)
        .field(FieldSpec::string("street"))
        .field(FieldSpec::string("city"))
        .field(FieldSpec::string("country").with_default("USA"))
        .build()
}

pub fn advanced_user_basic() -> Result<Arc<Schema>, SchemaError> {
    let address = address_basic()?;
    Schema::builder("AdvancedUser", ExtraPolicy::Ignore)
        .field(FieldSpec::string("name"))
        .field(FieldSpec::integer("age"))
        .field(FieldSpec::string("email"))
        .field(FieldSpec::record("address", &address))
        .build()
}

/// Length, range and pattern constraints on every field.
pub fn user_profile() -> Result<Arc<Schema>, SchemaError> {
    Schema::builder("UserProfile", ExtraPolicy::Ignore)
        .field(FieldSpec::string("name").length(2, 50))
        .field(FieldSpec::integer("age").between(0.0, 120.0))
        .field(FieldSpec::string("email").pattern(Regex::new(r"^[^@]+@[^@]+\.[^@]+$")?))
        .field(FieldSpec::string("phone").pattern(Regex::new(r"^\+?1?-?\d{3}-?\d{3}-?\d{4}$")?))
        .field(FieldSpec::float("score").between(0.0, 100.0))
        .build()
}

/// Predicates that clean names and usernames and enforce business rules.
pub fn smart_user() -> Result<Arc<Schema>, SchemaError> {
    Schema::builder("SmartUser", ExtraPolicy::Ignore)
        .field(
            FieldSpec::string("name")
                .check(named("trim")?)
                .check(named("non_empty")?)
                .check(named("letters_and_spaces")?)
                .check(named("title_case")?),
        )
        .field(FieldSpec::integer("age").check(age_rules()))
        .field(
            FieldSpec::string("username")
                .check(named("trim")?)
                .check(named("lowercase")?)
                .length(3, 20)
                .pattern(Regex::new(r"^[a-z0-9_]+$")?)
                .check(Predicate::for_str("no_leading_underscore", |s| {
                    if s.starts_with('_') {
                        Err("cannot start with underscore".to_string())
                    } else {
                        Ok(s.to_string())
                    }
                })),
        )
        .field(FieldSpec::string("password").check(named("strong_password")?))
        .build()
}

/// Forbids extra keys, rejects assignment and trims string input.
pub fn configured_user() -> Result<Arc<Schema>, SchemaError> {
    Schema::builder("ConfiguredUser", ExtraPolicy::Forbid)
        .frozen()
        .strip_whitespace(true)
        .field(FieldSpec::string("name"))
        .field(FieldSpec::integer("age"))
        .field(FieldSpec::string("email"))
        .build()
}

pub const ROLES: [&str; 4] = ["admin", "user", "moderator", "guest"];

pub fn user_with_role() -> Result<Arc<Schema>, SchemaError> {
    Schema::builder("UserWithRole", ExtraPolicy::Ignore)
        .field(FieldSpec::string("name"))
        .field(FieldSpec::integer("age"))
        .field(FieldSpec::string("role").one_of(ROLES))
        .field(
            FieldSpec::string("status")
                .one_of(ROLES)
                .with_default("guest"),
        )
        .build()
}

pub fn address() -> Result<Arc<Schema>, SchemaError> {
    Schema::builder("Address", ExtraPolicy::Ignore)
        .field(FieldSpec::string("street"))
        .field(FieldSpec::string("city"))
        .field(FieldSpec::string("state").length(2, 2))
        .field(FieldSpec::string("zip_code").pattern(Regex::new(r"^\d{5}(-\d{4})?$")?))
        .field(FieldSpec::string("country").with_default("USA"))
        .build()
}

pub fn company() -> Result<Arc<Schema>, SchemaError> {
    Schema::builder("Company", ExtraPolicy::Ignore)
        .field(FieldSpec::string("name"))
        .field(FieldSpec::string("industry"))
        .field(FieldSpec::integer("size").ge(1.0))
        .build()
}

/// Nested address, optional company and list fields.
pub fn advanced_user() -> Result<Arc<Schema>, SchemaError> {
    let address = address()?;
    let company = company()?;
    Schema::builder("AdvancedUser", ExtraPolicy::Ignore)
        .field(FieldSpec::string("name"))
        .field(FieldSpec::integer("age"))
        .field(FieldSpec::string("email"))
        .field(FieldSpec::record("address", &address))
        .field(
            FieldSpec::record("company", &company)
                .nullable()
                .with_default(Value::Null),
        )
        .field(FieldSpec::list("skills", FieldType::String).with_default(json!([])))
        .field(FieldSpec::list("test_scores", FieldType::Float).with_default(json!([])))
        .field(FieldSpec::list("emergency_contacts", FieldType::Any).with_default(json!([])))
        .build()
}

fn named(name: &str) -> Result<Predicate, SchemaError> {
    builtin(name).ok_or_else(|| SchemaError::UnknownPredicate {
        name: name.to_string(),
        available: crate::core::predicates::BUILTIN_NAMES.join(", "),
    })
}

fn age_rules() -> Predicate {
    Predicate::for_i64("age_rules", |age| {
        if age < 0 {
            Err("cannot be negative".to_string())
        } else if age > 150 {
            Err("seems unrealistic (max 150)".to_string())
        } else if age < 13 {
            Err("user must be at least 13 years old".to_string())
        } else {
            Ok(age)
        }
    })
}
