//! Narrated walkthroughs over the catalog schemas (`recordcheck demo`).

use std::io::Write;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::catalog;
use crate::core::record::Record;
use crate::core::violation::Violations;

/// A walkthrough section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Lesson {
    /// Basic records, coercion, errors and JSON.
    Intro,
    /// Length, range, pattern and enumerated constraints.
    Constraints,
    /// Predicates that clean and check values.
    Validators,
    /// Nested records and lists.
    Nesting,
    /// Extra-key policy, frozen records and whitespace stripping.
    Config,
    /// A request/response round trip.
    Api,
    /// Every lesson in order.
    #[default]
    All,
}

impl Lesson {
    const ORDER: [Lesson; 6] = [
        Lesson::Intro,
        Lesson::Constraints,
        Lesson::Validators,
        Lesson::Nesting,
        Lesson::Config,
        Lesson::Api,
    ];
}

/// Write the narration for `lesson` to `out`.
#[instrument(skip(out))]
pub fn run_lesson(lesson: Lesson, out: &mut impl Write) -> Result<()> {
    match lesson {
        Lesson::All => {
            for each in Lesson::ORDER {
                run_lesson(each, out)?;
            }
            Ok(())
        }
        Lesson::Intro => intro(out),
        Lesson::Constraints => constraints(out),
        Lesson::Validators => validators(out),
        Lesson::Nesting => nesting(out),
        Lesson::Config => config(out),
        Lesson::Api => api(out),
    }
}

fn intro(out: &mut impl Write) -> Result<()> {
    let schema = catalog::user()?;
    writeln!(out, "=== Creating Valid Users ===")?;
    let alice = Record::from_value(
        &schema,
        &json!({"name": "Alice Smith", "age": 28, "email": "alice@example.com"}),
    )?;
    writeln!(out, "User 1: {alice}")?;
    writeln!(out, "User 1 is_active: {}", json_of(alice.get("is_active")))?;
    show(
        out,
        "User 2",
        Record::from_value(
            &schema,
            &json!({
                "name": "Bob Johnson",
                "age": 35,
                "email": "bob@example.com",
                "nickname": "Bobby",
                "is_active": false
            }),
        ),
    )?;
    let charlie = Record::from_value(
        &schema,
        &json!({"name": "Charlie Brown", "age": "25", "email": "charlie@example.com"}),
    )?;
    writeln!(out, "User 3: {charlie}")?;
    writeln!(out, "User 3 age stored as {}", json_of(charlie.get("age")))?;
    writeln!(out)?;

    writeln!(out, "=== Validation Error Examples ===")?;
    show(
        out,
        "Age must be a number",
        Record::from_value(
            &schema,
            &json!({"name": "David Wilson", "age": "not-a-number", "email": "david@example.com"}),
        ),
    )?;
    show(
        out,
        "Missing required field",
        Record::from_value(
            &schema,
            &json!({"name": "Eve Adams", "email": "eve@example.com"}),
        ),
    )?;
    writeln!(out)?;

    writeln!(out, "=== JSON Examples ===")?;
    let frank = Record::from_value(
        &schema,
        &json!({
            "name": "Frank Miller",
            "age": 42,
            "email": "frank@example.com",
            "nickname": "Frankie"
        }),
    )?;
    writeln!(out, "User as JSON: {}", frank.to_json())?;
    let grace = r#"{"name": "Grace Hopper", "age": 85, "email": "grace@example.com"}"#;
    let parsed: Value = serde_json::from_str(grace).context("parse lesson json")?;
    show(out, "User from JSON", Record::from_value(&schema, &parsed))?;
    writeln!(out)?;

    writeln!(out, "=== Nested Records ===")?;
    let advanced = catalog::advanced_user_basic()?;
    let ivy = Record::from_value(
        &advanced,
        &json!({
            "name": "Ivy Chen",
            "age": 29,
            "email": "ivy@example.com",
            "address": {"street": "123 Main St", "city": "San Francisco"}
        }),
    )?;
    writeln!(out, "Advanced user: {ivy}")?;
    writeln!(
        out,
        "User's city: {}",
        json_of(ivy.get("address").and_then(|address| address.get("city")))
    )?;
    writeln!(out)?;
    Ok(())
}

fn constraints(out: &mut impl Write) -> Result<()> {
    let schema = catalog::user_profile()?;
    writeln!(out, "=== Field Validation and Constraints ===")?;
    show(
        out,
        "Valid profile",
        Record::from_value(
            &schema,
            &json!({
                "name": "Alice Johnson",
                "age": 28,
                "email": "alice@example.com",
                "phone": "555-123-4567",
                "score": 85.5
            }),
        ),
    )?;
    show(
        out,
        "Age too high",
        Record::from_value(
            &schema,
            &json!({
                "name": "Bob",
                "age": 150,
                "email": "bob@example.com",
                "phone": "555-123-4567",
                "score": 90.0
            }),
        ),
    )?;
    show(
        out,
        "Email format",
        Record::from_value(
            &schema,
            &json!({
                "name": "Charlie",
                "age": 25,
                "email": "not-an-email",
                "phone": "555-123-4567",
                "score": 75.0
            }),
        ),
    )?;

    let roles = catalog::user_with_role()?;
    show(
        out,
        "Role with default status",
        Record::from_value(
            &roles,
            &json!({"name": "Dana", "age": 41, "role": "moderator"}),
        ),
    )?;
    show(
        out,
        "Unknown role",
        Record::from_value(&roles, &json!({"name": "Eli", "age": 19, "role": "root"})),
    )?;
    writeln!(out)?;
    Ok(())
}

fn validators(out: &mut impl Write) -> Result<()> {
    let schema = catalog::smart_user()?;
    writeln!(out, "=== Custom Validation ===")?;
    let alice = Record::from_value(
        &schema,
        &json!({
            "name": "  alice smith  ",
            "age": 25,
            "username": "ALICE_123",
            "password": "SecurePass123!"
        }),
    )?;
    writeln!(
        out,
        "Created user: {} (username: {})",
        json_of(alice.get("name")),
        json_of(alice.get("username"))
    )?;
    show(
        out,
        "Weak password",
        Record::from_value(
            &schema,
            &json!({"name": "Bob Wilson", "age": 30, "username": "bob_w", "password": "weak"}),
        ),
    )?;
    show(
        out,
        "Username with leading underscore",
        Record::from_value(
            &schema,
            &json!({
                "name": "Charlie Brown",
                "age": 35,
                "username": "_invalid",
                "password": "StrongPass123!"
            }),
        ),
    )?;
    writeln!(out)?;
    Ok(())
}

fn nesting(out: &mut impl Write) -> Result<()> {
    let schema = catalog::advanced_user()?;
    writeln!(out, "=== Complex Records and Nesting ===")?;
    let diana = Record::from_value(
        &schema,
        &json!({
            "name": "Diana Prince",
            "age": 32,
            "email": "diana@example.com",
            "address": {
                "street": "123 Main St",
                "city": "San Francisco",
                "state": "CA",
                "zip_code": "94105"
            },
            "company": {"name": "Tech Corp", "industry": "Software", "size": 50},
            "skills": ["Python", "JavaScript", "SQL"],
            "test_scores": [95.5, 87.0, 92.5],
            "emergency_contacts": [
                {"name": "John Doe", "phone": "555-0123", "relationship": "spouse"},
                {"name": "Jane Smith", "phone": "555-0456", "relationship": "sister"}
            ]
        }),
    )?;
    writeln!(out, "Created complex user: {}", json_of(diana.get("name")))?;
    writeln!(out, "{}", diana.to_json_pretty())?;
    let scores: Vec<f64> = diana
        .get("test_scores")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default();
    if !scores.is_empty() {
        let average = scores.iter().sum::<f64>() / scores.len() as f64;
        writeln!(out, "Average test score: {average:.1}")?;
    }
    show(
        out,
        "Bad nested values",
        Record::from_value(
            &schema,
            &json!({
                "name": "Zed",
                "age": 40,
                "email": "zed@example.com",
                "address": {
                    "street": "1 Loop",
                    "city": "Cupertino",
                    "state": "California",
                    "zip_code": "9501"
                },
                "test_scores": [88.0, "n/a"]
            }),
        ),
    )?;
    writeln!(out)?;
    Ok(())
}

fn config(out: &mut impl Write) -> Result<()> {
    let schema = catalog::configured_user()?;
    writeln!(out, "=== Schema Policies ===")?;
    let mut eve = Record::from_value(
        &schema,
        &json!({"name": "  Eve Adams  ", "age": 28, "email": "eve@example.com"}),
    )?;
    writeln!(
        out,
        "Created user with stripped name: {}",
        json_of(eve.get("name"))
    )?;
    show(
        out,
        "Extra field",
        Record::from_value(
            &schema,
            &json!({
                "name": "Frank Miller",
                "age": 35,
                "email": "frank@example.com",
                "nickname": "Frankie"
            }),
        ),
    )?;
    match eve.set_field("age", json!(29)) {
        Ok(()) => writeln!(out, "Assignment accepted: {eve}")?,
        Err(err) => writeln!(out, "Assignment rejected: {err}")?,
    }

    let roles = catalog::user_with_role()?;
    let mut dana = Record::from_value(&roles, &json!({"name": "Dana", "age": 41, "role": "user"}))?;
    match dana.set_field("role", json!("superuser")) {
        Ok(()) => writeln!(out, "Assignment accepted: {dana}")?,
        Err(err) => writeln!(out, "Assignment rejected: {err}")?,
    }
    dana.set_field("role", json!("admin"))?;
    writeln!(out, "After valid assignment: {dana}")?;
    writeln!(out)?;
    Ok(())
}

fn api(out: &mut impl Write) -> Result<()> {
    let schema = catalog::advanced_user()?;
    writeln!(out, "=== Request/Response Round Trip ===")?;
    let request = json!({
        "name": "Grace Hopper",
        "age": 85,
        "email": "grace@navy.mil",
        "address": {
            "street": "1000 Navy Pentagon",
            "city": "Washington",
            "state": "DC",
            "zip_code": "20350"
        },
        "skills": ["Mathematics", "Computer Science", "Leadership"]
    });
    match Record::from_value(&schema, &request) {
        Ok(user) => {
            writeln!(out, "Registered user: {}", json_of(user.get("name")))?;
            writeln!(out, "Response data includes {} fields", user.to_map().len())?;
            let body = user.to_json();
            writeln!(out, "JSON response length: {} characters", body.len())?;
            let echoed: Value = serde_json::from_str(&body).context("parse response json")?;
            let again = Record::from_value(&schema, &echoed)?;
            writeln!(
                out,
                "Response parses back to the same record: {}",
                again == user
            )?;
        }
        Err(violations) => report_violations(out, "Registration failed", &violations)?,
    }
    writeln!(out)?;
    Ok(())
}

fn show(out: &mut impl Write, label: &str, outcome: Result<Record, Violations>) -> Result<()> {
    match outcome {
        Ok(record) => {
            debug!(label, "lesson record accepted");
            writeln!(out, "ok  {label}: {record}")?;
        }
        Err(violations) => report_violations(out, label, &violations)?,
    }
    Ok(())
}

fn report_violations(out: &mut impl Write, label: &str, violations: &Violations) -> Result<()> {
    debug!(label, count = violations.len(), "lesson record rejected");
    writeln!(out, "err {label}: {} violation(s)", violations.len())?;
    for violation in violations {
        writeln!(out, "    - {violation}")?;
    }
    Ok(())
}

fn json_of(value: Option<&Value>) -> String {
    value.map_or_else(|| "<missing>".to_string(), Value::to_string)
}
