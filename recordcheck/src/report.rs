//! Rendering of check outcomes as text or JSON.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;
use serde_json::Value;

use crate::check::CheckOutcome;
use crate::core::record::Record;
use crate::core::violation::Violation;
use crate::io::config::OutputFormat;

const REPORT_TEMPLATE: &str = include_str!("templates/report.txt");

/// Machine-readable report.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    schema: &'a str,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<&'a Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<&'a [Violation]>,
}

#[derive(Debug, Serialize)]
struct ViolationLine {
    path: String,
    code: &'static str,
    message: String,
    got: String,
}

impl ViolationLine {
    fn from_violation(violation: &Violation) -> Self {
        Self {
            path: violation.path.clone(),
            code: violation.code(),
            message: violation.message.clone(),
            got: violation
                .value
                .as_ref()
                .map(|value| format!(" (got {})", compact(value)))
                .unwrap_or_default(),
        }
    }
}

/// Render `outcome` for `schema` in `format`.
pub fn render(schema: &str, outcome: &CheckOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => render_text(schema, outcome),
        OutputFormat::Json => render_json(schema, outcome),
    }
}

pub fn render_text(schema: &str, outcome: &CheckOutcome) -> Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("report.txt", REPORT_TEMPLATE)
        .context("load report template")?;
    let template = env.get_template("report.txt")?;

    let rendered = match outcome {
        CheckOutcome::Accepted(record) => template.render(context! {
            schema => schema,
            valid => true,
            record => record.to_json_pretty(),
        })?,
        CheckOutcome::Rejected(violations) => template.render(context! {
            schema => schema,
            valid => false,
            violations => violations.iter().map(ViolationLine::from_violation).collect::<Vec<_>>(),
        })?,
    };
    Ok(rendered)
}

pub fn render_json(schema: &str, outcome: &CheckOutcome) -> Result<String> {
    let report = match outcome {
        CheckOutcome::Accepted(record) => JsonReport {
            schema,
            valid: true,
            record: Some(record),
            violations: None,
        },
        CheckOutcome::Rejected(violations) => JsonReport {
            schema,
            valid: false,
            record: None,
            violations: Some(violations.as_slice()),
        },
    };
    serde_json::to_string_pretty(&report).context("serialize json report")
}

/// Short single-line rendering; long values are cut.
fn compact(value: &Value) -> String {
    const MAX_CHARS: usize = 60;
    let text = value.to_string();
    if text.chars().count() <= MAX_CHARS {
        return text;
    }
    let cut: String = text.chars().take(MAX_CHARS).collect();
    format!("{cut}...")
}
