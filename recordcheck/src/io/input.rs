//! Raw record input: one JSON object read from a file or stdin.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// Source argument that selects stdin.
pub const STDIN: &str = "-";

/// Read the input mapping from `source` (a path, or `-` for stdin).
#[instrument(skip_all, fields(source = %source))]
pub fn read_input(source: &str) -> Result<Map<String, Value>> {
    let raw = if source == STDIN {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read input from stdin")?;
        buf
    } else {
        let path = Path::new(source);
        fs::read_to_string(path).with_context(|| format!("read input {}", path.display()))?
    };
    let map = parse_input(&raw).with_context(|| format!("parse input {source}"))?;
    debug!(keys = map.len(), "read input");
    Ok(map)
}

/// Parse `raw` as a JSON object.
pub fn parse_input(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw).context("parse input json")? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!(
            "input must be a JSON object, found {}",
            crate::core::predicates::type_name(&other)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_file;

    #[test]
    fn keeps_key_order() {
        let map = parse_input(r#"{"b": 1, "a": 2, "c": 3}"#).expect("parse");
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn rejects_non_objects() {
        let err = parse_input("[1, 2]").expect_err("array");
        assert_eq!(err.to_string(), "input must be a JSON object, found list");
    }

    #[test]
    fn reports_malformed_json() {
        let err = parse_input("{").expect_err("malformed");
        assert!(err.to_string().contains("parse input json"));
    }

    #[test]
    fn reads_from_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_file(temp.path(), "input.json", r#"{"name": "Al"}"#);
        let map = read_input(path.to_str().expect("utf-8 path")).expect("read");
        assert_eq!(map.get("name"), Some(&Value::from("Al")));
    }
}
