//! Helpers for rendering qualified field paths.
//!
//! Nested record fields join with `.`, sequence elements with `[index]`:
//! `address.zip_code`, `contacts[1].name`, `scores[2]`.

/// Label used when a violation concerns the input as a whole.
pub const ROOT: &str = "<root>";

/// Append a field name to `prefix`.
pub fn field_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

/// Append a sequence index to `prefix`.
pub fn index_path(prefix: &str, index: usize) -> String {
    format!("{prefix}[{index}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_field_has_no_separator() {
        assert_eq!(field_path("", "age"), "age");
    }

    #[test]
    fn nested_paths_compose() {
        let contact = index_path("contacts", 1);
        assert_eq!(field_path(&contact, "name"), "contacts[1].name");
        assert_eq!(field_path("address", "zip_code"), "address.zip_code");
    }
}
