//! Stable exit codes for recordcheck CLI commands.

/// Command succeeded; for `check`, the input was accepted.
pub const OK: i32 = 0;
/// Command failed: unreadable files, malformed schema, bad config or other errors.
pub const ERROR: i32 = 1;
/// `recordcheck check` rejected the input.
pub const REJECTED: i32 = 2;
