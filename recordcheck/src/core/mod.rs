//! Deterministic, pure logic for rule-checked records.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values and return deterministic outputs suitable for tests.

pub mod coerce;
pub mod constraint;
mod evaluate;
pub mod path;
pub mod predicates;
pub mod record;
pub mod schema;
pub mod violation;
