//! Rule-checked records: validate raw field mappings against schemas defined
//! once up front.
//!
//! - **[`core`]**: pure schema definition, coercion, constraints and record
//!   construction. No I/O.
//! - **[`io`]**: schema documents, input files, config, subprocesses and git.
//!
//! Orchestration modules ([`check`], [`demo`], [`repo`]) combine the two for
//! the CLI; [`catalog`] holds the ready-made schemas the lessons use.

pub mod catalog;
pub mod check;
pub mod core;
pub mod demo;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod report;
pub mod repo;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
