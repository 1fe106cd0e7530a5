//! Side-effecting collaborators: files, config, subprocesses and git.

pub mod config;
pub mod git;
pub mod init;
pub mod input;
pub mod process;
pub mod schema_file;
