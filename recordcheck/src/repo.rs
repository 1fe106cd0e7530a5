//! `recordcheck repo`: read-only summary of a git working tree.

use std::fmt;
use std::path::Path;

use anyhow::{Result, bail};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::io::git::{Git, LogEntry, StatusEntry};
use crate::io::process::ProcessLimits;

/// Snapshot of the working directory, staging area and history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoSummary {
    /// `None` on a detached HEAD.
    pub branch: Option<String>,
    pub commit_count: u64,
    pub recent: Vec<CommitLine>,
    pub changes: Vec<ChangeLine>,
    pub unstaged: Vec<String>,
    pub staged: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitLine {
    pub hash: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeLine {
    pub code: String,
    pub kind: &'static str,
    pub path: String,
}

impl From<LogEntry> for CommitLine {
    fn from(entry: LogEntry) -> Self {
        Self {
            hash: entry.hash,
            subject: entry.subject,
        }
    }
}

impl From<StatusEntry> for ChangeLine {
    fn from(entry: StatusEntry) -> Self {
        Self {
            kind: entry.kind().label(),
            code: entry.code,
            path: entry.path,
        }
    }
}

impl RepoSummary {
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Collect a summary of the repository containing `workdir`.
#[instrument(skip(limits), fields(workdir = %workdir.display()))]
pub fn summarize(workdir: &Path, limits: ProcessLimits, log_entries: usize) -> Result<RepoSummary> {
    let git = Git::new(workdir, limits);
    if !git.is_repo()? {
        bail!("not a git repository: {}", workdir.display());
    }

    let branch = match git.current_branch() {
        Ok(name) => Some(name),
        Err(err) => {
            warn!(error = %err, "branch unavailable");
            None
        }
    };

    Ok(RepoSummary {
        branch,
        commit_count: git.commit_count()?,
        recent: git
            .recent_commits(log_entries)?
            .into_iter()
            .map(CommitLine::from)
            .collect(),
        changes: git
            .status_porcelain()?
            .into_iter()
            .map(ChangeLine::from)
            .collect(),
        unstaged: git.unstaged_files()?,
        staged: git.staged_files()?,
    })
}

impl fmt::Display for RepoSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => writeln!(f, "branch: {branch}")?,
            None => writeln!(f, "branch: (detached HEAD)")?,
        }
        writeln!(f, "commits: {}", self.commit_count)?;

        if self.recent.is_empty() {
            writeln!(f, "recent: none")?;
        } else {
            writeln!(f, "recent:")?;
            for (idx, commit) in self.recent.iter().enumerate() {
                writeln!(f, "  {}. {} {}", idx + 1, commit.hash, commit.subject)?;
            }
        }

        if self.is_clean() {
            writeln!(f, "status: clean")?;
        } else {
            writeln!(f, "status:")?;
            for change in &self.changes {
                writeln!(f, "  {:<20} {}", change.kind, change.path)?;
            }
        }

        writeln!(f, "working tree: {} file(s) modified", self.unstaged.len())?;
        write!(f, "staging area: {} file(s) staged", self.staged.len())
    }
}
