//! Read-only git adapter for repository inspection.
//!
//! Every call shells out to `git` under [`ProcessLimits`] and parses the plain
//! text output. Nothing here writes to the repository.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::io::process::{CapturedOutput, ProcessLimits, run_with_limits};

/// Where a porcelain status entry sits in git's three areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Not tracked by git yet.
    Untracked,
    /// Changed in the working tree, not staged.
    ModifiedUnstaged,
    /// Changed and staged.
    ModifiedStaged,
    /// New file, staged.
    AddedStaged,
    /// Any other XY combination (renames, deletions, conflicts, ...).
    Other,
}

impl ChangeKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "??" => ChangeKind::Untracked,
            " M" => ChangeKind::ModifiedUnstaged,
            "M " => ChangeKind::ModifiedStaged,
            "A " => ChangeKind::AddedStaged,
            _ => ChangeKind::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChangeKind::Untracked => "untracked",
            ChangeKind::ModifiedUnstaged => "modified (unstaged)",
            ChangeKind::ModifiedStaged => "modified (staged)",
            ChangeKind::AddedStaged => "added (staged)",
            ChangeKind::Other => "other",
        }
    }
}

/// Parsed `git status --porcelain` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// 2-letter XY code, or "??" for untracked.
    pub code: String,
    /// Path for the changed file.
    pub path: String,
}

impl StatusEntry {
    pub fn kind(&self) -> ChangeKind {
        ChangeKind::from_code(&self.code)
    }
}

/// One line of `git log --oneline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub hash: String,
    pub subject: String,
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    limits: ProcessLimits,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>, limits: ProcessLimits) -> Self {
        Self {
            workdir: workdir.into(),
            limits,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// True if `workdir` is inside a git repository.
    #[instrument(skip_all)]
    pub fn is_repo(&self) -> Result<bool> {
        let output = self.run(&["rev-parse", "--git-dir"])?;
        let inside = output.success() && !output.stdout_text().trim().is_empty();
        debug!(inside, "repository check");
        Ok(inside)
    }

    /// Return the current branch name, including an unborn branch in a repo
    /// without commits. Errors on detached HEAD.
    #[instrument(skip_all)]
    pub fn current_branch(&self) -> Result<String> {
        let args = ["symbolic-ref", "--quiet", "--short", "HEAD"];
        let output = self.run(&args)?;
        // `--quiet` exits 1 without output when HEAD is not a symbolic ref.
        if !output.timed_out && output.status.code() == Some(1) {
            warn!("detached HEAD detected");
            return Err(anyhow!("detached HEAD"));
        }
        let name = self.stdout_of(&args, output)?.trim().to_string();
        debug!(branch = %name, "current branch");
        Ok(name)
    }

    /// Get status entries (including untracked) in porcelain format.
    pub fn status_porcelain(&self) -> Result<Vec<StatusEntry>> {
        let out = self.run_capture(&["status", "--porcelain=v1", "-uall"])?;
        out.lines()
            .filter(|line| !line.trim().is_empty())
            .map(parse_status_line)
            .collect()
    }

    /// Most recent `count` commits, newest first. Empty for a repo without commits.
    pub fn recent_commits(&self, count: usize) -> Result<Vec<LogEntry>> {
        if !self.has_commits()? {
            return Ok(Vec::new());
        }
        let limit = format!("-{count}");
        let out = self.run_capture(&["log", "--oneline", "--no-decorate", &limit])?;
        Ok(out.lines().filter_map(parse_log_line).collect())
    }

    /// Number of commits reachable from HEAD.
    pub fn commit_count(&self) -> Result<u64> {
        if !self.has_commits()? {
            return Ok(0);
        }
        let out = self.run_capture(&["rev-list", "--count", "HEAD"])?;
        let count = out.trim();
        count
            .parse()
            .map_err(|err| anyhow!("unexpected rev-list count '{count}': {err}"))
    }

    /// Paths changed in the working tree but not staged.
    pub fn unstaged_files(&self) -> Result<Vec<String>> {
        self.name_list(&["diff", "--name-only"])
    }

    /// Paths staged for the next commit.
    pub fn staged_files(&self) -> Result<Vec<String>> {
        self.name_list(&["diff", "--cached", "--name-only"])
    }

    fn has_commits(&self) -> Result<bool> {
        let output = self.run(&["rev-parse", "--verify", "--quiet", "HEAD"])?;
        Ok(output.success())
    }

    fn name_list(&self, args: &[&str]) -> Result<Vec<String>> {
        let out = self.run_capture(args)?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        self.stdout_of(args, output)
    }

    fn stdout_of(&self, args: &[&str], output: CapturedOutput) -> Result<String> {
        if output.timed_out {
            return Err(anyhow!(
                "git {} timed out after {}s",
                args.join(" "),
                self.limits.timeout.as_secs()
            ));
        }
        if !output.status.success() {
            return Err(anyhow!(
                "git {} failed: {}",
                args.join(" "),
                output.stderr_text().trim()
            ));
        }
        Ok(output.stdout_text())
    }

    fn run(&self, args: &[&str]) -> Result<CapturedOutput> {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.workdir);
        run_with_limits(cmd, self.limits)
            .map_err(|err| anyhow!("git {}: {err:#}", args.join(" ")))
    }
}

fn parse_status_line(line: &str) -> Result<StatusEntry> {
    if let Some(path) = line.strip_prefix("?? ") {
        return Ok(StatusEntry {
            code: "??".to_string(),
            path: path.trim().to_string(),
        });
    }
    if line.len() < 4 || !line.is_char_boundary(2) || !line.is_char_boundary(3) {
        return Err(anyhow!("unexpected porcelain line: '{line}'"));
    }
    let code = line[..2].to_string();
    let mut path = line[3..].trim().to_string();
    if let Some((_, new)) = path.split_once("->") {
        path = new.trim().to_string();
    }
    Ok(StatusEntry { code, path })
}

fn parse_log_line(line: &str) -> Option<LogEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (hash, subject) = line.split_once(' ').unwrap_or((line, ""));
    Some(LogEntry {
        hash: hash.to_string(),
        subject: subject.trim().to_string(),
    })
}
