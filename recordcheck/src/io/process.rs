//! Bounded child-process execution for external tools.
//!
//! Commands run with stdin closed, a wall-clock timeout, and a cap on how much
//! stdout/stderr is kept in memory. Both pipes are drained on reader threads so
//! a chatty child can never block on a full pipe.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Limits applied to one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessLimits {
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

/// Captured output of a finished (or killed) child.
#[derive(Debug)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Bytes discarded beyond the output limit, per stream.
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.success()
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Run `cmd` to completion or until `limits.timeout` elapses.
#[instrument(skip_all, fields(timeout_ms = limits.timeout.as_millis() as u64, output_limit_bytes = limits.output_limit_bytes))]
pub fn run_with_limits(mut cmd: Command, limits: ProcessLimits) -> Result<CapturedOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().context("spawn command")?;
    debug!(pid = child.id(), "spawned child process");

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let limit = limits.output_limit_bytes;
    let stdout_reader = thread::spawn(move || drain_limited(stdout, limit));
    let stderr_reader = thread::spawn(move || drain_limited(stderr, limit));

    let waited = child
        .wait_timeout(limits.timeout)
        .context("wait for command")?;
    let (status, timed_out) = match waited {
        Some(status) => (status, false),
        None => {
            warn!(
                timeout_ms = limits.timeout.as_millis() as u64,
                "command timed out, killing"
            );
            child.kill().context("kill command")?;
            (child.wait().context("wait command after kill")?, true)
        }
    };

    let (stdout, stdout_truncated) = join_reader(stdout_reader).context("join stdout")?;
    let (stderr, stderr_truncated) = join_reader(stderr_reader).context("join stderr")?;
    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CapturedOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

fn join_reader(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    handle
        .join()
        .map_err(|_| anyhow!("output reader thread panicked"))?
}

/// Read `reader` to EOF, keeping at most `limit` bytes.
fn drain_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut kept = Vec::new();
    let mut discarded = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        let keep = n.min(room);
        kept.extend_from_slice(&chunk[..keep]);
        discarded += n - keep;
    }

    Ok((kept, discarded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_limited_counts_discarded_bytes() {
        let input: &[u8] = b"hello world";
        let (kept, discarded) = drain_limited(input, 5).expect("drain");
        assert_eq!(kept, b"hello");
        assert_eq!(discarded, 6);
    }

    #[test]
    fn drain_limited_keeps_short_output() {
        let input: &[u8] = b"ok";
        let (kept, discarded) = drain_limited(input, 100).expect("drain");
        assert_eq!(kept, b"ok");
        assert_eq!(discarded, 0);
    }

    #[test]
    fn spawn_failure_is_reported() {
        let cmd = Command::new("recordcheck-definitely-missing-binary");
        let err = run_with_limits(
            cmd,
            ProcessLimits {
                timeout: Duration::from_secs(5),
                output_limit_bytes: 1024,
            },
        )
        .expect_err("missing binary");
        assert!(err.to_string().contains("spawn command"));
    }
}
