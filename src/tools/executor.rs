//! Bounded executor
//!
//! Wraps backend work in explicit limits:
//! - wall-clock budget (`run_bounded`, `run_blocking`)
//! - byte ceiling on streamed output (`read_capped`)
//! - process-group termination when a child overruns (`terminate`)
//!
//! Holds no state across calls; every invocation builds its own `Limits`.

use crate::errors::{Result, ToolError};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Limits applied to one bounded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Wall-clock budget
    pub time: Duration,

    /// Optional byte ceiling
    pub size: Option<u64>,
}

impl Limits {
    /// Time-only limits
    pub fn time(time: Duration) -> Self {
        Self { time, size: None }
    }

    /// Add a byte ceiling
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Reject a known size above the ceiling
    pub fn check_size(&self, actual: u64) -> Result<()> {
        match self.size {
            Some(limit) if actual > limit => Err(ToolError::Overflow { actual, limit }),
            _ => Ok(()),
        }
    }

    fn limit_ms(&self) -> u64 {
        self.time.as_millis().min(u64::MAX as u128) as u64
    }
}

/// Run a future under the time budget.
///
/// On expiry the future is dropped, which closes whatever it was holding.
pub async fn run_bounded<T, F>(operation: F, limits: &Limits) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();

    match timeout(limits.time, operation).await {
        Ok(result) => {
            debug!(elapsed_ms = start.elapsed().as_millis() as u64, "bounded operation finished");
            result
        }
        Err(_) => {
            warn!(limit_ms = limits.limit_ms(), "bounded operation timed out");
            Err(ToolError::TimedOut {
                limit_ms: limits.limit_ms(),
            })
        }
    }
}

/// Run blocking work on the blocking pool under the time budget.
///
/// `on_timeout` runs when the budget expires and must make the blocking
/// work return promptly (for SQLite: trigger the interrupt handle).
pub async fn run_blocking<T, F, C>(work: F, limits: &Limits, on_timeout: C) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
    C: FnOnce(),
{
    let handle = tokio::task::spawn_blocking(work);

    match timeout(limits.time, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ToolError::backend(format!(
            "Backend worker failed: {}",
            join_err
        ))),
        Err(_) => {
            on_timeout();
            warn!(limit_ms = limits.limit_ms(), "blocking operation timed out");
            Err(ToolError::TimedOut {
                limit_ms: limits.limit_ms(),
            })
        }
    }
}

/// Read a stream to the end, stopping once it passes `limit` bytes.
///
/// The reader is never drained past `limit + 1`; on overflow the reported
/// size is what was observed before stopping.
pub async fn read_capped<R>(reader: R, limit: u64) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut limited = reader.take(limit.saturating_add(1));
    limited.read_to_end(&mut buf).await?;

    let actual = buf.len() as u64;
    if actual > limit {
        return Err(ToolError::Overflow { actual, limit });
    }

    Ok(buf)
}

/// Kill a child and everything in its process group, then reap it.
///
/// The child must have been spawned with `process_group(0)` on unix so the
/// group id equals its pid.
pub async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(raw) = child.id().and_then(|pid| i32::try_from(pid).ok()) {
            if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
                debug!(pid = raw, error = %e, "killpg failed");
            }
        }
    }

    // kill() also waits, so no zombie is left behind
    if let Err(e) = child.kill().await {
        debug!(error = %e, "child already exited");
    }
}
