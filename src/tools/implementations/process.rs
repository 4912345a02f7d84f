//! Process tool implementations
//!
//! - execute_command: run a shell command under a timeout
//! - get_environment: read-only host status
//!
//! A timed-out command is reported through the command result itself
//! (returncode 124, empty stdout) rather than as an error envelope, and its
//! whole process group is killed. Spawn failures are reported the same way
//! with returncode 1.

use crate::config::ServerInfo;
use crate::errors::{Result, ToolError};
use crate::tools::executor::{read_capped, run_bounded, terminate, Limits};
use crate::tools::implementations::filesystem::resolve_directory;
use crate::tools::types::ToolContext;
use serde::Serialize;
use serde_json::{json, Value};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use sysinfo::System;
use tokio::io::AsyncRead;
use tokio::process::Command;
use tracing::{debug, warn};

/// Exit code reported for a timed-out command
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Captured result of one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
}

impl CommandOutput {
    fn failed(stderr: String) -> Self {
        Self {
            stdout: String::new(),
            stderr,
            returncode: 1,
        }
    }
}

/// Execute a shell command
pub async fn execute_command(
    command: &str,
    working_dir: &str,
    timeout_seconds: u64,
    context: &ToolContext,
) -> Result<CommandOutput> {
    if command.trim().is_empty() {
        return Err(ToolError::invalid("Command cannot be empty"));
    }

    let max_timeout = context.max_timeout.as_secs();
    if timeout_seconds == 0 || timeout_seconds > max_timeout {
        return Err(ToolError::invalid(format!(
            "timeout must be between 1 and {} seconds, got {}",
            max_timeout, timeout_seconds
        )));
    }

    let cwd = resolve_directory(working_dir, context)
        .map_err(|_| ToolError::invalid(format!("Invalid working_dir: {}", working_dir)))?;

    let mut cmd = shell_command(command);
    cmd.current_dir(&cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(error = %e, "command spawn failed");
            return Ok(CommandOutput::failed(format!(
                "Command execution failed: {}",
                e
            )));
        }
    };
    debug!(pid = ?child.id(), "command spawned");

    let cap = context.max_output_size as u64;
    let limits = Limits::time(Duration::from_secs(timeout_seconds)).with_size(cap);
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let child_ref = &mut child;

    let outcome = run_bounded(
        async move {
            let (out, err) = tokio::try_join!(drain(stdout, cap), drain(stderr, cap))?;
            let status = child_ref.wait().await?;
            Ok((out, err, status))
        },
        &limits,
    )
    .await;

    match outcome {
        Ok((out, err, status)) => {
            limits.check_size((out.len() + err.len()) as u64)?;
            Ok(CommandOutput {
                stdout: String::from_utf8_lossy(&out).into_owned(),
                stderr: String::from_utf8_lossy(&err).into_owned(),
                returncode: exit_code(status),
            })
        }
        Err(ToolError::TimedOut { .. }) => {
            terminate(&mut child).await;
            Ok(CommandOutput {
                stdout: String::new(),
                stderr: format!("Command timed out after {} seconds", timeout_seconds),
                returncode: TIMEOUT_EXIT_CODE,
            })
        }
        Err(e) => {
            terminate(&mut child).await;
            Err(e)
        }
    }
}

/// Read-only host status
pub fn get_environment(context: &ToolContext, info: &ServerInfo) -> Value {
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let root = std::fs::canonicalize(&context.root)
        .unwrap_or_else(|_| context.root.clone())
        .display()
        .to_string();

    json!({
        "cwd": cwd,
        "root": root,
        "os_name": System::name(),
        "os_version": System::os_version(),
        "kernel_version": System::kernel_version(),
        "family": std::env::consts::FAMILY,
        "platform": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "cpu_count": num_cpus::get(),
        "server": {
            "name": info.name,
            "version": info.version,
        },
    })
}

fn shell_command(command: &str) -> Command {
    #[cfg(unix)]
    {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
    #[cfg(windows)]
    {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    }
}

async fn drain<R>(pipe: Option<R>, cap: u64) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    match pipe {
        Some(reader) => read_capped(reader, cap).await,
        None => Ok(Vec::new()),
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
