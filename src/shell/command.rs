//! Subprocess execution.

use crate::error::{EnvselError, Result};
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How often a running child is polled while a timeout is in effect.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal or timeout).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,

    /// Whether the command was killed after exceeding its timeout.
    pub timed_out: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
            timed_out: false,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
            timed_out: false,
        }
    }

    /// Create a result for a command killed after its timeout.
    pub fn timeout(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: None,
            stdout,
            stderr,
            duration,
            success: false,
            timed_out: true,
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Timeout (None = wait for the command to exit).
    pub timeout: Option<Duration>,
}

/// Render a program and its arguments for logs and error messages.
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        if arg.contains(' ') {
            rendered.push_str(&format!("\"{}\"", arg));
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}

/// Execute a program with arguments, capturing stdout and stderr.
///
/// Spawn failures are returned as [`EnvselError::CommandFailed`] carrying the
/// OS error text. A non-zero exit or a timeout is reported through the
/// returned [`CommandResult`].
pub fn execute(program: &str, args: &[String], options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();
    let rendered = display_command(program, args);
    tracing::debug!("Executing: {}", rendered);

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| {
        tracing::debug!("Failed to spawn {}: {}", rendered, e);
        EnvselError::CommandFailed {
            command: rendered.clone(),
            message: e.to_string(),
        }
    })?;

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    // Drain both pipes on their own threads so a chatty child never blocks
    // on a full pipe while we wait for it.
    let stdout_handle = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(out) = stdout.as_mut() {
            let _ = out.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).to_string()
    });

    let stderr_handle = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(err) = stderr.as_mut() {
            let _ = err.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).to_string()
    });

    let status = match options.timeout {
        None => Some(child.wait()?),
        Some(limit) => loop {
            if let Some(status) = child.try_wait()? {
                break Some(status);
            }
            if start.elapsed() >= limit {
                tracing::debug!("Timed out after {:?}: {}", limit, rendered);
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
            thread::sleep(POLL_INTERVAL);
        },
    };

    // Grandchildren of a killed command can keep the pipes open, so the
    // reader threads are left detached instead of joined.
    let Some(status) = status else {
        return Ok(CommandResult::timeout(
            String::new(),
            String::new(),
            start.elapsed(),
        ));
    };

    let stdout_output = stdout_handle.join().unwrap_or_default();
    let stderr_output = stderr_handle.join().unwrap_or_default();
    let duration = start.elapsed();

    match status {
        status if status.success() => Ok(CommandResult::success(
            stdout_output,
            stderr_output,
            duration,
        )),
        status => Ok(CommandResult::failure(
            status.code(),
            stdout_output,
            stderr_output,
            duration,
        )),
    }
}
