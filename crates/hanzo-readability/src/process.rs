//! Running external commands under a hard wall-clock timeout

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by [`BoundedProcessRunner::run`]
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("command is empty")]
    EmptyCommand,

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process was still running at the deadline and has been killed.
    #[error("process timed out after {}[s]", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("io error while waiting for process: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured output of a process that exited on its own.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout immediately followed by stderr, byte for byte.
    pub fn combined(&self) -> Vec<u8> {
        let mut combined = Vec::with_capacity(self.stdout.len() + self.stderr.len());
        combined.extend_from_slice(&self.stdout);
        combined.extend_from_slice(&self.stderr);
        combined
    }

    /// The last `n` non-empty lines of the combined output, trimmed.
    pub fn tail_lines(&self, n: usize) -> Vec<String> {
        let combined = self.combined();
        let text = String::from_utf8_lossy(&combined);
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let skip = lines.len().saturating_sub(n);
        lines[skip..].iter().map(|line| line.to_string()).collect()
    }
}

/// Executes one command, collects its output and enforces a deadline.
#[derive(Debug, Clone, Default)]
pub struct BoundedProcessRunner;

impl BoundedProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `command` (program followed by its arguments) in `cwd`.
    ///
    /// Returns the captured output when the process exits before `timeout`,
    /// whatever its exit status. A process still running at the deadline is
    /// killed and reported as [`ProcessError::Timeout`].
    ///
    /// Arguments are passed through as OS strings, so non-UTF-8 paths reach
    /// the process unchanged.
    pub async fn run<S: AsRef<OsStr>>(
        &self,
        command: &[S],
        cwd: &Path,
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        let (program, args) = command.split_first().ok_or(ProcessError::EmptyCommand)?;
        let program_name = program.as_ref().to_string_lossy().to_string();

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(?cmd, cwd = %cwd.display(), "spawning command");
        let child = cmd.spawn().map_err(|source| {
            tracing::error!(program = %program_name, error = %source, "failed to spawn command");
            ProcessError::Spawn {
                program: program_name.clone(),
                source,
            }
        })?;

        // Dropping the wait future on timeout drops the child, and
        // kill_on_drop takes care of the termination.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    program = %program_name,
                    timeout_secs = timeout.as_secs_f64(),
                    "command execution timed out"
                );
                return Err(ProcessError::Timeout(timeout));
            }
        };

        let output = ProcessOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        };
        tracing::debug!(
            program = %program_name,
            exit_code = ?output.exit_code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "command finished"
        );
        Ok(output)
    }
}
