//! Helpers for running external programs and reporting their failures.

use crate::error::{Error, Result};
use std::process::{Command, Output, Stdio};

/// Renders a command line the way a user would type it.
pub fn describe(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Runs `cmd` to completion, capturing its output.
///
/// # Errors
/// Returns [`Error::CommandFailed`] when the program cannot be started or
/// exits unsuccessfully. The message carries the trimmed stderr.
pub fn run_checked(cmd: &mut Command) -> Result<Output> {
    let command = describe(cmd);
    log::debug!("Running: {command}");
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::CommandFailed {
            command: command.clone(),
            stderr: e.to_string(),
        })?;
    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr
        };
        Err(Error::CommandFailed { command, stderr })
    }
}

/// Lines of stdout, with empty lines removed.
pub fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
