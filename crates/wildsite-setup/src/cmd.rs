use std::process::Command;

use anyhow::{Context, Result, bail};

/// Execute a command with logging. Logs the full command line at debug level
/// and a human-friendly description at info level.
pub fn run_cmd(description: &str, program: &str, args: &[&str]) -> Result<()> {
    let cmd_line = format!("{program} {}", args.join(" "));
    tracing::info!("{description}");
    tracing::debug!("exec: {cmd_line}");

    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to execute: {cmd_line}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::error!("command failed: {cmd_line}\nstderr: {stderr}");
        bail!("{description} failed ({}): {stderr}", output.status);
    }
    Ok(())
}

/// Execute a command whose failure must not stop the run. Failures are logged
/// at warn level and reported as `false`.
pub fn run_cmd_best_effort(description: &str, program: &str, args: &[&str]) -> bool {
    match run_cmd(description, program, args) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("{description} skipped: {e:#}");
            false
        }
    }
}

/// Execute a command attached to the operator's terminal, for tools that
/// prompt on their own (certbot in manual mode).
pub fn run_cmd_interactive(description: &str, program: &str, args: &[&str]) -> Result<()> {
    let cmd_line = format!("{program} {}", args.join(" "));
    tracing::info!("{description}");
    tracing::debug!("exec (interactive): {cmd_line}");

    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("failed to execute: {cmd_line}"))?;

    if !status.success() {
        bail!("{description} failed ({status})");
    }
    Ok(())
}

/// Execute a command and return its stdout as a string.
/// A non-zero exit is an error.
pub fn run_cmd_output(program: &str, args: &[&str]) -> Result<String> {
    let cmd_line = format!("{program} {}", args.join(" "));
    tracing::debug!("exec (capture): {cmd_line}");

    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to execute: {cmd_line}"))?;

    if !output.status.success() {
        bail!("{cmd_line} exited with {}", output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Check whether a program exists on PATH.
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .output()
        .is_ok_and(|o| o.status.success())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn run_cmd_succeeds_and_fails_on_exit_status() {
        assert!(run_cmd("true", "true", &[]).is_ok());
        let err = run_cmd("forced failure", "false", &[]).unwrap_err();
        assert!(err.to_string().contains("forced failure failed"));
    }

    #[test]
    fn missing_program_is_an_error() {
        assert!(run_cmd("missing", "wildsite-no-such-program", &[]).is_err());
        assert!(!command_exists("wildsite-no-such-program"));
    }

    #[test]
    fn best_effort_swallows_failure() {
        assert!(!run_cmd_best_effort("forced failure", "false", &[]));
        assert!(run_cmd_best_effort("noop", "true", &[]));
    }

    #[test]
    fn output_is_trimmed() {
        let out = run_cmd_output("echo", &["  hello  "]).unwrap();
        assert_eq!(out, "hello");
        assert!(run_cmd_output("false", &[]).is_err());
    }
}
