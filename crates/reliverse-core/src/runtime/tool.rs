//! External command execution with streamed output

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;

/// Check if a binary is available in PATH
pub fn is_installed(binary: &str) -> bool {
    which_command()
        .arg(binary)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn which_command() -> std::process::Command {
    if cfg!(windows) {
        std::process::Command::new("where")
    } else {
        std::process::Command::new("which")
    }
}

/// Get the `--version` output of a binary (if available)
pub fn get_version(binary: &str) -> Option<String> {
    std::process::Command::new(binary)
        .arg("--version")
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
}

/// Run `program args...` in `cwd`, echoing the command and streaming its
/// output line by line. Fails on a non-zero exit.
pub async fn run_streaming(program: &str, args: &[&str], cwd: &Path) -> Result<()> {
    let display = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    println!();
    println!("{} {}", "Running:".dimmed(), display.yellow());
    println!();

    let mut child = TokioCommand::new(program)
        .args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start: {}", display))?;

    let stdout = child.stdout.take().context("Failed to capture stdout")?;
    let stderr = child.stderr.take().context("Failed to capture stderr")?;

    let mut stdout_reader = BufReader::new(stdout).lines();
    let mut stderr_reader = BufReader::new(stderr).lines();
    let mut stderr_open = true;

    loop {
        tokio::select! {
            line = stdout_reader.next_line() => {
                match line {
                    Ok(Some(line)) => println!("  {}", line),
                    Ok(None) => break,
                    Err(e) => {
                        eprintln!("{} {}", "Error reading stdout:".red(), e);
                        break;
                    }
                }
            }
            line = stderr_reader.next_line(), if stderr_open => {
                match line {
                    Ok(Some(line)) => eprintln!("  {}", line.yellow()),
                    Ok(None) => stderr_open = false,
                    Err(e) => {
                        eprintln!("{} {}", "Error reading stderr:".red(), e);
                        stderr_open = false;
                    }
                }
            }
        }
    }

    while stderr_open {
        match stderr_reader.next_line().await {
            Ok(Some(line)) => eprintln!("  {}", line.yellow()),
            _ => stderr_open = false,
        }
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("Failed to wait for: {}", display))?;
    println!();

    if !status.success() {
        anyhow::bail!(
            "Command failed with exit code {}: {}",
            status.code().unwrap_or(-1),
            display
        );
    }
    Ok(())
}

/// Run a command quietly and capture trimmed stdout
pub async fn run_captured(program: &str, args: &[&str], cwd: &Path) -> Result<String> {
    let output = TokioCommand::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to start: {} {}", program, args.join(" ")))?;

    if !output.status.success() {
        anyhow::bail!(
            "{} {} failed: {}",
            program,
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_installed_finds_shell() {
        assert!(is_installed("sh"));
        assert!(!is_installed("definitely-not-a-real-binary-xyz"));
    }

    #[tokio::test]
    async fn test_run_streaming_reports_exit_code() {
        let dir = TempDir::new().unwrap();
        run_streaming("sh", &["-c", "echo out; echo err >&2"], dir.path())
            .await
            .unwrap();

        let err = run_streaming("sh", &["-c", "exit 3"], dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exit code 3"));
    }

    #[tokio::test]
    async fn test_run_captured_runs_in_cwd() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();
        let out = run_captured("ls", &[], dir.path()).await.unwrap();
        assert_eq!(out, "marker");
    }
}
