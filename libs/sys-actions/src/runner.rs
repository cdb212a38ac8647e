//! running external commands
use std::{io, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

/// What a finished command left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// exit 0 with `stdout`
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// non-zero exit with `stderr`
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Seam between the actions and the OS, lets the actions run against a
/// scripted runner in tests.
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    /// run to completion, capturing output
    async fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;
    /// start and forget, nothing about the child is observed
    async fn spawn(&self, program: &str, args: &[&str]) -> io::Result<()>;
}

/// `program args..` as a single line, for logs & errors
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs commands on the host, through `sudo` unless disabled
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    sudo: bool,
}

impl SystemRunner {
    pub fn new(sudo: bool) -> Self {
        Self { sudo }
    }

    fn command(&self, program: &str, args: &[&str]) -> Command {
        let mut cmd = if self.sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(program);
            cmd
        } else {
            Command::new(program)
        };
        cmd.args(args).stdin(Stdio::null());
        cmd
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        trace!(cmd = %command_line(program, args), sudo = self.sudo, "running");
        let output = self.command(program, args).output().await?;
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn spawn(&self, program: &str, args: &[&str]) -> io::Result<()> {
        trace!(cmd = %command_line(program, args), sudo = self.sudo, "spawning");
        self.command(program, args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        assert_eq!(
            command_line("systemctl", &["restart", "dnsmasq"]),
            "systemctl restart dnsmasq"
        );
        assert_eq!(command_line("true", &[]), "true");
    }

    #[tokio::test]
    async fn test_system_runner() -> anyhow::Result<()> {
        let runner = SystemRunner::new(false);
        let out = runner.run("sh", &["-c", "echo hi; echo oops >&2; exit 3"]).await?;
        assert!(!out.success);
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout, "hi\n");
        assert_eq!(out.stderr, "oops\n");

        let out = runner.run("sh", &["-c", "printf home-wifi"]).await?;
        assert_eq!(out, CommandOutput::success("home-wifi"));

        assert!(runner.run("definitely-not-a-command-7f3a", &[]).await.is_err());
        Ok(())
    }
}
