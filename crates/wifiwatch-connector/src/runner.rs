// # Command Runner
//
// The one place where connectors touch the operating system. Every
// platform variant issues its queries through a `CommandRunner`, so the
// parsing and polling logic can be exercised against scripted output.

use async_trait::async_trait;
use wifiwatch_core::{Error, Result};

/// Captured result of one subprocess invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Process exited with status 0
    pub success: bool,
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with `stdout`
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with `stderr`
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Best single-line description of why the command failed
    pub fn failure_summary(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };

        match text.lines().next() {
            Some(line) if !line.is_empty() => line.to_string(),
            _ => "non-zero exit status".to_string(),
        }
    }
}

/// Executes OS commands on behalf of a connector
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and capture its output
    ///
    /// # Returns
    ///
    /// - `Ok(CommandOutput)`: The process ran (successfully or not)
    /// - `Err(Error::CommandFailed)`: The process could not be started
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// Runs commands with `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::command(program, e.to_string()))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Printable command line with any argument containing `secret` masked
pub(crate) fn describe(program: &str, args: &[&str], secret: Option<&str>) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        match secret {
            Some(s) if is_secret_arg(arg, s) => line.push_str("<REDACTED>"),
            _ => line.push_str(arg),
        }
    }
    line
}

/// `arg` is the secret itself or a `key=<secret>` assignment
fn is_secret_arg(arg: &str, secret: &str) -> bool {
    !secret.is_empty()
        && (arg == secret
            || arg
                .strip_suffix(secret)
                .is_some_and(|prefix| prefix.ends_with('=')))
}

/// Run a command and return its stdout, failing on a non-zero exit
pub(crate) async fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
    secret: Option<&str>,
) -> Result<String> {
    let output = runner
        .run(program, args)
        .await
        .map_err(|e| match e {
            Error::CommandFailed { message, .. } => {
                Error::command(describe(program, args, secret), message)
            }
            other => other,
        })?;

    if !output.success {
        return Err(Error::command(
            describe(program, args, secret),
            output.failure_summary(),
        ));
    }

    Ok(output.stdout)
}
