//! Markdown conversion through an external command
//!
//! The command reads source markdown on stdin and writes tracker markup on
//! stdout. It is killed once the timeout elapses. Every failure surfaces as
//! [`SyncError::Conversion`].

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use issuesync_core::MarkdownConverter;
use issuesync_domain::{MarkdownConfig, Result, SyncError};
use wait_timeout::ChildExt;

/// Runs the configured converter command once per conversion
#[derive(Debug, Clone)]
pub struct CommandMarkdownConverter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandMarkdownConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self { program: program.into(), args, timeout }
    }
}

/// Converter for the configured command, or a passthrough when none is set
pub fn converter_from_config(config: &MarkdownConfig) -> std::sync::Arc<dyn MarkdownConverter> {
    match &config.command {
        Some(command) if !command.trim().is_empty() => {
            tracing::info!(command = %command, "using external markdown converter");
            std::sync::Arc::new(CommandMarkdownConverter::new(
                command.clone(),
                config.args.clone(),
                Duration::from_secs(config.timeout_secs),
            ))
        }
        _ => {
            tracing::info!("no markdown converter configured, bodies are passed through");
            std::sync::Arc::new(PassthroughConverter)
        }
    }
}

fn conversion_error(context: &str, err: impl std::fmt::Display) -> SyncError {
    SyncError::Conversion(format!("{context}: {err}"))
}

/// Blocking conversion; run on the blocking pool
fn run_command(program: &str, args: &[String], timeout: Duration, input: String) -> Result<String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| conversion_error("markdown converter spawn", e))?;

    // Each pipe gets its own thread; the child must never block on a full
    // pipe while we wait on it.
    let mut stdin = child.stdin.take();
    let writer = thread::spawn(move || -> std::io::Result<()> {
        if let Some(stdin) = stdin.as_mut() {
            stdin.write_all(input.as_bytes())?;
        }
        Ok(())
    });
    let mut stdout = child.stdout.take();
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(stdout) = stdout.as_mut() {
            let _ = stdout.read_to_end(&mut buf);
        }
        buf
    });
    let mut stderr = child.stderr.take();
    let err_reader = thread::spawn(move || {
        let mut buf = String::new();
        if let Some(stderr) = stderr.as_mut() {
            let _ = stderr.read_to_string(&mut buf);
        }
        buf
    });

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "markdown converter timed out, killing process");
            let _ = child.kill();
            let _ = child.wait();
            return Err(SyncError::Conversion(format!(
                "markdown converter timed out after {}s",
                timeout.as_secs()
            )));
        }
        Err(e) => return Err(conversion_error("markdown converter wait", e)),
    };

    let write_result = writer.join().unwrap_or_else(|_| Ok(()));
    let stdout = reader.join().unwrap_or_default();
    let stderr = err_reader.join().unwrap_or_default();

    if !status.success() {
        return Err(SyncError::Conversion(format!(
            "markdown converter exited with {status}: {}",
            stderr.trim()
        )));
    }
    if let Err(e) = write_result {
        tracing::debug!(error = %e, "markdown converter closed stdin early");
    }

    String::from_utf8(stdout).map_err(|e| conversion_error("markdown converter output", e))
}

#[async_trait]
impl MarkdownConverter for CommandMarkdownConverter {
    async fn convert(&self, text: &str) -> Result<String> {
        let program = self.program.clone();
        let args = self.args.clone();
        let timeout = self.timeout;
        let input = text.to_string();
        tokio::task::spawn_blocking(move || run_command(&program, &args, timeout, input))
            .await
            .map_err(|e| conversion_error("markdown converter task", e))?
    }
}

/// Returns bodies unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughConverter;

#[async_trait]
impl MarkdownConverter for PassthroughConverter {
    async fn convert(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}
