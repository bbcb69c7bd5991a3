//! Process execution.
//!
//! The [`Executor`] trait is the single point where child processes are
//! started. Everything above it (plugin runners, the external compiler) only
//! sees bytes in and an [`ExecOutput`] back.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Errors that can occur running a program.
#[derive(Debug, Error)]
pub enum ExecError {
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  #[error("i/o error talking to {program}: {source}")]
  Io {
    program: String,
    #[source]
    source: io::Error,
  },

  #[error("{program} was cancelled")]
  Cancelled { program: String },
}

/// The result of a program that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
  /// Exit code, or `None` if the process was terminated by a signal.
  pub exit_code: Option<i32>,
  pub stdout: Vec<u8>,
  pub stderr: Vec<u8>,
}

impl ExecOutput {
  pub fn success(&self) -> bool {
    self.exit_code == Some(0)
  }
}

/// Starts programs on behalf of runners.
#[async_trait]
pub trait Executor: Send + Sync {
  /// Run `program` with `args`, feed it `stdin`, and collect its output.
  ///
  /// When `cancel` fires the process is killed and [`ExecError::Cancelled`]
  /// is returned.
  async fn run(
    &self,
    program: &str,
    args: &[String],
    stdin: Vec<u8>,
    cancel: &CancellationToken,
  ) -> Result<ExecOutput, ExecError>;
}

/// Runs programs as local child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
  working_dir: Option<PathBuf>,
  env: BTreeMap<String, String>,
}

impl ProcessExecutor {
  pub fn new() -> Self {
    Self::default()
  }

  /// Run every program in `dir`.
  pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.working_dir = Some(dir.into());
    self
  }

  /// Add an environment variable on top of the inherited environment.
  pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }
}

#[async_trait]
impl Executor for ProcessExecutor {
  async fn run(
    &self,
    program: &str,
    args: &[String],
    stdin: Vec<u8>,
    cancel: &CancellationToken,
  ) -> Result<ExecOutput, ExecError> {
    info!(program = %program, "executing program");

    let mut command = Command::new(program);
    command
      .args(args)
      .envs(&self.env)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);
    if let Some(dir) = &self.working_dir {
      command.current_dir(dir);
    }

    debug!(program = %program, args = ?args, input_bytes = stdin.len(), "spawning process");
    let mut child = command.spawn().map_err(|source| ExecError::Spawn {
      program: program.to_string(),
      source,
    })?;

    let pipe = child.stdin.take();
    let feed = async move {
      let Some(mut pipe) = pipe else {
        return Ok(());
      };
      match pipe.write_all(&stdin).await {
        // The program may exit without reading its input; its exit status decides.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
      }
      // Dropping the pipe closes the program's stdin.
    };
    let run = async { tokio::join!(feed, child.wait_with_output()) };

    let (fed, output) = tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        // Dropping `run` drops the child, which kills it.
        info!(program = %program, "cancelled, terminating process");
        return Err(ExecError::Cancelled { program: program.to_string() });
      }
      result = run => result,
    };

    let io_err = |source| ExecError::Io {
      program: program.to_string(),
      source,
    };
    fed.map_err(io_err)?;
    let output = output.map_err(io_err)?;

    let output = ExecOutput {
      exit_code: output.status.code(),
      stdout: output.stdout,
      stderr: output.stderr,
    };

    if !output.stderr.is_empty() {
      debug!(program = %program, stderr = %String::from_utf8_lossy(&output.stderr), "process stderr");
    }
    debug!(
      program = %program,
      exit_code = ?output.exit_code,
      output_bytes = output.stdout.len(),
      "process exited"
    );

    Ok(output)
  }
}
