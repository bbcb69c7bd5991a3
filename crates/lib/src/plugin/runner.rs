//! Plugin runners: external programs exposed as request/response services.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::PluginError;
use super::exec::{ExecError, Executor};
use super::protocol::{PluginRequest, PluginResponse};

/// A plugin addressed as a service with one operation.
#[async_trait]
pub trait Runner: Send + Sync {
  /// Send `request` and wait for the response.
  ///
  /// An `error` response is returned as [`PluginError::Plugin`]; a returned
  /// response always carries files only.
  async fn invoke(&self, request: &PluginRequest, cancel: &CancellationToken) -> Result<PluginResponse, PluginError>;
}

/// Maps a program name and arguments to a [`Runner`].
pub trait RunnerProvider: Send + Sync {
  fn new_runner(&self, program: &str, args: &[String]) -> Arc<dyn Runner>;
}

impl<F> RunnerProvider for F
where
  F: Fn(&str, &[String]) -> Arc<dyn Runner> + Send + Sync,
{
  fn new_runner(&self, program: &str, args: &[String]) -> Arc<dyn Runner> {
    self(program, args)
  }
}

/// Provides [`ProgramRunner`]s that share one executor.
#[derive(Clone)]
pub struct ExecutorRunnerProvider {
  executor: Arc<dyn Executor>,
}

impl ExecutorRunnerProvider {
  pub fn new(executor: Arc<dyn Executor>) -> Self {
    Self { executor }
  }
}

impl RunnerProvider for ExecutorRunnerProvider {
  fn new_runner(&self, program: &str, args: &[String]) -> Arc<dyn Runner> {
    Arc::new(ProgramRunner::new(self.executor.clone(), program, args.to_vec()))
  }
}

/// Runs one program per invocation: request on stdin, response on stdout.
#[derive(Clone)]
pub struct ProgramRunner {
  executor: Arc<dyn Executor>,
  program: String,
  args: Vec<String>,
}

impl ProgramRunner {
  pub fn new(executor: Arc<dyn Executor>, program: impl Into<String>, args: Vec<String>) -> Self {
    Self {
      executor,
      program: program.into(),
      args,
    }
  }

  pub fn program(&self) -> &str {
    &self.program
  }
}

#[async_trait]
impl Runner for ProgramRunner {
  async fn invoke(&self, request: &PluginRequest, cancel: &CancellationToken) -> Result<PluginResponse, PluginError> {
    let program = &self.program;
    let protocol_err = |source| PluginError::Protocol {
      program: program.clone(),
      source,
    };

    let input = request.encode().map_err(protocol_err)?;
    let output = self
      .executor
      .run(program, &self.args, input, cancel)
      .await
      .map_err(|e| match e {
        ExecError::Cancelled { .. } => PluginError::Cancelled {
          program: program.clone(),
        },
        other => PluginError::Spawn {
          program: program.clone(),
          source: other,
        },
      })?;

    if !output.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      warn!(program = %program, exit_code = ?output.exit_code, "plugin failed");
      return Err(PluginError::Execution {
        program: program.clone(),
        exit_code: output.exit_code,
        stderr,
      });
    }

    let response = PluginResponse::decode(&output.stdout).map_err(protocol_err)?;
    if let Some(message) = response.error {
      return Err(PluginError::Plugin {
        program: program.clone(),
        message,
      });
    }
    debug!(program = %program, files = response.files.len(), "plugin responded");
    Ok(response)
  }
}
