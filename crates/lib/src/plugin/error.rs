//! Errors returned by plugin execution.

use thiserror::Error;

use super::exec::ExecError;
use super::protocol::ProtocolError;

/// Errors that can occur invoking a plugin.
#[derive(Debug, Error)]
pub enum PluginError {
  /// The program could not be started or its pipes failed.
  #[error("failed to run plugin program {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: ExecError,
  },

  /// The program exited with a non-zero status.
  #[error("plugin program {program} exited with {}: {stderr}", describe_exit(.exit_code))]
  Execution {
    program: String,
    exit_code: Option<i32>,
    stderr: String,
  },

  /// The request could not be encoded or the response could not be decoded.
  #[error("plugin program {program} violated the plugin protocol: {source}")]
  Protocol {
    program: String,
    #[source]
    source: ProtocolError,
  },

  /// The program returned a structured error response.
  #[error("plugin program {program} reported an error: {message}")]
  Plugin { program: String, message: String },

  /// The invocation was cancelled and the program terminated.
  #[error("plugin program {program} was cancelled")]
  Cancelled { program: String },
}

fn describe_exit(exit_code: &Option<i32>) -> String {
  match exit_code {
    Some(code) => format!("code {}", code),
    None => "a signal".to_string(),
  }
}
