//! The schema compiler collaborator.
//!
//! Compilation is delegated to an external program speaking a JSON envelope
//! over stdin/stdout:
//!
//! ```json
//! {"version": 1, "files": [{"path": "a.proto", "content": "syntax = ..."}]}
//! ```
//!
//! It replies with either `{"image": {...}}` or
//! `{"diagnostics": [{"path": "a.proto", "line": 3, "column": 1, "message": "..."}]}`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cas::FileSet;
use crate::consts::PROTOCOL_VERSION;
use crate::image::{Image, ImageError};
use crate::plugin::{ExecError, Executor};

/// A compiler finding attached to a source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub line: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub column: Option<u32>,
  pub message: String,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match (&self.path, self.line, self.column) {
      (Some(path), Some(line), Some(column)) => write!(f, "{}:{}:{}: {}", path, line, column, self.message),
      (Some(path), Some(line), None) => write!(f, "{}:{}: {}", path, line, self.message),
      (Some(path), None, _) => write!(f, "{}: {}", path, self.message),
      (None, _, _) => f.write_str(&self.message),
    }
  }
}

/// Errors that can occur compiling a file set.
#[derive(Debug, Error)]
pub enum CompileError {
  /// The sources are invalid; the diagnostics say why.
  #[error("compilation failed with {} diagnostic(s)", .0.len())]
  Diagnostics(Vec<Diagnostic>),

  #[error("source file {0} is not valid UTF-8")]
  NonUtf8Source(String),

  #[error("failed to run compiler {program}: {source}")]
  Exec {
    program: String,
    #[source]
    source: ExecError,
  },

  #[error("compiler {program} exited with {exit_code:?}: {stderr}")]
  Failed {
    program: String,
    exit_code: Option<i32>,
    stderr: String,
  },

  #[error("invalid response from compiler {program}: {message}")]
  InvalidResponse { program: String, message: String },

  #[error("compiler produced an invalid image: {0}")]
  Image(#[from] ImageError),

  #[error("compilation was cancelled")]
  Cancelled,
}

/// Turns a verified file set into an image.
#[async_trait]
pub trait Compiler: Send + Sync {
  async fn compile(&self, files: &FileSet, cancel: &CancellationToken) -> Result<Image, CompileError>;
}

#[derive(Serialize)]
struct CompileRequest<'a> {
  version: u32,
  files: Vec<SourceFile<'a>>,
}

#[derive(Serialize)]
struct SourceFile<'a> {
  path: &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CompileResponse {
  #[serde(default)]
  image: Option<Image>,
  #[serde(default)]
  diagnostics: Vec<Diagnostic>,
}

/// A [`Compiler`] backed by an external program.
#[derive(Clone)]
pub struct ExternalCompiler {
  executor: Arc<dyn Executor>,
  program: String,
  args: Vec<String>,
}

impl ExternalCompiler {
  pub fn new(executor: Arc<dyn Executor>, program: impl Into<String>, args: Vec<String>) -> Self {
    Self {
      executor,
      program: program.into(),
      args,
    }
  }

  fn invalid(&self, message: impl Into<String>) -> CompileError {
    CompileError::InvalidResponse {
      program: self.program.clone(),
      message: message.into(),
    }
  }
}

#[async_trait]
impl Compiler for ExternalCompiler {
  async fn compile(&self, files: &FileSet, cancel: &CancellationToken) -> Result<Image, CompileError> {
    let sources = files
      .files()
      .map(|(path, content)| {
        std::str::from_utf8(content)
          .map(|content| SourceFile { path, content })
          .map_err(|_| CompileError::NonUtf8Source(path.to_string()))
      })
      .collect::<Result<Vec<_>, _>>()?;
    info!(program = %self.program, files = sources.len(), "compiling");

    let request = CompileRequest {
      version: PROTOCOL_VERSION,
      files: sources,
    };
    let input = serde_json::to_vec(&request).map_err(|e| self.invalid(format!("failed to encode request: {}", e)))?;

    let output = self
      .executor
      .run(&self.program, &self.args, input, cancel)
      .await
      .map_err(|e| match e {
        ExecError::Cancelled { .. } => CompileError::Cancelled,
        other => CompileError::Exec {
          program: self.program.clone(),
          source: other,
        },
      })?;
    if !output.success() {
      return Err(CompileError::Failed {
        program: self.program.clone(),
        exit_code: output.exit_code,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    let response: CompileResponse =
      serde_json::from_slice(&output.stdout).map_err(|e| self.invalid(format!("failed to decode response: {}", e)))?;
    match (response.image, response.diagnostics.is_empty()) {
      (Some(_), false) => Err(self.invalid("response carries both an image and diagnostics")),
      (None, false) => {
        debug!(program = %self.program, count = response.diagnostics.len(), "compiler reported diagnostics");
        Err(CompileError::Diagnostics(response.diagnostics))
      }
      (None, true) => Err(self.invalid("response carries neither an image nor diagnostics")),
      (Some(image), true) => {
        let image = Image::new(image.files().to_vec(), image.data().to_vec())?;
        info!(program = %self.program, files = image.files().len(), "compiled image");
        Ok(image)
      }
    }
  }
}
