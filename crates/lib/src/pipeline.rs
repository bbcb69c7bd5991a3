//! The generation entry point: input in, merged generated files out.
//!
//! ```text
//! module pin ──▶ ModuleReader ──▶ FileSet ──▶ Compiler ──┐
//!                                                       ├─▶ Image ──▶ Generator ──▶ GeneratedFiles
//! image file ───────────────────────────────────────────┘
//! ```
//!
//! Nothing is written here; callers persist the result only after the whole
//! run has succeeded.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::compile::{CompileError, Compiler, Diagnostic};
use crate::generate::{GenConfig, GenerateError, GenerateOptions, GeneratedFiles, Generator};
use crate::image::Image;
use crate::module::{ModuleError, ModulePin, ModuleReader};

/// What to generate from.
#[derive(Debug, Clone)]
pub enum GenerateInput {
  /// A module to download, verify and compile.
  Module(ModulePin),
  /// An already compiled image.
  Image(Image),
}

impl fmt::Display for GenerateInput {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GenerateInput::Module(pin) => write!(f, "module {}", pin),
      GenerateInput::Image(image) => write!(f, "image of {} file(s)", image.files().len()),
    }
  }
}

/// Errors that can occur in a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Module(#[from] ModuleError),

  /// The module compiled with errors.
  #[error("{} diagnostic(s) reported", .0.len())]
  Diagnostics(Vec<Diagnostic>),

  #[error(transparent)]
  Compile(CompileError),

  #[error(transparent)]
  Generate(GenerateError),

  #[error("module input requires a registry")]
  NoRegistry,

  #[error("module input requires a compiler")]
  NoCompiler,

  #[error("generation was cancelled")]
  Cancelled,
}

impl From<CompileError> for PipelineError {
  fn from(err: CompileError) -> Self {
    match err {
      CompileError::Diagnostics(diagnostics) => PipelineError::Diagnostics(diagnostics),
      CompileError::Cancelled => PipelineError::Cancelled,
      other => PipelineError::Compile(other),
    }
  }
}

impl From<GenerateError> for PipelineError {
  fn from(err: GenerateError) -> Self {
    match err {
      GenerateError::Cancelled => PipelineError::Cancelled,
      other => PipelineError::Generate(other),
    }
  }
}

/// Collaborators a pipeline run needs.
///
/// The reader and compiler are only required for module input.
#[derive(Clone)]
pub struct PipelineDeps {
  pub reader: Option<ModuleReader>,
  pub compiler: Option<Arc<dyn Compiler>>,
  pub generator: Generator,
}

/// Run one generation: resolve `input` to an image and fan it out to the
/// plugins in `config`.
pub async fn generate(
  input: GenerateInput,
  config: &GenConfig,
  options: &GenerateOptions,
  deps: &PipelineDeps,
  cancel: &CancellationToken,
) -> Result<GeneratedFiles, PipelineError> {
  info!(input = %input, plugins = config.plugins.len(), "starting generation");
  let image = match input {
    GenerateInput::Image(image) => image,
    GenerateInput::Module(pin) => {
      let reader = deps.reader.as_ref().ok_or(PipelineError::NoRegistry)?;
      let compiler = deps.compiler.as_ref().ok_or(PipelineError::NoCompiler)?;
      let module = tokio::select! {
        _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
        module = reader.get_module(&pin) => module?,
      };
      compiler.compile(module.file_set(), cancel).await?
    }
  };
  Ok(deps.generator.generate(config, &image, options, cancel).await?)
}
