//! Implementation of the `protopin generate` command.
//!
//! Resolves the input to an image, runs every configured plugin, and writes
//! the merged output only after the whole run has succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use protopin_lib::compile::{Compiler, Diagnostic, ExternalCompiler};
use protopin_lib::consts::{ERROR_FORMAT_JSON, INPUT_FORMAT_IMAGE, INPUT_FORMAT_MODULE};
use protopin_lib::generate::{GenConfig, GenerateOptions, Generator};
use protopin_lib::image::Image;
use protopin_lib::module::{LocalRegistry, ModulePin, ModuleReader};
use protopin_lib::pipeline::{self, GenerateInput, PipelineDeps, PipelineError};
use protopin_lib::plugin::{Executor, ExecutorRunnerProvider, ProcessExecutor};

use crate::output::{format_duration, print_json, print_success, symbols};

/// Flags accepted by `protopin generate`.
pub struct GenerateArgs {
  pub template: String,
  pub input: String,
  pub input_format: Option<String>,
  pub output: PathBuf,
  pub files: Vec<String>,
  pub error_format: String,
  pub registry: Option<PathBuf>,
  pub compiler: Option<String>,
  pub allow_overlap: bool,
  pub parallelism: Option<usize>,
}

/// Execute the generate command.
///
/// Ctrl-C cancels the run and terminates any running plugin.
pub fn cmd_generate(args: GenerateArgs) -> Result<()> {
  let start = Instant::now();
  let config = GenConfig::read_path_or_data(&args.template).context("Failed to load generation config")?;
  let input = resolve_input(&args.input, args.input_format.as_deref())?;

  let executor: Arc<dyn Executor> = Arc::new(ProcessExecutor::new());
  let reader = args
    .registry
    .as_ref()
    .map(|dir| ModuleReader::new(Arc::new(LocalRegistry::new(dir))));
  let compiler = args.compiler.as_ref().map(|program| -> Arc<dyn Compiler> {
    Arc::new(ExternalCompiler::new(executor.clone(), program.clone(), Vec::new()))
  });
  let deps = PipelineDeps {
    reader,
    compiler,
    generator: Generator::new(Arc::new(ExecutorRunnerProvider::new(executor))),
  };

  let mut options = GenerateOptions {
    base_out_dir: args.output.clone(),
    files: args.files,
    allow_overlap: args.allow_overlap,
    ..Default::default()
  };
  if let Some(parallelism) = args.parallelism {
    options.parallelism = parallelism;
  }

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let cancel = CancellationToken::new();
  let generated = rt.block_on(async {
    let signal_token = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        info!("interrupted, cancelling");
        signal_token.cancel();
      }
    });
    pipeline::generate(input, &config, &options, &deps, &cancel).await
  });

  let generated = match generated {
    Ok(generated) => generated,
    Err(PipelineError::Diagnostics(diagnostics)) => {
      print_diagnostics(&diagnostics, &args.error_format)?;
      bail!("Compilation failed with {} diagnostic(s)", diagnostics.len());
    }
    Err(err) => return Err(err).context("Generation failed"),
  };

  rt.block_on(generated.write(&options.base_out_dir))
    .context("Failed to write generated files")?;

  for file in generated.files() {
    println!(
      "  {} {} {}",
      symbols::ADD.green(),
      file.path,
      format!("({})", file.plugin).dimmed()
    );
  }
  print_success(&format!(
    "Generated {} file(s) in {} ({})",
    generated.len(),
    options.base_out_dir.display(),
    format_duration(start.elapsed())
  ));

  Ok(())
}

/// Interpret `--input`; without an explicit format an existing file is an image.
fn resolve_input(input: &str, format: Option<&str>) -> Result<GenerateInput> {
  let format = match format {
    Some(format) => format,
    None if Path::new(input).is_file() => INPUT_FORMAT_IMAGE,
    None => INPUT_FORMAT_MODULE,
  };
  if format == INPUT_FORMAT_IMAGE {
    let data = std::fs::read(input).with_context(|| format!("Failed to read image {}", input))?;
    let image = Image::from_json(&data).with_context(|| format!("Failed to decode image {}", input))?;
    return Ok(GenerateInput::Image(image));
  }
  let pin = input
    .parse::<ModulePin>()
    .with_context(|| format!("Invalid module reference {}", input))?;
  Ok(GenerateInput::Module(pin))
}

fn print_diagnostics(diagnostics: &[Diagnostic], format: &str) -> Result<()> {
  if format == ERROR_FORMAT_JSON {
    return print_json(&diagnostics);
  }
  for diagnostic in diagnostics {
    eprintln!("{}", diagnostic);
  }
  Ok(())
}
