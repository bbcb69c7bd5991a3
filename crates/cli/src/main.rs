mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use protopin_lib::consts::{ALL_ERROR_FORMATS, ALL_INPUT_FORMATS, DEFAULT_GEN_CONFIG_FILE, ERROR_FORMAT_TEXT};

use crate::cmd::{GenerateArgs, cmd_export, cmd_generate, cmd_push};
use crate::output::print_error;

/// protopin - Fetch pinned schema modules and run code generator plugins
#[derive(Parser)]
#[command(name = "protopin")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (RUST_LOG overrides)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate code from a module or image with the configured plugins
  Generate {
    /// Generation config: a file path or inline YAML/JSON
    #[arg(long, default_value = DEFAULT_GEN_CONFIG_FILE)]
    template: String,

    /// Module pin (remote/owner/repository:commit) or image file
    #[arg(long)]
    input: String,

    /// How to interpret --input (detected when omitted)
    #[arg(long, value_parser = PossibleValuesParser::new(ALL_INPUT_FORMATS.iter().copied()))]
    input_format: Option<String>,

    /// Base output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Only generate for these files (repeatable)
    #[arg(long = "file")]
    files: Vec<String>,

    /// Format for compiler diagnostics
    #[arg(long, default_value = ERROR_FORMAT_TEXT, value_parser = PossibleValuesParser::new(ALL_ERROR_FORMATS.iter().copied()))]
    error_format: String,

    /// Local registry directory for module input
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Compiler program for module input
    #[arg(long)]
    compiler: Option<String>,

    /// Let later plugins overwrite earlier plugins' files
    #[arg(long)]
    allow_overlap: bool,

    /// Maximum number of plugins to run at once
    #[arg(short = 'j', long)]
    parallelism: Option<usize>,
  },

  /// Publish a directory as a module in a local registry
  Push {
    /// Local registry directory
    #[arg(long)]
    registry: PathBuf,

    /// Module pin (remote/owner/repository:commit)
    pin: String,

    /// Directory holding the module files
    dir: PathBuf,
  },

  /// Download and verify a module, writing its files to a directory
  Export {
    /// Local registry directory
    #[arg(long)]
    registry: PathBuf,

    /// Module pin (remote/owner/repository:commit[@digest])
    pin: String,

    /// Destination directory
    dir: PathBuf,
  },
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  if let Err(err) = run(cli.command) {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}

fn run(command: Commands) -> Result<()> {
  match command {
    Commands::Generate {
      template,
      input,
      input_format,
      output,
      files,
      error_format,
      registry,
      compiler,
      allow_overlap,
      parallelism,
    } => cmd_generate(GenerateArgs {
      template,
      input,
      input_format,
      output,
      files,
      error_format,
      registry,
      compiler,
      allow_overlap,
      parallelism,
    }),
    Commands::Push { registry, pin, dir } => cmd_push(&registry, &pin, &dir),
    Commands::Export { registry, pin, dir } => cmd_export(&registry, &pin, &dir),
  }
}
