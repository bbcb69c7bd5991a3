//! Fan an image out to every configured plugin and merge what they produce.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::GenConfig;
use crate::image::{Image, ImageError};
use crate::plugin::{PluginError, PluginRequest, PluginResponse, RunnerProvider};
use crate::util::path::join;

/// Errors that can occur during a generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
  /// A plugin failed; the whole run fails with it.
  #[error("plugin {plugin} failed: {source}")]
  Plugin {
    plugin: String,
    #[source]
    source: PluginError,
  },

  /// Two plugins produced the same output path.
  #[error("output {path} is generated by both plugin {first} and plugin {second}")]
  Collision {
    path: String,
    first: String,
    second: String,
  },

  /// Decoded envelopes never carry such paths; in-process runners can.
  #[error("plugin {plugin} produced a file outside its output directory: {path}")]
  InvalidOutputPath { plugin: String, path: String },

  #[error(transparent)]
  Image(#[from] ImageError),

  #[error("plugin task panicked: {0}")]
  Panicked(String),

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("generation was cancelled")]
  Cancelled,
}

/// Options for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
  /// Directory generated files are written under.
  pub base_out_dir: PathBuf,
  /// Restrict generation to these image files. Empty means all.
  pub files: Vec<String>,
  /// Maximum number of plugins running at once.
  pub parallelism: usize,
  /// Let later plugins overwrite earlier plugins' files, in addition to the config setting.
  pub allow_overlap: bool,
}

impl Default for GenerateOptions {
  fn default() -> Self {
    Self {
      base_out_dir: PathBuf::from("."),
      files: Vec::new(),
      parallelism: num_cpus(),
      allow_overlap: false,
    }
  }
}

fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

/// A generated file, attributed to the plugin that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
  /// Path relative to the base output directory.
  pub path: String,
  pub content: String,
  pub plugin: String,
}

/// The merged output of a successful run, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedFiles {
  files: BTreeMap<String, OutputFile>,
}

impl GeneratedFiles {
  /// Files in path order.
  pub fn files(&self) -> impl Iterator<Item = &OutputFile> {
    self.files.values()
  }

  pub fn get(&self, path: &str) -> Option<&OutputFile> {
    self.files.get(path)
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  /// Write every file under `base_out_dir`, returning the written paths.
  pub async fn write(&self, base_out_dir: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    let mut written = Vec::with_capacity(self.files.len());
    for file in self.files.values() {
      let dest = base_out_dir.join(&file.path);
      if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
          .await
          .map_err(|source| GenerateError::Write {
            path: parent.to_path_buf(),
            source,
          })?;
      }
      tokio::fs::write(&dest, &file.content)
        .await
        .map_err(|source| GenerateError::Write {
          path: dest.clone(),
          source,
        })?;
      debug!(path = %dest.display(), plugin = %file.plugin, "wrote file");
      written.push(dest);
    }
    info!(files = written.len(), out = %base_out_dir.display(), "wrote generated files");
    Ok(written)
  }
}

/// Runs the configured plugins against an image.
#[derive(Clone)]
pub struct Generator {
  provider: Arc<dyn RunnerProvider>,
}

impl Generator {
  pub fn new(provider: Arc<dyn RunnerProvider>) -> Self {
    Self { provider }
  }

  /// Invoke every plugin in `config` and merge their files.
  ///
  /// Plugins run concurrently, bounded by `options.parallelism`. The first
  /// failure cancels the rest and fails the run. Results merge in config
  /// order regardless of completion order.
  pub async fn generate(
    &self,
    config: &GenConfig,
    image: &Image,
    options: &GenerateOptions,
    cancel: &CancellationToken,
  ) -> Result<GeneratedFiles, GenerateError> {
    if cancel.is_cancelled() {
      return Err(GenerateError::Cancelled);
    }
    let image = image.filter_files(&options.files)?;
    let parallelism = options.parallelism.max(1);
    info!(
      plugins = config.plugins.len(),
      files = image.files().len(),
      parallelism,
      "generating"
    );

    let run_token = cancel.child_token();
    let semaphore = Arc::new(Semaphore::new(parallelism));
    let mut join_set = JoinSet::new();

    for (index, plugin) in config.plugins.iter().enumerate() {
      let program = plugin.program();
      let runner = self.provider.new_runner(&program, &plugin.args);
      let request = PluginRequest::new(image.clone(), plugin.opt.clone(), plugin.out.clone());
      let semaphore = semaphore.clone();
      let token = run_token.clone();
      let name = plugin.name.clone();

      join_set.spawn(async move {
        let permit = tokio::select! {
          _ = token.cancelled() => None,
          permit = semaphore.acquire_owned() => permit.ok(),
        };
        let Some(_permit) = permit else {
          return (index, Err(PluginError::Cancelled { program }));
        };
        debug!(plugin = %name, program = %program, "invoking plugin");
        (index, runner.invoke(&request, &token).await)
      });
    }

    let mut responses: Vec<Option<PluginResponse>> = vec![None; config.plugins.len()];
    let mut failure: Option<GenerateError> = None;

    while let Some(joined) = join_set.join_next().await {
      let err = match joined {
        Ok((index, Ok(response))) => {
          responses[index] = Some(response);
          continue;
        }
        // Cancellation is the consequence of an earlier failure, never the cause.
        Ok((_, Err(PluginError::Cancelled { .. }))) if failure.is_some() => continue,
        Ok((index, Err(source))) => {
          let plugin = config.plugins[index].name.clone();
          error!(plugin = %plugin, error = %source, "plugin failed");
          GenerateError::Plugin { plugin, source }
        }
        Err(e) => {
          error!(error = %e, "plugin task panicked");
          GenerateError::Panicked(e.to_string())
        }
      };
      if failure.is_none() {
        failure = Some(err);
        run_token.cancel();
      }
    }

    if cancel.is_cancelled() {
      return Err(GenerateError::Cancelled);
    }
    if let Some(err) = failure {
      return Err(err);
    }

    let allow_overlap = config.allow_overlap || options.allow_overlap;
    let mut merged = GeneratedFiles::default();
    for (plugin, response) in config.plugins.iter().zip(responses) {
      let Some(response) = response else {
        continue;
      };
      for file in response.files {
        let path = join(&plugin.out, &file.path).ok_or_else(|| GenerateError::InvalidOutputPath {
          plugin: plugin.name.clone(),
          path: file.path.clone(),
        })?;
        if let Some(existing) = merged.files.get(&path) {
          if !allow_overlap {
            return Err(GenerateError::Collision {
              path,
              first: existing.plugin.clone(),
              second: plugin.name.clone(),
            });
          }
          warn!(path = %path, first = %existing.plugin, second = %plugin.name, "overwriting generated file");
        }
        merged.files.insert(
          path.clone(),
          OutputFile {
            path,
            content: file.content,
            plugin: plugin.name.clone(),
          },
        );
      }
    }

    info!(files = merged.len(), "generation complete");
    Ok(merged)
  }
}
