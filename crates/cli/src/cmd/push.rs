//! Implementation of the `protopin push` command.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;
use walkdir::WalkDir;

use protopin_lib::cas::FileSet;
use protopin_lib::module::{LocalRegistry, ModulePin};

use crate::output::{print_stat, print_success};

/// Execute the push command.
///
/// Every regular file under `dir` becomes a module file, keyed by its path
/// relative to `dir`. Symlinks are followed.
pub fn cmd_push(registry: &Path, pin: &str, dir: &Path) -> Result<()> {
  let pin: ModulePin = pin
    .parse()
    .with_context(|| format!("Invalid module reference {}", pin))?;
  let files = collect_files(dir).with_context(|| format!("Failed to read module directory {}", dir.display()))?;
  let file_set = FileSet::from_files(files).context("Failed to build module")?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let digest = rt
    .block_on(LocalRegistry::new(registry).publish(&pin, &file_set))
    .context("Failed to publish module")?;

  print_success(&format!("Pushed {} ({} file(s))", pin, file_set.len()));
  print_stat("Digest", &digest.to_string());
  Ok(())
}

fn collect_files(root: &Path) -> Result<Vec<(String, Vec<u8>)>> {
  let mut files = Vec::new();
  for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
    let entry = entry.context("Failed to walk module directory")?;
    if !entry.file_type().is_file() {
      if !entry.file_type().is_dir() {
        debug!(path = %entry.path().display(), "skipping non-regular file");
      }
      continue;
    }
    let relative = entry.path().strip_prefix(root).context("Walked outside the module directory")?;
    let mut components = Vec::new();
    for component in relative.components() {
      match component.as_os_str().to_str() {
        Some(name) => components.push(name),
        None => bail!("File name {} is not valid UTF-8", relative.display()),
      }
    }
    let content = std::fs::read(entry.path()).with_context(|| format!("Failed to read {}", entry.path().display()))?;
    files.push((components.join("/"), content));
  }
  Ok(files)
}
