//! Implementation of the `protopin export` command.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use protopin_lib::module::{LocalRegistry, ModulePin, ModuleReader};

use crate::output::{print_stat, print_success};

/// Execute the export command.
///
/// The module is fully verified before any file is written.
pub fn cmd_export(registry: &Path, pin: &str, dir: &Path) -> Result<()> {
  let pin: ModulePin = pin
    .parse()
    .with_context(|| format!("Invalid module reference {}", pin))?;
  let reader = ModuleReader::new(Arc::new(LocalRegistry::new(registry)));

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let module = rt.block_on(reader.get_module(&pin)).context("Failed to read module")?;

  let mut count = 0;
  for file in module.files() {
    let dest = dir.join(file.path());
    if let Some(parent) = dest.parent() {
      std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&dest, file.content()).with_context(|| format!("Failed to write {}", dest.display()))?;
    count += 1;
  }

  print_success(&format!("Exported {} file(s) from {} to {}", count, pin, dir.display()));
  print_stat("Digest", &module.file_set().manifest().digest().to_string());
  if !module.dependencies().is_empty() {
    let deps: Vec<String> = module.dependencies().iter().map(ToString::to_string).collect();
    print_stat("Dependencies", &deps.join(", "));
  }
  Ok(())
}
