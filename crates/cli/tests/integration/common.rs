//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the registry, module
/// sources, plugin scripts and generated output.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Absolute path of `relative_path` inside the environment.
  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Write an executable `/bin/sh` script.
  #[cfg(unix)]
  pub fn write_script(&self, relative_path: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = self.write_file(relative_path, &format!("#!/bin/sh\n{}\n", body));
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
  }

  /// Registry directory (isolated per test).
  pub fn registry_path(&self) -> PathBuf {
    self.path("registry")
  }

  /// Base output directory.
  pub fn output_path(&self) -> PathBuf {
    self.path("out")
  }

  /// Read a generated file relative to the output directory.
  pub fn read_output(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.output_path().join(relative_path)).unwrap()
  }

  /// Get a Command for the protopin binary, run from the temp directory.
  pub fn protopin_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("protopin");
    cmd.current_dir(self.temp.path());
    cmd
  }

  /// Push the module under `dir` to the test registry.
  pub fn push(&self, pin: &str, dir: &Path) {
    self
      .protopin_cmd()
      .arg("push")
      .arg("--registry")
      .arg(self.registry_path())
      .arg(pin)
      .arg(dir)
      .assert()
      .success();
  }
}
