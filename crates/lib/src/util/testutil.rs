//! Test utilities for protopin-lib.
//!
//! Helpers that write small `/bin/sh` scripts standing in for plugin and
//! compiler programs.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable shell script named `name` into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// A plugin that drains its input and replies with `response` verbatim.
pub fn static_plugin(dir: &Path, name: &str, response: &str) -> PathBuf {
  write_script(dir, name, &format!("cat > /dev/null\ncat <<'PROTOPIN_EOF'\n{}\nPROTOPIN_EOF", response))
}

/// A plugin that replies with one generated file per `(path, content)` pair.
pub fn emitting_plugin(dir: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
  let files: Vec<serde_json::Value> = files
    .iter()
    .map(|(path, content)| serde_json::json!({ "path": path, "content": content }))
    .collect();
  static_plugin(dir, name, &serde_json::json!({ "files": files }).to_string())
}

/// A plugin that echoes its request back as the content of `request.json`.
pub fn echo_request_plugin(dir: &Path, name: &str) -> PathBuf {
  write_script(
    dir,
    name,
    r#"req=$(cat)
esc=$(printf '%s' "$req" | sed 's/\\/\\\\/g; s/"/\\"/g')
printf '{"files":[{"path":"request.json","content":"%s"}]}' "$esc""#,
  )
}

/// A plugin that writes `stderr` and exits with `code`.
pub fn failing_plugin(dir: &Path, name: &str, code: i32, stderr: &str) -> PathBuf {
  write_script(dir, name, &format!("cat > /dev/null\necho '{}' >&2\nexit {}", stderr, code))
}

/// A plugin that never finishes on its own.
pub fn hanging_plugin(dir: &Path, name: &str) -> PathBuf {
  write_script(dir, name, "exec sleep 30")
}
