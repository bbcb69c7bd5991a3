//! Generation config.
//!
//! The config (`protopin.gen.yaml` by default) lists the plugins to run:
//!
//! ```yaml
//! version: v1
//! allow_overlap: false
//! plugins:
//!   - name: go
//!     out: gen/go
//!     opt:
//!       paths: source_relative
//!   - name: docs
//!     path: ./tools/render-docs
//!     args: ["--format", "markdown"]
//!     out: gen/docs
//! ```
//!
//! JSON with the same shape is accepted too.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{GEN_CONFIG_VERSION, PLUGIN_PROGRAM_PREFIX};
use crate::util::path::normalize;

/// Errors that can occur loading a generation config.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse YAML config: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("failed to parse JSON config: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unsupported config version {0:?}, expected {expected:?}", expected = GEN_CONFIG_VERSION)]
  UnsupportedVersion(String),

  #[error("config must declare at least one plugin")]
  NoPlugins,

  #[error("plugin {index} has an empty name")]
  EmptyName { index: usize },

  #[error("plugin {plugin} has invalid out {out:?}: must be a relative path inside the output directory")]
  InvalidOut { plugin: String, out: String },
}

/// A validated generation config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenConfig {
  pub version: String,
  pub plugins: Vec<PluginConfig>,
  /// Let later plugins overwrite files produced by earlier ones.
  #[serde(default)]
  pub allow_overlap: bool,
}

/// One plugin entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
  pub name: String,
  /// Program to run. Defaults to `protoc-gen-<name>` on `PATH`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub args: Vec<String>,
  /// Output directory relative to the base output directory.
  pub out: String,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub opt: BTreeMap<String, String>,
}

impl PluginConfig {
  pub fn new(name: impl Into<String>, out: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      path: None,
      args: Vec::new(),
      out: out.into(),
      opt: BTreeMap::new(),
    }
  }

  /// The program this entry runs.
  pub fn program(&self) -> String {
    match &self.path {
      Some(path) => path.clone(),
      None => format!("{}{}", PLUGIN_PROGRAM_PREFIX, self.name),
    }
  }
}

impl GenConfig {
  /// Validate and normalize a config built in code.
  pub fn new(plugins: Vec<PluginConfig>, allow_overlap: bool) -> Result<Self, ConfigError> {
    Self {
      version: GEN_CONFIG_VERSION.to_string(),
      plugins,
      allow_overlap,
    }
    .validated()
  }

  pub fn from_yaml(data: &str) -> Result<Self, ConfigError> {
    serde_yaml::from_str::<GenConfig>(data)?.validated()
  }

  pub fn from_json(data: &str) -> Result<Self, ConfigError> {
    serde_json::from_str::<GenConfig>(data)?.validated()
  }

  /// Load a config from a file, choosing the format by extension.
  pub fn read(path: &Path) -> Result<Self, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.display().to_string(),
      source,
    })?;
    match path.extension().and_then(|e| e.to_str()) {
      Some("json") => Self::from_json(&data),
      _ => Self::from_yaml(&data),
    }
  }

  /// Load a config given either a file path or inline config data.
  ///
  /// Inline data is recognized by a leading `{` (JSON) or a line break (YAML).
  pub fn read_path_or_data(value: &str) -> Result<Self, ConfigError> {
    let trimmed = value.trim_start();
    if trimmed.starts_with('{') {
      return Self::from_json(value);
    }
    if value.contains('\n') {
      return Self::from_yaml(value);
    }
    Self::read(Path::new(value))
  }

  fn validated(mut self) -> Result<Self, ConfigError> {
    if self.version != GEN_CONFIG_VERSION {
      return Err(ConfigError::UnsupportedVersion(self.version));
    }
    if self.plugins.is_empty() {
      return Err(ConfigError::NoPlugins);
    }
    for (index, plugin) in self.plugins.iter_mut().enumerate() {
      if plugin.name.trim().is_empty() {
        return Err(ConfigError::EmptyName { index });
      }
      plugin.out = normalize_out(&plugin.out).ok_or_else(|| ConfigError::InvalidOut {
        plugin: plugin.name.clone(),
        out: plugin.out.clone(),
      })?;
    }
    Ok(self)
  }
}

/// `.` names the base output directory itself.
fn normalize_out(out: &str) -> Option<String> {
  match out {
    "." => Some(".".to_string()),
    other => normalize(other),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const YAML: &str = "version: v1
plugins:
  - name: go
    out: gen/go/
    opt:
      paths: source_relative
  - name: docs
    path: ./render-docs
    args: [--format, markdown]
    out: ./gen/docs
";

  #[test]
  fn parse_yaml() {
    let config = GenConfig::from_yaml(YAML).unwrap();
    assert!(!config.allow_overlap);
    assert_eq!(config.plugins.len(), 2);

    let go = &config.plugins[0];
    assert_eq!(go.program(), "protoc-gen-go");
    assert_eq!(go.out, "gen/go");
    assert_eq!(go.opt.get("paths").map(String::as_str), Some("source_relative"));

    let docs = &config.plugins[1];
    assert_eq!(docs.program(), "./render-docs");
    assert_eq!(docs.args, vec!["--format", "markdown"]);
    assert_eq!(docs.out, "gen/docs");
  }

  #[test]
  fn parse_json() {
    let config = GenConfig::from_json(r#"{"version":"v1","allow_overlap":true,"plugins":[{"name":"go","out":"."}]}"#).unwrap();
    assert!(config.allow_overlap);
    assert_eq!(config.plugins[0].out, ".");
  }

  #[test]
  fn rejects_unknown_version() {
    let err = GenConfig::from_yaml("version: v2\nplugins: [{name: go, out: gen}]\n").unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedVersion(v) if v == "v2"));
  }

  #[test]
  fn rejects_no_plugins() {
    let err = GenConfig::from_yaml("version: v1\nplugins: []\n").unwrap_err();
    assert!(matches!(err, ConfigError::NoPlugins));
  }

  #[test]
  fn rejects_unknown_fields() {
    let err = GenConfig::from_yaml("version: v1\nplugins: [{name: go, out: gen, strategy: all}]\n").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));
  }

  #[test]
  fn rejects_escaping_out() {
    for out in ["../outside", "/abs", ""] {
      let yaml = format!("version: v1\nplugins: [{{name: go, out: {:?}}}]\n", out);
      let err = GenConfig::from_yaml(&yaml).unwrap_err();
      assert!(matches!(err, ConfigError::InvalidOut { .. }), "accepted {out:?}: {err}");
    }
  }

  #[test]
  fn rejects_empty_name() {
    let err = GenConfig::new(vec![PluginConfig::new(" ", "gen")], false).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyName { index: 0 }));
  }

  #[test]
  fn read_path_or_data() {
    let temp = tempfile::TempDir::new().unwrap();
    let yaml_path = temp.path().join("protopin.gen.yaml");
    std::fs::write(&yaml_path, YAML).unwrap();
    let json_path = temp.path().join("gen.json");
    std::fs::write(&json_path, r#"{"version":"v1","plugins":[{"name":"go","out":"gen"}]}"#).unwrap();

    assert_eq!(GenConfig::read_path_or_data(yaml_path.to_str().unwrap()).unwrap().plugins.len(), 2);
    assert_eq!(GenConfig::read_path_or_data(json_path.to_str().unwrap()).unwrap().plugins.len(), 1);
    assert_eq!(GenConfig::read_path_or_data(YAML).unwrap().plugins.len(), 2);
    assert_eq!(
      GenConfig::read_path_or_data(r#"{"version":"v1","plugins":[{"name":"go","out":"gen"}]}"#)
        .unwrap()
        .plugins[0]
        .name,
      "go"
    );

    let err = GenConfig::read_path_or_data(temp.path().join("missing.yaml").to_str().unwrap()).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
  }
}
