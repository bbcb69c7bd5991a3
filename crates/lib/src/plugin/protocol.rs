//! The plugin request/response envelopes.
//!
//! A plugin reads one JSON request from stdin and writes one JSON response to
//! stdout:
//!
//! ```json
//! {"version": 1, "image": {"files": ["a.proto"], "data": "..."},
//!  "files_to_generate": ["a.proto"], "options": {"paths": "source_relative"},
//!  "out": "gen/go"}
//! ```
//!
//! ```json
//! {"files": [{"path": "a.pb.go", "content": "package a\n"}]}
//! {"error": "unsupported option: paths"}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::PROTOCOL_VERSION;
use crate::image::Image;
use crate::util::path::validate_normalized;

/// Errors in encoding or decoding an envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
  #[error("failed to encode request: {0}")]
  Encode(#[source] serde_json::Error),

  #[error("failed to decode response: {0}")]
  Decode(#[source] serde_json::Error),

  #[error("response carries both files and an error")]
  Ambiguous,

  #[error("generated file path {path:?} is invalid: {reason}")]
  InvalidPath { path: String, reason: String },

  #[error("generated file {0} appears more than once")]
  DuplicatePath(String),
}

/// One plugin invocation's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRequest {
  pub version: u32,
  pub image: Image,
  /// Files in the image the plugin should generate code for.
  pub files_to_generate: Vec<String>,
  pub options: BTreeMap<String, String>,
  /// Output directory the plugin's files will be written under.
  pub out: String,
}

impl PluginRequest {
  /// A request to generate every file in `image`.
  pub fn new(image: Image, options: BTreeMap<String, String>, out: impl Into<String>) -> Self {
    Self {
      version: PROTOCOL_VERSION,
      files_to_generate: image.files().to_vec(),
      image,
      options,
      out: out.into(),
    }
  }

  pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(self).map_err(ProtocolError::Encode)
  }
}

/// A generated output file. The path is relative to the plugin's `out`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedFile {
  pub path: String,
  pub content: String,
}

/// One plugin invocation's output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginResponse {
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub files: Vec<GeneratedFile>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl PluginResponse {
  pub fn with_files(files: Vec<GeneratedFile>) -> Self {
    Self { files, error: None }
  }

  pub fn with_error(message: impl Into<String>) -> Self {
    Self {
      files: Vec::new(),
      error: Some(message.into()),
    }
  }

  /// Decode and validate a response envelope.
  ///
  /// A response with an `error` is valid here; callers decide what to do
  /// with it.
  pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
    let response: PluginResponse = serde_json::from_slice(data).map_err(ProtocolError::Decode)?;
    if response.error.is_some() && !response.files.is_empty() {
      return Err(ProtocolError::Ambiguous);
    }
    let mut seen = std::collections::BTreeSet::new();
    for file in &response.files {
      validate_normalized(&file.path).map_err(|reason| ProtocolError::InvalidPath {
        path: file.path.clone(),
        reason: reason.to_string(),
      })?;
      if !seen.insert(file.path.as_str()) {
        return Err(ProtocolError::DuplicatePath(file.path.clone()));
      }
    }
    Ok(response)
  }

  pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(self).map_err(ProtocolError::Encode)
  }
}
