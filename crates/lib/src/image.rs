//! Compiled schema images.
//!
//! An [`Image`] is the compiler's output: the list of source paths it was
//! built from plus opaque compiled bytes. Plugins receive it verbatim. On
//! disk and on the wire it is JSON with the bytes base64-encoded:
//!
//! ```json
//! {"files": ["a.proto", "b/c.proto"], "data": "CgdhLnByb3Rv..."}
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::path::validate_normalized;

/// Errors that can occur loading or filtering an image.
#[derive(Debug, Error)]
pub enum ImageError {
  #[error("failed to read image {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to decode image: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("image file path {path:?} is invalid: {reason}")]
  InvalidPath { path: String, reason: String },

  #[error("file {0} is not part of the image")]
  FileNotInImage(String),
}

/// A compiled representation of a set of schema files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Image {
  files: Vec<String>,
  #[serde(with = "base64_bytes")]
  data: Vec<u8>,
}

impl Image {
  pub fn new(files: Vec<String>, data: Vec<u8>) -> Result<Self, ImageError> {
    let image = Self { files, data };
    image.validate()?;
    Ok(image)
  }

  fn validate(&self) -> Result<(), ImageError> {
    for path in &self.files {
      validate_normalized(path).map_err(|reason| ImageError::InvalidPath {
        path: path.clone(),
        reason: reason.to_string(),
      })?;
    }
    Ok(())
  }

  /// Source paths the image was compiled from.
  pub fn files(&self) -> &[String] {
    &self.files
  }

  pub fn data(&self) -> &[u8] {
    &self.data
  }

  /// Restrict the image to `paths`.
  ///
  /// An empty filter returns the image unchanged. Every requested path must
  /// be in the image. Order follows the image, not the filter.
  pub fn filter_files(&self, paths: &[String]) -> Result<Image, ImageError> {
    if paths.is_empty() {
      return Ok(self.clone());
    }
    let known: BTreeSet<&str> = self.files.iter().map(String::as_str).collect();
    if let Some(missing) = paths.iter().find(|p| !known.contains(p.as_str())) {
      return Err(ImageError::FileNotInImage(missing.clone()));
    }
    let wanted: BTreeSet<&str> = paths.iter().map(String::as_str).collect();
    Ok(Image {
      files: self
        .files
        .iter()
        .filter(|f| wanted.contains(f.as_str()))
        .cloned()
        .collect(),
      data: self.data.clone(),
    })
  }

  pub fn from_json(data: &[u8]) -> Result<Self, ImageError> {
    let image: Image = serde_json::from_slice(data)?;
    image.validate()?;
    Ok(image)
  }

  pub fn to_json(&self) -> Result<Vec<u8>, ImageError> {
    Ok(serde_json::to_vec_pretty(self)?)
  }

  /// Load a JSON image file.
  pub async fn read(path: &Path) -> Result<Self, ImageError> {
    let data = tokio::fs::read(path).await.map_err(|source| ImageError::Read {
      path: path.display().to_string(),
      source,
    })?;
    Self::from_json(&data)
  }
}

mod base64_bytes {
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let text = String::deserialize(deserializer)?;
    STANDARD.decode(text).map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn image() -> Image {
    Image::new(
      vec!["a.proto".to_string(), "b/c.proto".to_string(), "d.proto".to_string()],
      b"\x00compiled\xff".to_vec(),
    )
    .unwrap()
  }

  #[test]
  fn json_form_encodes_data_as_base64() {
    let json: serde_json::Value = serde_json::from_slice(&image().to_json().unwrap()).unwrap();
    assert_eq!(json["data"], "AGNvbXBpbGVk/w==");
    assert_eq!(json["files"][1], "b/c.proto");
    assert_eq!(Image::from_json(&image().to_json().unwrap()).unwrap(), image());
  }

  #[test]
  fn from_json_rejects_unnormalized_paths() {
    let err = Image::from_json(br#"{"files":["../x.proto"],"data":""}"#).unwrap_err();
    assert!(matches!(err, ImageError::InvalidPath { .. }));
  }

  #[test]
  fn from_json_rejects_bad_base64() {
    let err = Image::from_json(br#"{"files":[],"data":"not base64!"}"#).unwrap_err();
    assert!(matches!(err, ImageError::Decode(_)));
  }

  #[test]
  fn filter_keeps_image_order() {
    let filtered = image()
      .filter_files(&["d.proto".to_string(), "a.proto".to_string()])
      .unwrap();
    assert_eq!(filtered.files(), ["a.proto", "d.proto"]);
    assert_eq!(filtered.data(), image().data());
  }

  #[test]
  fn empty_filter_is_identity() {
    assert_eq!(image().filter_files(&[]).unwrap(), image());
  }

  #[test]
  fn filter_rejects_unknown_path() {
    let err = image().filter_files(&["missing.proto".to_string()]).unwrap_err();
    assert!(matches!(err, ImageError::FileNotInImage(p) if p == "missing.proto"));
  }

  #[tokio::test]
  async fn read_image_file() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("image.json");
    std::fs::write(&path, image().to_json().unwrap()).unwrap();
    assert_eq!(Image::read(&path).await.unwrap(), image());
  }
}
