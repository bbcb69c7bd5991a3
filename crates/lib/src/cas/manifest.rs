//! Manifests: canonical listings of file paths and their content digests.
//!
//! # Format
//!
//! One entry per line, sorted by path, each line terminated by `\n`:
//!
//! ```text
//! sha256:0b1c...  foo/bar.proto
//! sha256:9f2e...  foo/baz.proto
//! ```
//!
//! The digest and path are separated by exactly two spaces. Serialization is
//! byte-for-byte canonical so the manifest's own digest is reproducible.

use std::collections::BTreeMap;
use std::fmt;

use super::{Blob, CasError, Digest, compute_digest};
use crate::util::path::validate_normalized;

const SEPARATOR: &str = "  ";

/// A single manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
  path: String,
  digest: Digest,
}

impl FileNode {
  /// Create an entry; the path must already be normalized.
  pub fn new(path: impl Into<String>, digest: Digest) -> Result<Self, CasError> {
    let path = path.into();
    validate_normalized(&path).map_err(|reason| CasError::InvalidPath {
      path: path.clone(),
      reason: reason.to_string(),
    })?;
    Ok(Self { path, digest })
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn digest(&self) -> &Digest {
    &self.digest
  }
}

/// A path-sorted set of [`FileNode`]s with unique paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
  nodes: Vec<FileNode>,
}

impl Manifest {
  /// Build a manifest from entries in any order.
  ///
  /// Fails with [`CasError::DuplicatePath`] if two entries share a path.
  pub fn new(nodes: impl IntoIterator<Item = FileNode>) -> Result<Self, CasError> {
    let mut by_path: BTreeMap<String, FileNode> = BTreeMap::new();
    for node in nodes {
      if by_path.contains_key(node.path()) {
        return Err(CasError::DuplicatePath(node.path));
      }
      by_path.insert(node.path.clone(), node);
    }
    Ok(Self {
      nodes: by_path.into_values().collect(),
    })
  }

  /// Parse the canonical text form.
  pub fn parse(text: &str) -> Result<Self, CasError> {
    let body = match text.strip_suffix('\n') {
      Some(body) => body,
      None if text.is_empty() => "",
      None => {
        return Err(CasError::MalformedManifest {
          line: text.lines().count(),
          message: "missing trailing newline".to_string(),
        });
      }
    };
    if body.is_empty() {
      return Ok(Self::default());
    }

    let mut nodes: Vec<FileNode> = Vec::new();
    for (index, line) in body.split('\n').enumerate() {
      let line_number = index + 1;
      let malformed = |message: String| CasError::MalformedManifest {
        line: line_number,
        message,
      };

      let (digest_text, path) = line
        .split_once(SEPARATOR)
        .ok_or_else(|| malformed(format!("expected \"<digest>{}<path>\", got {:?}", SEPARATOR, line)))?;
      let digest: Digest = digest_text.parse().map_err(|e: CasError| malformed(e.to_string()))?;
      let node = FileNode::new(path, digest).map_err(|e| malformed(e.to_string()))?;

      if let Some(previous) = nodes.last() {
        if previous.path() == node.path() {
          return Err(malformed(format!("duplicate path {}", node.path())));
        }
        if previous.path() > node.path() {
          return Err(malformed(format!("path {} is out of order", node.path())));
        }
      }
      nodes.push(node);
    }
    Ok(Self { nodes })
  }

  /// Decode a manifest stored as a blob.
  pub fn from_blob(blob: &Blob) -> Result<Self, CasError> {
    let text = std::str::from_utf8(blob.content()).map_err(|e| CasError::MalformedManifest {
      line: 0,
      message: format!("manifest is not valid UTF-8: {}", e),
    })?;
    Self::parse(text)
  }

  /// The canonical text form. Equivalent to `to_string()`.
  pub fn serialize(&self) -> String {
    self.to_string()
  }

  /// The manifest as a blob of its canonical text form.
  pub fn to_blob(&self) -> Blob {
    Blob::new(self.serialize())
  }

  /// Digest of the canonical text form.
  pub fn digest(&self) -> Digest {
    compute_digest(self.serialize().as_bytes())
  }

  /// Entries in path order.
  pub fn file_nodes(&self) -> &[FileNode] {
    &self.nodes
  }

  pub fn paths(&self) -> impl Iterator<Item = &str> {
    self.nodes.iter().map(FileNode::path)
  }

  /// Entry for `path`, if present.
  pub fn file_node(&self, path: &str) -> Option<&FileNode> {
    self
      .nodes
      .binary_search_by(|node| node.path().cmp(path))
      .ok()
      .map(|index| &self.nodes[index])
  }

  /// Digest recorded for `path`, if present.
  pub fn get_digest(&self, path: &str) -> Option<&Digest> {
    self.file_node(path).map(FileNode::digest)
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }
}

impl fmt::Display for Manifest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for node in &self.nodes {
      writeln!(f, "{}{}{}", node.digest(), SEPARATOR, node.path())?;
    }
    Ok(())
  }
}
