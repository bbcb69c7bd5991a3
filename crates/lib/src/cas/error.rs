//! Errors raised while building or verifying content-addressed data.

use thiserror::Error;

use super::Digest;

/// Errors that can occur in the content-addressing layer.
#[derive(Debug, Error)]
pub enum CasError {
  /// Blob content does not hash to the digest it claims.
  #[error("digest mismatch: expected {expected}, got {actual}")]
  Integrity { expected: Digest, actual: Digest },

  /// Manifest text could not be parsed.
  #[error("malformed manifest at line {line}: {message}")]
  MalformedManifest { line: usize, message: String },

  /// Two blobs share a digest but carry different content.
  #[error("duplicate digest {digest} with differing content")]
  DuplicateDigest { digest: Digest },

  /// A manifest entry references a digest with no blob.
  #[error("missing blob for {path}: {digest}")]
  MissingBlob { path: String, digest: Digest },

  /// Path is not part of the file set.
  #[error("file not found: {0}")]
  FileNotFound(String),

  /// Digest string could not be parsed.
  #[error("invalid digest {value:?}: {message}")]
  InvalidDigest { value: String, message: String },

  /// Path is not in normalized relative form.
  #[error("invalid path {path:?}: {reason}")]
  InvalidPath { path: String, reason: String },

  /// Two manifest entries share a path.
  #[error("duplicate path in manifest: {0}")]
  DuplicatePath(String),
}
