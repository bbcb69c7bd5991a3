//! Errors returned by module retrieval.

use thiserror::Error;

use super::download::ServiceError;
use super::lock::LockError;
use crate::cas::CasError;

/// Errors that can occur while reading a module from a registry.
///
/// Every download-stage variant carries the pin it was fetching.
#[derive(Debug, Error)]
pub enum ModuleError {
  /// A module coordinate could not be parsed or validated.
  #[error("invalid module pin: {0}")]
  InvalidPin(String),

  /// The registry reports that the module or commit does not exist.
  #[error("module {pin} does not exist")]
  NotFound { pin: String },

  /// The download service call failed.
  #[error("failed to download module {pin}: {source}")]
  Download {
    pin: String,
    #[source]
    source: ServiceError,
  },

  /// The service reported success but the response violates the protocol.
  #[error("invalid response downloading module {pin}: {message}")]
  InvalidResponse { pin: String, message: String },

  /// The manifest blob could not be decoded.
  #[error("failed to download module {pin}: failed to decode manifest file: {source}")]
  DecodeManifest {
    pin: String,
    #[source]
    source: CasError,
  },

  /// The module's lock file could not be decoded.
  #[error("failed to download module {pin}: failed to decode lock file: {source}")]
  DecodeLock {
    pin: String,
    #[source]
    source: LockError,
  },

  /// Downloaded content failed verification.
  #[error("failed to download module {pin}: {source}")]
  Verify {
    pin: String,
    #[source]
    source: CasError,
  },

  /// The requested path is not part of the module.
  #[error("file {path} not found in module {pin}")]
  FileNotFound { pin: String, path: String },
}
