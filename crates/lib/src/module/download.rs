//! The registry download-service contract.
//!
//! The module reader talks to a registry only through [`DownloadService`].
//! Transport, authentication and retries live behind the trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::cas::Digest;

/// Request for one module's manifest and content blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
  pub remote: String,
  pub owner: String,
  pub repository: String,
  pub commit: String,
}

/// A blob as received over the wire; its digest is a claim, not yet verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBlob {
  pub digest: Digest,
  pub content: Vec<u8>,
}

/// A successful download response.
///
/// Both fields may be empty; the reader decides what that means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadResponse {
  pub manifest: Option<RemoteBlob>,
  pub blobs: Vec<RemoteBlob>,
}

/// Structured failure status from a download service.
#[derive(Debug, Error)]
pub enum ServiceError {
  /// The requested module or commit does not exist.
  #[error("not found: {0}")]
  NotFound(String),

  /// Any other transport or service failure.
  #[error(transparent)]
  Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ServiceError {
  /// Wrap an arbitrary message as a service failure.
  pub fn other(message: impl Into<String>) -> Self {
    let message: String = message.into();
    ServiceError::Other(message.into())
  }
}

/// A registry service returning a module's manifest and blobs in one call.
#[async_trait]
pub trait DownloadService: Send + Sync {
  async fn download_manifest_and_blobs(&self, request: &DownloadRequest) -> Result<DownloadResponse, ServiceError>;
}
