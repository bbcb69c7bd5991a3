//! A registry backed by a local directory.
//!
//! # Layout
//!
//! ```text
//! <root>/blobs/<algorithm>/<hex>                       content, keyed by digest
//! <root>/modules/<remote>/<owner>/<repository>/<commit> manifest digest text
//! ```
//!
//! The registry only serves bytes; the module reader verifies them.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use super::ModulePin;
use super::download::{DownloadRequest, DownloadResponse, DownloadService, RemoteBlob, ServiceError};
use crate::cas::{Blob, Digest, FileSet, Manifest};

/// Errors that can occur reading or writing a local registry.
#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("failed to access {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid commit pointer at {path}: {message}")]
  InvalidPointer { path: PathBuf, message: String },

  #[error("manifest blob {0} is missing from the registry")]
  MissingManifest(Digest),

  #[error("invalid module coordinates: {0}")]
  InvalidCoordinates(String),
}

/// A [`DownloadService`] serving modules from a directory tree.
#[derive(Debug, Clone)]
pub struct LocalRegistry {
  root: PathBuf,
}

impl LocalRegistry {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn blob_path(&self, digest: &Digest) -> PathBuf {
    self
      .root
      .join("blobs")
      .join(digest.digest_type().name())
      .join(digest.hex())
  }

  /// Pins only hold plain path components, so the result stays under `root`.
  fn commit_path(&self, pin: &ModulePin) -> PathBuf {
    self
      .root
      .join("modules")
      .join(pin.remote())
      .join(pin.owner())
      .join(pin.repository())
      .join(pin.commit())
  }

  /// Store `file_set` as the module at `pin`, returning the manifest digest.
  ///
  /// Blobs already present are not rewritten.
  pub async fn publish(&self, pin: &ModulePin, file_set: &FileSet) -> Result<Digest, RegistryError> {
    let manifest_blob = file_set.manifest().to_blob();
    for blob in file_set.blob_set().blobs().chain(std::iter::once(&manifest_blob)) {
      self.write_blob(blob).await?;
    }

    let commit_path = self.commit_path(pin);
    if let Some(parent) = commit_path.parent() {
      create_dir_all(parent).await?;
    }
    let pointer = format!("{}\n", manifest_blob.digest());
    tokio::fs::write(&commit_path, pointer)
      .await
      .map_err(|source| RegistryError::Io {
        path: commit_path.clone(),
        source,
      })?;

    info!(
      pin = %pin,
      files = file_set.len(),
      digest = %manifest_blob.digest(),
      "published module"
    );
    Ok(manifest_blob.digest().clone())
  }

  async fn write_blob(&self, blob: &Blob) -> Result<(), RegistryError> {
    let path = self.blob_path(blob.digest());
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
      return Ok(());
    }
    if let Some(parent) = path.parent() {
      create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, blob.content())
      .await
      .map_err(|source| RegistryError::Io { path, source })
  }

  async fn read_blob(&self, digest: &Digest) -> Result<Option<RemoteBlob>, RegistryError> {
    let path = self.blob_path(digest);
    match tokio::fs::read(&path).await {
      Ok(content) => Ok(Some(RemoteBlob {
        digest: digest.clone(),
        content,
      })),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(source) => Err(RegistryError::Io { path, source }),
    }
  }

  async fn read_module(&self, request: &DownloadRequest) -> Result<Option<DownloadResponse>, RegistryError> {
    let pin = ModulePin::new(
      request.remote.as_str(),
      request.owner.as_str(),
      request.repository.as_str(),
      request.commit.as_str(),
      None,
    )
    .map_err(|e| RegistryError::InvalidCoordinates(e.to_string()))?;
    let commit_path = self.commit_path(&pin);
    let pointer = match tokio::fs::read_to_string(&commit_path).await {
      Ok(pointer) => pointer,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(source) => {
        return Err(RegistryError::Io {
          path: commit_path,
          source,
        });
      }
    };
    let manifest_digest: Digest = pointer.trim().parse().map_err(|e: crate::cas::CasError| {
      RegistryError::InvalidPointer {
        path: commit_path.clone(),
        message: e.to_string(),
      }
    })?;

    let manifest = self
      .read_blob(&manifest_digest)
      .await?
      .ok_or_else(|| RegistryError::MissingManifest(manifest_digest.clone()))?;

    // An undecodable manifest is still served so the reader can report it.
    let mut blobs = Vec::new();
    if let Ok(decoded) = Blob::from_parts(manifest.digest.clone(), manifest.content.clone())
      .map_err(|_| ())
      .and_then(|blob| Manifest::from_blob(&blob).map_err(|_| ()))
    {
      for node in decoded.file_nodes() {
        if blobs.iter().any(|b: &RemoteBlob| &b.digest == node.digest()) {
          continue;
        }
        match self.read_blob(node.digest()).await? {
          Some(blob) => blobs.push(blob),
          None => debug!(path = node.path(), digest = %node.digest(), "blob missing from registry"),
        }
      }
    }

    Ok(Some(DownloadResponse {
      manifest: Some(manifest),
      blobs,
    }))
  }
}

async fn create_dir_all(path: &Path) -> Result<(), RegistryError> {
  tokio::fs::create_dir_all(path)
    .await
    .map_err(|source| RegistryError::Io {
      path: path.to_path_buf(),
      source,
    })
}

#[async_trait]
impl DownloadService for LocalRegistry {
  async fn download_manifest_and_blobs(&self, request: &DownloadRequest) -> Result<DownloadResponse, ServiceError> {
    match self.read_module(request).await {
      Ok(Some(response)) => Ok(response),
      Ok(None) => Err(ServiceError::NotFound(format!(
        "{}/{}/{}:{}",
        request.remote, request.owner, request.repository, request.commit
      ))),
      Err(e) => Err(ServiceError::Other(Box::new(e))),
    }
  }
}
