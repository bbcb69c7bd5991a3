//! Module retrieval and verification.
//!
//! [`ModuleReader::get_module`] downloads a pinned module's manifest and blobs,
//! verifies every blob against its digest, and assembles a [`FileSet`].
//! There is no retry logic and no cache: the same pin and the same service
//! response always produce the same module or the same error.

use std::io::Read;
use std::sync::Arc;

use tracing::{debug, info};

use super::download::{DownloadRequest, DownloadService, RemoteBlob, ServiceError};
use super::lock::decode_lock_file;
use super::{ModuleError, ModulePin};
use crate::cas::{Blob, BlobSet, CasError, FileSet, Manifest, verify_blob};
use crate::consts::LOCK_FILE_NAME;

/// A verified module pinned to one commit.
#[derive(Debug, Clone)]
pub struct Module {
  pin: ModulePin,
  file_set: FileSet,
  dependencies: Vec<ModulePin>,
}

impl Module {
  pub fn pin(&self) -> &ModulePin {
    &self.pin
  }

  pub fn file_set(&self) -> &FileSet {
    &self.file_set
  }

  /// Dependency pins declared by the module's lock file, if it has one.
  pub fn dependencies(&self) -> &[ModulePin] {
    &self.dependencies
  }

  /// Look up one file, tagged with the module's commit.
  pub fn get_module_file(&self, path: &str) -> Result<ModuleFile<'_>, ModuleError> {
    let not_found = || ModuleError::FileNotFound {
      pin: self.pin.to_string(),
      path: path.to_string(),
    };
    let node = self.file_set.manifest().file_node(path).ok_or_else(not_found)?;
    let content = self.file_set.get_file_content(node.path()).map_err(|_| not_found())?;
    Ok(ModuleFile {
      path: node.path(),
      commit: self.pin.commit(),
      content,
    })
  }

  /// All files in manifest order.
  pub fn files(&self) -> impl Iterator<Item = ModuleFile<'_>> {
    let commit = self.pin.commit();
    self
      .file_set
      .files()
      .map(move |(path, content)| ModuleFile { path, commit, content })
  }
}

/// A file retrieved from a [`Module`]. Borrows from its module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleFile<'a> {
  path: &'a str,
  commit: &'a str,
  content: &'a [u8],
}

impl<'a> ModuleFile<'a> {
  pub fn path(&self) -> &'a str {
    self.path
  }

  /// Commit of the module this file was retrieved from.
  pub fn commit(&self) -> &'a str {
    self.commit
  }

  pub fn content(&self) -> &'a [u8] {
    self.content
  }

  /// A reader over the file content.
  pub fn reader(&self) -> impl Read + 'a {
    self.content
  }
}

/// Reads pinned modules through a [`DownloadService`].
///
/// Holds no mutable state and is safe to share across concurrent downloads.
#[derive(Clone)]
pub struct ModuleReader {
  service: Arc<dyn DownloadService>,
}

impl ModuleReader {
  pub fn new(service: Arc<dyn DownloadService>) -> Self {
    Self { service }
  }

  /// Download, verify, and assemble the module at `pin`.
  pub async fn get_module(&self, pin: &ModulePin) -> Result<Module, ModuleError> {
    let pin_name = pin.to_string();
    info!(pin = %pin_name, "downloading module");

    let request = DownloadRequest {
      remote: pin.remote().to_string(),
      owner: pin.owner().to_string(),
      repository: pin.repository().to_string(),
      commit: pin.commit().to_string(),
    };
    let response = self
      .service
      .download_manifest_and_blobs(&request)
      .await
      .map_err(|e| match e {
        ServiceError::NotFound(_) => ModuleError::NotFound { pin: pin_name.clone() },
        other => ModuleError::Download {
          pin: pin_name.clone(),
          source: other,
        },
      })?;

    let verify_err = |source: CasError| ModuleError::Verify {
      pin: pin_name.clone(),
      source,
    };

    let Some(manifest_blob) = response.manifest else {
      return Err(ModuleError::InvalidResponse {
        pin: pin_name.clone(),
        message: "expected non-nil manifest".to_string(),
      });
    };
    let manifest_blob = into_blob(manifest_blob).map_err(verify_err)?;
    if let Some(expected) = pin.digest() {
      verify_blob(&manifest_blob, expected).map_err(verify_err)?;
    }
    let manifest = Manifest::from_blob(&manifest_blob).map_err(|source| ModuleError::DecodeManifest {
      pin: pin_name.clone(),
      source,
    })?;

    let blobs = response
      .blobs
      .into_iter()
      .map(into_blob)
      .collect::<Result<Vec<_>, _>>()
      .map_err(verify_err)?;
    let blob_set = BlobSet::new(blobs).map_err(verify_err)?;
    debug!(pin = %pin_name, blobs = blob_set.len(), "verified blobs");

    let file_set = FileSet::new(manifest, blob_set).map_err(verify_err)?;

    let dependencies = match file_set.get_file_content(LOCK_FILE_NAME) {
      Ok(data) => decode_lock_file(data).map_err(|source| ModuleError::DecodeLock {
        pin: pin_name.clone(),
        source,
      })?,
      Err(_) => Vec::new(),
    };

    info!(
      pin = %pin_name,
      files = file_set.len(),
      dependencies = dependencies.len(),
      "module verified"
    );

    Ok(Module {
      pin: pin.clone(),
      file_set,
      dependencies,
    })
  }
}

fn into_blob(remote: RemoteBlob) -> Result<Blob, CasError> {
  Blob::from_parts(remote.digest, remote.content)
}
