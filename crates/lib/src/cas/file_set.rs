//! File sets: a manifest bound to the blobs it references.

use super::{Blob, BlobSet, CasError, FileNode, Manifest};

/// A verified, path-addressable view of a module snapshot.
///
/// Every manifest entry resolves to a blob in the blob set. The blob set may
/// hold extra blobs; the manifest decides which files exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
  manifest: Manifest,
  blob_set: BlobSet,
}

impl FileSet {
  /// Bind `manifest` to `blob_set`.
  ///
  /// Fails with [`CasError::MissingBlob`] on the first entry whose digest is
  /// not in the blob set.
  pub fn new(manifest: Manifest, blob_set: BlobSet) -> Result<Self, CasError> {
    for node in manifest.file_nodes() {
      if !blob_set.contains(node.digest()) {
        return Err(CasError::MissingBlob {
          path: node.path().to_string(),
          digest: node.digest().clone(),
        });
      }
    }
    Ok(Self { manifest, blob_set })
  }

  /// Build a file set from `(path, content)` pairs.
  pub fn from_files<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Result<Self, CasError>
  where
    P: Into<String>,
    C: Into<Vec<u8>>,
  {
    let mut nodes = Vec::new();
    let mut blob_set = BlobSet::default();
    for (path, content) in files {
      let blob = Blob::new(content);
      nodes.push(FileNode::new(path, blob.digest().clone())?);
      blob_set.insert(blob)?;
    }
    Self::new(Manifest::new(nodes)?, blob_set)
  }

  pub fn manifest(&self) -> &Manifest {
    &self.manifest
  }

  pub fn blob_set(&self) -> &BlobSet {
    &self.blob_set
  }

  /// Paths in manifest order.
  pub fn list_paths(&self) -> Vec<&str> {
    self.manifest.paths().collect()
  }

  /// Content of the file at `path`.
  pub fn get_file_content(&self, path: &str) -> Result<&[u8], CasError> {
    let digest = self
      .manifest
      .get_digest(path)
      .ok_or_else(|| CasError::FileNotFound(path.to_string()))?;
    let blob = self.blob_set.get(digest).ok_or_else(|| CasError::MissingBlob {
      path: path.to_string(),
      digest: digest.clone(),
    })?;
    Ok(blob.content())
  }

  /// Iterate `(path, content)` in manifest order.
  pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
    self.manifest.file_nodes().iter().filter_map(|node| {
      self
        .blob_set
        .get(node.digest())
        .map(|blob| (node.path(), blob.content()))
    })
  }

  pub fn len(&self) -> usize {
    self.manifest.len()
  }

  pub fn is_empty(&self) -> bool {
    self.manifest.is_empty()
  }
}
