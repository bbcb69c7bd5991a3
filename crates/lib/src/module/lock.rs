//! Module dependency lock files.
//!
//! A module may carry a lock file pinning its dependencies:
//!
//! ```yaml
//! version: v1
//! deps:
//!   - remote: registry.example.com
//!     owner: acme
//!     repository: units
//!     commit: 0a1b2c
//!     digest: sha256:...
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ModuleError, ModulePin};
use crate::cas::Digest;
use crate::consts::LOCK_FILE_VERSION;

/// Errors that can occur when decoding a lock file.
#[derive(Debug, Error)]
pub enum LockError {
  #[error("failed to parse lock file: {0}")]
  Parse(#[source] serde_yaml::Error),

  #[error("unsupported lock file version {0:?}")]
  UnsupportedVersion(String),

  #[error("invalid dependency {index}: {source}")]
  InvalidDependency {
    index: usize,
    #[source]
    source: Box<ModuleError>,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LockFile {
  version: String,
  #[serde(default)]
  deps: Vec<LockedDependency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LockedDependency {
  remote: String,
  owner: String,
  repository: String,
  commit: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  digest: Option<Digest>,
}

/// Decode lock file content into dependency pins.
pub fn decode_lock_file(data: &[u8]) -> Result<Vec<ModulePin>, LockError> {
  let lock: LockFile = serde_yaml::from_slice(data).map_err(LockError::Parse)?;
  if lock.version != LOCK_FILE_VERSION {
    return Err(LockError::UnsupportedVersion(lock.version));
  }
  lock
    .deps
    .into_iter()
    .enumerate()
    .map(|(index, dep)| {
      ModulePin::new(dep.remote, dep.owner, dep.repository, dep.commit, dep.digest).map_err(|e| {
        LockError::InvalidDependency {
          index,
          source: Box::new(e),
        }
      })
    })
    .collect()
}

/// Encode dependency pins as lock file content.
pub fn encode_lock_file(pins: &[ModulePin]) -> Result<String, LockError> {
  let lock = LockFile {
    version: LOCK_FILE_VERSION.to_string(),
    deps: pins
      .iter()
      .map(|pin| LockedDependency {
        remote: pin.remote().to_string(),
        owner: pin.owner().to_string(),
        repository: pin.repository().to_string(),
        commit: pin.commit().to_string(),
        digest: pin.digest().cloned(),
      })
      .collect(),
  };
  serde_yaml::to_string(&lock).map_err(LockError::Parse)
}
