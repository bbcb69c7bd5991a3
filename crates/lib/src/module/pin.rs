//! Module pins: coordinates resolving a module to one exact commit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ModuleError;
use crate::cas::Digest;

/// An immutable module coordinate.
///
/// Text form: `remote/owner/repository:commit`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModulePin {
  remote: String,
  owner: String,
  repository: String,
  commit: String,
  /// Expected digest of the module's manifest, when known.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  digest: Option<Digest>,
}

impl ModulePin {
  pub fn new(
    remote: impl Into<String>,
    owner: impl Into<String>,
    repository: impl Into<String>,
    commit: impl Into<String>,
    digest: Option<Digest>,
  ) -> Result<Self, ModuleError> {
    let pin = Self {
      remote: remote.into(),
      owner: owner.into(),
      repository: repository.into(),
      commit: commit.into(),
      digest,
    };
    pin.validate()?;
    Ok(pin)
  }

  fn validate(&self) -> Result<(), ModuleError> {
    let fields = [
      ("remote", &self.remote),
      ("owner", &self.owner),
      ("repository", &self.repository),
      ("commit", &self.commit),
    ];
    for (name, value) in fields {
      if value.is_empty() {
        return Err(ModuleError::InvalidPin(format!("{} is empty", name)));
      }
      if value.contains(['/', '\\', ':']) || value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ModuleError::InvalidPin(format!("{} {:?} contains an invalid character", name, value)));
      }
      if value == "." || value == ".." {
        return Err(ModuleError::InvalidPin(format!("{} {:?} is a relative path component", name, value)));
      }
    }
    Ok(())
  }

  pub fn remote(&self) -> &str {
    &self.remote
  }

  pub fn owner(&self) -> &str {
    &self.owner
  }

  pub fn repository(&self) -> &str {
    &self.repository
  }

  pub fn commit(&self) -> &str {
    &self.commit
  }

  pub fn digest(&self) -> Option<&Digest> {
    self.digest.as_ref()
  }

  /// Copy of this pin with an expected manifest digest attached.
  pub fn with_digest(mut self, digest: Digest) -> Self {
    self.digest = Some(digest);
    self
  }
}

impl fmt::Display for ModulePin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}/{}:{}", self.remote, self.owner, self.repository, self.commit)
  }
}

impl FromStr for ModulePin {
  type Err = ModuleError;

  /// Accepts `remote/owner/repository:commit`, optionally followed by
  /// `@<digest>` naming the expected manifest digest.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (reference, digest) = match s.split_once('@') {
      Some((reference, digest)) => {
        let digest: Digest = digest
          .parse()
          .map_err(|e| ModuleError::InvalidPin(format!("{:?} has an invalid digest: {}", s, e)))?;
        (reference, Some(digest))
      }
      None => (s, None),
    };
    let (name, commit) = reference
      .rsplit_once(':')
      .ok_or_else(|| ModuleError::InvalidPin(format!("{:?} is missing a :commit suffix", s)))?;
    let parts: Vec<&str> = name.split('/').collect();
    let [remote, owner, repository] = parts.as_slice() else {
      return Err(ModuleError::InvalidPin(format!(
        "{:?} is not of the form remote/owner/repository:commit",
        s
      )));
    };
    Self::new(*remote, *owner, *repository, commit, digest)
  }
}
