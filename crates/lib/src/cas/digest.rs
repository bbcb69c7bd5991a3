//! Content digests.
//!
//! A [`Digest`] is a typed hash over byte content. The text form is
//! `<algorithm>:<lowercase-hex>`, e.g. `sha256:b94d27b9...`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;

use super::CasError;

/// Hash algorithm a digest was computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DigestType {
  Sha256,
}

impl DigestType {
  /// The algorithm tag used in the text form.
  pub fn name(self) -> &'static str {
    match self {
      DigestType::Sha256 => "sha256",
    }
  }

  /// Length of the raw hash in bytes.
  pub fn byte_len(self) -> usize {
    match self {
      DigestType::Sha256 => 32,
    }
  }

  fn from_name(name: &str) -> Option<Self> {
    match name {
      "sha256" => Some(DigestType::Sha256),
      _ => None,
    }
  }
}

impl fmt::Display for DigestType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// A typed content fingerprint.
///
/// Two digests are equal iff both the algorithm and the hash bytes match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
  digest_type: DigestType,
  value: Vec<u8>,
}

impl Digest {
  /// Build a digest from raw hash bytes, checking the length for the algorithm.
  pub fn new(digest_type: DigestType, value: Vec<u8>) -> Result<Self, CasError> {
    if value.len() != digest_type.byte_len() {
      return Err(CasError::InvalidDigest {
        value: hex::encode(&value),
        message: format!("expected {} bytes for {}, got {}", digest_type.byte_len(), digest_type, value.len()),
      });
    }
    Ok(Self { digest_type, value })
  }

  pub fn digest_type(&self) -> DigestType {
    self.digest_type
  }

  pub fn value(&self) -> &[u8] {
    &self.value
  }

  /// Lowercase hex of the hash bytes, without the algorithm tag.
  pub fn hex(&self) -> String {
    hex::encode(&self.value)
  }
}

impl fmt::Display for Digest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.digest_type, self.hex())
  }
}

impl FromStr for Digest {
  type Err = CasError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = |message: &str| CasError::InvalidDigest {
      value: s.to_string(),
      message: message.to_string(),
    };

    let (name, hex_value) = s.split_once(':').ok_or_else(|| invalid("missing algorithm prefix"))?;
    let digest_type = DigestType::from_name(name).ok_or_else(|| invalid("unknown digest algorithm"))?;
    if hex_value.chars().any(|c| c.is_ascii_uppercase()) {
      return Err(invalid("hex must be lowercase"));
    }
    let value = hex::decode(hex_value).map_err(|e| invalid(&e.to_string()))?;
    if value.len() != digest_type.byte_len() {
      return Err(invalid(&format!(
        "expected {} bytes for {}, got {}",
        digest_type.byte_len(),
        digest_type,
        value.len()
      )));
    }
    Ok(Self { digest_type, value })
  }
}

impl Serialize for Digest {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Digest {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

/// Compute the default (SHA-256) digest of `data`.
pub fn compute_digest(data: &[u8]) -> Digest {
  compute_digest_of_type(DigestType::Sha256, data)
}

/// Compute a digest of `data` with the given algorithm.
pub fn compute_digest_of_type(digest_type: DigestType, data: &[u8]) -> Digest {
  let value = match digest_type {
    DigestType::Sha256 => {
      use sha2::Digest as _;
      let mut hasher = Sha256::new();
      hasher.update(data);
      hasher.finalize().to_vec()
    }
  };
  Digest { digest_type, value }
}
