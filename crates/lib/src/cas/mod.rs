//! Content-addressed storage primitives.
//!
//! This module provides:
//! - [`Digest`]: typed content fingerprints
//! - [`Blob`] and [`BlobSet`]: verified content keyed by digest
//! - [`Manifest`]: canonical path → digest listings
//! - [`FileSet`]: a manifest bound to its blobs

mod blob;
mod digest;
mod error;
mod file_set;
mod manifest;

pub use blob::{Blob, BlobSet, verify_blob};
pub use digest::{Digest, DigestType, compute_digest, compute_digest_of_type};
pub use error::CasError;
pub use file_set::FileSet;
pub use manifest::{FileNode, Manifest};
