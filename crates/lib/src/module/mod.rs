//! Pinned modules: identity, lock files, registry access and verified retrieval.

mod download;
mod error;
mod local;
mod lock;
mod pin;
mod reader;

pub use download::{DownloadRequest, DownloadResponse, DownloadService, RemoteBlob, ServiceError};
pub use error::ModuleError;
pub use local::{LocalRegistry, RegistryError};
pub use lock::{LockError, decode_lock_file, encode_lock_file};
pub use pin::ModulePin;
pub use reader::{Module, ModuleFile, ModuleReader};
