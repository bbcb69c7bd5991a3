//! protopin-lib: module retrieval and plugin-driven code generation.
//!
//! This crate provides:
//! - `cas`: digests, blobs, manifests and verified file sets
//! - `module`: pinned modules, lock files and registry access
//! - `compile`: the schema compiler collaborator
//! - `plugin`: out-of-process generator plugins
//! - `generate`: plugin configuration and the generation run
//! - `pipeline`: the end-to-end entry point

pub mod cas;
pub mod compile;
pub mod consts;
pub mod generate;
pub mod image;
pub mod module;
pub mod pipeline;
pub mod plugin;
pub mod util;
