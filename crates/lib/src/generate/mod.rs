//! Code generation: plugin configuration and the generation run.

mod config;
mod generator;

pub use config::{ConfigError, GenConfig, PluginConfig};
pub use generator::{GenerateError, GenerateOptions, GeneratedFiles, Generator, OutputFile};
