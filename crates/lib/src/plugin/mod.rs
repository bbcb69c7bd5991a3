//! Out-of-process code generator plugins.
//!
//! This module provides:
//! - [`Executor`]: the process-spawning collaborator
//! - [`PluginRequest`] and [`PluginResponse`]: the JSON envelopes
//! - [`Runner`] and [`RunnerProvider`]: plugins as request/response services

mod error;
mod exec;
mod protocol;
mod runner;

pub use error::PluginError;
pub use exec::{ExecError, ExecOutput, Executor, ProcessExecutor};
pub use protocol::{GeneratedFile, PluginRequest, PluginResponse, ProtocolError};
pub use runner::{ExecutorRunnerProvider, ProgramRunner, Runner, RunnerProvider};
