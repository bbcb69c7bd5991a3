//! Process-wide constants.
//!
//! The format tables are immutable and read-only for the lifetime of the
//! process; CLI help text and validation both read from them.

/// Input format for a module coordinate (`remote/owner/repository:commit`).
pub const INPUT_FORMAT_MODULE: &str = "module";

/// Input format for a pre-built JSON image file.
pub const INPUT_FORMAT_IMAGE: &str = "image";

/// All accepted input formats.
pub const ALL_INPUT_FORMATS: &[&str] = &[INPUT_FORMAT_MODULE, INPUT_FORMAT_IMAGE];

/// Print compiler diagnostics as `path:line:column: message` lines.
pub const ERROR_FORMAT_TEXT: &str = "text";

/// Print compiler diagnostics as a JSON array.
pub const ERROR_FORMAT_JSON: &str = "json";

/// All accepted formats for printing compiler diagnostics.
pub const ALL_ERROR_FORMATS: &[&str] = &[ERROR_FORMAT_TEXT, ERROR_FORMAT_JSON];

/// Default generation config file name.
pub const DEFAULT_GEN_CONFIG_FILE: &str = "protopin.gen.yaml";

/// The only supported generation config version.
pub const GEN_CONFIG_VERSION: &str = "v1";

/// Name of the dependency lock file inside a module.
pub const LOCK_FILE_NAME: &str = "protopin.lock";

/// The only supported lock file version.
pub const LOCK_FILE_VERSION: &str = "v1";

/// Prefix prepended to a plugin name when no explicit program path is configured.
pub const PLUGIN_PROGRAM_PREFIX: &str = "protoc-gen-";

/// Version stamped into every plugin and compiler request envelope.
pub const PROTOCOL_VERSION: u32 = 1;
