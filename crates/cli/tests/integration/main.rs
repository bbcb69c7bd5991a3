//! CLI integration tests: real registries, plugins and compilers on disk.

mod common;
mod generate_tests;
mod registry_tests;
