//! sprig library crate — re-exports for integration tests.
//!
//! The primary interface is the `sprig` binary. This lib.rs exposes the
//! internal modules so that integration tests can exercise the staged
//! filesystem, manifest merge, and template materialization directly
//! without going through the CLI.

pub mod assets;
pub mod diff;
pub mod doctor;
pub mod error;
pub mod exec;
pub mod init;
pub mod manifest;
pub mod outdated;
pub mod prefs;
pub mod prompt;
pub mod render;
pub mod stage;
pub mod telemetry;
pub mod templates;
