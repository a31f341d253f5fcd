//! # lamp-cli
//!
//! `lamp` command: argument parsing, tracing setup, status report and command handlers over
//! the storage crate.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod report;

pub use cli::{Cli, Commands, OutputFormat};
pub use commands::{prepare_sqlite_dir, run, Outcome};
pub use logger::init_tracing;
pub use report::{collect_status, default_message, DatabaseStatus, EnvironmentInfo, StatusReport};
