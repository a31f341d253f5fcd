//! CLI parser.

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "lamp")]
#[command(about = "LAMP stack status: environment, database connection, latest messages", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Connect, insert a timestamped message, and show the latest messages and total count.
    Status {
        /// Number of latest messages to show.
        #[arg(short, long, default_value = "10")]
        limit: u32,
        /// Text to insert instead of the timestamped default.
        #[arg(short, long)]
        message: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Open the connection and run a liveness probe.
    Check,
    /// Show one message by id.
    Show { id: i64 },
    /// Delete all messages.
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
