//! lamp CLI: status report, connection check, message lookup and reset. Config from env / .env.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use lamp_cli::{init_tracing, prepare_sqlite_dir, run, Cli};
use storage::{ConnectionManager, DatabaseConfig};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_file = std::env::var("LOG_FILE").ok().filter(|p| !p.is_empty());
    init_tracing(log_file.as_deref())?;

    let config = DatabaseConfig::from_env()
        .context("Load database config from env (DB_DRIVER, MYSQL_*, SQLITE_PATH)")?;
    prepare_sqlite_dir(&config)?;
    let manager = ConnectionManager::new(config);

    let outcome = run(cli.command, &manager).await?;
    println!("{}", outcome.output);

    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
