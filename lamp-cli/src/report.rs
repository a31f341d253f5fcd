//! Status report: environment info plus one connect / insert / read cycle against the store.

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use storage::{
    ConnectionManager, ConnectionOptions, DatabaseDriver, ErrorPolicy, Message, MessageStore,
    StorageError,
};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentInfo {
    pub hostname: String,
    pub server_software: String,
    pub os: String,
    pub arch: String,
}

impl EnvironmentInfo {
    pub fn detect() -> Self {
        let hostname = std::env::var("HOSTNAME")
            .ok()
            .filter(|h| !h.is_empty())
            .or_else(|| {
                std::fs::read_to_string("/etc/hostname")
                    .ok()
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
            })
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            hostname,
            server_software: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DatabaseStatus {
    Connected {
        driver: DatabaseDriver,
        target: String,
        database: String,
        options: ConnectionOptions,
        policy: ErrorPolicy,
        inserted: bool,
        latest: Vec<Message>,
        total: i64,
    },
    /// The handle is open but a statement failed (only reachable under `Propagate`).
    QueryFailed {
        driver: DatabaseDriver,
        target: String,
        database: String,
        policy: ErrorPolicy,
        error: String,
    },
    Failed {
        driver: DatabaseDriver,
        target: String,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub environment: EnvironmentInfo,
    pub database: DatabaseStatus,
}

/// Default body inserted on each status run.
pub fn default_message() -> String {
    format!(
        "LAMP Stack running - {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

/// Runs one status cycle. Connection and configuration failures become
/// [`DatabaseStatus::Failed`]; statement failures on an open handle become
/// [`DatabaseStatus::QueryFailed`].
pub async fn collect_status(
    manager: &ConnectionManager,
    message: &str,
    limit: u32,
) -> StatusReport {
    let config = manager.config();
    let database = match run_cycle(manager, message, limit).await {
        Ok(Cycle {
            policy,
            inserted,
            latest,
            total,
        }) => {
            info!("Status cycle done: inserted={}, total={}", inserted, total);
            DatabaseStatus::Connected {
                driver: config.driver,
                target: config.target(),
                database: database_name(manager),
                options: config.options(),
                policy,
                inserted,
                latest,
                total,
            }
        }
        Err(e @ (StorageError::Connection(_) | StorageError::Configuration(_))) => {
            DatabaseStatus::Failed {
                driver: config.driver,
                target: config.target(),
                error: e.to_string(),
            }
        }
        Err(e) => DatabaseStatus::QueryFailed {
            driver: config.driver,
            target: config.target(),
            database: database_name(manager),
            policy: config.error_policy,
            error: e.to_string(),
        },
    };

    StatusReport {
        generated_at: Utc::now(),
        environment: EnvironmentInfo::detect(),
        database,
    }
}

struct Cycle {
    policy: ErrorPolicy,
    inserted: bool,
    latest: Vec<Message>,
    total: i64,
}

async fn run_cycle(
    manager: &ConnectionManager,
    message: &str,
    limit: u32,
) -> Result<Cycle, StorageError> {
    let handle = manager.get_connection().await?;
    let store = MessageStore::with_policy(handle, manager.config().error_policy).await?;

    Ok(Cycle {
        policy: store.policy(),
        inserted: store.create(message).await?,
        latest: store.get_latest(limit).await?,
        total: store.count().await?,
    })
}

fn database_name(manager: &ConnectionManager) -> String {
    let config = manager.config();
    match config.driver {
        DatabaseDriver::MySql => config.database.clone(),
        DatabaseDriver::Sqlite => config.sqlite_path.clone(),
    }
}

impl StatusReport {
    /// True when the handle was opened, even if a later statement failed.
    pub fn is_connected(&self) -> bool {
        !matches!(self.database, DatabaseStatus::Failed { .. })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let env = &self.environment;

        let _ = writeln!(
            out,
            "LAMP Stack status ({})",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Server:   {}", env.server_software);
        let _ = writeln!(out, "Platform: {}/{}", env.os, env.arch);
        let _ = writeln!(out, "Hostname: {}", env.hostname);
        let _ = writeln!(out);

        match &self.database {
            DatabaseStatus::Connected {
                driver,
                target,
                database,
                options,
                policy,
                inserted,
                latest,
                total,
            } => {
                let _ = writeln!(out, "✓ Successfully connected to database: {}", database);
                let _ = writeln!(out, "  driver={} target={}", driver.as_str(), target);
                let _ = writeln!(
                    out,
                    "  fail_on_error={} named_rows={} emulate_prepares={}",
                    options.fail_on_error, options.named_rows, options.emulate_prepares
                );
                let _ = writeln!(out, "  error_policy={}", policy.as_str());
                if !inserted {
                    let _ = writeln!(out, "  (test message was not inserted)");
                }
                let _ = writeln!(out);

                if !latest.is_empty() {
                    let _ = writeln!(out, "Latest {} Messages", latest.len());
                    let _ = writeln!(out, "{:<8} {:<20} {}", "ID", "Created At", "Message");
                    let _ = writeln!(out, "{}", "-".repeat(80));
                    for m in latest {
                        let _ = writeln!(
                            out,
                            "{:<8} {:<20} {}",
                            format!("#{}", m.id),
                            m.created_at.format("%Y-%m-%d %H:%M:%S"),
                            m.message
                        );
                    }
                    let _ = writeln!(out);
                }

                let _ = writeln!(out, "Total Messages in Database: {}", total);
            }
            DatabaseStatus::QueryFailed {
                database,
                policy,
                error,
                ..
            } => {
                let _ = writeln!(out, "✓ Successfully connected to database: {}", database);
                let _ = writeln!(out, "  error_policy={}", policy.as_str());
                let _ = writeln!(out);
                let _ = writeln!(out, "✗ Query failed: {}", error);
            }
            DatabaseStatus::Failed { error, .. } => {
                let _ = writeln!(out, "✗ Connection failed: {}", error);
            }
        }

        out
    }
}
