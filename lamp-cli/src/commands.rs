//! Command handlers. Each returns the text to print and whether the run succeeded.

use anyhow::{Context, Result};
use storage::{ConnectionManager, DatabaseConfig, MessageStore};

use crate::cli::{Commands, OutputFormat};
use crate::report::{collect_status, default_message};

pub struct Outcome {
    pub output: String,
    pub success: bool,
}

/// Creates the directory of a file-backed SQLite database so the first open can create the file.
pub fn prepare_sqlite_dir(config: &DatabaseConfig) -> Result<()> {
    if let Some(dir) = config.sqlite_dir() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Create SQLite directory {}", dir.display()))?;
    }
    Ok(())
}

pub async fn run(command: Commands, manager: &ConnectionManager) -> Result<Outcome> {
    match command {
        Commands::Status {
            limit,
            message,
            format,
        } => handle_status(manager, message, limit, format).await,
        Commands::Check => handle_check(manager).await,
        Commands::Show { id } => handle_show(manager, id).await,
        Commands::Reset => handle_reset(manager).await,
    }
}

async fn handle_status(
    manager: &ConnectionManager,
    message: Option<String>,
    limit: u32,
    format: OutputFormat,
) -> Result<Outcome> {
    let message = message.unwrap_or_else(default_message);
    let report = collect_status(manager, &message, limit).await;

    let output = match format {
        OutputFormat::Text => report.render_text(),
        OutputFormat::Json => report.to_json()?,
    };
    Ok(Outcome {
        output,
        success: report.is_connected(),
    })
}

async fn handle_check(manager: &ConnectionManager) -> Result<Outcome> {
    let target = manager.config().target();
    if let Err(e) = manager.get_connection().await {
        return Ok(Outcome {
            output: format!("✗ Connection failed: {}", e),
            success: false,
        });
    }

    let connected = manager.is_connected().await;
    let output = if connected {
        format!("✓ Connected: {}", target)
    } else {
        format!("✗ Liveness probe failed: {}", target)
    };
    Ok(Outcome {
        output,
        success: connected,
    })
}

async fn handle_show(manager: &ConnectionManager, id: i64) -> Result<Outcome> {
    let store = open_store(manager).await?;

    Ok(match store.get_by_id(id).await? {
        Some(m) => Outcome {
            output: format!(
                "#{} [{}] {}",
                m.id,
                m.created_at.format("%Y-%m-%d %H:%M:%S"),
                m.message
            ),
            success: true,
        },
        None => Outcome {
            output: format!("Message #{} not found", id),
            success: false,
        },
    })
}

async fn handle_reset(manager: &ConnectionManager) -> Result<Outcome> {
    let store = open_store(manager).await?;

    Ok(if store.truncate().await? {
        Outcome {
            output: "All messages deleted".to_string(),
            success: true,
        }
    } else {
        Outcome {
            output: "Failed to delete messages".to_string(),
            success: false,
        }
    })
}

async fn open_store(manager: &ConnectionManager) -> Result<MessageStore> {
    let handle = manager.get_connection().await?;
    Ok(MessageStore::with_policy(handle, manager.config().error_policy).await?)
}
