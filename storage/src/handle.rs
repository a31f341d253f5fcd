//! Live database handle: one connection (not a pool) per driver, shared behind an async mutex.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::ConnectOptions;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::{DatabaseConfig, DatabaseDriver};
use crate::error::StorageError;

/// A live connection. Cloning shares the same underlying connection.
#[derive(Clone)]
pub enum DatabaseHandle {
    MySql(Arc<Mutex<MySqlConnection>>),
    Sqlite(Arc<Mutex<SqliteConnection>>),
}

impl DatabaseHandle {
    /// Opens a new connection from `config`. Any driver failure maps to [`StorageError::Connection`].
    pub async fn open(config: &DatabaseConfig) -> Result<Self, StorageError> {
        info!("Opening {} connection: {}", config.driver.as_str(), config.target());

        match config.driver {
            DatabaseDriver::MySql => {
                let options = MySqlConnectOptions::new()
                    .host(&config.host)
                    .port(config.port)
                    .database(&config.database)
                    .username(&config.username)
                    .password(&config.password)
                    .charset(&config.charset);

                let conn = tokio::time::timeout(config.connect_timeout, options.connect())
                    .await
                    .map_err(|_| {
                        StorageError::Connection(format!(
                            "timed out after {}s connecting to {}",
                            config.connect_timeout.as_secs(),
                            config.target()
                        ))
                    })?
                    .map_err(StorageError::connection)?;

                Ok(DatabaseHandle::MySql(Arc::new(Mutex::new(conn))))
            }
            DatabaseDriver::Sqlite => {
                let options = sqlite_options(&config.sqlite_path)?.create_if_missing(true);
                let conn = options.connect().await.map_err(StorageError::connection)?;

                Ok(DatabaseHandle::Sqlite(Arc::new(Mutex::new(conn))))
            }
        }
    }

    pub fn driver(&self) -> DatabaseDriver {
        match self {
            DatabaseHandle::MySql(_) => DatabaseDriver::MySql,
            DatabaseHandle::Sqlite(_) => DatabaseDriver::Sqlite,
        }
    }

    /// Liveness probe (`SELECT 1`).
    pub async fn ping(&self) -> Result<(), StorageError> {
        let result = match self {
            DatabaseHandle::MySql(conn) => {
                let mut conn = conn.lock().await;
                sqlx::query("SELECT 1").execute(&mut *conn).await.map(|_| ())
            }
            DatabaseHandle::Sqlite(conn) => {
                let mut conn = conn.lock().await;
                sqlx::query("SELECT 1").execute(&mut *conn).await.map(|_| ())
            }
        };

        result.map_err(|e| {
            warn!("Liveness probe failed: {}", e);
            StorageError::Connection(e.to_string())
        })
    }

    /// True when both handles share the same underlying connection.
    pub fn ptr_eq(&self, other: &DatabaseHandle) -> bool {
        match (self, other) {
            (DatabaseHandle::MySql(a), DatabaseHandle::MySql(b)) => Arc::ptr_eq(a, b),
            (DatabaseHandle::Sqlite(a), DatabaseHandle::Sqlite(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Accepts either a `sqlite:` URL (including `sqlite::memory:`) or a plain file path.
fn sqlite_options(path: &str) -> Result<SqliteConnectOptions, StorageError> {
    if path.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(path).map_err(StorageError::connection)
    } else {
        Ok(SqliteConnectOptions::new().filename(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory_and_ping() {
        let handle = DatabaseHandle::open(&DatabaseConfig::sqlite("sqlite::memory:"))
            .await
            .expect("Failed to open in-memory handle");

        assert_eq!(handle.driver(), DatabaseDriver::Sqlite);
        assert!(handle.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_clone_shares_connection() {
        let handle = DatabaseHandle::open(&DatabaseConfig::sqlite("sqlite::memory:"))
            .await
            .unwrap();
        let other = DatabaseHandle::open(&DatabaseConfig::sqlite("sqlite::memory:"))
            .await
            .unwrap();

        assert!(handle.ptr_eq(&handle.clone()));
        assert!(!handle.ptr_eq(&other));
    }

    #[tokio::test]
    async fn test_open_unreachable_sqlite_path_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("lamp.db");

        let result = DatabaseHandle::open(&DatabaseConfig::sqlite(path.to_string_lossy())).await;

        assert!(matches!(result, Err(StorageError::Connection(_))));
    }
}
