//! Connection manager: owns at most one lazily-opened [`DatabaseHandle`].
//!
//! Construct it explicitly with [`ConnectionManager::new`] and pass it by reference, or use
//! [`ConnectionManager::global`] for a process-wide instance loaded from env on first use.
//! The type is neither `Clone` nor deserializable, so a second manager cannot be made from an
//! existing one.

use std::sync::OnceLock;

use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::error::StorageError;
use crate::handle::DatabaseHandle;

static GLOBAL: OnceLock<ConnectionManager> = OnceLock::new();

pub struct ConnectionManager {
    config: DatabaseConfig,
    handle: OnceCell<DatabaseHandle>,
}

impl ConnectionManager {
    /// Creates a manager; no connection is opened until [`get_connection`](Self::get_connection).
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            handle: OnceCell::new(),
        }
    }

    /// Creates a manager from environment configuration.
    pub fn from_env() -> Result<Self, StorageError> {
        Ok(Self::new(DatabaseConfig::from_env()?))
    }

    /// Returns the process-wide manager, loading configuration from env on the first call.
    ///
    /// Concurrent first calls may each load the config, but only one manager is kept and none
    /// of them has opened a handle yet.
    pub fn global() -> Result<&'static ConnectionManager, StorageError> {
        if let Some(manager) = GLOBAL.get() {
            return Ok(manager);
        }
        let manager = Self::from_env()?;
        Ok(GLOBAL.get_or_init(|| manager))
    }

    /// Returns the active handle, opening it on first call.
    ///
    /// Concurrent first calls share a single open attempt. A failed open is not cached: the
    /// next call tries again.
    pub async fn get_connection(&self) -> Result<&DatabaseHandle, StorageError> {
        self.handle
            .get_or_try_init(|| async {
                match DatabaseHandle::open(&self.config).await {
                    Ok(handle) => {
                        info!("Connected to {}", self.config.target());
                        Ok(handle)
                    }
                    Err(e) => {
                        error!("Failed to connect to {}: {}", self.config.target(), e);
                        Err(e)
                    }
                }
            })
            .await
    }

    /// Point-in-time liveness check; false when no handle exists or the probe fails.
    pub async fn is_connected(&self) -> bool {
        match self.handle.get() {
            Some(handle) => handle.ping().await.is_ok(),
            None => false,
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}
