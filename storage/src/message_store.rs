//! Message store: schema bootstrap and CRUD over the `messages` table.
//!
//! Wraps a driver-specific [`MessageRepository`] and applies the [`ErrorPolicy`]: with
//! `Sentinel` a failed operation is logged and reported as `false` / empty / `0` / `None`,
//! with `Propagate` it is returned as `Err`.

use std::sync::Arc;

use tracing::error;

use crate::config::ErrorPolicy;
use crate::error::StorageError;
use crate::handle::DatabaseHandle;
use crate::models::{Message, MAX_MESSAGE_LEN};
use crate::mysql_repo::MySqlMessageRepository;
use crate::repository::MessageRepository;
use crate::sqlite_repo::SqliteMessageRepository;

#[derive(Clone)]
pub struct MessageStore {
    repo: Arc<dyn MessageRepository>,
    policy: ErrorPolicy,
}

impl MessageStore {
    /// Builds a store over `handle` with the default policy and bootstraps the schema.
    pub async fn new(handle: &DatabaseHandle) -> Result<Self, StorageError> {
        Self::with_policy(handle, ErrorPolicy::default()).await
    }

    /// Builds a store over `handle` and bootstraps the schema. Bootstrap failures are always returned.
    pub async fn with_policy(
        handle: &DatabaseHandle,
        policy: ErrorPolicy,
    ) -> Result<Self, StorageError> {
        let repo: Arc<dyn MessageRepository> = match handle {
            DatabaseHandle::MySql(conn) => Arc::new(MySqlMessageRepository::new(conn.clone())),
            DatabaseHandle::Sqlite(conn) => Arc::new(SqliteMessageRepository::new(conn.clone())),
        };
        Self::from_repository(repo, policy).await
    }

    /// Builds a store over any repository implementation and bootstraps the schema.
    pub async fn from_repository(
        repo: Arc<dyn MessageRepository>,
        policy: ErrorPolicy,
    ) -> Result<Self, StorageError> {
        let store = Self { repo, policy };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Idempotent "create if absent" for the table and its `created_at` index.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.repo.ensure_schema().await
    }

    /// Inserts one message; the timestamp is assigned by the database.
    pub async fn create(&self, message: &str) -> Result<bool, StorageError> {
        let result = match validate_message(message) {
            Ok(()) => self.repo.insert(message).await,
            Err(e) => Err(e),
        };
        self.settle(result.map(|_| true), "creating message", || false)
    }

    /// Up to `limit` messages, newest first.
    pub async fn get_latest(&self, limit: u32) -> Result<Vec<Message>, StorageError> {
        let result = self.repo.latest(i64::from(limit)).await;
        self.settle(result, "fetching messages", Vec::new)
    }

    pub async fn count(&self) -> Result<i64, StorageError> {
        let result = self.repo.count().await;
        self.settle(result, "counting messages", || 0)
    }

    /// The message with `id`, or `None`. Under `Sentinel` a failure is also `None`.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Message>, StorageError> {
        let result = self.repo.find_by_id(id).await;
        self.settle(result, "fetching message", || None)
    }

    /// Deletes all messages. Meant for tests and resets.
    pub async fn truncate(&self) -> Result<bool, StorageError> {
        let result = self.repo.truncate().await;
        self.settle(result.map(|_| true), "truncating messages", || false)
    }

    fn settle<T>(
        &self,
        result: Result<T, StorageError>,
        action: &str,
        sentinel: impl FnOnce() -> T,
    ) -> Result<T, StorageError> {
        match (result, self.policy) {
            (Ok(value), _) => Ok(value),
            (Err(e), ErrorPolicy::Sentinel) => {
                error!("Error {}: {}", action, e);
                Ok(sentinel())
            }
            (Err(e), ErrorPolicy::Propagate) => Err(e),
        }
    }
}

fn validate_message(message: &str) -> Result<(), StorageError> {
    let len = message.chars().count();
    if len > MAX_MESSAGE_LEN {
        return Err(StorageError::InvalidMessage(format!(
            "message is {} characters, limit is {}",
            len, MAX_MESSAGE_LEN
        )));
    }
    Ok(())
}
