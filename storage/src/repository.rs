use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::Message;

/// Driver-specific access to the `messages` table.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Creates the table and its index if absent. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<(), StorageError>;
    async fn insert(&self, message: &str) -> Result<(), StorageError>;
    /// Newest first (id descending), at most `limit` rows.
    async fn latest(&self, limit: i64) -> Result<Vec<Message>, StorageError>;
    async fn count(&self) -> Result<i64, StorageError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, StorageError>;
    /// Removes all rows and restarts the id sequence.
    async fn truncate(&self) -> Result<(), StorageError>;
}
