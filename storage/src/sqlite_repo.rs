//! SQLite implementation of [`MessageRepository`], for local runs and tests.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::SqliteConnection;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::Message;
use crate::repository::MessageRepository;

pub struct SqliteMessageRepository {
    conn: Arc<Mutex<SqliteConnection>>,
}

impl SqliteMessageRepository {
    pub fn new(conn: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        info!("Creating messages table if not exists");
        let mut conn = self.conn.lock().await;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message VARCHAR(255) NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_created_at ON messages(created_at)")
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn insert(&self, message: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().await;

        let result = sqlx::query("INSERT INTO messages (message) VALUES (?)")
            .bind(message)
            .execute(&mut *conn)
            .await?;

        info!("Saved message: id={}", result.last_insert_rowid());
        Ok(())
    }

    async fn latest(&self, limit: i64) -> Result<Vec<Message>, StorageError> {
        let mut conn = self.conn.lock().await;

        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, message, created_at FROM messages ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

        debug!("Retrieved {} messages", messages.len());
        Ok(messages)
    }

    async fn count(&self) -> Result<i64, StorageError> {
        let mut conn = self.conn.lock().await;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, StorageError> {
        let mut conn = self.conn.lock().await;

        let message = sqlx::query_as::<_, Message>(
            "SELECT id, message, created_at FROM messages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(message)
    }

    async fn truncate(&self) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().await;

        sqlx::query("DELETE FROM messages")
            .execute(&mut *conn)
            .await?;
        // AUTOINCREMENT keeps its counter here; clearing it mirrors TRUNCATE on MySQL.
        sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'messages'")
            .execute(&mut *conn)
            .await?;

        info!("Truncated messages table");
        Ok(())
    }
}
