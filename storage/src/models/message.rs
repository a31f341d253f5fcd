//! Message model for persistence.
//!
//! Maps to the `messages` table; rows serialize as `{id, message, created_at}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column width of `messages.message`, in characters.
pub const MAX_MESSAGE_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    /// Auto-assigned, monotonically increasing.
    pub id: i64,
    pub message: String,
    /// Assigned by the database at insert time.
    pub created_at: DateTime<Utc>,
}
