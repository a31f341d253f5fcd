//! Integration tests for [`storage::MessageStore`].
//!
//! Covers schema bootstrap, ordering, counting, lookup by id and truncation using an in-memory
//! SQLite database.

use storage::{DatabaseConfig, DatabaseHandle, ErrorPolicy, MessageStore, StorageError};

async fn open_memory_handle() -> DatabaseHandle {
    DatabaseHandle::open(&DatabaseConfig::sqlite("sqlite::memory:"))
        .await
        .expect("Failed to open in-memory handle")
}

async fn schema_object_count(handle: &DatabaseHandle, kind: &str, name: &str) -> i64 {
    let DatabaseHandle::Sqlite(conn) = handle else {
        panic!("expected a SQLite handle");
    };
    let mut conn = conn.lock().await;
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = ? AND name = ?")
            .bind(kind)
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .expect("Failed to query sqlite_master");
    count
}

async fn drop_table(handle: &DatabaseHandle) {
    let DatabaseHandle::Sqlite(conn) = handle else {
        panic!("expected a SQLite handle");
    };
    let mut conn = conn.lock().await;
    sqlx::query("DROP TABLE messages")
        .execute(&mut *conn)
        .await
        .expect("Failed to drop table");
}

/// **Test: Schema bootstrap is idempotent.**
///
/// **Setup:** One handle; build the store three times and call ensure_schema twice more.
/// **Expected:** No error; exactly one `messages` table and one `idx_created_at` index exist.
#[tokio::test]
async fn test_schema_bootstrap_is_idempotent() {
    let handle = open_memory_handle().await;

    let store = MessageStore::new(&handle).await.expect("first bootstrap");
    MessageStore::new(&handle).await.expect("second bootstrap");
    MessageStore::new(&handle).await.expect("third bootstrap");
    store.ensure_schema().await.expect("explicit bootstrap");
    store.ensure_schema().await.expect("explicit bootstrap again");

    assert_eq!(schema_object_count(&handle, "table", "messages").await, 1);
    assert_eq!(schema_object_count(&handle, "index", "idx_created_at").await, 1);
}

/// **Test: Bootstrap keeps existing rows.**
#[tokio::test]
async fn test_schema_bootstrap_keeps_rows() {
    let handle = open_memory_handle().await;
    let store = MessageStore::new(&handle).await.unwrap();
    store.create("kept").await.unwrap();

    let again = MessageStore::new(&handle).await.unwrap();

    assert_eq!(again.count().await, Ok(1));
}

/// **Test: The just-created message is the newest entry.**
#[tokio::test]
async fn test_create_then_latest_returns_new_row() {
    let handle = open_memory_handle().await;
    let store = MessageStore::new(&handle).await.unwrap();
    store.create("first").await.unwrap();

    assert_eq!(store.create("just inserted").await, Ok(true));
    let latest = store.get_latest(1).await.unwrap();

    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].message, "just inserted");
    assert_eq!(latest[0].id, 2);
}

/// **Test: End-to-end hello/world scenario.**
///
/// **Setup:** Empty table; create "hello" then "world".
/// **Expected:** get_latest(10) is [world, hello]; count is 2.
#[tokio::test]
async fn test_hello_world_ordering_and_count() {
    let handle = open_memory_handle().await;
    let store = MessageStore::new(&handle).await.unwrap();

    assert_eq!(store.create("hello").await, Ok(true));
    assert_eq!(store.create("world").await, Ok(true));

    let latest = store.get_latest(10).await.unwrap();
    let bodies: Vec<&str> = latest.iter().map(|m| m.message.as_str()).collect();

    assert_eq!(bodies, vec!["world", "hello"]);
    assert!(latest[0].id > latest[1].id);
    assert_eq!(store.count().await, Ok(2));
}

/// **Test: get_latest never returns more than `limit` rows.**
///
/// **Setup:** Save 15 messages.
/// **Expected:** limit 10 → 10 rows, newest first; limit 50 → all 15; limit 0 → none.
#[tokio::test]
async fn test_get_latest_respects_limit() {
    let handle = open_memory_handle().await;
    let store = MessageStore::new(&handle).await.unwrap();

    for i in 0..15 {
        store.create(&format!("Message {}", i)).await.unwrap();
    }

    let ten = store.get_latest(10).await.unwrap();
    assert_eq!(ten.len(), 10);
    assert_eq!(ten[0].message, "Message 14");
    assert_eq!(ten[9].message, "Message 5");
    assert!(ten.windows(2).all(|w| w[0].id > w[1].id));

    assert_eq!(store.get_latest(50).await.unwrap().len(), 15);
    assert!(store.get_latest(0).await.unwrap().is_empty());
}

/// **Test: Empty table yields an empty vec, not an error.**
#[tokio::test]
async fn test_get_latest_empty() {
    let handle = open_memory_handle().await;
    let store = MessageStore::new(&handle).await.unwrap();

    assert_eq!(store.get_latest(10).await, Ok(vec![]));
    assert_eq!(store.count().await, Ok(0));
}

/// **Test: count follows successful creates since the last truncate.**
#[tokio::test]
async fn test_count_tracks_creates_and_truncates() {
    let handle = open_memory_handle().await;
    let store = MessageStore::new(&handle).await.unwrap();

    for _ in 0..3 {
        store.create("before").await.unwrap();
    }
    assert_eq!(store.count().await, Ok(3));

    assert_eq!(store.truncate().await, Ok(true));
    store.create("after").await.unwrap();
    store.create("after").await.unwrap();
    // Rejected before insert; does not count.
    assert_eq!(store.create(&"x".repeat(300)).await, Ok(false));

    assert_eq!(store.count().await, Ok(2));
}

/// **Test: Truncate on a non-empty table empties it and restarts ids.**
#[tokio::test]
async fn test_truncate_empties_table() {
    let handle = open_memory_handle().await;
    let store = MessageStore::new(&handle).await.unwrap();
    store.create("hello").await.unwrap();
    store.create("world").await.unwrap();

    assert_eq!(store.truncate().await, Ok(true));

    assert_eq!(store.count().await, Ok(0));
    assert_eq!(store.get_latest(10).await, Ok(vec![]));

    store.create("fresh").await.unwrap();
    assert_eq!(store.get_latest(1).await.unwrap()[0].id, 1);
}

/// **Test: get_by_id returns the matching row.**
#[tokio::test]
async fn test_get_by_id_existing() {
    let handle = open_memory_handle().await;
    let store = MessageStore::new(&handle).await.unwrap();
    store.create("Hello World").await.unwrap();
    let id = store.get_latest(1).await.unwrap()[0].id;

    let message = store
        .get_by_id(id)
        .await
        .expect("Failed to query")
        .expect("message should exist");

    assert_eq!(message.id, id);
    assert_eq!(message.message, "Hello World");
}

/// **Test: A miss and a lower-level failure look the same under the sentinel policy.**
///
/// **Setup:** One store; look up a missing id, then drop the table behind the store and look up again.
/// **Expected:** Both lookups return `Ok(None)`. The failure is not distinguishable from a miss.
#[tokio::test]
async fn test_get_by_id_miss_and_failure_are_identical_under_sentinel() {
    let handle = open_memory_handle().await;
    let store = MessageStore::with_policy(&handle, ErrorPolicy::Sentinel)
        .await
        .unwrap();

    let miss = store.get_by_id(999).await;
    drop_table(&handle).await;
    let failure = store.get_by_id(999).await;

    assert_eq!(miss, Ok(None));
    assert_eq!(failure, miss);
}

/// **Test: Under the propagate policy the same failure is an error.**
#[tokio::test]
async fn test_get_by_id_failure_is_error_under_propagate() {
    let handle = open_memory_handle().await;
    let store = MessageStore::with_policy(&handle, ErrorPolicy::Propagate)
        .await
        .unwrap();

    assert_eq!(store.get_by_id(999).await, Ok(None));
    drop_table(&handle).await;

    let result = store.get_by_id(999).await;
    assert!(matches!(result, Err(StorageError::Statement(_))), "{:?}", result);
}

/// **Test: Writes, reads and counts all fall back to sentinels after the table disappears.**
#[tokio::test]
async fn test_sentinels_after_table_dropped() {
    let handle = open_memory_handle().await;
    let store = MessageStore::new(&handle).await.unwrap();
    store.create("hello").await.unwrap();

    drop_table(&handle).await;

    assert_eq!(store.create("lost").await, Ok(false));
    assert_eq!(store.get_latest(10).await, Ok(vec![]));
    assert_eq!(store.count().await, Ok(0));
    assert_eq!(store.truncate().await, Ok(false));

    // Bootstrap recreates the table; the store works again.
    store.ensure_schema().await.unwrap();
    assert_eq!(store.create("back").await, Ok(true));
    assert_eq!(store.count().await, Ok(1));
}

/// **Test: Rows serialize with the keys consumers render.**
#[tokio::test]
async fn test_row_shape() {
    let handle = open_memory_handle().await;
    let store = MessageStore::new(&handle).await.unwrap();
    store.create("shape").await.unwrap();

    let row = &store.get_latest(1).await.unwrap()[0];
    let value = serde_json::to_value(row).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();

    assert_eq!(keys.len(), 3);
    assert_eq!(value["id"], 1);
    assert_eq!(value["message"], "shape");
    assert!(value["created_at"].is_string());
}

/// **Test: Messages persist in a file-backed database across handles.**
#[tokio::test]
async fn test_file_database_persists_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lamp.db");
    let config = DatabaseConfig::sqlite(path.to_string_lossy());

    {
        let handle = DatabaseHandle::open(&config).await.unwrap();
        let store = MessageStore::new(&handle).await.unwrap();
        store.create("persisted").await.unwrap();
    }

    let handle = DatabaseHandle::open(&config).await.unwrap();
    let store = MessageStore::new(&handle).await.unwrap();
    let latest = store.get_latest(10).await.unwrap();

    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].message, "persisted");
}
