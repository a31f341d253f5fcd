//! Storage crate: connection management and message persistence.
//!
//! ## Modules
//!
//! - [`config`] – DatabaseConfig, DatabaseDriver, ErrorPolicy (loaded from env)
//! - [`error`] – Storage error types
//! - [`handle`] – DatabaseHandle (one MySQL or SQLite connection)
//! - [`connection_manager`] – ConnectionManager (lazily opens and caches the handle)
//! - [`models`] – Message
//! - [`repository`] – MessageRepository trait
//! - [`mysql_repo`], [`sqlite_repo`] – driver implementations
//! - [`message_store`] – MessageStore (schema bootstrap, CRUD, error policy)

mod config;
mod connection_manager;
mod error;
mod handle;
mod message_store;
mod models;
mod mysql_repo;
mod repository;
mod sqlite_repo;


pub use config::{mask_secret, ConnectionOptions, DatabaseConfig, DatabaseDriver, ErrorPolicy};
pub use connection_manager::ConnectionManager;
pub use error::StorageError;
pub use handle::DatabaseHandle;
pub use message_store::MessageStore;
pub use models::{Message, MAX_MESSAGE_LEN};
pub use mysql_repo::MySqlMessageRepository;
pub use repository::MessageRepository;
pub use sqlite_repo::SqliteMessageRepository;
