//! Storage models.

mod message;

pub use message::{Message, MAX_MESSAGE_LEN};
