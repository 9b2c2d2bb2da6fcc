//! `gridtalk-io` — persistence for the workbook and the conversation log.

pub mod conversations;
pub mod demo;
pub mod error;
pub mod store;
pub mod xlsx;

pub use conversations::{Conversation, ConversationStore, Message, SqliteConversations};
pub use error::{ConversationError, StoreError};
pub use store::{DocumentStore, DEFAULT_CACHE_TTL};
