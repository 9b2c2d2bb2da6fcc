//! Conversation threads and their messages.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConversationError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS threads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    thread_id INTEGER NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL
);
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub role: String,
    pub content: String,
}

/// The conversation-management operations an approved action can run.
pub trait ConversationStore: Send + Sync {
    fn rename(&self, id: i64, title: &str) -> Result<(), ConversationError>;

    /// Delete a conversation together with its messages.
    fn delete(&self, id: i64) -> Result<(), ConversationError>;

    /// Delete all messages of a conversation, returning how many were removed.
    fn clear_messages(&self, id: i64) -> Result<usize, ConversationError>;
}

pub struct SqliteConversations {
    conn: Mutex<Connection>,
}

impl SqliteConversations {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, ConversationError> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            // Connection::open reports the real failure if this did not work.
            let _ = std::fs::create_dir_all(dir);
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, ConversationError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, ConversationError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn create(&self, title: &str) -> Result<i64, ConversationError> {
        let conn = self.conn.lock();
        conn.execute("INSERT INTO threads (title) VALUES (?1)", params![title])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> Result<Conversation, ConversationError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, title FROM threads WHERE id = ?1",
            params![id],
            |row| Ok(Conversation { id: row.get(0)?, title: row.get(1)? }),
        )
        .optional()?
        .ok_or(ConversationError::NotFound(id))
    }

    pub fn list(&self) -> Result<Vec<Conversation>, ConversationError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, title FROM threads ORDER BY id")?;
        let rows = stmt.query_map([], |row| Ok(Conversation { id: row.get(0)?, title: row.get(1)? }))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn add_message(&self, conversation_id: i64, role: &str, content: &str) -> Result<i64, ConversationError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO messages (thread_id, role, content) VALUES (?1, ?2, ?3)",
            params![conversation_id, role, content],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn messages(&self, conversation_id: i64) -> Result<Vec<Message>, ConversationError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, thread_id, role, content FROM messages WHERE thread_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![conversation_id], |row| {
            Ok(Message {
                id: row.get(0)?,
                conversation_id: row.get(1)?,
                role: row.get(2)?,
                content: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl ConversationStore for SqliteConversations {
    fn rename(&self, id: i64, title: &str) -> Result<(), ConversationError> {
        let changed = self
            .conn
            .lock()
            .execute("UPDATE threads SET title = ?1 WHERE id = ?2", params![title, id])?;
        if changed == 0 {
            return Err(ConversationError::NotFound(id));
        }
        debug!(id, title, "conversation renamed");
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<(), ConversationError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let messages = tx.execute("DELETE FROM messages WHERE thread_id = ?1", params![id])?;
        let threads = tx.execute("DELETE FROM threads WHERE id = ?1", params![id])?;
        if threads == 0 {
            return Err(ConversationError::NotFound(id));
        }
        tx.commit()?;
        debug!(id, messages, "conversation deleted");
        Ok(())
    }

    fn clear_messages(&self, id: i64) -> Result<usize, ConversationError> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM messages WHERE thread_id = ?1", params![id])?;
        debug!(id, deleted, "conversation messages cleared");
        Ok(deleted)
    }
}
