use std::path::PathBuf;

use gridtalk_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to open workbook {}: {message}", .path.display())]
    Open { path: PathBuf, message: String },

    #[error("failed to save workbook {}: {message}", .path.display())]
    Save { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// The engine error underneath, if this is a data-level failure.
    pub fn engine(&self) -> Option<&EngineError> {
        match self {
            StoreError::Engine(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("conversation {0} not found")]
    NotFound(i64),

    #[error("conversation store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
