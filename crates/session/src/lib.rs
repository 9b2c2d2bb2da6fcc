//! `gridtalk-session` — the confirm → execute half of a conversation turn.
//!
//! [`bridge`] carries proposals to a human and decisions back;
//! [`executor`] runs confirmed decisions against the stores.

pub mod bridge;
pub mod executor;

use gridtalk_io::{ConversationError, StoreError};
use gridtalk_protocol::ProtocolError;
use thiserror::Error;

pub use bridge::{confirmation_channel, AgentPort, BridgeError, HumanPort, PendingConfirmation};
pub use executor::ActionExecutor;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Conversation(#[from] ConversationError),
}
