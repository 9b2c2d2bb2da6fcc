//! Channel bridge between the agent side and the human side.
//!
//! The agent thread cannot decide anything itself. It sends each proposal
//! through an mpsc channel to whoever renders the confirmation dialog and
//! blocks on a oneshot reply until the human answers. There is no polling
//! and no timeout here; bounding the wait is the caller's concern.

use std::sync::mpsc;

use gridtalk_protocol::{decide, ActionDecision, ActionProposal, DecisionStatus};
use thiserror::Error;

/// A simple oneshot channel for single-use replies.
/// Uses std::sync::mpsc under the hood.
pub mod oneshot {
    use std::sync::mpsc;

    pub struct Sender<T>(mpsc::SyncSender<T>);
    pub struct Receiver<T>(mpsc::Receiver<T>);

    impl<T> Sender<T> {
        pub fn send(self, value: T) -> Result<(), T> {
            self.0.send(value).map_err(|e| e.0)
        }
    }

    impl<T> Receiver<T> {
        pub fn blocking_recv(self) -> Result<T, RecvError> {
            self.0.recv().map_err(|_| RecvError)
        }
    }

    #[derive(Debug, Clone, Copy)]
    pub struct RecvError;

    pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
        let (tx, rx) = mpsc::sync_channel(1);
        (Sender(tx), Receiver(rx))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The other side went away before answering.
    #[error("confirmation channel closed")]
    ChannelClosed,
}

/// A proposal waiting for a human answer. Answering consumes it, so each
/// proposal gets exactly one decision.
pub struct PendingConfirmation {
    proposal: ActionProposal,
    reply: oneshot::Sender<ActionDecision>,
}

impl PendingConfirmation {
    pub fn proposal(&self) -> &ActionProposal {
        &self.proposal
    }

    pub fn answer(self, status: DecisionStatus) -> Result<(), BridgeError> {
        let decision = decide(self.proposal, status);
        self.reply.send(decision).map_err(|_| BridgeError::ChannelClosed)
    }

    pub fn confirm(self) -> Result<(), BridgeError> {
        self.answer(DecisionStatus::Confirmed)
    }

    pub fn reject(self) -> Result<(), BridgeError> {
        self.answer(DecisionStatus::Rejected)
    }
}

/// Agent-side handle.
#[derive(Clone)]
pub struct AgentPort {
    tx: mpsc::Sender<PendingConfirmation>,
}

impl AgentPort {
    /// Hand `proposal` to the human side and wait for the decision.
    pub fn request_confirmation(&self, proposal: ActionProposal) -> Result<ActionDecision, BridgeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PendingConfirmation {
                proposal,
                reply: reply_tx,
            })
            .map_err(|_| BridgeError::ChannelClosed)?;
        reply_rx.blocking_recv().map_err(|_| BridgeError::ChannelClosed)
    }
}

/// Human-side handle.
pub struct HumanPort {
    rx: mpsc::Receiver<PendingConfirmation>,
}

impl HumanPort {
    /// Block until the next proposal arrives. `None` once every agent port is gone.
    pub fn next_pending(&self) -> Option<PendingConfirmation> {
        self.rx.recv().ok()
    }

    pub fn try_next_pending(&self) -> Option<PendingConfirmation> {
        self.rx.try_recv().ok()
    }
}

pub fn confirmation_channel() -> (AgentPort, HumanPort) {
    let (tx, rx) = mpsc::channel();
    (AgentPort { tx }, HumanPort { rx })
}
