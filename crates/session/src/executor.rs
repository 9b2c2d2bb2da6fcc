//! Runs confirmed decisions, at most once each.

use std::collections::HashSet;
use std::sync::Arc;

use gridtalk_io::{ConversationStore, DocumentStore};
use gridtalk_protocol::{Action, ActionDecision, ActionProposal, ActionResult};
use parking_lot::Mutex;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bridge::AgentPort;
use crate::SessionError;

pub struct ActionExecutor<C: ConversationStore> {
    documents: Arc<DocumentStore>,
    conversations: C,
    /// Proposals that already received their one execution attempt.
    handled: Mutex<HashSet<Uuid>>,
}

impl<C: ConversationStore> ActionExecutor<C> {
    pub fn new(documents: Arc<DocumentStore>, conversations: C) -> Self {
        Self {
            documents,
            conversations,
            handled: Mutex::new(HashSet::new()),
        }
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn conversations(&self) -> &C {
        &self.conversations
    }

    pub fn was_handled(&self, proposal_id: Uuid) -> bool {
        self.handled.lock().contains(&proposal_id)
    }

    /// Execute a decision. Rejected decisions are not attempted and yield a
    /// cancelled result. Failures are reported, never retried.
    pub fn execute(&self, decision: ActionDecision) -> ActionResult {
        let id = decision.proposal_id();
        let kind = decision.kind();

        if !self.handled.lock().insert(id) {
            warn!(%id, %kind, "decision already handled, refusing to run it again");
            return ActionResult::failure(format!("Action {} was already handled", id));
        }

        if !decision.is_confirmed() {
            info!(%id, %kind, "action rejected by user");
            return ActionResult::cancelled();
        }

        let outcome = decision
            .params()
            .require(kind)
            .map_err(SessionError::from)
            .and_then(|action| self.run(action));

        match outcome {
            Ok(result) => {
                info!(%id, %kind, "action executed");
                result
            }
            Err(e) => {
                warn!(%id, %kind, error = %e, "action failed");
                ActionResult::failure(format!("Error: {}", e))
            }
        }
    }

    /// Ask the human through `port`, then execute whatever they decided.
    /// A closed channel counts as a cancellation.
    pub fn confirm_and_execute(&self, port: &AgentPort, proposal: ActionProposal) -> ActionResult {
        match port.request_confirmation(proposal) {
            Ok(decision) => self.execute(decision),
            Err(e) => {
                warn!(error = %e, "no decision received");
                ActionResult::cancelled()
            }
        }
    }

    fn run(&self, action: Action) -> Result<ActionResult, SessionError> {
        let result = match action {
            Action::UpdateCell { sheet, cell, value } => {
                let written = self.documents.write_cell(&sheet, &cell, value)?;
                let shown = match &written.formula {
                    Some(f) => format!("={}", f),
                    None => written.value.display(),
                };
                ActionResult {
                    success: true,
                    message: format!("Updated {}!{}. New value: {}", written.sheet, written.cell, shown),
                    data: serde_json::to_value(&written).ok(),
                }
            }
            Action::DeleteRow { sheet, row_index } => {
                let deleted = self.documents.delete_row(&sheet, row_index)?;
                ActionResult {
                    success: true,
                    message: format!("Deleted row {} from {}", row_index, sheet),
                    data: serde_json::to_value(&deleted).ok(),
                }
            }
            Action::AddRow { sheet, row_index, row_data } => {
                let added = self.documents.add_row(&sheet, row_index, row_data)?;
                let mut message = format!("Added row {} to {}", added.row_index, sheet);
                if let Some(id) = added.assigned_id {
                    message.push_str(&format!(" with ID {}", gridtalk_engine::format_number(id)));
                }
                ActionResult {
                    success: true,
                    message,
                    data: serde_json::to_value(&added).ok(),
                }
            }
            Action::RenameConversation { id, title } => {
                self.conversations.rename(id, &title)?;
                ActionResult::ok(format!("Renamed conversation #{} to \"{}\"", id, title))
            }
            Action::DeleteConversation { id } => {
                self.conversations.delete(id)?;
                ActionResult::ok(format!("Deleted conversation #{}", id))
            }
            Action::ClearConversation { id } => {
                let deleted = self.conversations.clear_messages(id)?;
                ActionResult::ok_with(
                    format!("Cleared all messages in conversation #{}", id),
                    json!({ "deletedCount": deleted }),
                )
            }
        };
        Ok(result)
    }
}
