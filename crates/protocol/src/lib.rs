//! Confirm-before-mutate wire types.
//!
//! An agent builds an [`ActionProposal`]; a human answers it with
//! [`decide`], producing an [`ActionDecision`] that carries the proposal's
//! kind and parameters verbatim; the executor turns a confirmed decision into
//! a typed [`Action`] and reports an [`ActionResult`].
//!
//! ```ignore
//! use gridtalk_protocol::{decide, propose, ActionParams, DecisionStatus};
//!
//! let proposal = propose("deleteRow", "Delete row", "Remove Phone from Inventory",
//!     ActionParams { sheet: Some("Inventory".into()), row_index: Some(3), ..Default::default() })?;
//! let decision = decide(proposal, DecisionStatus::Confirmed);
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use gridtalk_engine::InputValue;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("missing parameters for {kind}: {}", .missing.join(", "))]
    MissingParameters {
        kind: ActionKind,
        missing: Vec<&'static str>,
    },
}

// =============================================================================
// Action kinds
// =============================================================================

/// The closed set of actions that need human confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    #[serde(alias = "updateExcelCell")]
    UpdateCell,
    #[serde(alias = "deleteExcelRow")]
    DeleteRow,
    #[serde(alias = "addExcelRow")]
    AddRow,
    #[serde(alias = "updateThreadTitle")]
    RenameConversation,
    #[serde(alias = "deleteThread")]
    DeleteConversation,
    #[serde(alias = "clearMessages")]
    ClearConversation,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::UpdateCell,
        ActionKind::DeleteRow,
        ActionKind::AddRow,
        ActionKind::RenameConversation,
        ActionKind::DeleteConversation,
        ActionKind::ClearConversation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::UpdateCell => "updateCell",
            ActionKind::DeleteRow => "deleteRow",
            ActionKind::AddRow => "addRow",
            ActionKind::RenameConversation => "renameConversation",
            ActionKind::DeleteConversation => "deleteConversation",
            ActionKind::ClearConversation => "clearConversation",
        }
    }

    /// Earlier wire name still accepted on input.
    fn legacy_name(&self) -> &'static str {
        match self {
            ActionKind::UpdateCell => "updateExcelCell",
            ActionKind::DeleteRow => "deleteExcelRow",
            ActionKind::AddRow => "addExcelRow",
            ActionKind::RenameConversation => "updateThreadTitle",
            ActionKind::DeleteConversation => "deleteThread",
            ActionKind::ClearConversation => "clearMessages",
        }
    }

    /// Whether the action mutates the workbook (as opposed to the conversation log).
    pub fn touches_workbook(&self) -> bool {
        matches!(self, ActionKind::UpdateCell | ActionKind::DeleteRow | ActionKind::AddRow)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s || k.legacy_name() == s)
            .ok_or_else(|| ProtocolError::UnknownAction(s.to_string()))
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Loosely typed parameters as an agent supplies them. Which fields are
/// required depends on the kind; see [`ActionParams::require`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionParams {
    #[serde(alias = "threadId", skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    /// An explicit `null` is a value (clear the cell); an absent key is not.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub value: Option<InputValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_data: Option<Vec<InputValue>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<InputValue>, D::Error>
where
    D: Deserializer<'de>,
{
    InputValue::deserialize(deserializer).map(Some)
}

/// A fully validated action, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    UpdateCell { sheet: String, cell: String, value: InputValue },
    DeleteRow { sheet: String, row_index: usize },
    AddRow { sheet: String, row_index: usize, row_data: Vec<InputValue> },
    RenameConversation { id: i64, title: String },
    DeleteConversation { id: i64 },
    ClearConversation { id: i64 },
}

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_ref().filter(|s| !s.is_empty()).cloned()
}

/// Collects the names of absent fields while handing present ones through.
#[derive(Default)]
struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    fn field<T>(&mut self, name: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.missing.push(name);
        }
        value
    }
}

impl ActionParams {
    /// Check that every field `kind` needs is present. Nothing is defaulted:
    /// empty strings and a zero conversation id count as missing.
    pub fn require(&self, kind: ActionKind) -> Result<Action, ProtocolError> {
        let mut req = Required::default();
        let id = self.conversation_id.filter(|id| *id != 0);

        let action = match kind {
            ActionKind::UpdateCell => {
                let sheet = req.field("sheet", non_empty(&self.sheet));
                let cell = req.field("cell", non_empty(&self.cell));
                let value = req.field("value", self.value.clone());
                match (sheet, cell, value) {
                    (Some(sheet), Some(cell), Some(value)) => Some(Action::UpdateCell { sheet, cell, value }),
                    _ => None,
                }
            }
            ActionKind::DeleteRow => {
                let sheet = req.field("sheet", non_empty(&self.sheet));
                let row_index = req.field("rowIndex", self.row_index);
                match (sheet, row_index) {
                    (Some(sheet), Some(row_index)) => Some(Action::DeleteRow { sheet, row_index }),
                    _ => None,
                }
            }
            ActionKind::AddRow => {
                let sheet = req.field("sheet", non_empty(&self.sheet));
                let row_index = req.field("rowIndex", self.row_index);
                let row_data = req.field("rowData", self.row_data.clone());
                match (sheet, row_index, row_data) {
                    (Some(sheet), Some(row_index), Some(row_data)) => {
                        Some(Action::AddRow { sheet, row_index, row_data })
                    }
                    _ => None,
                }
            }
            ActionKind::RenameConversation => {
                let id = req.field("conversationId", id);
                let title = req.field("newTitle", non_empty(&self.new_title));
                match (id, title) {
                    (Some(id), Some(title)) => Some(Action::RenameConversation { id, title }),
                    _ => None,
                }
            }
            ActionKind::DeleteConversation => {
                req.field("conversationId", id).map(|id| Action::DeleteConversation { id })
            }
            ActionKind::ClearConversation => {
                req.field("conversationId", id).map(|id| Action::ClearConversation { id })
            }
        };

        action.ok_or_else(|| ProtocolError::MissingParameters {
            kind,
            missing: req.missing,
        })
    }
}

// =============================================================================
// Proposal → Decision
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionProposal {
    pub id: Uuid,
    pub kind: ActionKind,
    pub title: String,
    pub description: String,
    pub params: ActionParams,
    pub created_at: DateTime<Utc>,
}

impl ActionProposal {
    pub fn new(
        kind: ActionKind,
        title: impl Into<String>,
        description: impl Into<String>,
        params: ActionParams,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            description: description.into(),
            params,
            created_at: Utc::now(),
        }
    }
}

/// Build a proposal from an agent-supplied kind name. Unknown kinds are
/// refused here, before a human ever sees them.
pub fn propose(
    kind: &str,
    title: impl Into<String>,
    description: impl Into<String>,
    params: ActionParams,
) -> Result<ActionProposal, ProtocolError> {
    let kind = kind.parse()?;
    Ok(ActionProposal::new(kind, title, description, params))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Confirmed,
    Rejected,
}

/// A human's binary answer to one proposal. Fields are read-only; the only
/// way to build one is [`decide`], which takes the proposal by value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDecision {
    proposal_id: Uuid,
    status: DecisionStatus,
    kind: ActionKind,
    params: ActionParams,
    decided_at: DateTime<Utc>,
}

impl ActionDecision {
    pub fn proposal_id(&self) -> Uuid {
        self.proposal_id
    }

    pub fn status(&self) -> DecisionStatus {
        self.status
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == DecisionStatus::Confirmed
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn params(&self) -> &ActionParams {
        &self.params
    }

    pub fn decided_at(&self) -> DateTime<Utc> {
        self.decided_at
    }
}

pub fn decide(proposal: ActionProposal, status: DecisionStatus) -> ActionDecision {
    ActionDecision {
        proposal_id: proposal.id,
        status,
        kind: proposal.kind,
        params: proposal.params,
        decided_at: Utc::now(),
    }
}

// =============================================================================
// Results
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn ok_with(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Neutral outcome for a rejected proposal. Nothing was attempted.
    pub fn cancelled() -> Self {
        Self {
            success: false,
            message: "Action cancelled".to_string(),
            data: Some(serde_json::json!({ "cancelled": true })),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.get("cancelled"))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}
