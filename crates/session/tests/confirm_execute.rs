use std::fs;
use std::sync::Arc;
use std::thread;

use gridtalk_engine::CellValue;
use gridtalk_io::demo::demo_workbook;
use gridtalk_io::{xlsx, DocumentStore, SqliteConversations};
use gridtalk_protocol::{decide, propose, ActionParams, DecisionStatus};
use gridtalk_session::{confirmation_channel, ActionExecutor};
use serde_json::json;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    executor: ActionExecutor<SqliteConversations>,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.xlsx");
        xlsx::save(&demo_workbook().unwrap(), &path).unwrap();
        let store = Arc::new(DocumentStore::new(path));
        let executor = ActionExecutor::new(store, SqliteConversations::in_memory().unwrap());
        Self { dir, executor }
    }

    fn workbook_bytes(&self) -> Vec<u8> {
        fs::read(self.dir.path().join("example.xlsx")).unwrap()
    }
}

fn delete_inventory_row() -> ActionParams {
    serde_json::from_value(json!({"sheet": "Inventory", "rowIndex": 3})).unwrap()
}

#[test]
fn rejected_delete_leaves_file_unchanged() {
    let fx = Fixture::new();
    let before = fx.workbook_bytes();

    let proposal = propose("deleteRow", "Delete row", "Remove Desk", delete_inventory_row()).unwrap();
    let result = fx.executor.execute(decide(proposal, DecisionStatus::Rejected));

    assert!(!result.success);
    assert!(result.is_cancelled());
    assert_eq!(fx.workbook_bytes(), before);
}

#[test]
fn confirmed_delete_removes_one_row() {
    let fx = Fixture::new();
    let store = fx.executor.documents();
    let before = store.read_sheet("Inventory").unwrap().row_count;
    assert!(store.is_cached());

    let proposal = propose("deleteRow", "Delete row", "Remove Desk", delete_inventory_row()).unwrap();
    let result = fx.executor.execute(decide(proposal, DecisionStatus::Confirmed));
    assert!(result.success, "{}", result.message);

    assert!(!store.is_cached());
    assert_eq!(store.read_sheet("Inventory").unwrap().row_count, before - 1);
    assert_eq!(
        store.read_cell("Inventory", "A4").unwrap().value,
        CellValue::String("Chair".into())
    );
}

#[test]
fn decision_runs_at_most_once() {
    let fx = Fixture::new();
    let proposal = propose("deleteRow", "Delete row", "Remove Desk", delete_inventory_row()).unwrap();
    let decision = decide(proposal, DecisionStatus::Confirmed);

    assert!(fx.executor.execute(decision.clone()).success);
    let again = fx.executor.execute(decision.clone());
    assert!(!again.success);
    assert!(fx.executor.was_handled(decision.proposal_id()));
    assert_eq!(fx.executor.documents().read_sheet("Inventory").unwrap().row_count, 5);
}

#[test]
fn missing_parameters_are_not_guessed() {
    let fx = Fixture::new();
    let before = fx.workbook_bytes();
    let params: ActionParams = serde_json::from_value(json!({"sheet": "Inventory"})).unwrap();

    let proposal = propose("deleteRow", "Delete row", "Remove something", params).unwrap();
    let result = fx.executor.execute(decide(proposal, DecisionStatus::Confirmed));

    assert!(!result.success);
    assert!(result.message.contains("rowIndex"), "{}", result.message);
    assert_eq!(fx.workbook_bytes(), before);
}

#[test]
fn engine_errors_become_failed_results() {
    let fx = Fixture::new();
    let params: ActionParams =
        serde_json::from_value(json!({"sheet": "Inventory", "rowIndex": 40})).unwrap();
    let proposal = propose("deleteExcelRow", "Delete row", "Out of range", params).unwrap();

    let result = fx.executor.execute(decide(proposal, DecisionStatus::Confirmed));
    assert!(!result.success);
    assert!(result.message.contains("out of bounds"), "{}", result.message);
}

#[test]
fn update_cell_reports_new_value() {
    let fx = Fixture::new();
    let params: ActionParams =
        serde_json::from_value(json!({"sheet": "Users", "cell": "E2", "value": 5200})).unwrap();
    let proposal = propose("updateCell", "Raise", "Set Firdavs' salary", params).unwrap();

    let result = fx.executor.execute(decide(proposal, DecisionStatus::Confirmed));
    assert!(result.success);
    assert_eq!(result.message, "Updated Users!E2. New value: 5200");
    assert_eq!(
        fx.executor.documents().read_cell("Users", "E2").unwrap().value,
        CellValue::Number(5200.0)
    );
}

#[test]
fn add_row_through_bridge() {
    let fx = Fixture::new();
    let (agent, human) = confirmation_channel();
    let ui = thread::spawn(move || {
        let pending = human.next_pending().unwrap();
        assert_eq!(pending.proposal().title, "Add user");
        pending.confirm().unwrap();
    });

    let params: ActionParams = serde_json::from_value(json!({
        "sheet": "Users",
        "rowIndex": 6,
        "rowData": ["Alexsandr", "alex@gmail.com", "Developer", 4760]
    }))
    .unwrap();
    let proposal = propose("addRow", "Add user", "Add Alexsandr", params).unwrap();
    let result = fx.executor.confirm_and_execute(&agent, proposal);
    ui.join().unwrap();

    assert!(result.success, "{}", result.message);
    assert_eq!(result.message, "Added row 6 to Users with ID 6");
    assert_eq!(
        fx.executor.documents().read_cell("Users", "A7").unwrap().value,
        CellValue::Number(6.0)
    );
}

#[test]
fn closed_bridge_cancels() {
    let fx = Fixture::new();
    let before = fx.workbook_bytes();
    let (agent, human) = confirmation_channel();
    drop(human);

    let proposal = propose("deleteRow", "Delete row", "Remove Desk", delete_inventory_row()).unwrap();
    let result = fx.executor.confirm_and_execute(&agent, proposal);
    assert!(result.is_cancelled());
    assert_eq!(fx.workbook_bytes(), before);
}

#[test]
fn conversation_actions() {
    let fx = Fixture::new();
    let conversations = fx.executor.conversations();
    let id = conversations.create("Sales questions").unwrap();
    conversations.add_message(id, "user", "@Sales!E8").unwrap();
    conversations.add_message(id, "assistant", "130000").unwrap();

    let params: ActionParams = serde_json::from_value(json!({"threadId": id})).unwrap();
    let proposal = propose("clearMessages", "Clear", "Clear chat", params.clone()).unwrap();
    let result = fx.executor.execute(decide(proposal, DecisionStatus::Confirmed));
    assert!(result.success);
    assert_eq!(result.data, Some(json!({"deletedCount": 2})));

    let rename: ActionParams =
        serde_json::from_value(json!({"threadId": id, "newTitle": "Totals"})).unwrap();
    let proposal = propose("renameConversation", "Rename", "Rename chat", rename).unwrap();
    assert!(fx.executor.execute(decide(proposal, DecisionStatus::Confirmed)).success);
    assert_eq!(conversations.get(id).unwrap().title, "Totals");

    let proposal = propose("deleteThread", "Delete", "Delete chat", params).unwrap();
    assert!(fx.executor.execute(decide(proposal, DecisionStatus::Confirmed)).success);
    assert!(conversations.list().unwrap().is_empty());
}
