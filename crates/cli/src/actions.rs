//! Mutating commands. Every change is proposed, confirmed on the terminal
//! (or by `--yes`), and only then executed.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;

use gridtalk_engine::{CellValue, InputValue};
use gridtalk_io::demo::demo_workbook;
use gridtalk_io::{DocumentStore, StoreError};
use gridtalk_protocol::{propose, ActionKind, ActionParams, ActionProposal};
use gridtalk_session::{confirmation_channel, ActionExecutor, HumanPort};
use tracing::debug;

use crate::exit_codes::{EXIT_ACTION_FAILED, EXIT_CANCELLED};
use crate::{print_json, CliError, Context};

/// JSON scalars (`5200`, `true`, `null`) become typed values; anything else is text.
pub fn parse_value(raw: &str) -> InputValue {
    serde_json::from_str::<InputValue>(raw).unwrap_or_else(|_| InputValue::Text(raw.to_string()))
}

fn show_input(value: &InputValue) -> String {
    match value {
        InputValue::Null => "(empty)".to_string(),
        InputValue::Bool(b) => CellValue::Boolean(*b).display(),
        InputValue::Number(n) => CellValue::Number(*n).display(),
        InputValue::Text(s) => format!("{:?}", s),
    }
}

pub fn cmd_write(
    ctx: &Context,
    sheet: String,
    cell: String,
    raw: &str,
    yes: bool,
    json: bool,
) -> Result<(), CliError> {
    let value = parse_value(raw);
    let description = format!("Set {}!{} to {}", sheet, cell.to_uppercase(), show_input(&value));
    let params = ActionParams {
        sheet: Some(sheet),
        cell: Some(cell),
        value: Some(value),
        ..Default::default()
    };
    let proposal = ActionProposal::new(ActionKind::UpdateCell, "Update cell", description, params);
    run_guarded(ctx, proposal, yes, json)
}

pub fn cmd_delete_row(ctx: &Context, sheet: String, row: usize, yes: bool, json: bool) -> Result<(), CliError> {
    let mut description = format!("Delete row {} from {}", row, sheet);
    if let Some(preview) = row_preview(&ctx.store(), &sheet, row) {
        description.push_str(&format!(": {}", preview));
    }
    let params = ActionParams {
        sheet: Some(sheet),
        row_index: Some(row),
        ..Default::default()
    };
    let proposal = ActionProposal::new(ActionKind::DeleteRow, "Delete row", description, params);
    run_guarded(ctx, proposal, yes, json)
}

pub fn cmd_add_row(
    ctx: &Context,
    sheet: String,
    row: usize,
    raw_values: &[String],
    yes: bool,
    json: bool,
) -> Result<(), CliError> {
    let values: Vec<InputValue> = raw_values.iter().map(|v| parse_value(v)).collect();
    let shown: Vec<String> = values.iter().map(show_input).collect();
    let description = format!("Insert [{}] into {} at row {}", shown.join(", "), sheet, row);
    let params = ActionParams {
        sheet: Some(sheet),
        row_index: Some(row),
        row_data: Some(values),
        ..Default::default()
    };
    let proposal = ActionProposal::new(ActionKind::AddRow, "Add row", description, params);
    run_guarded(ctx, proposal, yes, json)
}

pub fn cmd_action(
    ctx: &Context,
    kind: &str,
    raw_params: &str,
    title: Option<String>,
    description: Option<String>,
    yes: bool,
    json: bool,
) -> Result<(), CliError> {
    let params: ActionParams = serde_json::from_str(raw_params)
        .map_err(|e| CliError::usage(format!("invalid parameters: {}", e)))?;
    let title = title.unwrap_or_else(|| kind.to_string());
    let description = description.unwrap_or_else(|| raw_params.to_string());
    let proposal = propose(kind, title, description, params).map_err(|e| CliError::usage(e.to_string()))?;
    run_guarded(ctx, proposal, yes, json)
}

pub fn cmd_seed(ctx: &Context, force: bool) -> Result<(), CliError> {
    if ctx.workbook.exists() && !force {
        return Err(CliError::usage(format!("workbook already exists: {}", ctx.workbook.display()))
            .with_hint("pass --force to overwrite it"));
    }
    let workbook = demo_workbook().map_err(StoreError::from)?;
    ctx.store().replace(&workbook)?;
    println!(
        "Seeded {} with sheets {}",
        ctx.workbook.display(),
        workbook.sheet_names().join(", ")
    );
    Ok(())
}

/// Current content of physical row `row` across the used columns, for the
/// confirmation prompt.
fn row_preview(store: &DocumentStore, sheet: &str, row: usize) -> Option<String> {
    let workbook = store.workbook().ok()?;
    let sheet = workbook.sheet(sheet).ok()?;
    if row >= sheet.row_extent() {
        return None;
    }
    let shown: Vec<String> = sheet.row_cells(row).iter().map(|c| c.value.display()).collect();
    Some(shown.join(", "))
}

/// Propose on one thread, answer on another, execute what was decided.
fn run_guarded(ctx: &Context, proposal: ActionProposal, yes: bool, json: bool) -> Result<(), CliError> {
    let documents = Arc::new(ctx.store());
    let conversations = ctx.conversation_store()?;
    let executor = ActionExecutor::new(documents, conversations);

    let (agent, human) = confirmation_channel();
    let prompt = thread::spawn(move || answer_from_terminal(human, yes));

    let result = executor.confirm_and_execute(&agent, proposal);
    drop(agent);
    if prompt.join().is_err() {
        debug!("confirmation prompt thread panicked");
    }

    if json {
        print_json(&result)?;
    } else {
        println!("{}", result.message);
    }

    if result.success {
        Ok(())
    } else if result.is_cancelled() {
        Err(CliError::silent(EXIT_CANCELLED))
    } else {
        Err(CliError::silent(EXIT_ACTION_FAILED))
    }
}

/// The human side of the bridge: show each proposal and read y/N from stdin.
fn answer_from_terminal(human: HumanPort, yes: bool) {
    while let Some(pending) = human.next_pending() {
        let confirmed = yes || ask(&pending.proposal().title, &pending.proposal().description);
        let sent = if confirmed { pending.confirm() } else { pending.reject() };
        if sent.is_err() {
            debug!("agent stopped waiting for a decision");
        }
    }
}

fn ask(title: &str, description: &str) -> bool {
    let mut stderr = io::stderr();
    // The prompt is best-effort; a closed stderr still reads the answer.
    let _ = write!(stderr, "{}\n  {}\nProceed? [y/N] ", title, description);
    let _ = stderr.flush();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("5200"), InputValue::Number(5200.0));
        assert_eq!(parse_value("true"), InputValue::Bool(true));
        assert_eq!(parse_value("null"), InputValue::Null);
        assert_eq!(parse_value("=E2*12"), InputValue::Text("=E2*12".into()));
        assert_eq!(parse_value("Laptop"), InputValue::Text("Laptop".into()));
        assert_eq!(parse_value("\"42\""), InputValue::Text("42".into()));
    }

    #[test]
    fn test_row_preview_uses_physical_rows() {
        use gridtalk_core::CellAddress;
        use gridtalk_engine::{Cell, Sheet, Workbook};

        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("offset.xlsx"));
        // Data starts at B3, so row 3 is the second record.
        let mut sheet = Sheet::new("Log");
        for (i, (name, qty)) in [("Pens", 4.0), ("Ink", 9.0)].iter().enumerate() {
            sheet.set(CellAddress::new(2 + i, 1), Cell::literal(CellValue::String((*name).into())));
            sheet.set(CellAddress::new(2 + i, 2), Cell::literal(CellValue::Number(*qty)));
        }
        store.replace(&Workbook::from_sheets(vec![sheet]).unwrap()).unwrap();

        assert_eq!(row_preview(&store, "Log", 3).as_deref(), Some("Ink, 9"));
        assert_eq!(row_preview(&store, "Log", 2).as_deref(), Some("Pens, 4"));
        assert_eq!(row_preview(&store, "Log", 4), None);
    }

    #[test]
    fn test_show_input() {
        assert_eq!(show_input(&InputValue::Number(4760.0)), "4760");
        assert_eq!(show_input(&InputValue::Text("x".into())), "\"x\"");
        assert_eq!(show_input(&InputValue::Null), "(empty)");
    }
}
