// Integration tests for the `gridtalk` binary.
// Run with: cargo test -p gridtalk-cli --test cli_tests

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// A temp dir with the demo workbook seeded.
    fn seeded() -> Self {
        let ws = Self { dir: tempfile::tempdir().unwrap() };
        let out = ws.run(&["seed"]);
        assert!(out.status.success(), "seed failed: {}", String::from_utf8_lossy(&out.stderr));
        ws
    }

    fn workbook(&self) -> PathBuf {
        self.dir.path().join("data").join("example.xlsx")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_gridtalk"));
        cmd.current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env_remove("GRIDTALK_WORKBOOK")
            .env_remove("GRIDTALK_CONVERSATIONS")
            .arg("--config")
            .arg(self.dir.path().join("settings.json"))
            .arg("--workbook")
            .arg(self.workbook())
            .arg("--conversations")
            .arg(self.dir.path().join("data").join("chat.sqlite"))
            .args(args);
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).stdin(Stdio::null()).output().expect("run gridtalk")
    }

    fn run_with_input(&self, args: &[&str], input: &str) -> Output {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn gridtalk");
        child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
        child.wait_with_output().expect("wait for gridtalk")
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let out = self.run(args);
        assert!(out.status.success(), "{:?} failed: {}", args, String::from_utf8_lossy(&out.stderr));
        serde_json::from_slice(&out.stdout).expect("valid JSON")
    }
}

fn read_bytes(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

#[test]
fn sheets_lists_demo_workbook() {
    let ws = Workspace::seeded();
    let sheets = ws.json(&["sheets", "--json"]);
    let names: Vec<_> = sheets.as_array().unwrap().iter().map(|s| s["name"].clone()).collect();
    assert_eq!(names, vec!["Users", "Sales", "Inventory"]);
    assert_eq!(sheets[1]["usedRange"], "A1:E8");
    assert_eq!(sheets[1]["rowCount"], 8);
}

#[test]
fn cell_and_formula() {
    let ws = Workspace::seeded();
    let cell = ws.json(&["cell", "Sales", "e8", "--json"]);
    assert_eq!(cell["cell"], "E8");
    assert_eq!(cell["value"]["type"], "number");
    assert_eq!(cell["value"]["value"], 130000.0);
    assert_eq!(cell["formula"], "SUM(E2:E7)");

    let formula = ws.json(&["formula", "Users", "A1", "--json"]);
    assert_eq!(formula["hasFormula"], false);
    assert!(formula["formula"].is_null());
}

#[test]
fn range_corners_in_any_order() {
    let ws = Workspace::seeded();
    let range = ws.json(&["range", "Users", "C3:A2", "--json"]);
    assert_eq!(range["range"], "A2:C3");
    assert_eq!(range["rowCount"], 2);
    assert_eq!(range["colCount"], 3);
    assert_eq!(range["data"][0][1]["value"], "Firdavs");
}

#[test]
fn unknown_sheet_exit_code() {
    let ws = Workspace::seeded();
    let out = ws.run(&["sheet", "Orders"]);
    assert_eq!(out.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Available sheets: Users, Sales, Inventory"), "{}", stderr);
}

#[test]
fn bad_reference_is_usage_error() {
    let ws = Workspace::seeded();
    let out = ws.run(&["cell", "Users", "1A"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn mentions_resolve() {
    let ws = Workspace::seeded();
    let reports = ws.json(&[
        "mentions",
        "compare @Sales!E2:E3 with @Users!B2",
        "--resolve",
        "--json",
    ]);
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["sheet"], "Sales");
    assert_eq!(reports[0]["range"], "E2:E3");
    assert_eq!(reports[0]["result"]["data"][1][0]["value"], 20000.0);
    assert_eq!(reports[1]["full"], "@Users!B2");
    assert_eq!(reports[1]["result"]["data"][0][0]["value"], "Firdavs");
}

#[test]
fn mention_generation() {
    let ws = Workspace::seeded();
    let out = ws.run(&["mention", "Sales", "a1", "c3"]);
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "@Sales!A1:C3");
    let out = ws.run(&["mention", "Sales", "A1", "A1"]);
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "@Sales!A1");
}

#[test]
fn rejected_delete_changes_nothing() {
    let ws = Workspace::seeded();
    let before = read_bytes(&ws.workbook());

    let out = ws.run_with_input(&["delete-row", "Inventory", "3"], "n\n");
    assert_eq!(out.status.code(), Some(10));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Delete row 3 from Inventory: Desk"));
    assert_eq!(read_bytes(&ws.workbook()), before);
}

#[test]
fn closed_stdin_counts_as_rejection() {
    let ws = Workspace::seeded();
    let before = read_bytes(&ws.workbook());
    let out = ws.run(&["delete-row", "Inventory", "3"]);
    assert_eq!(out.status.code(), Some(10));
    assert_eq!(read_bytes(&ws.workbook()), before);
}

#[test]
fn confirmed_delete_removes_row() {
    let ws = Workspace::seeded();
    let out = ws.run_with_input(&["delete-row", "Inventory", "3"], "y\n");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let sheet = ws.json(&["sheet", "Inventory", "--json"]);
    assert_eq!(sheet["rowCount"], 5);
    assert_eq!(sheet["data"][3][0]["value"], "Chair");
}

#[test]
fn write_with_yes() {
    let ws = Workspace::seeded();
    let result = ws.json(&["write", "Users", "F1", "=E1", "--yes", "--json"]);
    assert_eq!(result["success"], true);

    let formula = ws.json(&["formula", "Users", "F1", "--json"]);
    assert_eq!(formula["formula"], "E1");
}

#[test]
fn write_past_limit_fails() {
    let ws = Workspace::seeded();
    let out = ws.run(&["write", "Users", "A20002", "1", "--yes"]);
    assert_eq!(out.status.code(), Some(11));
    assert!(String::from_utf8_lossy(&out.stdout).contains("exceeds the write limit"));
}

#[test]
fn add_row_assigns_id() {
    let ws = Workspace::seeded();
    let result = ws.json(&[
        "add-row",
        "Users",
        "6",
        "Alexsandr",
        "alex@gmail.com",
        "Developer",
        "4760",
        "--yes",
        "--json",
    ]);
    assert_eq!(result["message"], "Added row 6 to Users with ID 6");

    let row = ws.json(&["range", "Users", "A7:E7", "--json"]);
    assert_eq!(row["data"][0][0]["value"], 6.0);
    assert_eq!(row["data"][0][4]["value"], 4760.0);
}

#[test]
fn generic_action_rejects_unknown_kind() {
    let ws = Workspace::seeded();
    let out = ws.run(&["action", "dropSheet", "{}", "--yes"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown action: dropSheet"));
}

#[test]
fn generic_action_missing_parameters() {
    let ws = Workspace::seeded();
    let out = ws.run(&["action", "deleteRow", r#"{"sheet":"Users"}"#, "--yes"]);
    assert_eq!(out.status.code(), Some(11));
    assert!(String::from_utf8_lossy(&out.stdout).contains("rowIndex"));
}

#[test]
fn seed_refuses_to_overwrite() {
    let ws = Workspace::seeded();
    let out = ws.run(&["seed"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(ws.run(&["seed", "--force"]).status.success());
}

#[test]
fn missing_workbook_hints_seed() {
    let ws = Workspace { dir: tempfile::tempdir().unwrap() };
    let out = ws.run(&["sheets"]);
    assert_eq!(out.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&out.stderr).contains("gridtalk seed"));
}

#[test]
fn oversized_range_is_refused() {
    let ws = Workspace::seeded();
    let out = ws.run(&["range", "Sales", "A1:ZZZ999999999"]);
    assert_eq!(out.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&out.stderr).contains("covers more than"));

    let reports = ws.json(&["mentions", "see @Sales!A1:ZZZ999999999", "--resolve", "--json"]);
    assert!(reports[0]["error"].as_str().unwrap().contains("covers more than"));
}
