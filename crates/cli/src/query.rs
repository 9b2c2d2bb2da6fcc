//! Read-only commands: sheet listing, cell/range reads and mention tools.

use gridtalk_core::mention::{self, Mention};
use gridtalk_core::Range;
use gridtalk_engine::{CellValue, RangeResult};
use serde::Serialize;

use crate::{print_json, CliError, Context};

pub fn cmd_sheets(ctx: &Context, json: bool) -> Result<(), CliError> {
    let sheets = ctx.store().list_sheets()?;
    if json {
        return print_json(&sheets);
    }
    for s in &sheets {
        println!("{}\t{} rows x {} cols\t{}", s.name, s.row_count, s.col_count, s.used_range);
    }
    Ok(())
}

pub fn cmd_cell(ctx: &Context, sheet: &str, cell: &str, json: bool) -> Result<(), CliError> {
    let result = ctx.store().read_cell(sheet, cell)?;
    if json {
        return print_json(&result);
    }
    match &result.formula {
        Some(f) => println!("{}!{} = {} (={})", result.sheet, result.cell, describe(&result.value), f),
        None => println!("{}!{} = {}", result.sheet, result.cell, describe(&result.value)),
    }
    Ok(())
}

pub fn cmd_formula(ctx: &Context, sheet: &str, cell: &str, json: bool) -> Result<(), CliError> {
    let result = ctx.store().read_formula(sheet, cell)?;
    if json {
        return print_json(&result);
    }
    match &result.formula {
        Some(f) => println!("={}", f),
        None => println!("{}!{} has no formula", result.sheet, result.cell),
    }
    Ok(())
}

pub fn cmd_range(ctx: &Context, sheet: &str, range: &str, json: bool) -> Result<(), CliError> {
    let range: Range = range.parse().map_err(|e: gridtalk_core::AddressError| CliError::usage(e.to_string()))?;
    let pair = range.to_reference_pair();
    let result = ctx.store().read_range(sheet, &pair.from, &pair.to)?;
    print_range(&result, json)
}

pub fn cmd_sheet(ctx: &Context, sheet: &str, json: bool) -> Result<(), CliError> {
    let result = ctx.store().read_sheet(sheet)?;
    print_range(&result, json)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MentionReport {
    #[serde(flatten)]
    mention: Mention,
    range: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<RangeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn cmd_mentions(ctx: &Context, text: &str, resolve: bool, json: bool) -> Result<(), CliError> {
    let store = ctx.store();
    let mut reports = Vec::new();

    for m in mention::parse_all(text) {
        let range = m.range().map(|r| r.to_string()).unwrap_or_default();
        let (result, error) = if resolve {
            match store.read_range(&m.sheet, &m.from, m.to_or_from()) {
                Ok(r) => (Some(r), None),
                Err(e) => (None, Some(e.to_string())),
            }
        } else {
            (None, None)
        };
        reports.push(MentionReport { mention: m, range, result, error });
    }

    if json {
        return print_json(&reports);
    }
    if reports.is_empty() {
        println!("no mentions");
        return Ok(());
    }
    for report in &reports {
        println!("{}\t{}\t{}", report.mention.full, report.mention.sheet, report.range);
        if let Some(result) = &report.result {
            print_grid(result);
        }
        if let Some(error) = &report.error {
            println!("  error: {}", error);
        }
    }
    Ok(())
}

pub fn cmd_mention(sheet: &str, from: &str, to: Option<&str>) -> Result<(), CliError> {
    let candidate = mention::generate(sheet, from, to);
    if !mention::is_valid_mention(&candidate) {
        return Err(CliError::usage(format!("not a valid mention: {}", candidate)));
    }
    println!("{}", candidate);
    Ok(())
}

fn print_range(result: &RangeResult, json: bool) -> Result<(), CliError> {
    if json {
        return print_json(result);
    }
    println!(
        "{}!{} ({} rows x {} cols)",
        result.sheet, result.range, result.row_count, result.col_count
    );
    print_grid(result);
    Ok(())
}

fn print_grid(result: &RangeResult) {
    for row in &result.data {
        let line: Vec<String> = row.iter().map(CellValue::display).collect();
        println!("{}", line.join("\t"));
    }
}

fn describe(value: &CellValue) -> String {
    match value {
        CellValue::Empty => "(empty)".to_string(),
        CellValue::String(s) => format!("{:?}", s),
        other => other.display(),
    }
}
