//! XLSX load and save.
//!
//! Reading goes through calamine (values plus formula text); writing goes
//! through rust_xlsxwriter into memory and then replaces the target file in
//! one rename, so a failed save never leaves a half-written workbook behind.
//!
//! xlsx has no way to store an empty string as a cell value, so cleared
//! cells are written as text-formatted blanks and also listed in workbook
//! defined names (`GridtalkBlanks_<sheet index>_<chunk>`) that `load` reads
//! back as empty-text literals.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use gridtalk_core::address::column_index_to_letters;
use gridtalk_core::{CellAddress, Range};
use gridtalk_engine::{format_number, Cell, CellValue, Sheet, Workbook};
use rust_xlsxwriter::{Format, Formula, Workbook as XlsxWorkbook, Worksheet, XlsxError};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StoreError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SECONDS_PER_DAY: f64 = 86_400.0;

const BLANKS_NAME: &str = "GridtalkBlanks";
const BLANKS_PER_NAME: usize = 200;

/// Load every sheet of the workbook at `path`.
pub fn load(path: &Path) -> Result<Workbook, StoreError> {
    let open_err = |message: String| StoreError::Open {
        path: path.to_path_buf(),
        message,
    };

    let mut source = open_workbook_auto(path).map_err(|e| open_err(e.to_string()))?;
    let mut blanks = empty_text_cells_by_sheet(source.defined_names());
    let mut sheets = Vec::new();

    for (index, name) in source.sheet_names().into_iter().enumerate() {
        let values = source
            .worksheet_range(&name)
            .map_err(|e| open_err(format!("sheet '{}': {}", name, e)))?;
        let mut sheet = Sheet::new(name.as_str());
        let mut used: Option<Range> = None;

        if let (Some(start), Some(end)) = (values.start(), values.end()) {
            used = Some(bounds(start, end));
            for (row_idx, row) in values.rows().enumerate() {
                for (col_idx, data) in row.iter().enumerate() {
                    let addr = CellAddress::new(start.0 as usize + row_idx, start.1 as usize + col_idx);
                    if let Some(value) = convert_value(data) {
                        sheet.set(addr, Cell::literal(value));
                    }
                }
            }
        }

        // Formula text comes from a separate range; cached results were read above.
        if let Ok(formulas) = source.worksheet_formula(&name) {
            if let (Some(start), Some(end)) = (formulas.start(), formulas.end()) {
                let extent = bounds(start, end);
                used = Some(used.map_or(extent, |r| r.union(&extent)));
                for (row_idx, row) in formulas.rows().enumerate() {
                    for (col_idx, text) in row.iter().enumerate() {
                        if text.is_empty() {
                            continue;
                        }
                        let addr = CellAddress::new(start.0 as usize + row_idx, start.1 as usize + col_idx);
                        // An empty cached result means none was ever computed.
                        let cached = Some(sheet.cell(addr).value)
                            .filter(|v| !v.is_blank())
                            .unwrap_or_default();
                        let text = text.strip_prefix('=').unwrap_or(text);
                        sheet.set(addr, Cell::formula(text, cached));
                    }
                }
            }
        }

        sheet.set_used_range(used);
        for addr in blanks.remove(&index).unwrap_or_default() {
            if sheet.get(addr).is_none() {
                sheet.set(addr, Cell::literal(CellValue::String(String::new())));
            }
        }
        debug!(sheet = %sheet.name, cells = sheet.cell_count(), "sheet loaded");
        sheets.push(sheet);
    }

    Ok(Workbook::from_sheets(sheets)?)
}

/// Parse the blank-cell defined names written by [`save`].
fn empty_text_cells_by_sheet(names: &[(String, String)]) -> HashMap<usize, Vec<CellAddress>> {
    let mut out: HashMap<usize, Vec<CellAddress>> = HashMap::new();
    for (name, value) in names {
        let index = name
            .strip_prefix(BLANKS_NAME)
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(|rest| rest.split('_').next())
            .and_then(|i| i.parse::<usize>().ok());
        let Some(index) = index else { continue };

        let cells = value
            .split(',')
            .filter(|part| part.contains('!'))
            .filter_map(|part| part.rsplit('!').next())
            .filter_map(|reference| CellAddress::parse(&reference.replace('$', "")).ok());
        out.entry(index).or_default().extend(cells);
    }
    out
}

fn bounds(start: (u32, u32), end: (u32, u32)) -> Range {
    Range::new(
        CellAddress::new(start.0 as usize, start.1 as usize),
        CellAddress::new(end.0 as usize, end.1 as usize),
    )
}

fn convert_value(data: &Data) -> Option<CellValue> {
    let value = match data {
        Data::Empty => return None,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::DateTime(dt) => CellValue::Date(serial_to_display(dt.as_f64())),
        Data::DateTimeIso(s) => CellValue::Date(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
    };
    Some(value)
}

/// Day zero of the 1900 date system, and the day before it for serials
/// below the phantom 1900-02-29.
fn epoch(serial: f64) -> Option<NaiveDateTime> {
    let day = if serial < 60.0 { 31 } else { 30 };
    NaiveDate::from_ymd_opt(1899, 12, day)?.and_hms_opt(0, 0, 0)
}

/// Render a date serial as `YYYY-MM-DD`, with a time part when it has one.
pub fn serial_to_display(serial: f64) -> String {
    let render = || -> Option<String> {
        let seconds = (serial * SECONDS_PER_DAY).round() as i64;
        let moment = epoch(serial)?.checked_add_signed(Duration::try_seconds(seconds)?)?;
        let pattern = if seconds % 86_400 == 0 { DATE_FORMAT } else { DATETIME_FORMAT };
        Some(moment.format(pattern).to_string())
    };
    render().unwrap_or_else(|| format_number(serial))
}

/// Inverse of [`serial_to_display`]; `None` for text that is not a date.
pub fn display_to_serial(text: &str) -> Option<f64> {
    let moment = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let serial = (moment - base).num_seconds() as f64 / SECONDS_PER_DAY;
    Some(if serial < 61.0 { serial - 1.0 } else { serial })
}

/// Serialize the workbook and atomically replace the file at `path`.
pub fn save(workbook: &Workbook, path: &Path) -> Result<(), StoreError> {
    let save_err = |e: XlsxError| StoreError::Save {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut xlsx = XlsxWorkbook::new();
    let formats = CellFormats {
        date: Format::new().set_num_format("yyyy-mm-dd"),
        datetime: Format::new().set_num_format("yyyy-mm-dd hh:mm:ss"),
        text: Format::new().set_num_format("@"),
    };

    for sheet in workbook.sheets() {
        let worksheet = xlsx.add_worksheet().set_name(&sheet.name).map_err(save_err)?;
        // No invented "0" for formulas that were never computed.
        worksheet.set_formula_result_default("");
        write_sheet_cells(sheet, worksheet, &formats).map_err(save_err)?;
    }

    for (index, sheet) in workbook.sheets().iter().enumerate() {
        let blanks = empty_text_cells(sheet);
        let quoted = format!("'{}'", sheet.name.replace('\'', "''"));
        for (chunk, addrs) in blanks.chunks(BLANKS_PER_NAME).enumerate() {
            let refs: Vec<String> = addrs
                .iter()
                .map(|a| format!("{}!${}${}", quoted, column_index_to_letters(a.col), a.row + 1))
                .collect();
            xlsx.define_name(format!("{BLANKS_NAME}_{index}_{chunk}"), &refs.join(","))
                .map_err(save_err)?;
        }
    }

    let bytes = xlsx.save_to_buffer().map_err(save_err)?;
    atomic_write(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "workbook saved");
    Ok(())
}

struct CellFormats {
    date: Format,
    datetime: Format,
    text: Format,
}

/// Literal empty-string cells, in row-major order.
fn empty_text_cells(sheet: &Sheet) -> Vec<CellAddress> {
    let mut cells: Vec<CellAddress> = sheet
        .cells_iter()
        .filter(|(_, cell)| cell.formula.is_none() && matches!(&cell.value, CellValue::String(s) if s.is_empty()))
        .map(|(addr, _)| addr)
        .collect();
    cells.sort_by_key(|a| (a.row, a.col));
    cells
}

fn write_sheet_cells(sheet: &Sheet, worksheet: &mut Worksheet, formats: &CellFormats) -> Result<(), XlsxError> {
    for (addr, cell) in sheet.cells_iter() {
        let row = u32::try_from(addr.row).map_err(|_| XlsxError::RowColumnLimitError)?;
        let col = u16::try_from(addr.col).map_err(|_| XlsxError::RowColumnLimitError)?;

        if let Some(text) = &cell.formula {
            let mut formula = Formula::new(text);
            if !matches!(cell.value, CellValue::Empty) {
                formula = formula.set_result(cell.value.display());
            }
            worksheet.write_formula(row, col, formula)?;
            continue;
        }

        match &cell.value {
            CellValue::Empty => {}
            CellValue::String(s) if s.is_empty() => {
                worksheet.write_blank(row, col, &formats.text)?;
            }
            CellValue::String(s) | CellValue::Error(s) => {
                worksheet.write_string(row, col, s)?;
            }
            CellValue::Number(n) => {
                worksheet.write_number(row, col, *n)?;
            }
            CellValue::Boolean(b) => {
                worksheet.write_boolean(row, col, *b)?;
            }
            CellValue::Date(s) => match display_to_serial(s) {
                Some(serial) => {
                    let format = if serial.fract() == 0.0 { &formats.date } else { &formats.datetime };
                    worksheet.write_number_with_format(row, col, serial, format)?;
                }
                None => {
                    worksheet.write_string(row, col, s)?;
                }
            },
        }
    }
    Ok(())
}

/// Write `bytes` to a temp file beside `dest`, then rename it over `dest`.
pub fn atomic_write(dest: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}
