//! Exporter — renders a timetable as a two-dimensional grid, rows by period
//! and columns by day, for download as CSV or an Excel-compatible sheet.
//!
//! `csv` is comma-separated with `text/csv`; `excel` is the same grid
//! tab-separated under `application/vnd.ms-excel`, which spreadsheet
//! applications open natively. Cells name `subjectCode/facultyName`; empty
//! slots render blank.

use crate::errors::AppError;
use crate::models::grid::{Period, Slot, Weekday};
use crate::models::timetable::Timetable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    /// Parses the `{format}` path segment of the download endpoint.
    pub fn parse(format: &str) -> Result<Self, AppError> {
        match format {
            "csv" => Ok(ExportFormat::Csv),
            "excel" => Ok(ExportFormat::Excel),
            other => Err(AppError::InvalidRequest(format!(
                "unknown download format '{other}' (expected csv or excel)"
            ))),
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Excel => "application/vnd.ms-excel",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Csv => "timetable.csv",
            ExportFormat::Excel => "timetable.xls",
        }
    }

    fn separator(self) -> char {
        match self {
            ExportFormat::Csv => ',',
            ExportFormat::Excel => '\t',
        }
    }
}

/// Builds the grid as rows of cells: one header row, then one row per
/// period. Deterministic — cell content mirrors session order in the store.
pub fn render_grid(timetable: &Timetable) -> Vec<Vec<String>> {
    let mut header = vec!["Time / Day".to_string()];
    header.extend(Weekday::ALL.iter().map(|d| d.name().to_string()));

    let mut rows = vec![header];
    for period in Period::ALL {
        let mut row = vec![period.label().to_string()];
        for day in Weekday::ALL {
            row.push(cell_for(timetable, Slot::new(day, period)));
        }
        rows.push(row);
    }
    rows
}

fn cell_for(timetable: &Timetable, slot: Slot) -> String {
    let mut entries: Vec<String> = timetable
        .sessions
        .iter()
        .filter(|s| s.slot == slot)
        .map(|s| format!("{}/{}", s.subject_code, s.faculty_name))
        .collect();
    entries.sort();
    entries.join("; ")
}

/// Serializes the grid to the requested format's text body.
pub fn export(timetable: &Timetable, format: ExportFormat) -> String {
    let separator = format.separator();
    let mut out = String::new();
    for row in render_grid(timetable) {
        let line: Vec<String> = row.iter().map(|cell| escape(cell, separator)).collect();
        out.push_str(&line.join(&separator.to_string()));
        out.push('\n');
    }
    out
}

/// Quotes a cell when it contains the separator, a quote, or a newline;
/// embedded quotes are doubled (RFC 4180 style, also understood by Excel).
fn escape(cell: &str, separator: char) -> String {
    if cell.contains(separator) || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
