//! Spreadsheet reports
//!
//! A [`Report`] is a list of [`Sheet`]s, each with fixed headers and rows of
//! text or numbers. [`Report::write_xlsx`] renders it with bold, frozen
//! header rows and autofit columns. The [`sheets`] module turns extraction,
//! scan, package and caption results into sheets.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use keyhoist_core::error::{Error, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

pub mod sheets;

/// Longest sheet name Excel accepts
const MAX_SHEET_NAME: usize = 31;

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Number(value as f64)
    }
}

/// One worksheet: a name, header row and data rows
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> &mut Self {
        self.rows.push(row);
        self
    }
}

/// An ordered set of sheets written to one workbook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub sheets: Vec<Sheet>,
}

impl Report {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.rows.len()).sum()
    }

    /// Write the report as an `.xlsx` workbook, creating parent directories
    pub fn write_xlsx(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_at(parent, e))?;
        }

        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let mut used = HashSet::new();

        for sheet in &self.sheets {
            let name = unique_sheet_name(&sheet.name, &mut used);
            let worksheet = render_sheet(sheet, &name, &header).map_err(report_error)?;
            workbook.push_worksheet(worksheet);
        }
        if self.sheets.is_empty() {
            // a workbook needs at least one sheet
            workbook.push_worksheet(Worksheet::new());
        }

        workbook.save(path).map_err(report_error)?;
        info!(
            "Wrote {} ({} sheets, {} rows)",
            path.display(),
            self.sheets.len(),
            self.total_rows()
        );
        Ok(())
    }
}

fn render_sheet(sheet: &Sheet, name: &str, header: &Format) -> std::result::Result<Worksheet, XlsxError> {
    let mut worksheet = Worksheet::new();
    worksheet.set_name(name)?;

    for (col, title) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, title, header)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (i, row) in sheet.rows.iter().enumerate() {
        let row_num = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(text) => worksheet.write_string(row_num, col as u16, text)?,
                Cell::Number(n) => worksheet.write_number(row_num, col as u16, *n)?,
            };
        }
    }

    worksheet.autofit();
    Ok(worksheet)
}

fn report_error(e: XlsxError) -> Error {
    Error::report(e.to_string())
}

/// Make a name Excel accepts and that no earlier sheet in the workbook uses
pub fn unique_sheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    let base = if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    };

    let mut candidate = truncate(&base, MAX_SHEET_NAME);
    let mut n = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({n})");
        candidate = format!(
            "{}{suffix}",
            truncate(&base, MAX_SHEET_NAME - suffix.chars().count())
        );
        n += 1;
    }
    used.insert(candidate.to_lowercase());
    candidate
}

fn truncate(name: &str, max: usize) -> String {
    name.chars().take(max).collect()
}
