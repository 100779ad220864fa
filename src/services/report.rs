//! Two-sheet workbook: run metadata and one row per match.

use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::core::errors::{Error, Result};
use crate::models::{MatchRow, MetadataValue, RunMetadata};

pub const METADATA_SHEET: &str = "Metadata";
pub const RESULTS_SHEET: &str = "Results";
pub const METADATA_HEADERS: [&str; 2] = ["Metadata", "Value"];
pub const RESULT_HEADERS: [&str; 5] = ["Org", "Repo", "Branch", "File", "Link"];

const HEADER_FILL: u32 = 0x006699;
const MAX_COLUMN_WIDTH: usize = 100;

/// Writes the whole report in one go. Any failure is fatal to the run.
pub fn write_report(rows: &[MatchRow], metadata: &RunMetadata, path: &Path) -> Result<()> {
    let fail = |reason: String| Error::Write {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
    }

    let mut workbook = Workbook::new();
    build_workbook(&mut workbook, rows, metadata).map_err(|e| fail(e.to_string()))?;
    workbook.save(path).map_err(|e| fail(e.to_string()))?;

    tracing::info!("Data saved to {}", path.display());
    Ok(())
}

fn build_workbook(
    workbook: &mut Workbook,
    rows: &[MatchRow],
    metadata: &RunMetadata,
) -> std::result::Result<(), XlsxError> {
    let header = Format::new()
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin);
    let cell = Format::new().set_border(FormatBorder::Thin);

    let sheet = workbook.add_worksheet();
    sheet.set_name(METADATA_SHEET)?;
    let mut widths = ColumnWidths::default();
    write_header(sheet, &METADATA_HEADERS, &header, &mut widths)?;
    for (idx, (key, value)) in metadata.entries().into_iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_string_with_format(row, 0, key, &cell)?;
        widths.observe(0, key);
        match value {
            MetadataValue::Text(text) => {
                sheet.write_string_with_format(row, 1, &text, &cell)?;
                widths.observe(1, &text);
            }
            MetadataValue::Number(number) => {
                sheet.write_number_with_format(row, 1, number, &cell)?;
                widths.observe(1, &number.to_string());
            }
        }
    }
    widths.apply(sheet)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(RESULTS_SHEET)?;
    let mut widths = ColumnWidths::default();
    write_header(sheet, &RESULT_HEADERS, &header, &mut widths)?;
    for (idx, found) in rows.iter().enumerate() {
        let row = idx as u32 + 1;
        let values = [
            found.organization.as_str(),
            found.repository.as_str(),
            found.branch.as_str(),
            found.file_path.as_str(),
            found.link.as_str(),
        ];
        for (col, value) in values.iter().enumerate() {
            sheet.write_string_with_format(row, col as u16, *value, &cell)?;
            widths.observe(col, value);
        }
    }
    widths.apply(sheet)?;

    Ok(())
}

fn write_header(
    sheet: &mut Worksheet,
    headers: &[&str],
    format: &Format,
    widths: &mut ColumnWidths,
) -> std::result::Result<(), XlsxError> {
    for (col, title) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, format)?;
        widths.observe(col, title);
    }
    Ok(())
}

/// Longest cell per column, in characters.
#[derive(Default)]
struct ColumnWidths(Vec<usize>);

impl ColumnWidths {
    fn observe(&mut self, col: usize, value: &str) {
        if self.0.len() <= col {
            self.0.resize(col + 1, 0);
        }
        self.0[col] = self.0[col].max(value.chars().count());
    }

    fn apply(&self, sheet: &mut Worksheet) -> std::result::Result<(), XlsxError> {
        for (col, longest) in self.0.iter().enumerate() {
            sheet.set_column_width(col as u16, column_width(*longest) as f64)?;
        }
        Ok(())
    }
}

fn column_width(longest: usize) -> usize {
    (longest + 2).min(MAX_COLUMN_WIDTH)
}
