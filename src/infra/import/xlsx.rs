use std::path::Path;

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};

use crate::domain::entities::candidate::RawRow;
use crate::domain::headers::normalize_header;

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.trim().to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

/// Reads the first worksheet of an `.xlsx` / `.xls` workbook.
pub fn read_spreadsheet_rows(workbook_path: &Path) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto(workbook_path)
        .with_context(|| format!("failed to open workbook: {}", workbook_path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook has no sheets: {}", workbook_path.display()))?
        .with_context(|| format!("failed to read first sheet: {}", workbook_path.display()))?;

    let grid: Vec<Vec<String>> = range
        .rows()
        .map(|r| r.iter().map(cell_to_string).collect())
        .collect();

    Ok(grid_to_raw_rows(&grid))
}

/// First grid row is the header row; short rows are padded, blank rows skipped.
pub fn grid_to_raw_rows(grid: &[Vec<String>]) -> Vec<RawRow> {
    let Some((header_row, data_rows)) = grid.split_first() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|header| normalize_header(header))
        .collect();

    data_rows
        .iter()
        .filter(|values| values.iter().any(|value| !value.trim().is_empty()))
        .map(|values| RawRow::from_headers(&headers, values))
        .collect()
}
