use std::path::Path;

use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder, Trim};

use crate::domain::entities::candidate::RawRow;
use crate::domain::headers::normalize_header;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn read_csv_rows(csv_path: &Path) -> Result<Vec<RawRow>> {
    let bytes = std::fs::read(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    parse_csv_bytes(&bytes)
        .with_context(|| format!("failed to parse csv: {}", csv_path.display()))
}

/// First non-blank record is the header row. Quoted fields may contain commas.
/// Invalid UTF-8 is decoded lossily so one bad byte does not drop the file.
pub fn parse_csv_bytes(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for record in reader.byte_records() {
        let record = record.context("failed to parse csv record")?;
        let fields = decode_fields(&record);
        if fields.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if let Some(headers) = &headers {
            rows.push(RawRow::from_headers(headers, &fields));
            continue;
        }
        headers = Some(fields.iter().map(|header| normalize_header(header)).collect());
    }

    Ok(rows)
}

fn decode_fields(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).trim().to_string())
        .collect()
}
