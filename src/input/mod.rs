//! Tabular input: reading post exports and normalizing their columns

use anyhow::Context;
use std::path::Path;

pub mod normalize;
pub mod record;

pub use normalize::{canonical_column, normalize_row, normalize_rows};
pub use record::{coerce_count, CellValue, CountField, PostRecord, RawRow};

use crate::Result;

/// Column type inferred by the primary parser
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

/// Read a delimited file into rows.
///
/// Tries a strict, type-inferring parse first and falls back to a lenient
/// all-text parse. If both fail the result is empty: callers treat that as
/// "nothing to process".
pub fn read_rows(path: &Path) -> Vec<RawRow> {
    tracing::info!("Reading CSV file: {}", path.display());

    match read_typed(path) {
        Ok(rows) => {
            tracing::info!("Successfully read {} posts from CSV", rows.len());
            if let Some(first) = rows.first() {
                let columns: Vec<&str> = first.iter().map(|(h, _)| h.as_str()).collect();
                tracing::debug!("Available columns: {:?}", columns);
            }
            rows
        }
        Err(e) => {
            tracing::warn!("Error reading CSV file: {:#}", e);
            match read_lenient(path) {
                Ok(rows) => {
                    tracing::info!("Fallback read successful: {} posts", rows.len());
                    rows
                }
                Err(e2) => {
                    tracing::warn!("Fallback also failed: {:#}", e2);
                    Vec::new()
                }
            }
        }
    }
}

/// Strict parse: every record must match the header width. Column types are
/// inferred from all non-empty cells of the column.
fn read_typed(path: &Path) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = clean_headers(reader.headers()?);
    if headers.is_empty() {
        anyhow::bail!("CSV file has no header row");
    }

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.context("Malformed CSV record")?;
        records.push(record);
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|idx| infer_kind(records.iter().filter_map(|r| r.get(idx))))
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            headers
                .iter()
                .zip(kinds.iter())
                .zip(record.iter())
                .map(|((header, kind), cell)| (header.clone(), typed_cell(cell, *kind)))
                .collect()
        })
        .collect();

    Ok(rows)
}

/// Lenient parse: ragged rows are accepted and every cell stays text
fn read_lenient(path: &Path) -> Result<Vec<RawRow>> {
    let content = fs_err::read(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_slice());

    let headers = clean_headers(reader.headers()?);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.clone(), CellValue::from(cell)))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

fn clean_headers(headers: &csv::StringRecord) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            let h = if idx == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_string()
        })
        .collect()
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Integer;
    for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
        if cell.parse::<i64>().is_ok() {
            continue;
        }
        if cell.parse::<f64>().is_ok() {
            kind = ColumnKind::Float;
            continue;
        }
        return ColumnKind::Text;
    }
    kind
}

fn typed_cell(cell: &str, kind: ColumnKind) -> CellValue {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    match kind {
        ColumnKind::Integer => trimmed
            .parse::<i64>()
            .map(CellValue::Integer)
            .unwrap_or_else(|_| CellValue::Text(cell.to_string())),
        ColumnKind::Float => trimmed
            .parse::<f64>()
            .map(CellValue::Float)
            .unwrap_or_else(|_| CellValue::Text(cell.to_string())),
        ColumnKind::Text => CellValue::Text(cell.to_string()),
    }
}
