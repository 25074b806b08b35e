use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::models::{CellValue, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Workbook,
    Csv,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => SheetFormat::Csv,
            _ => SheetFormat::Workbook,
        }
    }
}

/// Reads an uploaded sheet. Either every row parses or the whole upload fails.
pub async fn read_rows(path: &Path) -> anyhow::Result<Vec<Row>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rows = parse_bytes(bytes, SheetFormat::from_path(path))
        .with_context(|| format!("failed to parse {}", path.display()))?;
    log::info!("loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn parse_bytes(bytes: Vec<u8>, format: SheetFormat) -> anyhow::Result<Vec<Row>> {
    match format {
        SheetFormat::Workbook => parse_workbook(bytes),
        SheetFormat::Csv => parse_csv(&bytes),
    }
}

/// Header names as they will key each row; blanks dropped, repeats get the
/// first free `_N` suffix.
fn unique_headers<I: IntoIterator<Item = String>>(raw: I) -> Vec<Option<String>> {
    let mut used: HashSet<String> = HashSet::new();
    raw.into_iter()
        .map(|header| {
            let header = header.trim().to_string();
            if header.is_empty() {
                return None;
            }
            let name = (0u32..)
                .map(|n| match n {
                    0 => header.clone(),
                    n => format!("{header}_{n}"),
                })
                .find(|candidate| !used.contains(candidate))?;
            used.insert(name.clone());
            Some(name)
        })
        .collect()
}

fn build_row<I>(headers: &[Option<String>], cells: I) -> Row
where
    I: IntoIterator<Item = Option<CellValue>>,
{
    Row::from_cells(
        headers
            .iter()
            .zip(cells)
            .filter_map(|(header, value)| Some((header.clone()?, value?))),
    )
}

fn workbook_cell(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Int(value) => Some(CellValue::Number(*value as f64)),
        Data::Float(value) => Some(CellValue::Number(*value)),
        Data::DateTime(value) => Some(CellValue::Number(value.as_f64())),
        Data::Bool(value) => Some(CellValue::Text(value.to_string())),
        Data::String(value) | Data::DateTimeIso(value) if !value.is_empty() => {
            Some(CellValue::Text(value.clone()))
        }
        _ => None,
    }
}

fn parse_workbook(bytes: Vec<u8>) -> anyhow::Result<Vec<Row>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .context("could not open spreadsheet")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("spreadsheet has no worksheets")?
        .context("could not read first worksheet")?;

    let mut lines = range.rows();
    let Some(header_row) = lines.next() else {
        return Ok(Vec::new());
    };
    let headers = unique_headers(header_row.iter().map(|cell| cell.to_string()));

    Ok(lines
        .map(|cells| build_row(&headers, cells.iter().map(workbook_cell)))
        .filter(|row| !row.is_empty())
        .collect())
}

fn csv_cell(field: &str) -> Option<CellValue> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => CellValue::Number(value),
        _ => CellValue::Text(field.to_string()),
    })
}

/// Fields are decoded lossily, so legacy single-byte exports still load.
fn parse_csv(bytes: &[u8]) -> anyhow::Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = unique_headers(
        reader
            .byte_headers()
            .context("could not read CSV header")?
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned()),
    );

    let mut rows = Vec::new();
    for (index, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("malformed CSV record {}", index + 1))?;
        let row = build_row(
            &headers,
            record
                .iter()
                .map(|field| csv_cell(&String::from_utf8_lossy(field))),
        );
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}
