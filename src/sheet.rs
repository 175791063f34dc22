use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("spreadsheet read failed: {0}")]
    Csv(#[from] csv::Error),
}

/// One cell as the sheet export renders it. Anything that parses as a number
/// is a number; spreadsheet tools export quantities and prices unquoted.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(number) => CellValue::Number(number),
            Err(_) => CellValue::Text(trimmed.to_string()),
        }
    }

    /// Cell rendered back to text; integral numbers drop the decimal tail
    /// (a quantity cell holding 3.0 reads "3").
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Text(value) => Some(value.clone()),
            CellValue::Number(value) => Some(format_number(*value)),
            CellValue::Empty => None,
        }
    }

    /// Best-effort whole number; anything fractional or non-numeric is None.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Number(value) if value.fract() == 0.0 => Some(*value as i64),
            CellValue::Text(value) => value.trim().parse::<i64>().ok(),
            _ => None,
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// One spreadsheet row keyed by column header. Read-only to the rest of the
/// pipeline.
#[derive(Debug, Clone, Default)]
pub struct ListingRow {
    cells: HashMap<String, CellValue>,
}

impl ListingRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, header: &str, value: CellValue) {
        self.cells.insert(header.to_string(), value);
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells.get(header)
    }

    /// Non-blank text under `header`, or None.
    pub fn text(&self, header: &str) -> Option<String> {
        self.get(header)
            .and_then(CellValue::as_text)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn integer(&self, header: &str) -> Option<i64> {
        self.get(header).and_then(CellValue::as_integer)
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(header, cell)| (header.as_str(), cell))
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|cell| matches!(cell, CellValue::Empty))
    }
}

/// Read the listings sheet. Fully blank rows are dropped the way the sheet
/// tooling drops them; short records simply have fewer cells.
pub fn read_rows(path: &Path) -> Result<Vec<ListingRow>, SheetError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = ListingRow::new();
        for (index, field) in record.iter().enumerate() {
            if let Some(header) = headers.get(index)
                && !header.is_empty()
            {
                row.set(header, CellValue::parse(field));
            }
        }
        if !row.is_blank() {
            rows.push(row);
        }
    }
    info!(target = "lister.sheet", path = %path.display(), rows = rows.len(), "sheet read");
    Ok(rows)
}
