//! CSV in, CSV out. The matchers never touch files; this module is the only
//! place that does.

use std::path::Path;

use crate::error::ReconError;
use crate::model::{Dataset, Row, Value};

/// Cell spellings read as null.
const NULL_TOKENS: [&str; 7] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Load CSV text into a [`Dataset`]. The first record is the header.
pub fn load_csv_dataset(csv_data: &str, delimiter: u8) -> Result<Dataset, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    for (i, h) in headers.iter().enumerate() {
        if headers[..i].contains(h) {
            return Err(ReconError::DuplicateColumn(h.clone()));
        }
    }

    let mut dataset = Dataset::new(headers);

    for record in reader.records() {
        let record = record?;
        let row: Row = dataset
            .columns
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), parse_cell(record.get(i).unwrap_or(""))))
            .collect();
        dataset.rows.push(row);
    }

    log::debug!(
        "loaded {} rows x {} columns",
        dataset.len(),
        dataset.columns.len()
    );

    Ok(dataset)
}

/// Read and load a CSV file.
pub fn load_csv_file(path: &Path, delimiter: u8) -> Result<Dataset, ReconError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
    load_csv_dataset(&data, delimiter)
}

/// Parse one cell: null tokens, then integer, then float, else text.
pub fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if NULL_TOKENS.contains(&trimmed) {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    if looks_numeric(trimmed) {
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::Text(raw.to_string())
}

/// Rust happily parses "inf" and "infinity"; a CSV cell saying so is text.
fn looks_numeric(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
}

/// Render a dataset as CSV with a header row, columns in dataset order.
pub fn write_csv_dataset(dataset: &Dataset) -> Result<String, ReconError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&dataset.columns)?;

    for row in &dataset.rows {
        let cells: Vec<String> = dataset
            .columns
            .iter()
            .map(|c| row.get(c).map(|v| v.to_cell().into_owned()).unwrap_or_default())
            .collect();
        writer.write_record(&cells)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ReconError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReconError::Csv(e.to_string()))
}

/// Write a dataset to `path` as CSV.
pub fn write_csv_file(path: &Path, dataset: &Dataset) -> Result<(), ReconError> {
    let text = write_csv_dataset(dataset)?;
    std::fs::write(path, text)
        .map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))
}
