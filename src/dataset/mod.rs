//! Transaction dataset ingestion.
//!
//! The evaluation engine treats the dataset as a finite sequence of
//! records with named fields; this module produces that sequence from a
//! CSV export. Cells that parse as numbers become numeric field values,
//! everything else stays text, and empty cells are omitted so missing
//! fields fail closed during rule matching.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::evaluation::TransactionRecord;
use crate::scheme::FieldValue;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("dataset could not be read: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Parse a CSV export into transaction records, one per data row.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<TransactionRecord>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let mut record = TransactionRecord::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if cell.is_empty() {
                continue;
            }
            let value = match cell.parse::<f64>() {
                Ok(number) => FieldValue::Number(number),
                Err(_) => FieldValue::Text(cell.to_string()),
            };
            record.set(header, value);
        }
        records.push(record);
    }

    Ok(records)
}

/// Convenience wrapper reading the dataset from disk.
pub fn load_records(path: &Path) -> Result<Vec<TransactionRecord>, DatasetError> {
    let file = File::open(path)?;
    parse_records(file)
}
