use csv::ReaderBuilder;
use serde_json::Value;
use shared_types::RawContactRecord;

use crate::ImportError;

/// Reads a CSV upload into raw import rows keyed by header name
pub struct CsvRowParser {
    delimiter: u8,
}

impl CsvRowParser {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// One row per data line. Short lines simply lack the trailing columns;
    /// a line that cannot be decoded fails the whole upload so row numbers stay aligned.
    pub fn parse_rows(&self, content: &[u8]) -> Result<Vec<RawContactRecord>, ImportError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content);

        let headers = reader
            .headers()
            .map_err(|e| ImportError::Parse(e.to_string()))?
            .clone();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::InvalidInput(
                "CSV upload has no header row".to_string(),
            ));
        }

        let mut rows = Vec::new();

        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                ImportError::Parse(format!("Row {}: {}", index + 1, e))
            })?;

            let mut row = RawContactRecord::new();
            for (i, field) in record.iter().enumerate() {
                if let Some(header) = headers.get(i) {
                    if !header.is_empty() {
                        row.insert(header.to_string(), Value::String(field.to_string()));
                    }
                }
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

impl Default for CsvRowParser {
    fn default() -> Self {
        Self::new()
    }
}
