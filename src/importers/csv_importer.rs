use std::io::Cursor;

use polars::prelude::*;
use tracing::debug;

use crate::error::{PipelineError, ReadError};
use crate::table::Table;

// Markers spreadsheet tools write for "no value"; empty fields are null already
const MISSING_MARKERS: &[&str] = &[
    "NaN", "nan", "NA", "N/A", "n/a", "#N/A", "NULL", "null", "None",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parser for comma-separated task exports
pub struct CsvImporter {
    file_name: String,
}

impl CsvImporter {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Parse CSV bytes into a table, inferring column types from the full file
    pub fn parse(&self, bytes: &[u8]) -> Result<Table, PipelineError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let null_values = NullValues::AllColumns(
            MISSING_MARKERS.iter().map(|marker| (*marker).into()).collect(),
        );
        let parse_options = CsvParseOptions::default()
            .with_null_values(Some(null_values))
            .with_missing_is_null(true);

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .with_parse_options(parse_options)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|e| PipelineError::io_failure(&self.file_name, ReadError::Csv(e)))?;

        debug!("Inferred CSV schema for {}: {:?}", self.file_name, frame.schema());
        Ok(Table::from(frame))
    }
}
