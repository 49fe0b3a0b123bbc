use polars::prelude::PolarsError;
use thiserror::Error;

/// Low-level failure while decoding an uploaded file
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("CSV parse failed: {0}")]
    Csv(#[source] PolarsError),

    #[error("Workbook parse failed: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Worksheet could not be loaded as a table: {0}")]
    Sheet(#[source] PolarsError),

    #[error("Workbook contains no worksheets")]
    NoWorksheet,
}

/// Errors raised by a single pipeline invocation. All of them are fatal to the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("An error occurred while reading {file_name}: {source}")]
    IoFailure {
        file_name: String,
        #[source]
        source: ReadError,
    },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Malformed timestamp in {column}: {value:?}")]
    MalformedTimestamp { column: String, value: String },

    #[error("Cannot coerce {value:?} in column {column} at row {row} to a number")]
    NumericCoercion {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Table operation failed: {0}")]
    Frame(#[from] PolarsError),
}

impl PipelineError {
    pub(crate) fn io_failure(file_name: &str, source: impl Into<ReadError>) -> Self {
        PipelineError::IoFailure {
            file_name: file_name.to_string(),
            source: source.into(),
        }
    }
}
