//! Readers for uploaded robot task exports (CSV and Excel)

pub mod csv_importer;
pub mod excel_importer;

use tracing::{info, instrument};

use crate::error::PipelineError;
use crate::table::Table;

pub use csv_importer::CsvImporter;
pub use excel_importer::ExcelImporter;

/// File formats accepted from the upload form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

impl FileFormat {
    /// Pick a format from the file name's extension
    pub fn from_file_name(file_name: &str) -> Result<Self, PipelineError> {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(FileFormat::Csv)
        } else if lower.ends_with(".xls") || lower.ends_with(".xlsx") {
            Ok(FileFormat::Spreadsheet)
        } else {
            Err(PipelineError::UnsupportedFormat(file_name.to_string()))
        }
    }
}

/// Load an uploaded file into a table, keeping headers and cell values as authored
#[instrument(skip(bytes), fields(size = bytes.len()))]
pub fn read_table(bytes: &[u8], file_name: &str) -> Result<Table, PipelineError> {
    let table = match FileFormat::from_file_name(file_name)? {
        FileFormat::Csv => CsvImporter::new(file_name).parse(bytes)?,
        FileFormat::Spreadsheet => ExcelImporter::new(file_name).parse(bytes.to_vec())?,
    };

    info!(
        "Read {} rows and {} columns from {}",
        table.len(),
        table.columns().len(),
        file_name
    );
    Ok(table)
}
