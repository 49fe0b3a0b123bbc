use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, ReadError};
use crate::table::{Cell, Table};
use crate::utils::parse_timestamp;

/// Parser for task exports saved as Excel workbooks (.xls or .xlsx)
pub struct ExcelImporter {
    file_name: String,
}

impl ExcelImporter {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Parse the first worksheet of an in-memory workbook
    ///
    /// # Expected Sheet Structure:
    /// ```text
    /// Row 1: Column headers ("Robot name", "S/N", "Receive task report time", ...)
    /// Row 2+: One cleaning task per row
    /// ```
    pub fn parse(&self, bytes: Vec<u8>) -> Result<Table, PipelineError> {
        let mut workbook = match open_workbook_auto_from_rs(Cursor::new(bytes)) {
            Ok(wb) => wb,
            Err(e) => return Err(PipelineError::io_failure(&self.file_name, e)),
        };

        let sheet_names = workbook.sheet_names();
        debug!("Workbook {} has sheets {:?}", self.file_name, sheet_names);
        if sheet_names.len() > 1 {
            warn!(
                "Workbook {} has {} sheets, reading only the first",
                self.file_name,
                sheet_names.len()
            );
        }

        let range = match workbook.worksheet_range_at(0) {
            Some(Ok(range)) => range,
            Some(Err(e)) => return Err(PipelineError::io_failure(&self.file_name, e)),
            None => {
                return Err(PipelineError::io_failure(
                    &self.file_name,
                    ReadError::NoWorksheet,
                ))
            }
        };

        let table = self.range_to_table(&range)?;
        info!(
            "Parsed {} task rows from workbook {}",
            table.len(),
            self.file_name
        );
        Ok(table)
    }

    fn range_to_table(&self, range: &Range<Data>) -> Result<Table, PipelineError> {
        let mut rows = range.rows();

        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(|c| c.to_string()).collect(),
            None => {
                debug!("Worksheet in {} is empty", self.file_name);
                return Ok(Table::default());
            }
        };

        let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
        for row in rows {
            for (idx, column) in columns.iter_mut().enumerate() {
                column.push(row.get(idx).map(data_to_cell).unwrap_or(Cell::Null));
            }
        }

        Table::from_cells(headers.into_iter().zip(columns).collect())
            .map_err(|e| PipelineError::io_failure(&self.file_name, ReadError::Sheet(e)))
    }
}

/// Map a calamine cell onto the table's cell model
fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) if s.trim().is_empty() => Cell::Null,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(excel_date) => excel_date
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or(Cell::Float(excel_date.as_f64())),
        Data::DateTimeIso(s) => parse_timestamp(s)
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        // Formula errors (#DIV/0! etc.) carry no value
        Data::Error(_) | Data::Empty => Cell::Null,
    }
}
