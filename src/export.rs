use std::io::Write;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::error::PipelineError;
use crate::table::{Cell, Table};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON write failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not read records: {0}")]
    Table(#[from] PipelineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

pub fn write_table<W: Write>(
    table: &Table,
    format: OutputFormat,
    writer: W,
) -> Result<(), ExportError> {
    match format {
        OutputFormat::Csv => write_csv(table, writer),
        OutputFormat::Json => write_json(table, writer),
    }
}

/// Header row followed by one line per record, cells rendered as displayed
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(table.columns())?;
    for row in table.rows()? {
        csv_writer.write_record(row.iter().map(|c| c.to_string()))?;
    }
    csv_writer.flush()?;
    debug!("Wrote {} CSV records", table.len());
    Ok(())
}

/// Array of objects, keys in column order
pub fn write_json<W: Write>(table: &Table, writer: W) -> Result<(), ExportError> {
    let records = Records {
        columns: table.columns(),
        rows: table.rows()?,
    };
    serde_json::to_writer_pretty(writer, &records)?;
    debug!("Wrote {} JSON records", table.len());
    Ok(())
}

struct Records {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

struct Record<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl Serialize for Records {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&Record {
                columns: &self.columns,
                cells: row,
            })?;
        }
        seq.end()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}
