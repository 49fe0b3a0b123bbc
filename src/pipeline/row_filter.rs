use std::collections::HashSet;

use chrono::NaiveDateTime;
use polars::prelude::*;
use tracing::{debug, info, instrument};

use crate::error::PipelineError;
use crate::profiles::ColumnLayout;
use crate::profiles::unit_profile::ID_COLUMN;
use crate::table::{Cell, Table};
use crate::utils::{parse_strict_timestamp, parse_timestamp};

/// Removes excluded robots and stale reports, newest report first
pub struct RowFilter<'a> {
    layout: &'a ColumnLayout,
    excluded_serials: &'a HashSet<String>,
}

impl<'a> RowFilter<'a> {
    pub fn new(layout: &'a ColumnLayout, excluded_serials: &'a HashSet<String>) -> Self {
        Self {
            layout,
            excluded_serials,
        }
    }

    /// Keep rows reported strictly after `cutoff` (`YYYY-MM-DD HH:MM:SS`)
    ///
    /// Also drops the administrative columns and prepends an empty `Id` column.
    /// Rows with equal report times keep their source order. A row without a
    /// report time is never after the cutoff and is dropped here.
    #[instrument(skip(self, table), fields(rows = table.len(), units = ?self.layout.system))]
    pub fn apply(&self, table: Table, cutoff: &str) -> Result<Table, PipelineError> {
        let mut table = self.exclude_serials(table)?;

        for column in &self.layout.dropped_columns {
            table.require_column(column)?;
            table.frame_mut().drop_in_place(column)?;
        }
        let height = table.len();
        table.frame_mut().insert_column(
            0,
            Series::full_null(ID_COLUMN.into(), height, &DataType::String),
        )?;

        let report_times = self.parse_report_times(&mut table)?;

        let cutoff_at = parse_strict_timestamp(cutoff).ok_or_else(|| {
            PipelineError::MalformedTimestamp {
                column: "cutoff".to_string(),
                value: cutoff.to_string(),
            }
        })?;

        let keep: Vec<bool> = report_times
            .iter()
            .map(|t| t.is_some_and(|t| t > cutoff_at))
            .collect();
        let before = table.len();
        let mut table = Table::from(table.frame().filter(&BooleanChunked::new("keep".into(), keep))?);
        debug!(
            "Dropped {} rows reported at or before {}",
            before - table.len(),
            cutoff_at
        );

        let options = SortMultipleOptions::default()
            .with_order_descending(true)
            .with_maintain_order(true);
        let sorted = table
            .frame()
            .sort([self.layout.report_time_column.as_str()], options)?;
        table = Table::from(sorted);

        info!("{} rows remain after filtering", table.len());
        Ok(table)
    }

    fn exclude_serials(&self, table: Table) -> Result<Table, PipelineError> {
        if self.excluded_serials.is_empty() {
            return Ok(table);
        }

        let serials = table.cells(&self.layout.serial_column)?;
        let keep: Vec<bool> = serials
            .iter()
            .map(|serial| !self.excluded_serials.contains(&*serial.as_text()))
            .collect();

        let before = table.len();
        let kept = Table::from(table.frame().filter(&BooleanChunked::new("keep".into(), keep))?);
        info!("Excluded {} rows by serial number", before - kept.len());
        Ok(kept)
    }

    /// Replace the report-time column with parsed timestamps
    ///
    /// Blank cells become null; any other value that is not a timestamp fails the run.
    fn parse_report_times(
        &self,
        table: &mut Table,
    ) -> Result<Vec<Option<NaiveDateTime>>, PipelineError> {
        let column = &self.layout.report_time_column;
        let cells = table.cells(column)?;

        let mut parsed = Vec::with_capacity(cells.len());
        for cell in &cells {
            let time = match cell {
                Cell::Null => None,
                Cell::Text(s) if s.trim().is_empty() => None,
                Cell::DateTime(dt) => Some(*dt),
                Cell::Text(s) => match parse_timestamp(s) {
                    Some(dt) => Some(dt),
                    None => return Err(malformed(column, cell)),
                },
                other => return Err(malformed(column, other)),
            };
            parsed.push(time);
        }

        let blanks = parsed.iter().filter(|t| t.is_none()).count();
        if blanks > 0 {
            debug!("{} rows have no {}", blanks, column);
        }

        let typed: Vec<Cell> = parsed
            .iter()
            .map(|t| t.map(Cell::DateTime).unwrap_or(Cell::Null))
            .collect();
        table.set_cells(column, &typed)?;
        Ok(parsed)
    }
}

fn malformed(column: &str, cell: &Cell) -> PipelineError {
    PipelineError::MalformedTimestamp {
        column: column.to_string(),
        value: cell.to_string(),
    }
}
