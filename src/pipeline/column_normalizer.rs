use chrono::NaiveDateTime;
use polars::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::error::PipelineError;
use crate::profiles::{ColumnLayout, UnitConversion};
use crate::table::{Cell, Table, NULL_SENTINEL};
use crate::utils::round_to;

/// Placeholder the robot console writes for "no reading"
const PLACEHOLDER: &str = "-";

/// Brings filtered rows onto the layout's column order and cleans their values
///
/// One implementation serves both unit systems; the layout carries every
/// difference between them.
pub struct ColumnNormalizer<'a> {
    layout: &'a ColumnLayout,
}

impl<'a> ColumnNormalizer<'a> {
    pub fn new(layout: &'a ColumnLayout) -> Self {
        Self { layout }
    }

    #[instrument(skip(self, table), fields(rows = table.len(), units = ?self.layout.system))]
    pub fn apply(&self, table: Table, adjusted_at: NaiveDateTime) -> Result<Table, PipelineError> {
        let mut table = self.select_columns(table)?;

        let stamp = vec![Cell::DateTime(adjusted_at); table.len()];
        for column in &self.layout.timestamp_columns {
            table.require_column(column)?;
            table.set_cells(column, &stamp)?;
        }

        let mut table = replace_placeholders(table)?;

        for column in &self.layout.numeric_columns {
            self.coerce_column(&mut table, column)?;
        }

        for conversion in &self.layout.conversions {
            self.convert_column(&mut table, conversion)?;
        }

        Ok(table)
    }

    /// Reorder to the layout, synthesizing absent columns as `NULL`
    fn select_columns(&self, mut table: Table) -> Result<Table, PipelineError> {
        let height = table.len();
        for column in &self.layout.column_order {
            if !table.has_column(column) {
                warn!("Column {:?} missing from export, filling with NULL", column);
                table.frame_mut().with_column(Series::full_null(
                    column.as_str().into(),
                    height,
                    &DataType::String,
                ))?;
            }
        }

        let selected = table
            .frame()
            .select(self.layout.column_order.iter().map(String::as_str))?;
        Ok(Table::from(selected))
    }

    fn coerce_column(&self, table: &mut Table, column: &str) -> Result<(), PipelineError> {
        let rewrites = &self.layout.literal_rewrites;

        let coerced = table
            .cells(column)?
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                coerce_numeric(cell, rewrites).ok_or_else(|| PipelineError::NumericCoercion {
                    column: column.to_string(),
                    row,
                    value: cell.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        table.set_cells(column, &coerced)?;

        debug!("Coerced {} to numbers", column);
        Ok(())
    }

    fn convert_column(
        &self,
        table: &mut Table,
        conversion: &UnitConversion,
    ) -> Result<(), PipelineError> {
        let rewrites = &self.layout.literal_rewrites;
        let cells = table.cells(&conversion.column)?;

        let mut converted = Vec::with_capacity(cells.len());
        for (row, cell) in cells.iter().enumerate() {
            let value = match coerce_numeric(cell, rewrites) {
                Some(Cell::Null) => {
                    converted.push(Cell::Null);
                    continue;
                }
                Some(Cell::Float(v)) => v,
                _ => {
                    return Err(PipelineError::NumericCoercion {
                        column: conversion.column.clone(),
                        row,
                        value: cell.to_string(),
                    })
                }
            };
            converted.push(Cell::Float(round_to(
                value * conversion.factor,
                conversion.decimals,
            )));
        }
        table.set_cells(&conversion.column, &converted)?;

        info!(
            "Converted {} by factor {} ({} decimals)",
            conversion.column, conversion.factor, conversion.decimals
        );
        Ok(())
    }
}

/// `"-"` becomes `"0"`, then every missing text value becomes the `NULL` sentinel
///
/// Only text columns can hold either; typed columns keep their nulls, which
/// read back as `Cell::Null` all the same.
fn replace_placeholders(table: Table) -> Result<Table, PipelineError> {
    let exprs: Vec<Expr> = table
        .frame()
        .get_columns()
        .iter()
        .filter(|column| column.dtype() == &DataType::String)
        .map(|column| {
            let name = column.name().as_str();
            when(col(name).eq(lit(PLACEHOLDER)))
                .then(lit("0"))
                .otherwise(col(name))
                .fill_null(lit(NULL_SENTINEL))
                .alias(name)
        })
        .collect();

    if exprs.is_empty() {
        return Ok(table);
    }

    let frame = table.into_frame().lazy().with_columns(exprs).collect()?;
    Ok(Table::from(frame))
}

/// Float value of a cell after stripping thousands separators
///
/// The `NULL` sentinel passes through unchanged. Returns `None` when the
/// cell holds something that is not a number.
fn coerce_numeric(cell: &Cell, rewrites: &[(String, String)]) -> Option<Cell> {
    match cell {
        Cell::Null => Some(Cell::Null),
        Cell::Int(i) => Some(Cell::Float(*i as f64)),
        Cell::Float(f) => Some(Cell::Float(*f)),
        Cell::Text(s) => {
            let stripped = s.replace(',', "");
            let stripped = stripped.trim();
            let normalized = rewrites
                .iter()
                .find(|(from, _)| from == stripped)
                .map(|(_, to)| to.as_str())
                .unwrap_or(stripped);
            normalized
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Cell::Float)
        }
        Cell::Bool(_) | Cell::DateTime(_) => None,
    }
}
