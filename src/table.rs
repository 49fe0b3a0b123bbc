//! Task table shared by every pipeline stage
//!
//! A `Table` wraps a polars `DataFrame`. Columns keep their source header until
//! the schema finalizer renames them. `Cell` is the per-value view used by the
//! coercion code, the exporters and the tests: a polars null and the literal
//! `"NULL"` string both read as `Cell::Null`.

use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Serialize, Serializer};

use crate::error::PipelineError;
use crate::utils::{format_timestamp, from_epoch, to_epoch_micros};

/// Literal written wherever a value is absent
pub const NULL_SENTINEL: &str = "NULL";

/// One value as read from an export or produced by normalization
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing in the source, or the `"NULL"` sentinel of the canonical schema
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Rendered value, borrowed when the cell already holds text
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }

    pub fn from_any_value(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Cell::Null,
            AnyValue::Boolean(b) => Cell::Bool(b),
            AnyValue::String(s) => Cell::from_str_value(s),
            AnyValue::StringOwned(s) => Cell::from_str_value(s.as_str()),
            AnyValue::Int32(i) => Cell::Int(i64::from(i)),
            AnyValue::Int64(i) => Cell::Int(i),
            AnyValue::UInt32(i) => Cell::Int(i64::from(i)),
            AnyValue::UInt64(i) => i64::try_from(i)
                .map(Cell::Int)
                .unwrap_or(Cell::Float(i as f64)),
            AnyValue::Float32(f) => Cell::Float(f64::from(f)),
            AnyValue::Float64(f) => Cell::Float(f),
            AnyValue::Datetime(value, unit, _) => from_epoch(value, unit)
                .map(Cell::DateTime)
                .unwrap_or(Cell::Int(value)),
            other => Cell::Text(other.to_string()),
        }
    }

    fn from_str_value(s: &str) -> Self {
        if s == NULL_SENTINEL {
            Cell::Null
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str(NULL_SENTINEL),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::DateTime(dt) => f.write_str(&format_timestamp(dt)),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_str(NULL_SENTINEL),
            Cell::Int(i) => serializer.serialize_i64(*i),
            Cell::Float(v) => serializer.serialize_f64(*v),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::DateTime(dt) => serializer.serialize_str(&format_timestamp(dt)),
        }
    }
}

/// Build a typed series from cells
///
/// Integer, float, timestamp or boolean when every non-null cell agrees,
/// text otherwise. A column of nothing but nulls is a null text column.
pub fn cells_to_series(name: &str, cells: &[Cell]) -> PolarsResult<Series> {
    let name = PlSmallStr::from(name);
    let values = || cells.iter().filter(|c| !c.is_null());

    if values().next().is_none() {
        return Ok(Series::full_null(name, cells.len(), &DataType::String));
    }

    if values().all(|c| matches!(c, Cell::Int(_))) {
        let ints: Vec<Option<i64>> = cells
            .iter()
            .map(|c| match c {
                Cell::Int(i) => Some(*i),
                _ => None,
            })
            .collect();
        return Ok(Series::new(name, ints));
    }

    if values().all(|c| matches!(c, Cell::Int(_) | Cell::Float(_))) {
        let floats: Vec<Option<f64>> = cells.iter().map(Cell::as_f64).collect();
        return Ok(Series::new(name, floats));
    }

    if values().all(|c| matches!(c, Cell::DateTime(_))) {
        let micros: Vec<Option<i64>> = cells
            .iter()
            .map(|c| match c {
                Cell::DateTime(dt) => Some(to_epoch_micros(dt)),
                _ => None,
            })
            .collect();
        return Series::new(name, micros).cast(&DataType::Datetime(TimeUnit::Microseconds, None));
    }

    if values().all(|c| matches!(c, Cell::Bool(_))) {
        let flags: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Cell::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        return Ok(Series::new(name, flags));
    }

    let text: Vec<Option<String>> = cells
        .iter()
        .map(|c| match c {
            Cell::Null => None,
            other => Some(other.to_string()),
        })
        .collect();
    Ok(Series::new(name, text))
}

/// Task rows keyed by column name
#[derive(Debug, Clone, Default)]
pub struct Table {
    frame: DataFrame,
}

impl From<DataFrame> for Table {
    fn from(frame: DataFrame) -> Self {
        Self { frame }
    }
}

impl Table {
    /// Build a table from named cell columns, all of the same length
    pub fn from_cells(columns: Vec<(String, Vec<Cell>)>) -> PolarsResult<Self> {
        let columns = columns
            .iter()
            .map(|(name, cells)| cells_to_series(name, cells).map(Column::from))
            .collect::<PolarsResult<Vec<_>>>()?;
        Ok(Self {
            frame: DataFrame::new(columns)?,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut DataFrame {
        &mut self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.frame.get_column_index(name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, PipelineError> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<Cell> {
        let column = self.frame.column(column).ok()?;
        column.get(row).ok().map(Cell::from_any_value)
    }

    /// Every value of a column; `MissingColumn` when it is absent
    pub fn cells(&self, column: &str) -> Result<Vec<Cell>, PipelineError> {
        let values = self
            .frame
            .column(column)
            .map_err(|_| PipelineError::MissingColumn(column.to_string()))?;

        let cells = (0..values.len())
            .map(|idx| values.get(idx).map(Cell::from_any_value))
            .collect::<PolarsResult<Vec<_>>>()?;
        Ok(cells)
    }

    pub fn column_values(&self, column: &str) -> Option<Vec<Cell>> {
        self.cells(column).ok()
    }

    /// Replace a column (or append it when new) with freshly typed cells
    pub fn set_cells(&mut self, column: &str, cells: &[Cell]) -> Result<(), PipelineError> {
        let series = cells_to_series(column, cells)?;
        self.frame.with_column(series)?;
        Ok(())
    }

    /// Row-major copy of every cell, in column order
    pub fn rows(&self) -> Result<Vec<Vec<Cell>>, PipelineError> {
        let columns = self
            .columns()
            .iter()
            .map(|name| self.cells(name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((0..self.len())
            .map(|row| columns.iter().map(|column| column[row].clone()).collect())
            .collect())
    }
}
