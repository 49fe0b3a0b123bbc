use polars::prelude::*;
use tracing::{debug, instrument, warn};

use crate::error::PipelineError;
use crate::profiles::ServerProfile;
use crate::table::{Table, NULL_SENTINEL};

pub const TOTAL_TIME_COLUMN: &str = "total_time";
pub const WATER_USAGE_COLUMN: &str = "water_usage";
pub const PAUSE_TIME_COLUMN: &str = "pause_time";
pub const JOB_ID_COLUMN: &str = "job_id";
pub const VENDOR_COLUMN: &str = "vendor";

/// Source header to canonical snake_case name
///
/// Metric and imperial variants of a unit-bearing header share one canonical name.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaMapping {
    renames: Vec<(String, String)>,
}

impl Default for SchemaMapping {
    fn default() -> Self {
        Self::standard()
    }
}

impl SchemaMapping {
    pub fn new(renames: Vec<(String, String)>) -> Self {
        Self { renames }
    }

    /// Mapping for the reporting store's task table
    pub fn standard() -> Self {
        let pairs: &[(&str, &str)] = &[
            ("Id", "id"),
            ("Robot name", "robot_name"),
            ("S/N", "serial_number"),
            ("Map name", "map_name"),
            ("Cleaning plan", "task_name"),
            ("User", "user"),
            ("Task start time", "start_time"),
            ("End time", "end_time"),
            ("Task completion (%)", "task_completion"),
            ("Actual cleaning area(㎡)", "cleaning_area"),
            ("Actual cleaning area(ft²)", "cleaning_area"),
            ("Total time (h)", "total_time"),
            ("Water usage (L)", "water_usage"),
            ("Water usage (gal)", "water_usage"),
            ("Brush (%)", "brush"),
            ("Filter (%)", "filter_element"),
            ("Squeegee(%)", "squeegee"),
            ("Planned crystallization area (㎡)", "created_at"),
            ("Planned crystallization area (ft²)", "created_at"),
            ("Actual crystallization area (㎡)", "updated_at"),
            ("Actual crystallization area (ft²)", "updated_at"),
            ("Cleaning plan area (㎡)", "area_planned"),
            ("Cleaning plan area (ft²)", "area_planned"),
            ("Start battery level (%)", "start_battery_level"),
            ("End battery level (%)", "end_battery_level"),
            ("Receive task report time", "task_report_received"),
            ("Task type", "cleaning_mode"),
            ("Download link", "report_link"),
            ("Work efficiency (㎡/h)", "performance"),
            ("Work efficiency (ft²/h)", "performance"),
        ];

        Self::new(
            pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        )
    }

    pub fn canonical_name(&self, source: &str) -> Option<&str> {
        self.renames
            .iter()
            .find(|(from, _)| from == source)
            .map(|(_, to)| to.as_str())
    }
}

/// Renames normalized columns and adds the per-server null columns
pub struct SchemaFinalizer<'a> {
    mapping: &'a SchemaMapping,
    server: &'a ServerProfile,
}

impl<'a> SchemaFinalizer<'a> {
    pub fn new(mapping: &'a SchemaMapping, server: &'a ServerProfile) -> Self {
        Self { mapping, server }
    }

    #[instrument(skip(self, table), fields(server = %self.server.name))]
    pub fn apply(&self, mut table: Table) -> Result<Table, PipelineError> {
        for source in table.columns() {
            match self.mapping.canonical_name(&source) {
                Some(canonical) => {
                    table.frame_mut().rename(&source, canonical.into())?;
                }
                None => warn!("No canonical name for column {:?}, keeping it as is", source),
            }
        }

        let height = table.len();
        if self.server.pause_time_column {
            match (
                table.column_index(TOTAL_TIME_COLUMN),
                table.has_column(WATER_USAGE_COLUMN),
            ) {
                (Some(total_idx), true) => {
                    table
                        .frame_mut()
                        .insert_column(total_idx + 1, sentinel_column(PAUSE_TIME_COLUMN, height))?;
                    debug!("Inserted {} after {}", PAUSE_TIME_COLUMN, TOTAL_TIME_COLUMN);
                }
                _ => warn!(
                    "Skipping {}: {} or {} not present",
                    PAUSE_TIME_COLUMN, TOTAL_TIME_COLUMN, WATER_USAGE_COLUMN
                ),
            }
        }

        if self.server.vendor_columns {
            let frame = table.frame_mut();
            frame.with_column(sentinel_column(JOB_ID_COLUMN, height))?;
            frame.with_column(sentinel_column(VENDOR_COLUMN, height))?;
        }

        Ok(table)
    }
}

/// Text column holding nothing but the `NULL` sentinel
fn sentinel_column(name: &str, height: usize) -> Series {
    Series::new(name.into(), vec![NULL_SENTINEL; height])
}
