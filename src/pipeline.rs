// Record normalization pipeline
//
// Reader -> RowFilter -> ColumnNormalizer -> SchemaFinalizer. The server
// registry is consulted once per run to pick the unit layout and the
// server-specific output columns.

pub mod column_normalizer;
pub mod row_filter;
pub mod schema_finalizer;

use std::collections::HashSet;

use chrono::NaiveDateTime;
use tracing::{info, instrument};

use crate::error::PipelineError;
use crate::importers::read_table;
use crate::profiles::ServerRegistry;
use crate::table::Table;

pub use column_normalizer::ColumnNormalizer;
pub use row_filter::RowFilter;
pub use schema_finalizer::{SchemaFinalizer, SchemaMapping};

/// Caller-supplied parameters for one pipeline run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Only reports received strictly after this `YYYY-MM-DD HH:MM:SS` time are kept
    pub cutoff: String,
    /// Written into `created_at` and `updated_at` of every row
    pub adjusted_at: NaiveDateTime,
    pub server: String,
    /// Robot serial numbers to leave out; empty means keep all
    pub excluded_serials: HashSet<String>,
}

impl RunOptions {
    pub fn new(cutoff: impl Into<String>, adjusted_at: NaiveDateTime, server: impl Into<String>) -> Self {
        Self {
            cutoff: cutoff.into(),
            adjusted_at,
            server: server.into(),
            excluded_serials: HashSet::new(),
        }
    }

    pub fn excluding<I, S>(mut self, serials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_serials.extend(serials.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportPipeline {
    registry: ServerRegistry,
    mapping: SchemaMapping,
}

impl ReportPipeline {
    pub fn new(registry: ServerRegistry) -> Self {
        Self {
            registry,
            mapping: SchemaMapping::standard(),
        }
    }

    /// Read an uploaded export and turn it into canonical records
    #[instrument(skip(self, bytes, options), fields(server = %options.server))]
    pub fn process_upload(
        &self,
        bytes: &[u8],
        file_name: &str,
        options: &RunOptions,
    ) -> Result<Table, PipelineError> {
        let table = read_table(bytes, file_name)?;
        self.process_table(table, options)
    }

    /// Normalize an already loaded export
    pub fn process_table(&self, table: Table, options: &RunOptions) -> Result<Table, PipelineError> {
        let server = self.registry.lookup(&options.server);
        let layout = server.units.layout();
        info!(
            "Processing {} rows for {} using {:?} units",
            table.len(),
            server.name,
            layout.system
        );

        let filtered = RowFilter::new(&layout, &options.excluded_serials).apply(table, &options.cutoff)?;
        let normalized = ColumnNormalizer::new(&layout).apply(filtered, options.adjusted_at)?;
        let canonical = SchemaFinalizer::new(&self.mapping, &server).apply(normalized)?;

        info!(
            "Produced {} canonical records with {} columns",
            canonical.len(),
            canonical.columns().len()
        );
        Ok(canonical)
    }
}
