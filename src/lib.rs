pub mod config;
pub mod error;
pub mod export;
pub mod importers;
pub mod pipeline;
pub mod profiles;
pub mod table;
pub mod utils;

pub use error::{PipelineError, ReadError};
pub use pipeline::{ReportPipeline, RunOptions};
pub use table::{Cell, Table, NULL_SENTINEL};
