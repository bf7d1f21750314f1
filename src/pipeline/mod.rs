pub mod audit;
pub mod clean;
pub mod datasets;
pub mod prepare;
pub mod stats;
pub mod summary;

use crate::schema::SchemaError;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("No rows left after {0}")]
    Empty(&'static str),
}

impl PipelineError {
    pub(crate) fn csv(path: &Path, e: csv::Error) -> Self {
        PipelineError::Csv(format!("{}: {e}", path.display()))
    }
}
