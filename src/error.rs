use thiserror::Error;

use crate::model::EstimatorError;
use crate::types::ReportKey;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("missing field: {0}")]
    MissingField(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("no row for {vehicle_type} direction {direction} at {key:?}")]
    LookupMissing {
        key: ReportKey,
        vehicle_type: String,
        direction: u8,
    },

    #[error("{count} rows for {vehicle_type} direction {direction} at {key:?}")]
    LookupAmbiguous {
        key: ReportKey,
        vehicle_type: String,
        direction: u8,
        count: usize,
    },

    #[error("unknown location id {0}")]
    UnknownLocation(u32),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("estimator failed: {0}")]
    Estimator(#[from] EstimatorError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
