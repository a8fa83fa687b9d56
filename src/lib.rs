//! Hourly traffic-count forecasting for LAM stations.
//!
//! Raw observations are one-hot encoded, split, fitted with a multi-output
//! regressor, and the fitted model is queried over a date range. The flat
//! predictions are then pivoted into a per-station, per-hour report.

pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod model;
pub mod predict;
pub mod reshape;
pub mod series;
pub mod split;
pub mod table;
pub mod train;
pub mod types;

pub use config::PipelineConfig;
pub use encoder::{CategoryEncoder, CategorySchema, EncodedFrame};
pub use error::{PipelineError, Result};
pub use model::{ModelSchema, Regressor, RidgeRegressor, TrainedModel};
pub use reshape::{LocationNameTable, Reshaped, TimeSeriesReshaper, VehicleTypeLabels};
pub use split::{DatasetSplitter, Split};
pub use table::Table;
pub use types::{Field, Observation, TimeSeriesRow};
