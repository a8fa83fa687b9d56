use serde::Deserialize;
use std::{collections::HashSet, fs, path::Path};

use crate::error::{PipelineError, Result};
use crate::reshape::{LocationNameTable, VehicleTypeLabels};
use crate::types::Field;

#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub dataset_path: String,
    pub output_path: String,
    pub meta_path: Option<String>,
    pub prediction_dates: Vec<String>,
    pub location_ids: Vec<u32>,
    pub vehicle_types: Vec<String>,
    pub test_fraction: f64,
    pub seed: Option<u64>,
    pub categorical_fields: Vec<Field>,
    pub ridge_alpha: f64,
    pub hours: usize,
    pub vehicle_labels: VehicleTypeLabels,
    pub location_names: LocationNameTable,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: "refined_dataset.csv".to_string(),
            output_path: "prediction_22062018_26062018.csv".to_string(),
            meta_path: None,
            prediction_dates: (22..=26).map(|d| format!("2018-06-{}", d)).collect(),
            location_ids: vec![168, 1403, 110],
            vehicle_types: vec![
                "13 Linja-autot".to_string(),
                "12 KAIP".to_string(),
                "11 HA-PA".to_string(),
            ],
            test_fraction: 0.20,
            seed: None,
            categorical_fields: vec![
                Field::VehicleType,
                Field::LocationId,
                Field::Direction,
                Field::Weekday,
                Field::Week,
            ],
            ridge_alpha: 1.0,
            hours: 24,
            vehicle_labels: VehicleTypeLabels::default(),
            location_names: LocationNameTable::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        let cfg: PipelineConfig = serde_json::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(PipelineError::InvalidConfig(msg));
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return invalid(format!("test_fraction {} outside (0, 1)", self.test_fraction));
        }
        if !(self.ridge_alpha > 0.0) {
            return invalid(format!("ridge_alpha must be positive, got {}", self.ridge_alpha));
        }
        if self.hours == 0 {
            return invalid("hours must be at least 1".to_string());
        }
        if self.categorical_fields.is_empty() {
            return invalid("categorical_fields is empty".to_string());
        }
        if self.categorical_fields.iter().collect::<HashSet<_>>().len() != self.categorical_fields.len() {
            return invalid("duplicate categorical field".to_string());
        }
        if self.vehicle_types.iter().any(|v| v.trim().is_empty()) {
            return invalid("empty vehicle type".to_string());
        }
        if self.vehicle_types.iter().collect::<HashSet<_>>().len() != self.vehicle_types.len() {
            return invalid("duplicate vehicle type".to_string());
        }
        if self.location_ids.iter().collect::<HashSet<_>>().len() != self.location_ids.len() {
            return invalid("duplicate location id".to_string());
        }
        Ok(())
    }

    /// Hourly target column names, in order.
    pub fn targets(&self) -> Vec<String> {
        (1..=self.hours).map(crate::types::hour_column).collect()
    }
}
