use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::PipelineError;

/// Identifying fields of an observation, in canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    VehicleType,
    LocationId,
    Direction,
    Weekday,
    Week,
    Year,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::VehicleType,
        Field::LocationId,
        Field::Direction,
        Field::Weekday,
        Field::Week,
        Field::Year,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::VehicleType => "vehicle_type",
            Field::LocationId => "location_id",
            Field::Direction => "direction",
            Field::Weekday => "weekday",
            Field::Week => "week",
            Field::Year => "year",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| PipelineError::MissingField(s.to_string()))
    }
}

/// One distinct value of a categorical field. Integers sort before text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryValue::Int(v) => write!(f, "{}", v),
            CategoryValue::Text(v) => f.write_str(v),
        }
    }
}

/// One row of traffic counts for a location, vehicle class and direction on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub vehicle_type: String, // e.g. "11 HA-PA"
    pub location_id: u32,     // LAM station id
    pub direction: u8,        // 1 or 2
    pub weekday: u32,         // Monday = 0
    pub week: u32,            // ISO week number
    pub year: i32,
    // hourly counts, index 0 = hour_1; empty for query rows
    pub counts: Vec<f64>,
}

impl Observation {
    /// Query row without counts.
    pub fn query(
        vehicle_type: &str,
        location_id: u32,
        direction: u8,
        year: i32,
        week: u32,
        weekday: u32,
    ) -> Self {
        Self {
            vehicle_type: vehicle_type.to_string(),
            location_id,
            direction,
            weekday,
            week,
            year,
            counts: Vec::new(),
        }
    }

    pub fn value(&self, field: Field) -> CategoryValue {
        match field {
            Field::VehicleType => CategoryValue::Text(self.vehicle_type.clone()),
            Field::LocationId => CategoryValue::Int(self.location_id as i64),
            Field::Direction => CategoryValue::Int(self.direction as i64),
            Field::Weekday => CategoryValue::Int(self.weekday as i64),
            Field::Week => CategoryValue::Int(self.week as i64),
            Field::Year => CategoryValue::Int(self.year as i64),
        }
    }

    /// Numeric value of a passthrough field; `None` for textual fields.
    pub fn numeric(&self, field: Field) -> Option<f64> {
        match self.value(field) {
            CategoryValue::Int(v) => Some(v as f64),
            CategoryValue::Text(_) => None,
        }
    }
}

/// Name of the target column holding counts for `hour` (1-based).
pub fn hour_column(hour: usize) -> String {
    format!("hour_{}", hour)
}

/// Composite key of one reshaped report cell: (location_id, year, week, weekday, hour).
pub type ReportKey = (u32, i32, u32, u32, usize);

/// One report line: counts of three vehicle classes in both directions for one hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRow {
    pub date: NaiveDate,
    pub hour: String, // "HH-HH"
    #[serde(rename = "LAM Station")]
    pub station: String,
    #[serde(rename = "Cars and Vans - 1")]
    pub cars_and_vans_1: f64,
    #[serde(rename = "Cars and Vans - 2")]
    pub cars_and_vans_2: f64,
    #[serde(rename = "Trucks - 1")]
    pub trucks_1: f64,
    #[serde(rename = "Trucks - 2")]
    pub trucks_2: f64,
    #[serde(rename = "Buses - 1")]
    pub buses_1: f64,
    #[serde(rename = "Buses - 2")]
    pub buses_2: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_parse_back() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>().unwrap(), field);
        }
        assert!(matches!(
            "colour".parse::<Field>(),
            Err(PipelineError::MissingField(name)) if name == "colour"
        ));
    }

    #[test]
    fn test_category_value_ordering() {
        let mut values = vec![
            CategoryValue::Text("12 KAIP".into()),
            CategoryValue::Int(10),
            CategoryValue::Int(2),
            CategoryValue::Text("11 HA-PA".into()),
        ];
        values.sort();
        let shown: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        assert_eq!(shown, vec!["2", "10", "11 HA-PA", "12 KAIP"]);
    }

    #[test]
    fn test_numeric_passthrough() {
        let row = Observation::query("11 HA-PA", 168, 2, 2018, 25, 4);
        assert_eq!(row.numeric(Field::Year), Some(2018.0));
        assert_eq!(row.numeric(Field::VehicleType), None);
        assert_eq!(hour_column(24), "hour_24");
    }
}
