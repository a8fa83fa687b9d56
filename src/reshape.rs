use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::series::DIRECTIONS;
use crate::types::{Observation, ReportKey, TimeSeriesRow};

/// Vehicle-type labels of the three report classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleTypeLabels {
    pub cars_and_vans: String,
    pub trucks: String,
    pub buses: String,
}

impl Default for VehicleTypeLabels {
    fn default() -> Self {
        Self {
            cars_and_vans: "11 HA-PA".to_string(),
            trucks: "12 KAIP".to_string(),
            buses: "13 Linja-autot".to_string(),
        }
    }
}

/// Closed mapping of LAM station ids to display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationNameTable(HashMap<u32, String>);

impl LocationNameTable {
    pub fn new(names: HashMap<u32, String>) -> Self {
        Self(names)
    }

    pub fn name(&self, location_id: u32) -> Result<&str> {
        self.0
            .get(&location_id)
            .map(String::as_str)
            .ok_or(PipelineError::UnknownLocation(location_id))
    }
}

impl Default for LocationNameTable {
    fn default() -> Self {
        Self(HashMap::from([
            (168, "Askisto".to_string()),
            (1403, "Kemijärvi".to_string()),
            (110, "Mäntsälä".to_string()),
        ]))
    }
}

/// A report cell that could not be built.
#[derive(Debug)]
pub struct Skipped {
    pub key: ReportKey,
    pub error: PipelineError,
}

#[derive(Debug, Default)]
pub struct Reshaped {
    pub rows: Vec<TimeSeriesRow>,
    pub skipped: Vec<Skipped>,
}

// (location_id, year, week, weekday, vehicle_type, direction)
type LookupKey = (u32, i32, u32, u32, String, u8);

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Pivots per-vehicle-type rows into one report row per station, date and hour.
#[derive(Debug, Clone)]
pub struct TimeSeriesReshaper {
    labels: VehicleTypeLabels,
    locations: LocationNameTable,
    hours: usize,
}

impl TimeSeriesReshaper {
    pub fn new(labels: VehicleTypeLabels, locations: LocationNameTable, hours: usize) -> Result<Self> {
        if hours == 0 {
            return Err(PipelineError::InvalidConfig("reshaper needs at least one hour".into()));
        }
        Ok(Self {
            labels,
            locations,
            hours,
        })
    }

    /// Lookup failures skip only their own (location, date, hour); an unknown
    /// location aborts the whole reshape.
    pub fn reshape(&self, data: &[Observation]) -> Result<Reshaped> {
        let mut index: HashMap<LookupKey, Vec<usize>> = HashMap::new();
        let mut location_order: Vec<u32> = Vec::new();
        let mut dates: HashMap<u32, BTreeSet<(i32, u32, u32)>> = HashMap::new();
        for (i, row) in data.iter().enumerate() {
            index
                .entry((
                    row.location_id,
                    row.year,
                    row.week,
                    row.weekday,
                    row.vehicle_type.clone(),
                    row.direction,
                ))
                .or_default()
                .push(i);
            if !location_order.contains(&row.location_id) {
                location_order.push(row.location_id);
            }
            dates
                .entry(row.location_id)
                .or_default()
                .insert((row.year, row.week, row.weekday));
        }

        let mut out = Reshaped::default();
        for location_id in location_order {
            let station = self.locations.name(location_id)?;
            for &(year, week, weekday) in &dates[&location_id] {
                for hour in 1..=self.hours {
                    let key = (location_id, year, week, weekday, hour);
                    match self.build_row(data, &index, key, station) {
                        Ok(row) => out.rows.push(row),
                        Err(error) => {
                            warn!("failed: {:?}: {}", key, error);
                            out.skipped.push(Skipped { key, error });
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    fn build_row(
        &self,
        data: &[Observation],
        index: &HashMap<LookupKey, Vec<usize>>,
        key: ReportKey,
        station: &str,
    ) -> Result<TimeSeriesRow> {
        let (location_id, year, week, weekday, hour) = key;
        let lookup = |vehicle_type: &str, direction: u8| -> Result<f64> {
            let hits = index
                .get(&(
                    location_id,
                    year,
                    week,
                    weekday,
                    vehicle_type.to_string(),
                    direction,
                ))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            match hits {
                [i] => data[*i].counts.get(hour - 1).copied().ok_or_else(|| {
                    PipelineError::LookupMissing {
                        key,
                        vehicle_type: vehicle_type.to_string(),
                        direction,
                    }
                }),
                [] => Err(PipelineError::LookupMissing {
                    key,
                    vehicle_type: vehicle_type.to_string(),
                    direction,
                }),
                many => Err(PipelineError::LookupAmbiguous {
                    key,
                    vehicle_type: vehicle_type.to_string(),
                    direction,
                    count: many.len(),
                }),
            }
        };

        let [d1, d2] = DIRECTIONS;
        let cars_and_vans_1 = lookup(&self.labels.cars_and_vans, d1)?;
        let cars_and_vans_2 = lookup(&self.labels.cars_and_vans, d2)?;
        let trucks_1 = lookup(&self.labels.trucks, d1)?;
        let trucks_2 = lookup(&self.labels.trucks, d2)?;
        let buses_1 = lookup(&self.labels.buses, d1)?;
        let buses_2 = lookup(&self.labels.buses, d2)?;

        Ok(TimeSeriesRow {
            date: iso_date(year, week, weekday)?,
            hour: format!("{:02}-{:02}", hour - 1, hour),
            station: station.to_string(),
            cars_and_vans_1,
            cars_and_vans_2,
            trucks_1,
            trucks_2,
            buses_1,
            buses_2,
        })
    }
}

impl Default for TimeSeriesReshaper {
    fn default() -> Self {
        Self {
            labels: VehicleTypeLabels::default(),
            locations: LocationNameTable::default(),
            hours: 24,
        }
    }
}

/// Calendar date of an ISO week date with a Monday-based (0..=6) weekday.
pub fn iso_date(year: i32, week: u32, weekday: u32) -> Result<NaiveDate> {
    let wd = *WEEKDAYS
        .get(weekday as usize)
        .ok_or_else(|| PipelineError::InvalidDate(format!("weekday {}", weekday)))?;
    NaiveDate::from_isoywd_opt(year, week, wd)
        .ok_or_else(|| PipelineError::InvalidDate(format!("{}-W{:02}-{}", year, week, weekday + 1)))
}
