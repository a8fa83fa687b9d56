use csv::{Reader, StringRecord, Writer};
use std::{fs::File, path::Path, str::FromStr};
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::types::{hour_column, Field, Observation, TimeSeriesRow};

fn column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| PipelineError::MissingField(name.to_string()))
}

// pandas-style markers for a missing value
fn is_absent(raw: &str) -> bool {
    let v = raw.trim();
    v.is_empty() || v.eq_ignore_ascii_case("nan") || v.eq_ignore_ascii_case("na")
}

fn parse<T: FromStr>(record: &StringRecord, idx: usize, name: &str, line: u64) -> Result<T> {
    let raw = record.get(idx).unwrap_or("").trim();
    raw.parse::<T>().map_err(|_| {
        PipelineError::SchemaMismatch(format!("line {}: bad {} value {:?}", line, name, raw))
    })
}

/// Reads raw observations with `hours` hourly targets.
///
/// `sum`, `location_name` and `date` are not kept; rows are ordered by `date`
/// when that column exists. Rows with an empty or `NaN`/`NA` hourly value are
/// dropped; any other count must be a finite whole number >= 0.
pub fn load_observations(path: impl AsRef<Path>, hours: usize) -> Result<Vec<Observation>> {
    let file = File::open(path.as_ref())?;
    let mut reader = Reader::from_reader(file);
    let headers = reader.headers()?.clone();

    let mut idx = [0usize; 6];
    for (slot, field) in idx.iter_mut().zip(Field::ALL) {
        *slot = column(&headers, field.name())?;
    }
    let [vehicle_type, location_id, direction, weekday, week, year] = idx;
    let hour_idx = (1..=hours)
        .map(|h| column(&headers, &hour_column(h)))
        .collect::<Result<Vec<_>>>()?;
    let date_idx = column(&headers, "date").ok();

    let mut keyed: Vec<(String, Observation)> = Vec::new();
    let mut dropped = 0usize;
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if hour_idx
            .iter()
            .any(|&i| record.get(i).map_or(true, is_absent))
        {
            warn!("line {}: absent hourly count, row dropped", line);
            dropped += 1;
            continue;
        }
        let counts = hour_idx
            .iter()
            .enumerate()
            .map(|(h, &i)| parse::<f64>(&record, i, &hour_column(h + 1), line))
            .collect::<Result<Vec<_>>>()?;
        // counts are whole, non-negative vehicle numbers
        if let Some(h) = counts
            .iter()
            .position(|c| !c.is_finite() || *c < 0.0 || c.fract() != 0.0)
        {
            return Err(PipelineError::SchemaMismatch(format!(
                "line {}: {} is not a vehicle count: {}",
                line,
                hour_column(h + 1),
                counts[h]
            )));
        }

        let obs = Observation {
            vehicle_type: record.get(vehicle_type).unwrap_or("").trim().to_string(),
            location_id: parse(&record, location_id, "location_id", line)?,
            direction: parse(&record, direction, "direction", line)?,
            weekday: parse(&record, weekday, "weekday", line)?,
            week: parse(&record, week, "week", line)?,
            year: parse(&record, year, "year", line)?,
            counts,
        };
        let date = date_idx
            .and_then(|i| record.get(i))
            .unwrap_or("")
            .to_string();
        keyed.push((date, obs));
    }

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    info!("loaded {} observations ({} dropped)", keyed.len(), dropped);
    Ok(keyed.into_iter().map(|(_, o)| o).collect())
}

pub fn write_report(path: impl AsRef<Path>, rows: &[TimeSeriesRow]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = Writer::from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
