use chrono::{DateTime, Datelike, NaiveDate};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::model::{Regressor, TrainedModel};
use crate::predict::predict;
use crate::types::Observation;

pub const DIRECTIONS: [u8; 2] = [1, 2];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parses a human-written calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .map_err(|_| PipelineError::InvalidDate(s.to_string()))
}

/// Query row for a date: ISO year, ISO week and Monday-based weekday.
pub fn query_row(date: NaiveDate, location_id: u32, vehicle_type: &str, direction: u8) -> Observation {
    let iso = date.iso_week();
    Observation::query(
        vehicle_type,
        location_id,
        direction,
        iso.year(),
        iso.week(),
        date.weekday().num_days_from_monday(),
    )
}

/// Predicted counts for every date × location × vehicle type × direction,
/// in that nesting order.
pub fn generate<R: Regressor>(
    model: &TrainedModel<R>,
    dates: &[String],
    location_ids: &[u32],
    vehicle_types: &[String],
) -> Result<Vec<Observation>> {
    let parsed = dates
        .iter()
        .map(|d| parse_date(d))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(parsed.len() * location_ids.len() * vehicle_types.len() * 2);
    for &date in &parsed {
        for &location_id in location_ids {
            for vehicle_type in vehicle_types {
                for direction in DIRECTIONS {
                    rows.push(query_row(date, location_id, vehicle_type, direction));
                }
            }
        }
    }
    if rows.is_empty() {
        return Ok(rows);
    }

    info!("predicting {} series rows", rows.len());
    let pred = predict(&rows, model)?;
    for (i, row) in rows.iter_mut().enumerate() {
        row.counts = pred.row(i).to_vec();
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_formats() {
        let want = NaiveDate::from_ymd_opt(2018, 6, 22).unwrap();
        for s in [
            "2018-06-22",
            "2018/06/22",
            "20180622",
            "22.06.2018",
            "06/22/2018",
            "June 22, 2018",
            "22 Jun 2018",
            "2018-06-22T08:30:00+03:00",
            " 2018-06-22 ",
        ] {
            assert_eq!(parse_date(s).unwrap(), want, "format {:?}", s);
        }
        assert!(matches!(parse_date("someday"), Err(PipelineError::InvalidDate(_))));
        assert!(matches!(parse_date("2018-02-30"), Err(PipelineError::InvalidDate(_))));
    }

    #[test]
    fn test_query_row_iso_fields() {
        // Friday of ISO week 25
        let row = query_row(NaiveDate::from_ymd_opt(2018, 6, 22).unwrap(), 168, "12 KAIP", 2);
        assert_eq!((row.year, row.week, row.weekday), (2018, 25, 4));
        assert!(row.counts.is_empty());

        // Monday that belongs to the next ISO year
        let row = query_row(NaiveDate::from_ymd_opt(2018, 12, 31).unwrap(), 168, "12 KAIP", 1);
        assert_eq!((row.year, row.week, row.weekday), (2019, 1, 0));
    }
}
