use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{PipelineError, Result};
use crate::table::Table;
use crate::types::{hour_column, CategoryValue, Field, Observation};

/// Ordered (field, value) pairs, one per indicator column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySchema {
    pub indicators: Vec<(Field, CategoryValue)>,
}

impl CategorySchema {
    pub fn column_name(field: Field, value: &CategoryValue) -> String {
        format!("{}_{}", field.name(), value)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.indicators
            .iter()
            .map(|(f, v)| Self::column_name(*f, v))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}

/// Observations in numeric form, plus the indicator schema seen while encoding.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub table: Table,
    pub schema: CategorySchema,
}

/// One-hot encoder over a fixed set of categorical fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    fields: Vec<Field>,
}

impl CategoryEncoder {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let fields = names
            .iter()
            .map(|n| n.as_ref().parse::<Field>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(fields))
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Columns: numeric passthrough fields, then `hour_N` counts, then one
    /// indicator per distinct value of each categorical field (ascending).
    pub fn encode(&self, rows: &[Observation]) -> Result<EncodedFrame> {
        let passthrough: Vec<Field> = Field::ALL
            .into_iter()
            .filter(|f| !self.fields.contains(f))
            .collect();
        if passthrough.contains(&Field::VehicleType) {
            return Err(PipelineError::SchemaMismatch(
                "vehicle_type is textual and must be encoded as a category".to_string(),
            ));
        }

        let n_hours = rows.first().map(|r| r.counts.len()).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.counts.len() != n_hours) {
            return Err(PipelineError::SchemaMismatch(format!(
                "rows carry {} and {} hourly counts",
                n_hours,
                bad.counts.len()
            )));
        }

        let mut indicators = Vec::new();
        for &field in &self.fields {
            let distinct: BTreeSet<CategoryValue> = rows.iter().map(|r| r.value(field)).collect();
            indicators.extend(distinct.into_iter().map(|v| (field, v)));
        }
        let schema = CategorySchema { indicators };

        let mut columns: Vec<String> = passthrough.iter().map(|f| f.name().to_string()).collect();
        columns.extend((1..=n_hours).map(hour_column));
        columns.extend(schema.column_names());

        let mut data = Array2::<f64>::zeros((rows.len(), columns.len()));
        for (i, row) in rows.iter().enumerate() {
            let mut j = 0;
            for &field in &passthrough {
                data[[i, j]] = row.numeric(field).unwrap_or_default();
                j += 1;
            }
            for &count in &row.counts {
                data[[i, j]] = count;
                j += 1;
            }
            for (field, value) in &schema.indicators {
                if row.value(*field) == *value {
                    data[[i, j]] = 1.0;
                }
                j += 1;
            }
        }

        Ok(EncodedFrame {
            table: Table::new(columns, data)?,
            schema,
        })
    }
}

impl Default for CategoryEncoder {
    fn default() -> Self {
        Self::new(vec![
            Field::VehicleType,
            Field::LocationId,
            Field::Direction,
            Field::Weekday,
            Field::Week,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Observation> {
        let mut a = Observation::query("11 HA-PA", 168, 1, 2018, 25, 4);
        a.counts = vec![10.0, 12.0];
        let mut b = Observation::query("12 KAIP", 1403, 2, 2018, 25, 5);
        b.counts = vec![3.0, 4.0];
        let mut c = Observation::query("11 HA-PA", 110, 2, 2017, 26, 4);
        c.counts = vec![1.0, 2.0];
        vec![a, b, c]
    }

    #[test]
    fn test_column_layout() {
        let frame = CategoryEncoder::default().encode(&rows()).unwrap();
        let cols = frame.table.columns();
        assert_eq!(&cols[..3], &["year", "hour_1", "hour_2"]);
        assert_eq!(
            &cols[3..6],
            &["vehicle_type_11 HA-PA", "vehicle_type_12 KAIP", "location_id_110"]
        );
        assert!(cols.contains(&"week_26".to_string()));
        assert_eq!(cols.len(), 3 + frame.schema.len());
        assert_eq!(frame.table.column("year").unwrap().to_vec(), vec![2018.0, 2018.0, 2017.0]);
    }

    #[test]
    fn test_one_hot_exactness() {
        let encoder = CategoryEncoder::default();
        let frame = encoder.encode(&rows()).unwrap();
        for &field in encoder.fields() {
            let group: Vec<String> = frame
                .schema
                .indicators
                .iter()
                .filter(|(f, _)| *f == field)
                .map(|(f, v)| CategorySchema::column_name(*f, v))
                .collect();
            let sub = frame.table.select(&group).unwrap();
            for i in 0..sub.n_rows() {
                assert_eq!(sub.row(i).sum(), 1.0, "{} group is not one-hot in row {}", field, i);
            }
        }
    }

    #[test]
    fn test_indicator_lookup_matches_row_value() {
        let data = rows();
        let frame = CategoryEncoder::default().encode(&data).unwrap();
        let hit = frame.table.column("location_id_1403").unwrap();
        assert_eq!(hit.to_vec(), vec![0.0, 1.0, 0.0]);
        let ha_pa = frame.table.column("vehicle_type_11 HA-PA").unwrap();
        assert_eq!(ha_pa.to_vec(), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_query_rows_have_no_count_columns() {
        let q = vec![Observation::query("13 Linja-autot", 168, 1, 2018, 25, 4)];
        let frame = CategoryEncoder::default().encode(&q).unwrap();
        assert!(frame.table.column("hour_1").is_none());
        assert_eq!(frame.table.n_rows(), 1);
    }

    #[test]
    fn test_unknown_field_name_is_missing_field() {
        let err = CategoryEncoder::from_names(&["vehicle_type", "lane"]).unwrap_err();
        assert!(matches!(err, PipelineError::MissingField(n) if n == "lane"));
    }

    #[test]
    fn test_vehicle_type_must_be_categorical() {
        let encoder = CategoryEncoder::new(vec![Field::LocationId]);
        assert!(matches!(
            encoder.encode(&rows()),
            Err(PipelineError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_uneven_counts_rejected() {
        let mut data = rows();
        data[1].counts.pop();
        assert!(matches!(
            CategoryEncoder::default().encode(&data),
            Err(PipelineError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let data = rows();
        let before = data.clone();
        let _ = CategoryEncoder::default().encode(&data).unwrap();
        assert_eq!(data, before);
    }
}
