use rand::seq::SliceRandom;
use rand::Rng;

use crate::encoder::CategoryEncoder;
use crate::error::{PipelineError, Result};
use crate::model::{Regressor, TrainedModel};
use crate::table::Table;
use crate::types::Observation;

/// Predicts target values for raw observations.
///
/// Rows are encoded with the model's categorical fields and then laid out as
/// exactly the recorded feature columns: indicators the rows lack are zero,
/// indicators unknown to the model are dropped. The result has one column per
/// recorded target, in order.
pub fn predict<R: Regressor>(rows: &[Observation], model: &TrainedModel<R>) -> Result<Table> {
    let encoder = CategoryEncoder::new(model.schema().categorical_fields.clone());
    let encoded = encoder.encode(rows)?;
    let x = encoded.table.conform(model.features());

    let out = model.estimator().predict(x.data())?;
    if out.ncols() != model.targets().len() {
        return Err(PipelineError::SchemaMismatch(format!(
            "estimator returned {} columns for {} targets",
            out.ncols(),
            model.targets().len()
        )));
    }
    Table::new(model.targets().to_vec(), out)
}

/// One target of a sampled observation: (target, actual, predicted).
pub type SampleLine = (String, Option<f64>, f64);

/// Predicts one randomly chosen observation and lines its known counts up
/// with the predictions.
pub fn sample_prediction<R: Regressor, G: Rng + ?Sized>(
    observations: &[Observation],
    model: &TrainedModel<R>,
    rng: &mut G,
) -> Result<Option<Vec<SampleLine>>> {
    let sample = match observations.choose(rng) {
        Some(s) => s,
        None => return Ok(None),
    };
    let pred = predict(std::slice::from_ref(sample), model)?;
    let lines = model
        .targets()
        .iter()
        .zip(pred.row(0).iter())
        .enumerate()
        .map(|(i, (name, p))| (name.clone(), sample.counts.get(i).copied(), *p))
        .collect();
    Ok(Some(lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RidgeRegressor;
    use crate::split::DatasetSplitter;
    use crate::train::train;
    use crate::types::hour_column;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn history() -> Vec<Observation> {
        let mut rows = Vec::new();
        for (vt, base) in [("11 HA-PA", 100.0), ("12 KAIP", 20.0)] {
            for location_id in [168, 1403] {
                for direction in [1u8, 2] {
                    for weekday in 0..7u32 {
                        let mut row = Observation::query(vt, location_id, direction, 2018, 24, weekday);
                        row.counts = (1..=24)
                            .map(|h| base + h as f64 + direction as f64 + weekday as f64)
                            .collect();
                        rows.push(row);
                    }
                }
            }
        }
        rows
    }

    fn fitted() -> TrainedModel<RidgeRegressor> {
        let encoder = CategoryEncoder::default();
        let frame = encoder.encode(&history()).unwrap();
        let targets: Vec<String> = (1..=24).map(hour_column).collect();
        let split = DatasetSplitter::new(0.2)
            .with_seed(3)
            .split(&frame.table, &targets)
            .unwrap();
        train(&split.x_train, &split.y_train, encoder.fields(), RidgeRegressor::new(0.1)).unwrap()
    }

    #[test]
    fn test_prediction_has_one_column_per_target() {
        let model = fitted();
        let q = vec![
            Observation::query("11 HA-PA", 168, 1, 2018, 25, 4),
            Observation::query("12 KAIP", 1403, 2, 2018, 25, 5),
        ];
        let out = predict(&q, &model).unwrap();
        assert_eq!(out.columns(), model.targets());
        assert_eq!(out.n_rows(), 2);
    }

    #[test]
    fn test_unseen_categories_do_not_fail() {
        let model = fitted();
        // location 110, week 40 and a bus label never appear in history
        let q = vec![Observation::query("13 Linja-autot", 110, 1, 2018, 40, 2)];
        let out = predict(&q, &model).unwrap();
        assert_eq!(out.columns().len(), 24);

        // unseen indicators contribute zeros, same as leaving them out entirely
        let encoded = CategoryEncoder::default().encode(&q).unwrap();
        let x = encoded.table.conform(model.features());
        assert_eq!(x.column("location_id_168").unwrap()[0], 0.0);
        assert_eq!(x.column("location_id_1403").unwrap()[0], 0.0);
        assert!(x.column("location_id_110").is_none());
        assert_eq!(x.column("direction_1").unwrap()[0], 1.0);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let model = fitted();
        let q = vec![Observation::query("11 HA-PA", 168, 2, 2018, 24, 3)];
        assert_eq!(predict(&q, &model).unwrap(), predict(&q, &model).unwrap());
    }

    #[test]
    fn test_sample_prediction_lines_up_actuals() {
        let model = fitted();
        let data = history();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let lines = sample_prediction(&data, &model, &mut rng).unwrap().unwrap();
        assert_eq!(lines.len(), 24);
        assert_eq!(lines[0].0, "hour_1");
        assert!(lines.iter().all(|(_, actual, _)| actual.is_some()));

        assert!(sample_prediction(&[], &model, &mut rng).unwrap().is_none());
    }
}
