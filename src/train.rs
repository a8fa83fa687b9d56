use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::model::{ModelSchema, Regressor, TrainedModel};
use crate::table::Table;
use crate::types::Field;

/// Fits `model` and records the exact feature and target columns it saw.
pub fn train<R: Regressor>(
    x_train: &Table,
    y_train: &Table,
    categorical_fields: &[Field],
    mut model: R,
) -> Result<TrainedModel<R>> {
    if x_train.n_rows() == 0 || y_train.n_rows() == 0 {
        return Err(PipelineError::SchemaMismatch("empty training data".into()));
    }
    if x_train.n_rows() != y_train.n_rows() {
        return Err(PipelineError::SchemaMismatch(format!(
            "{} feature rows but {} target rows",
            x_train.n_rows(),
            y_train.n_rows()
        )));
    }

    info!(
        "fitting on {} rows, {} features -> {} targets",
        x_train.n_rows(),
        x_train.columns().len(),
        y_train.columns().len()
    );
    model.fit(x_train.data(), y_train.data())?;

    let schema = ModelSchema {
        categorical_fields: categorical_fields.to_vec(),
        features: x_train.columns().to_vec(),
        targets: y_train.columns().to_vec(),
    };
    debug!("recorded features: {:?}", schema.features);
    TrainedModel::new(model, schema)
}

/// R² of the model on held-out rows.
pub fn evaluate<R: Regressor>(x_test: &Table, y_test: &Table, model: &TrainedModel<R>) -> Result<f64> {
    let x = x_test.select(model.features())?;
    let y = y_test.select(model.targets())?;
    Ok(model.estimator().score(x.data(), y.data())?)
}
