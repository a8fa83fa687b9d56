use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

use crate::error::{PipelineError, Result};
use crate::types::Field;

#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("model has not been fitted yet")]
    NotFitted,

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("empty training data")]
    Empty,

    #[error("invalid alpha value: {0}")]
    InvalidAlpha(f64),

    #[error("computation error: {0}")]
    Computation(String),
}

/// Multi-output regression capability the pipeline trains and queries.
pub trait Regressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> std::result::Result<(), EstimatorError>;

    fn predict(&self, x: &Array2<f64>) -> std::result::Result<Array2<f64>, EstimatorError>;

    /// Coefficient of determination, uniformly averaged over targets.
    fn score(&self, x: &Array2<f64>, y: &Array2<f64>) -> std::result::Result<f64, EstimatorError> {
        let pred = self.predict(x)?;
        if pred.dim() != y.dim() {
            return Err(EstimatorError::DimensionMismatch {
                expected: y.ncols(),
                got: pred.ncols(),
            });
        }
        Ok(r2_score(y, &pred))
    }
}

pub fn r2_score(y_true: &Array2<f64>, y_pred: &Array2<f64>) -> f64 {
    let n_targets = y_true.ncols();
    if n_targets == 0 {
        return 0.0;
    }
    let mut total = 0.0;
    for (t, p) in y_true.columns().into_iter().zip(y_pred.columns()) {
        let mean = t.mean().unwrap_or(0.0);
        let ss_res: f64 = t.iter().zip(p.iter()).map(|(a, b)| (a - b).powi(2)).sum();
        let ss_tot: f64 = t.iter().map(|a| (a - mean).powi(2)).sum();
        total += if ss_tot == 0.0 {
            // constant target: perfect or nothing
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };
    }
    total / n_targets as f64
}

/// Ridge regression with one coefficient column per target.
///
/// Solves `(XᵀX + αI) B = XᵀY` on centered data, so the intercepts are
/// not penalized and collinear indicator groups stay solvable.
#[derive(Debug, Clone)]
pub struct RidgeRegressor {
    alpha: f64,
    coefficients: Option<Array2<f64>>, // [n_features, n_targets]
    intercept: Option<Array1<f64>>,    // [n_targets]
}

impl RidgeRegressor {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            coefficients: None,
            intercept: None,
        }
    }

    pub fn coefficients(&self) -> Option<&Array2<f64>> {
        self.coefficients.as_ref()
    }
}

impl Default for RidgeRegressor {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Regressor for RidgeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> std::result::Result<(), EstimatorError> {
        if !(self.alpha > 0.0) {
            return Err(EstimatorError::InvalidAlpha(self.alpha));
        }
        if x.nrows() == 0 || y.ncols() == 0 {
            return Err(EstimatorError::Empty);
        }
        if x.nrows() != y.nrows() {
            return Err(EstimatorError::DimensionMismatch {
                expected: x.nrows(),
                got: y.nrows(),
            });
        }

        let x_mean = x.mean_axis(Axis(0)).ok_or(EstimatorError::Empty)?;
        let y_mean = y.mean_axis(Axis(0)).ok_or(EstimatorError::Empty)?;
        let xc = x - &x_mean;
        let yc = y - &y_mean;

        let mut a = xc.t().dot(&xc);
        for i in 0..a.nrows() {
            a[[i, i]] += self.alpha;
        }
        let b = xc.t().dot(&yc);

        let coefficients = cholesky_solve(&a, &b)?;
        let intercept = &y_mean - &x_mean.dot(&coefficients);

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> std::result::Result<Array2<f64>, EstimatorError> {
        let (coef, intercept) = match (&self.coefficients, &self.intercept) {
            (Some(c), Some(i)) => (c, i),
            _ => return Err(EstimatorError::NotFitted),
        };
        if x.ncols() != coef.nrows() {
            return Err(EstimatorError::DimensionMismatch {
                expected: coef.nrows(),
                got: x.ncols(),
            });
        }
        Ok(x.dot(coef) + intercept)
    }
}

/// Solves `A X = B` for symmetric positive definite `A`.
fn cholesky_solve(a: &Array2<f64>, b: &Array2<f64>) -> std::result::Result<Array2<f64>, EstimatorError> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return Err(EstimatorError::Computation(
                        "matrix not positive definite".to_string(),
                    ));
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    let mut out = Array2::<f64>::zeros(b.raw_dim());
    for col in 0..b.ncols() {
        // L z = b
        let mut z = vec![0.0; n];
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..i {
                sum += l[[i, j]] * z[j];
            }
            z[i] = (b[[i, col]] - sum) / l[[i, i]];
        }
        // Lᵀ x = z
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += l[[j, i]] * out[[j, col]];
            }
            out[[i, col]] = (z[i] - sum) / l[[i, i]];
        }
    }
    Ok(out)
}

/// Column layout a model was fitted with; the only contract used to lay out
/// query rows at prediction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub categorical_fields: Vec<Field>,
    pub features: Vec<String>,
    pub targets: Vec<String>,
}

impl ModelSchema {
    pub fn validate(&self) -> Result<()> {
        if self.categorical_fields.is_empty() {
            return Err(PipelineError::SchemaMismatch("no categorical fields recorded".into()));
        }
        if self.features.is_empty() {
            return Err(PipelineError::SchemaMismatch("no feature columns recorded".into()));
        }
        if self.targets.is_empty() {
            return Err(PipelineError::SchemaMismatch("no target columns recorded".into()));
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let txt = fs::read_to_string(path.as_ref())?;
        let schema: ModelSchema = serde_json::from_str(&txt)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let txt = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), txt)?;
        Ok(())
    }
}

/// A fitted estimator together with the schema it was fitted on.
#[derive(Debug, Clone)]
pub struct TrainedModel<R> {
    estimator: R,
    schema: ModelSchema,
}

impl<R: Regressor> TrainedModel<R> {
    pub fn new(estimator: R, schema: ModelSchema) -> Result<Self> {
        schema.validate()?;
        Ok(Self { estimator, schema })
    }

    pub fn estimator(&self) -> &R {
        &self.estimator
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    pub fn features(&self) -> &[String] {
        &self.schema.features
    }

    pub fn targets(&self) -> &[String] {
        &self.schema.targets
    }
}
