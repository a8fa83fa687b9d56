use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{PipelineError, Result};
use crate::table::Table;

/// Train/test partition of features (X) and targets (Y).
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Table,
    pub x_test: Table,
    pub y_train: Table,
    pub y_test: Table,
}

/// Random row partition without replacement.
#[derive(Debug, Clone)]
pub struct DatasetSplitter {
    test_fraction: f64,
    seed: Option<u64>,
}

impl DatasetSplitter {
    pub fn new(test_fraction: f64) -> Self {
        Self {
            test_fraction,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn split(&self, table: &Table, targets: &[String]) -> Result<Split> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test fraction {} outside (0, 1)",
                self.test_fraction
            )));
        }

        let y = table.select(targets)?;
        let x = table.without(targets);

        let n = table.n_rows();
        let n_test = (self.test_fraction * n as f64).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(PipelineError::InvalidConfig(format!(
                "{} rows cannot be split at test fraction {}",
                n, self.test_fraction
            )));
        }

        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        let (test_idx, train_idx) = indices.split_at(n_test);

        Ok(Split {
            x_train: x.take_rows(train_idx),
            x_test: x.take_rows(test_idx),
            y_train: y.take_rows(train_idx),
            y_test: y.take_rows(test_idx),
        })
    }
}

impl Default for DatasetSplitter {
    fn default() -> Self {
        Self::new(0.20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    // column "id" holds the row number so partitions can be traced
    fn table(n: usize) -> Table {
        let mut data = Array2::<f64>::zeros((n, 3));
        for i in 0..n {
            data[[i, 0]] = i as f64;
            data[[i, 1]] = 1.0;
            data[[i, 2]] = 10.0 * i as f64;
        }
        Table::new(vec!["id".into(), "flag".into(), "hour_1".into()], data).unwrap()
    }

    fn ids(t: &Table) -> Vec<usize> {
        t.column("id").unwrap().iter().map(|v| *v as usize).collect()
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let split = DatasetSplitter::new(0.2)
            .with_seed(7)
            .split(&table(10), &["hour_1".to_string()])
            .unwrap();
        assert_eq!(split.x_test.n_rows(), 2);
        assert_eq!(split.x_train.n_rows(), 8);

        let mut all = ids(&split.x_train);
        all.extend(ids(&split.x_test));
        all.sort();
        assert_eq!(all, (0..10).collect::<Vec<_>>());

        assert_eq!(split.x_train.columns(), &["id".to_string(), "flag".to_string()][..]);
        assert_eq!(split.y_train.columns(), &["hour_1".to_string()][..]);
        // targets stay aligned with their feature rows
        for (i, id) in ids(&split.x_test).into_iter().enumerate() {
            assert_eq!(split.y_test.row(i)[0], 10.0 * id as f64);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let splitter = DatasetSplitter::new(0.3).with_seed(42);
        let a = splitter.split(&table(20), &["hour_1".to_string()]).unwrap();
        let b = splitter.split(&table(20), &["hour_1".to_string()]).unwrap();
        assert_eq!(ids(&a.x_test), ids(&b.x_test));
    }

    #[test]
    fn test_missing_target_column() {
        let err = DatasetSplitter::default()
            .split(&table(5), &["hour_2".to_string()])
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingField(n) if n == "hour_2"));
    }

    #[test]
    fn test_bad_fraction_and_tiny_tables() {
        let targets = ["hour_1".to_string()];
        assert!(matches!(
            DatasetSplitter::new(1.0).split(&table(5), &targets),
            Err(PipelineError::InvalidConfig(_))
        ));
        assert!(matches!(
            DatasetSplitter::new(0.2).split(&table(1), &targets),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}
