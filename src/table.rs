use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{PipelineError, Result};

/// Numeric table with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    data: Array2<f64>,
}

impl Table {
    pub fn new(columns: Vec<String>, data: Array2<f64>) -> Result<Self> {
        if columns.len() != data.ncols() {
            return Err(PipelineError::SchemaMismatch(format!(
                "{} column names for {} columns",
                columns.len(),
                data.ncols()
            )));
        }
        Ok(Self { columns, data })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|i| self.data.column(i))
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    /// Columns `names`, in that order. Fails on the first absent name.
    pub fn select(&self, names: &[String]) -> Result<Table> {
        let idx = names
            .iter()
            .map(|n| {
                self.column_index(n)
                    .ok_or_else(|| PipelineError::MissingField(n.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Table {
            columns: names.to_vec(),
            data: self.data.select(Axis(1), &idx),
        })
    }

    /// Every column except `names`, keeping the remaining order.
    pub fn without(&self, names: &[String]) -> Table {
        let keep: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !names.contains(c))
            .cloned()
            .collect();
        let idx: Vec<usize> = keep.iter().filter_map(|c| self.column_index(c)).collect();
        Table {
            columns: keep,
            data: self.data.select(Axis(1), &idx),
        }
    }

    /// Lays the table out as exactly `names`; absent columns are zero-filled,
    /// columns not in `names` are dropped.
    pub fn conform(&self, names: &[String]) -> Table {
        let mut data = Array2::<f64>::zeros((self.n_rows(), names.len()));
        for (j, name) in names.iter().enumerate() {
            if let Some(src) = self.column(name) {
                data.column_mut(j).assign(&src);
            }
        }
        Table {
            columns: names.to_vec(),
            data,
        }
    }

    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            data: self.data.select(Axis(0), indices),
        }
    }
}
