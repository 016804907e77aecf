//! Data
//!
//! A borrowed column-major [`Matrix`] view used by every model, and the owned
//! [`Dataset`] of unit records (covariates, outcome, treatment combination).
use crate::combination::{Combination, TreatmentSet};
use crate::errors::WdrlError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Contiguous Column Major Matrix data container.
///
/// This structure holds a dense matrix of values in a single contiguous memory block,
/// in column-major order (Fortran-style), which allows for efficient column slicing.
///
/// # Type Parameters
/// * `T` - The numeric type of the data (e.g., `f32`, `f64`).
pub struct Matrix<'a, T> {
    /// The raw data stored in a single slice.
    pub data: &'a [T],
    /// Number of rows in the matrix.
    pub rows: usize,
    /// Number of columns in the matrix.
    pub cols: usize,
}

impl<'a, T> Matrix<'a, T> {
    /// Create a new Matrix.
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Self {
        Matrix { data, rows, cols }
    }

    /// Get an entire column in the matrix.
    ///
    /// * `col` - The index of the column to get.
    pub fn get_col(&self, col: usize) -> &[T] {
        &self.data[col * self.rows..(col + 1) * self.rows]
    }

    /// Whether the backing slice holds exactly `rows * cols` values.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.rows * self.cols
    }
}

impl<'a, T> Matrix<'a, T>
where
    T: Copy,
{
    /// Copy the given rows, in order, into a new column-major buffer with
    /// `indices.len()` rows and the same number of columns.
    pub fn select_rows(&self, indices: &[usize]) -> Vec<T> {
        let mut out = Vec::with_capacity(indices.len() * self.cols);
        for col in 0..self.cols {
            let col_data = self.get_col(col);
            out.extend(indices.iter().map(|&i| col_data[i]));
        }
        out
    }
}

/// Ordered collection of unit records.
///
/// Covariates are stored column-major. Every unit has exactly one outcome and
/// one treatment combination.
#[derive(Debug, Clone)]
pub struct Dataset {
    covariates: Vec<f64>,
    outcomes: Vec<f64>,
    combinations: Vec<Combination>,
    rows: usize,
    cols: usize,
}

impl Dataset {
    /// Create a dataset from owned column-major covariates.
    ///
    /// * `covariates` - `rows * cols` values, column-major.
    /// * `rows` - Number of units.
    /// * `cols` - Number of covariates.
    /// * `outcomes` - One outcome per unit.
    /// * `combinations` - One treatment combination per unit.
    pub fn new(
        covariates: Vec<f64>,
        rows: usize,
        cols: usize,
        outcomes: Vec<f64>,
        combinations: Vec<Combination>,
    ) -> Result<Self, WdrlError> {
        if covariates.len() != rows * cols {
            return Err(WdrlError::ShapeMismatch(format!(
                "covariates hold {} values, expected {} rows x {} columns",
                covariates.len(),
                rows,
                cols
            )));
        }
        if outcomes.len() != rows {
            return Err(WdrlError::ShapeMismatch(format!(
                "{} outcomes provided for {} units",
                outcomes.len(),
                rows
            )));
        }
        if combinations.len() != rows {
            return Err(WdrlError::ShapeMismatch(format!(
                "{} combinations provided for {} units",
                combinations.len(),
                rows
            )));
        }
        if let Some(v) = covariates.iter().chain(outcomes.iter()).find(|v| !v.is_finite()) {
            return Err(WdrlError::InvalidParameter(
                "data".to_string(),
                "finite covariates and outcomes".to_string(),
                v.to_string(),
            ));
        }
        Ok(Dataset {
            covariates,
            outcomes,
            combinations,
            rows,
            cols,
        })
    }

    /// Copy a dataset out of borrowed inputs.
    pub fn from_matrix(x: &Matrix<f64>, outcomes: &[f64], combinations: &[Combination]) -> Result<Self, WdrlError> {
        if !x.is_consistent() {
            return Err(WdrlError::ShapeMismatch(format!(
                "matrix holds {} values, expected {} rows x {} columns",
                x.data.len(),
                x.rows,
                x.cols
            )));
        }
        Dataset::new(
            x.data.to_vec(),
            x.rows,
            x.cols,
            outcomes.to_vec(),
            combinations.to_vec(),
        )
    }

    /// Create a dataset from per-treatment binary indicator columns.
    ///
    /// * `indicators` - One column per treatment of `treatments`, each with one
    ///   entry per unit.
    pub fn from_indicators(
        covariates: Vec<f64>,
        rows: usize,
        cols: usize,
        outcomes: Vec<f64>,
        indicators: &[Vec<bool>],
        treatments: &TreatmentSet,
    ) -> Result<Self, WdrlError> {
        if indicators.len() != treatments.len() {
            return Err(WdrlError::ShapeMismatch(format!(
                "{} indicator columns provided for {} treatments",
                indicators.len(),
                treatments.len()
            )));
        }
        if let Some(col) = indicators.iter().find(|col| col.len() != rows) {
            return Err(WdrlError::ShapeMismatch(format!(
                "indicator column has {} entries for {} units",
                col.len(),
                rows
            )));
        }
        let combinations = (0..rows)
            .map(|i| {
                let unit: Vec<bool> = indicators.iter().map(|col| col[i]).collect();
                Combination::from_indicators(&unit)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Dataset::new(covariates, rows, cols, outcomes, combinations)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn covariates(&self) -> Matrix<'_, f64> {
        Matrix::new(&self.covariates, self.rows, self.cols)
    }

    pub fn outcomes(&self) -> &[f64] {
        &self.outcomes
    }

    pub fn combinations(&self) -> &[Combination] {
        &self.combinations
    }

    /// Units at the given positions, in order.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            covariates: self.covariates().select_rows(indices),
            outcomes: indices.iter().map(|&i| self.outcomes[i]).collect(),
            combinations: indices.iter().map(|&i| self.combinations[i]).collect(),
            rows: indices.len(),
            cols: self.cols,
        }
    }

    /// Shuffle the units with a seeded generator and split them into a
    /// training and a held-out partition.
    ///
    /// * `test_size` - Fraction of units held out, in `[0, 1)`.
    /// * `seed` - Seed of the shuffle.
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> Result<(Dataset, Dataset), WdrlError> {
        if !(0.0..1.0).contains(&test_size) {
            return Err(WdrlError::InvalidParameter(
                "test_size".to_string(),
                "a fraction in [0, 1)".to_string(),
                test_size.to_string(),
            ));
        }
        let mut index: Vec<usize> = (0..self.rows).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        index.shuffle(&mut rng);
        let n_test = (self.rows as f64 * test_size).round() as usize;
        let (test, train) = index.split_at(n_test);
        Ok((self.subset(train), self.subset(test)))
    }
}
