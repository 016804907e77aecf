//! Model interfaces
//!
//! The estimator only needs two capabilities: a regressor and a binary
//! probabilistic classifier. Every fit works on a fresh clone of a prototype,
//! so implementations carry their hyperparameters and their fitted state in
//! the same value.
use crate::constants::{PIVOT_TOLERANCE, SVD_RCOND};
use crate::data::Matrix;
use crate::errors::WdrlError;
use log::debug;
use nalgebra::{DMatrix, DVector};

pub trait Regressor: Clone + Send + Sync {
    /// Fit `y ~ x`.
    fn fit(&mut self, x: &Matrix<f64>, y: &[f64]) -> Result<(), WdrlError>;
    /// Expected outcome for every row of `x`.
    fn predict(&self, x: &Matrix<f64>) -> Vec<f64>;
}

pub trait Classifier: Clone + Send + Sync {
    /// Fit `P(y = 1 | x)`, where `y` only holds `0.0` and `1.0`.
    fn fit(&mut self, x: &Matrix<f64>, y: &[f64]) -> Result<(), WdrlError>;
    /// `P(y = 1)` for every row of `x`.
    fn predict_proba(&self, x: &Matrix<f64>) -> Vec<f64>;
}

/// Column-major design matrix with a leading column of ones when
/// `intercept` is set.
pub(crate) fn design_matrix(x: &Matrix<f64>, intercept: bool) -> DMatrix<f64> {
    let values = &x.data[..x.rows * x.cols];
    if intercept {
        let mut data = Vec::with_capacity(x.rows * (x.cols + 1));
        data.resize(x.rows, 1.0);
        data.extend_from_slice(values);
        DMatrix::from_vec(x.rows, x.cols + 1, data)
    } else {
        DMatrix::from_column_slice(x.rows, x.cols, values)
    }
}

/// Solve `a * beta = b` for a symmetric positive semi-definite `a`.
///
/// Uses a Cholesky factorization, and falls back to an SVD least-squares
/// solve when `a` is singular or numerically close to it.
pub(crate) fn solve_symmetric(a: DMatrix<f64>, b: &DVector<f64>, model: &str) -> Result<DVector<f64>, WdrlError> {
    let scale = a.diagonal().amax();
    if let Some(chol) = a.clone().cholesky() {
        let min_pivot = chol.l().diagonal().iter().fold(f64::INFINITY, |m, v| m.min(v * v));
        if min_pivot > PIVOT_TOLERANCE * scale {
            return Ok(chol.solve(b));
        }
    }
    debug!("{} system is not positive definite, solving by SVD.", model);
    let svd = a.svd(true, true);
    let eps = svd.singular_values.max() * SVD_RCOND;
    svd.solve(b, eps)
        .map_err(|e| WdrlError::FitFailed(model.to_string(), e.to_string()))
}

/// `intercept + x * coefficients` for every row of `x`.
pub(crate) fn linear_predictor(x: &Matrix<f64>, intercept: f64, coefficients: &[f64]) -> Vec<f64> {
    let mut out = vec![intercept; x.rows];
    for (j, c) in coefficients.iter().enumerate() {
        for (o, v) in out.iter_mut().zip(x.get_col(j)) {
            *o += c * v;
        }
    }
    out
}

pub(crate) fn check_fit_input(x: &Matrix<f64>, y: &[f64], model: &str) -> Result<(), WdrlError> {
    if !x.is_consistent() || x.rows != y.len() {
        return Err(WdrlError::ShapeMismatch(format!(
            "{} got a {} x {} matrix backed by {} values and {} targets",
            model,
            x.rows,
            x.cols,
            x.data.len(),
            y.len()
        )));
    }
    if x.rows == 0 {
        return Err(WdrlError::InsufficientData(format!("{} cannot be fitted on zero rows", model)));
    }
    Ok(())
}
