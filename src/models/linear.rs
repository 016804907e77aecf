//! Ordinary least squares
//!
//! Linear outcome and effect regressions, solved on the normal equations.
use crate::data::Matrix;
use crate::errors::WdrlError;
use crate::models::model::{check_fit_input, design_matrix, linear_predictor, solve_symmetric, Regressor};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Linear regression fitted by least squares on the normal equations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Whether to fit an intercept term.
    pub fit_intercept: bool,
    /// Fitted intercept, zero when `fit_intercept` is false.
    pub intercept: f64,
    /// Fitted slope per covariate.
    pub coefficients: Vec<f64>,
}

impl Default for LinearRegression {
    fn default() -> Self {
        LinearRegression {
            fit_intercept: true,
            intercept: 0.0,
            coefficients: Vec::new(),
        }
    }
}

impl LinearRegression {
    pub fn new(fit_intercept: bool) -> Self {
        LinearRegression {
            fit_intercept,
            ..Default::default()
        }
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Matrix<f64>, y: &[f64]) -> Result<(), WdrlError> {
        check_fit_input(x, y, "linear regression")?;
        let design = design_matrix(x, self.fit_intercept);
        let target = DVector::from_column_slice(y);
        let gram = design.tr_mul(&design);
        let moment = design.tr_mul(&target);
        let beta = solve_symmetric(gram, &moment, "linear regression")?;
        if beta.iter().any(|b| !b.is_finite()) {
            return Err(WdrlError::FitFailed(
                "linear regression".to_string(),
                "non-finite coefficients".to_string(),
            ));
        }
        if self.fit_intercept {
            self.intercept = beta[0];
            self.coefficients = beta.iter().skip(1).copied().collect();
        } else {
            self.intercept = 0.0;
            self.coefficients = beta.iter().copied().collect();
        }
        Ok(())
    }

    fn predict(&self, x: &Matrix<f64>) -> Vec<f64> {
        linear_predictor(x, self.intercept, &self.coefficients)
    }
}
