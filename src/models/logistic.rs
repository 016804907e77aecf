//! Unregularized logistic regression
//!
//! Maximum likelihood fit by Newton-Raphson (iteratively reweighted least
//! squares) with step halving whenever a full step lowers the log-likelihood.
//! No penalty is applied, so predicted probabilities are not shrunk towards
//! one half.
use crate::constants::{LOGISTIC_MAX_ITER, LOGISTIC_TOLERANCE, MAX_STEP_HALVINGS};
use crate::data::Matrix;
use crate::errors::WdrlError;
use crate::models::model::{check_fit_input, design_matrix, linear_predictor, solve_symmetric, Classifier};
use crate::utils::{sigmoid, softplus, validate_positive_float_parameter};
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Binary logistic regression with an intercept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Maximum number of Newton iterations.
    pub max_iter: usize,
    /// Convergence threshold on the largest absolute coefficient update.
    pub tolerance: f64,
    /// Fitted intercept on the log-odds scale.
    pub intercept: f64,
    /// Fitted log-odds slope per covariate.
    pub coefficients: Vec<f64>,
    /// Iterations used by the last fit.
    pub n_iter: usize,
    /// Whether the last fit met the tolerance.
    pub converged: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        LogisticRegression::new(LOGISTIC_MAX_ITER, LOGISTIC_TOLERANCE)
    }
}

impl LogisticRegression {
    pub fn new(max_iter: usize, tolerance: f64) -> Self {
        LogisticRegression {
            max_iter,
            tolerance,
            intercept: 0.0,
            coefficients: Vec::new(),
            n_iter: 0,
            converged: false,
        }
    }

    /// Log-odds for every row of `x`.
    pub fn decision_function(&self, x: &Matrix<f64>) -> Vec<f64> {
        linear_predictor(x, self.intercept, &self.coefficients)
    }
}

fn log_likelihood(design: &DMatrix<f64>, y: &DVector<f64>, beta: &DVector<f64>) -> f64 {
    let eta = design * beta;
    eta.iter().zip(y.iter()).map(|(e, yi)| yi * e - softplus(*e)).sum()
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Matrix<f64>, y: &[f64]) -> Result<(), WdrlError> {
        check_fit_input(x, y, "logistic regression")?;
        validate_positive_float_parameter(self.tolerance, "tolerance")?;
        if let Some(v) = y.iter().find(|v| **v != 0.0 && **v != 1.0) {
            return Err(WdrlError::InvalidParameter(
                "y".to_string(),
                "binary labels 0 or 1".to_string(),
                v.to_string(),
            ));
        }

        let design = design_matrix(x, true);
        let target = DVector::from_column_slice(y);
        let mut beta = DVector::<f64>::zeros(design.ncols());
        let mut ll = log_likelihood(&design, &target, &beta);
        self.converged = false;
        self.n_iter = 0;

        for iter in 0..self.max_iter {
            self.n_iter = iter + 1;
            let mu = (&design * &beta).map(sigmoid);
            let weights = mu.map(|p| p * (1.0 - p));
            let gradient = design.tr_mul(&(&target - &mu));
            let mut weighted = design.clone();
            for mut col in weighted.column_iter_mut() {
                col.component_mul_assign(&weights);
            }
            let hessian = design.tr_mul(&weighted);
            let step = solve_symmetric(hessian, &gradient, "logistic regression")?;

            let mut scale = 1.0;
            let mut candidate = &beta + &step;
            let mut candidate_ll = log_likelihood(&design, &target, &candidate);
            let mut halvings = 0;
            while !(candidate_ll.is_finite() && candidate_ll >= ll) && halvings < MAX_STEP_HALVINGS {
                scale *= 0.5;
                candidate = &beta + &step * scale;
                candidate_ll = log_likelihood(&design, &target, &candidate);
                halvings += 1;
            }
            if !(candidate_ll.is_finite() && candidate_ll >= ll) {
                // No step improves the likelihood, the current estimate is a maximum.
                debug!("Logistic regression step halving exhausted at iteration {}.", self.n_iter);
                self.converged = true;
                break;
            }

            let change = step.amax() * scale;
            beta = candidate;
            ll = candidate_ll;
            if change < self.tolerance {
                self.converged = true;
                break;
            }
        }

        if !self.converged {
            warn!(
                "Logistic regression did not converge in {} iterations, the classes may be separable.",
                self.max_iter
            );
        }
        if beta.iter().any(|b| !b.is_finite()) {
            return Err(WdrlError::FitFailed(
                "logistic regression".to_string(),
                "non-finite coefficients".to_string(),
            ));
        }
        self.intercept = beta[0];
        self.coefficients = beta.iter().skip(1).copied().collect();
        Ok(())
    }

    fn predict_proba(&self, x: &Matrix<f64>) -> Vec<f64> {
        self.decision_function(x).into_iter().map(sigmoid).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;

    #[test]
    fn test_recovers_coefficients() {
        let n = 5000;
        let mut rng = StdRng::seed_from_u64(11);
        let x0: Vec<f64> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
        let x1: Vec<f64> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
        let y: Vec<f64> = (0..n)
            .map(|i| {
                let p = sigmoid(-0.5 + 1.0 * x0[i] - 0.8 * x1[i]);
                if rng.gen::<f64>() < p {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        let mut data = x0.clone();
        data.extend(&x1);
        let x = Matrix::new(&data, n, 2);

        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();
        assert!(model.converged);
        assert!((model.intercept + 0.5).abs() < 0.15, "intercept {}", model.intercept);
        assert!((model.coefficients[0] - 1.0).abs() < 0.15, "{:?}", model.coefficients);
        assert!((model.coefficients[1] + 0.8).abs() < 0.15, "{:?}", model.coefficients);

        let probs = model.predict_proba(&x);
        assert_eq!(probs.len(), n);
        assert!(probs.iter().all(|p| *p > 0.0 && *p < 1.0));
    }

    #[test]
    fn test_intercept_only_matches_base_rate() {
        let data = vec![0.0; 8];
        let x = Matrix::new(&data, 8, 1);
        let y = vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();
        let p = model.predict_proba(&x);
        assert!((p[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_separable_data_stays_finite() {
        let data: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let x = Matrix::new(&data, 20, 1);
        let y: Vec<f64> = (0..20).map(|i| if i < 10 { 0.0 } else { 1.0 }).collect();
        let mut model = LogisticRegression::new(25, 1e-8);
        model.fit(&x, &y).unwrap();
        let p = model.predict_proba(&x);
        assert!(p.iter().all(|v| v.is_finite()));
        assert!(p[0] < 0.05);
        assert!(p[19] > 0.95);
    }

    #[test]
    fn test_rejects_non_binary_labels() {
        let data = vec![0.0, 1.0, 2.0];
        let x = Matrix::new(&data, 3, 1);
        let mut model = LogisticRegression::default();
        assert!(matches!(
            model.fit(&x, &[0.0, 0.5, 1.0]),
            Err(WdrlError::InvalidParameter(..))
        ));
    }
}
