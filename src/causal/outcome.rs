//! Outcome Regressors
//!
//! One regression per arm of a matched pair. Both are used to predict
//! counterfactual outcomes for units of the other arm.
use crate::data::Matrix;
use crate::errors::WdrlError;
use crate::models::Regressor;

/// Outcome models of the two arms of a matched pair.
#[derive(Debug, Clone)]
pub struct OutcomeModels<R> {
    /// Fitted on `arm = 0` units, predicts $\hat{m}_0(x)$.
    pub control: R,
    /// Fitted on `arm = 1` units, predicts $\hat{m}_1(x)$.
    pub treated: R,
}

impl<R: Regressor> OutcomeModels<R> {
    /// Fit one fresh clone of `prototype` per arm.
    ///
    /// Each arm needs at least as many units as there are covariates.
    pub fn fit(prototype: &R, x: &Matrix<f64>, y: &[f64], arm: &[f64]) -> Result<Self, WdrlError> {
        if y.len() != x.rows || arm.len() != x.rows {
            return Err(WdrlError::ShapeMismatch(format!(
                "{} outcomes and {} arm indicators for {} units",
                y.len(),
                arm.len(),
                x.rows
            )));
        }
        let (idx1, idx0): (Vec<usize>, Vec<usize>) = (0..x.rows).partition(|&i| arm[i] == 1.0);
        let control = fit_arm(prototype, x, y, &idx0, "without")?;
        let treated = fit_arm(prototype, x, y, &idx1, "with")?;
        Ok(OutcomeModels { control, treated })
    }

    /// Predicted `(m0_hat, m1_hat)` for every row of `x`.
    pub fn predict(&self, x: &Matrix<f64>) -> (Vec<f64>, Vec<f64>) {
        (self.control.predict(x), self.treated.predict(x))
    }
}

fn fit_arm<R: Regressor>(prototype: &R, x: &Matrix<f64>, y: &[f64], index: &[usize], arm: &str) -> Result<R, WdrlError> {
    if index.is_empty() || index.len() < x.cols {
        return Err(WdrlError::InsufficientData(format!(
            "outcome model of the \"{}\" arm has {} units for {} covariates",
            arm,
            index.len(),
            x.cols
        )));
    }
    let data = x.select_rows(index);
    let sub_x = Matrix::new(&data, index.len(), x.cols);
    let sub_y: Vec<f64> = index.iter().map(|&i| y[i]).collect();
    let mut model = prototype.clone();
    model.fit(&sub_x, &sub_y)?;
    Ok(model)
}
