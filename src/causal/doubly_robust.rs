//! Doubly-Robust Score Builder
//!
//! Augmented inverse propensity weighted (AIPW) pseudo-outcomes:
//!
//! $$y_1 = \hat{m}_1 + W (Y - \hat{m}_1) / p, \quad y_0 = \hat{m}_0 + (1 - W)(Y - \hat{m}_0) / (1 - p)$$
//! $$\Gamma = y_1 - y_0$$
//!
//! $E[\Gamma | X]$ equals the contrast effect when either the propensity model
//! or both outcome models are correct.
use crate::errors::WdrlError;

/// Per-unit doubly-robust score.
///
/// * `y` - Observed outcomes.
/// * `arm` - `1.0` for the "with" arm, `0.0` otherwise.
/// * `propensity` - Clipped `P(arm = 1 | x)`.
/// * `m0_hat` - Predictions of the "without" outcome model.
/// * `m1_hat` - Predictions of the "with" outcome model.
pub fn dr_scores(
    y: &[f64],
    arm: &[f64],
    propensity: &[f64],
    m0_hat: &[f64],
    m1_hat: &[f64],
) -> Result<Vec<f64>, WdrlError> {
    let n = y.len();
    if arm.len() != n || propensity.len() != n || m0_hat.len() != n || m1_hat.len() != n {
        return Err(WdrlError::ShapeMismatch(format!(
            "doubly-robust inputs have lengths {}, {}, {}, {}, {}",
            n,
            arm.len(),
            propensity.len(),
            m0_hat.len(),
            m1_hat.len()
        )));
    }
    Ok((0..n)
        .map(|i| {
            let (yi, w, p) = (y[i], arm[i], propensity[i]);
            let y1 = m1_hat[i] + w * (yi - m1_hat[i]) / p;
            let y0 = m0_hat[i] + (1.0 - w) * (yi - m0_hat[i]) / (1.0 - p);
            y1 - y0
        })
        .collect())
}
