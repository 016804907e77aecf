//! Propensity Estimator
//!
//! Probability of the "with" arm of a matched pair, fitted only on the units
//! of that pair and clipped away from zero and one before it is ever used as
//! a denominator.
use crate::data::Matrix;
use crate::errors::WdrlError;
use crate::models::Classifier;
use log::warn;

/// Clipped propensity scores of one matched pair.
#[derive(Debug, Clone)]
pub struct PropensityScores {
    /// `P(arm = 1 | x)` per unit, within `[clip, 1 - clip]`.
    pub scores: Vec<f64>,
    /// Number of raw estimates that fell outside `[clip, 1 - clip]`.
    pub n_clipped: usize,
}

/// Clamp every value into `[clip, 1 - clip]` and return how many were moved.
pub fn clip_propensities(scores: &mut [f64], clip: f64) -> usize {
    let (lo, hi) = (clip, 1.0 - clip);
    let mut n_clipped = 0;
    for p in scores.iter_mut() {
        if *p < lo || *p > hi {
            n_clipped += 1;
            *p = p.clamp(lo, hi);
        }
    }
    n_clipped
}

/// Fit a fresh clone of `prototype` on `(x, arm)` and return clipped
/// probabilities of `arm = 1` for the same units.
///
/// * `prototype` - Classifier to clone and fit.
/// * `x` - Covariates of the pair's units.
/// * `arm` - `1.0` for the "with" arm, `0.0` for the "without" arm.
/// * `clip` - Clipping bound, in `(0, 0.5)`.
pub fn estimate_propensity<C: Classifier>(
    prototype: &C,
    x: &Matrix<f64>,
    arm: &[f64],
    clip: f64,
) -> Result<PropensityScores, WdrlError> {
    if arm.len() != x.rows {
        return Err(WdrlError::ShapeMismatch(format!(
            "{} arm indicators for {} units",
            arm.len(),
            x.rows
        )));
    }
    let n_treated = arm.iter().filter(|a| **a == 1.0).count();
    let n_control = arm.len() - n_treated;
    if n_treated == 0 || n_control == 0 {
        return Err(WdrlError::InsufficientData(format!(
            "propensity model needs units in both arms, found {} with and {} without the treatment",
            n_treated, n_control
        )));
    }

    let mut model = prototype.clone();
    model.fit(x, arm)?;
    let mut scores = model.predict_proba(x);
    if scores.len() != x.rows || scores.iter().any(|p| !p.is_finite()) {
        return Err(WdrlError::FitFailed(
            "propensity model".to_string(),
            "probabilities are missing or non-finite".to_string(),
        ));
    }

    let n_clipped = clip_propensities(&mut scores, clip);
    if n_clipped > 0 {
        warn!(
            "{} of {} propensity scores fell outside [{}, {}] and were clipped.",
            n_clipped,
            scores.len(),
            clip,
            1.0 - clip
        );
    }
    Ok(PropensityScores { scores, n_clipped })
}
