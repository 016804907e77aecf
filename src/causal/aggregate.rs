//! Weighted Aggregator
//!
//! Combines the projected scores of every matched pair of one treatment into
//! a single score per unit:
//!
//! $$\bar{\Gamma}_i = \frac{\sum_w P(w) \, \Gamma^{(w)}_i}{\sum_w P(w)}$$
//!
//! where $w$ ranges over the "with" combinations and $P(w)$ is the empirical
//! frequency of $w$ in the training data. Combinations never observed carry
//! no weight and drop out of both sums.
use crate::causal::pairwise::PairEstimate;
use crate::combination::{Combination, CombinationProbabilities};
use crate::errors::WdrlError;

/// Aggregated scores and the normalized weights that produced them.
#[derive(Debug, Clone)]
pub struct WeightedScores {
    /// One aggregated score per training unit.
    pub scores: Vec<f64>,
    /// `(treated combination, weight)` of every contributing pair, in the
    /// order of the estimates. Weights sum to one.
    pub weights: Vec<(Combination, f64)>,
}

/// Normalized weights of the given "with" combinations.
///
/// Zero-frequency combinations are left out. Fails with
/// [`WdrlError::DegenerateWeight`] when nothing is left.
pub fn normalized_weights(
    treated: &[Combination],
    table: &CombinationProbabilities,
    treatment: &str,
) -> Result<Vec<(Combination, f64)>, WdrlError> {
    let raw: Vec<(Combination, f64)> = treated
        .iter()
        .map(|c| (*c, table.probability(*c)))
        .filter(|(_, p)| *p > 0.0)
        .collect();
    let total: f64 = raw.iter().map(|(_, p)| p).sum();
    if raw.is_empty() || total <= 0.0 {
        return Err(WdrlError::DegenerateWeight(treatment.to_string()));
    }
    Ok(raw.into_iter().map(|(c, p)| (c, p / total)).collect())
}

/// Frequency-weighted average of the projected pair scores.
///
/// * `estimates` - One estimate per matched pair of the treatment.
/// * `table` - Empirical combination frequencies of the training data.
/// * `treatment` - Treatment label, for error messages.
/// * `n_units` - Number of training units every estimate must cover.
pub fn aggregate_scores(
    estimates: &[PairEstimate],
    table: &CombinationProbabilities,
    treatment: &str,
    n_units: usize,
) -> Result<WeightedScores, WdrlError> {
    if let Some(e) = estimates.iter().find(|e| e.projected.len() != n_units) {
        return Err(WdrlError::ShapeMismatch(format!(
            "pair score column has {} entries for {} units",
            e.projected.len(),
            n_units
        )));
    }
    let treated: Vec<Combination> = estimates.iter().map(|e| e.pair.treated).collect();
    let weights = normalized_weights(&treated, table, treatment)?;

    let mut scores = vec![0.0; n_units];
    let contributing = estimates
        .iter()
        .filter(|e| table.probability(e.pair.treated) > 0.0);
    for (estimate, (_, weight)) in contributing.zip(&weights) {
        for (s, v) in scores.iter_mut().zip(&estimate.projected) {
            *s += weight * v;
        }
    }
    Ok(WeightedScores { scores, weights })
}
