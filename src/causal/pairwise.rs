//! Pairwise Contrast Processor
//!
//! For one matched pair `(w, w \ {k})`, fits the propensity and outcome
//! models on the pair's units, builds doubly-robust scores, regresses them on
//! the covariates and projects that regression onto every training unit.
//! Projection puts pairs fitted on disjoint subsets on a common footing so
//! they can be averaged unit by unit.
use crate::causal::doubly_robust::dr_scores;
use crate::causal::outcome::OutcomeModels;
use crate::causal::propensity::estimate_propensity;
use crate::combination::{MatchedPair, TreatmentSet};
use crate::data::{Dataset, Matrix};
use crate::errors::WdrlError;
use crate::models::{Classifier, Regressor};
use log::debug;

/// Projected doubly-robust scores of one matched pair.
#[derive(Debug, Clone)]
pub struct PairEstimate {
    pub pair: MatchedPair,
    /// One projected score per unit of the full training data.
    pub projected: Vec<f64>,
    /// Units in the "with" combination.
    pub n_treated: usize,
    /// Units in the "without" combination.
    pub n_control: usize,
    /// Propensity scores clipped into the allowed range.
    pub n_clipped: usize,
}

/// Shared, read-only context of every pair of an estimation run.
pub struct PairwiseContrast<'a, R, C> {
    data: &'a Dataset,
    treatments: &'a TreatmentSet,
    regressor: &'a R,
    classifier: &'a C,
    propensity_clip: f64,
}

impl<'a, R: Regressor, C: Classifier> PairwiseContrast<'a, R, C> {
    pub fn new(
        data: &'a Dataset,
        treatments: &'a TreatmentSet,
        regressor: &'a R,
        classifier: &'a C,
        propensity_clip: f64,
    ) -> Self {
        PairwiseContrast {
            data,
            treatments,
            regressor,
            classifier,
            propensity_clip,
        }
    }

    /// Estimate one pair. Errors name the pair's combinations.
    pub fn process(&self, pair: MatchedPair) -> Result<PairEstimate, WdrlError> {
        self.process_inner(pair).map_err(|e| self.with_context(pair, e))
    }

    fn process_inner(&self, pair: MatchedPair) -> Result<PairEstimate, WdrlError> {
        let index: Vec<usize> = self
            .data
            .combinations()
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == pair.treated || **c == pair.control)
            .map(|(i, _)| i)
            .collect();
        let arm: Vec<f64> = index
            .iter()
            .map(|&i| {
                if self.data.combinations()[i] == pair.treated {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        let n_treated = arm.iter().filter(|a| **a == 1.0).count();
        let n_control = arm.len() - n_treated;

        let full = self.data.covariates();
        let sub_data = full.select_rows(&index);
        let sub_x = Matrix::new(&sub_data, index.len(), full.cols);
        let sub_y: Vec<f64> = index.iter().map(|&i| self.data.outcomes()[i]).collect();

        let propensity = estimate_propensity(self.classifier, &sub_x, &arm, self.propensity_clip)?;
        let outcome = OutcomeModels::fit(self.regressor, &sub_x, &sub_y, &arm)?;
        let (m0_hat, m1_hat) = outcome.predict(&sub_x);
        let scores = dr_scores(&sub_y, &arm, &propensity.scores, &m0_hat, &m1_hat)?;

        let mut effect = self.regressor.clone();
        effect.fit(&sub_x, &scores)?;
        let projected = effect.predict(&full);

        debug!(
            "Pair {} vs {}: {} with, {} without, {} clipped propensities.",
            self.treatments.render(pair.treated),
            self.treatments.render(pair.control),
            n_treated,
            n_control,
            propensity.n_clipped
        );
        Ok(PairEstimate {
            pair,
            projected,
            n_treated,
            n_control,
            n_clipped: propensity.n_clipped,
        })
    }

    fn with_context(&self, pair: MatchedPair, error: WdrlError) -> WdrlError {
        let context = format!(
            "pair {} vs {}",
            self.treatments.render(pair.treated),
            self.treatments.render(pair.control)
        );
        match error {
            WdrlError::InsufficientData(msg) => WdrlError::InsufficientData(format!("{}: {}", context, msg)),
            WdrlError::FitFailed(model, msg) => WdrlError::FitFailed(format!("{} of {}", model, context), msg),
            other => other,
        }
    }
}
