//! ATE Engine
//!
//! Drives the Weighted Doubly Robust Learning estimator: for every treatment
//! `k`, each matched pair `(w, w \ {k})` is estimated on its own units and
//! projected onto the training population, the projections are averaged with
//! the empirical combination frequencies as weights, and a final regression
//! of the averaged score on the covariates gives the average treatment
//! effect as the mean of its fitted values.
//!
//! Treatments are independent of each other. A treatment that cannot be
//! estimated is reported as a failure next to the treatments that succeeded.
use crate::causal::aggregate::aggregate_scores;
use crate::causal::pairwise::{PairEstimate, PairwiseContrast};
use crate::combination::{Combination, CombinationProbabilities, MatchedPair, TreatmentSet};
use crate::config::WdrlConfig;
use crate::constants::MAX_STRICT_TREATMENTS;
use crate::data::{Dataset, Matrix};
use crate::errors::WdrlError;
use crate::models::{Classifier, LinearRegression, LogisticRegression, Regressor};
use crate::utils::{fmt_vec_output, mean};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Estimated effect of one treatment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentEffect {
    pub treatment: String,
    /// Average treatment effect.
    pub ate: f64,
    /// Fitted values of the final regression, one per training unit.
    pub unit_effects: Vec<f64>,
    /// Normalized weight of every "with" combination that contributed.
    pub weights: Vec<(Combination, f64)>,
    /// Matched pairs that were fitted.
    pub n_pairs: usize,
    /// Matched pairs left out because their "with" combination never occurs
    /// in the data.
    pub n_skipped: u64,
    /// Propensity scores clipped across all pairs.
    pub n_clipped: usize,
}

/// Result of one treatment, either an estimate or the error that stopped it.
#[derive(Debug)]
pub struct TreatmentOutcome {
    pub treatment: String,
    pub result: Result<TreatmentEffect, WdrlError>,
}

/// Per-treatment results of an estimation run, in treatment set order.
#[derive(Debug)]
pub struct AteReport {
    pub outcomes: Vec<TreatmentOutcome>,
}

impl AteReport {
    /// ATE of `treatment`, `None` if it failed or is unknown.
    pub fn ate(&self, treatment: &str) -> Option<f64> {
        self.effect(treatment).map(|e| e.ate)
    }

    pub fn effect(&self, treatment: &str) -> Option<&TreatmentEffect> {
        self.outcomes
            .iter()
            .find(|o| o.treatment == treatment)
            .and_then(|o| o.result.as_ref().ok())
    }

    /// Error of `treatment`, `None` if it succeeded or is unknown.
    pub fn error(&self, treatment: &str) -> Option<&WdrlError> {
        self.outcomes
            .iter()
            .find(|o| o.treatment == treatment)
            .and_then(|o| o.result.as_ref().err())
    }

    /// Treatment label to ATE, for the treatments that succeeded.
    pub fn estimates(&self) -> BTreeMap<String, f64> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|e| (o.treatment.clone(), e.ate)))
            .collect()
    }

    pub fn failures(&self) -> Vec<(&str, &WdrlError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.treatment.as_str(), e)))
            .collect()
    }

    /// Whether every treatment was estimated.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Weighted Doubly Robust Learning estimator.
///
/// `regressor` is cloned for every outcome, projection and final regression,
/// `classifier` for every propensity model.
#[derive(Debug, Clone)]
pub struct WdrlEstimator<R = LinearRegression, C = LogisticRegression> {
    pub cfg: WdrlConfig,
    pub regressor: R,
    pub classifier: C,
}

impl Default for WdrlEstimator {
    fn default() -> Self {
        WdrlEstimator {
            cfg: WdrlConfig::default(),
            regressor: LinearRegression::default(),
            classifier: LogisticRegression::default(),
        }
    }
}

impl WdrlEstimator {
    /// Estimator with linear outcome models and an unregularized logistic
    /// propensity model.
    pub fn new(cfg: WdrlConfig) -> Result<Self, WdrlError> {
        WdrlEstimator::with_models(cfg, LinearRegression::default(), LogisticRegression::default())
    }
}

impl<R: Regressor, C: Classifier> WdrlEstimator<R, C> {
    /// Estimator with user supplied models.
    pub fn with_models(cfg: WdrlConfig, regressor: R, classifier: C) -> Result<Self, WdrlError> {
        cfg.validate()?;
        Ok(WdrlEstimator {
            cfg,
            regressor,
            classifier,
        })
    }

    /// Set the propensity clipping bound.
    /// * `propensity_clip` - Scores are clipped into `[propensity_clip, 1 - propensity_clip]`.
    pub fn set_propensity_clip(mut self, propensity_clip: f64) -> Self {
        self.cfg.propensity_clip = propensity_clip;
        self
    }

    /// Set whether never observed combinations are skipped.
    pub fn set_skip_unobserved(mut self, skip_unobserved: bool) -> Self {
        self.cfg.skip_unobserved = skip_unobserved;
        self
    }

    /// Set whether treatments and pairs run on a thread pool.
    pub fn set_parallel(mut self, parallel: bool) -> Self {
        self.cfg.parallel = parallel;
        self
    }

    /// Set the number of threads.
    /// * `num_threads` - Thread count, all available cores if `None`.
    pub fn set_num_threads(mut self, num_threads: Option<usize>) -> Self {
        self.cfg.num_threads = num_threads;
        self
    }

    /// Estimate the ATE of every treatment of `treatments` on `data`, the
    /// training partition.
    ///
    /// Fails only for malformed input. Per-treatment failures are reported in
    /// the returned [`AteReport`].
    pub fn estimate(&self, data: &Dataset, treatments: &TreatmentSet) -> Result<AteReport, WdrlError> {
        self.cfg.validate()?;
        if data.rows() == 0 {
            return Err(WdrlError::InsufficientData("the dataset has no units".to_string()));
        }
        if let Some(c) = data.combinations().iter().find(|c| !treatments.admits(**c)) {
            return Err(WdrlError::InvalidParameter(
                "combinations".to_string(),
                format!("subsets of the {} treatments", treatments.len()),
                format!("mask {:#b}", c.bits()),
            ));
        }

        self.check_pair_budget(treatments)?;
        let table = CombinationProbabilities::from_combinations(data.combinations());
        let run = |k: usize| TreatmentOutcome {
            treatment: treatments.label(k).to_string(),
            result: self.estimate_treatment(data, treatments, &table, k),
        };

        let outcomes: Vec<TreatmentOutcome> = if self.cfg.parallel {
            let work = || -> Vec<TreatmentOutcome> { (0..treatments.len()).into_par_iter().map(run).collect() };
            match self.cfg.num_threads {
                Some(num_threads) => rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .map_err(|e| {
                        WdrlError::InvalidParameter(
                            "num_threads".to_string(),
                            "a thread count the system can provide".to_string(),
                            e.to_string(),
                        )
                    })?
                    .install(work),
                None => work(),
            }
        } else {
            (0..treatments.len()).map(run).collect()
        };

        for outcome in &outcomes {
            if let Err(e) = &outcome.result {
                warn!("Treatment {} could not be estimated: {}", outcome.treatment, e);
            }
        }
        Ok(AteReport { outcomes })
    }

    /// Fitting every matched pair is only allowed for small treatment sets.
    fn check_pair_budget(&self, treatments: &TreatmentSet) -> Result<(), WdrlError> {
        if !self.cfg.skip_unobserved && treatments.len() > MAX_STRICT_TREATMENTS {
            return Err(WdrlError::InvalidParameter(
                "skip_unobserved".to_string(),
                format!("true for more than {} treatments", MAX_STRICT_TREATMENTS),
                format!("false with {} treatments", treatments.len()),
            ));
        }
        Ok(())
    }

    /// Estimate a single treatment, identified by its position in
    /// `treatments`.
    pub fn estimate_treatment(
        &self,
        data: &Dataset,
        treatments: &TreatmentSet,
        table: &CombinationProbabilities,
        treatment: usize,
    ) -> Result<TreatmentEffect, WdrlError> {
        self.check_pair_budget(treatments)?;
        let label = treatments.label(treatment);
        let active: Vec<MatchedPair> = if self.cfg.skip_unobserved {
            treatments.observed_pairs(treatment, table)
        } else {
            treatments.matched_pairs(treatment).collect()
        };
        let n_skipped = treatments.n_pairs() - active.len() as u64;
        if n_skipped > 0 {
            debug!(
                "Treatment {}: skipping {} pairs with unobserved combinations.",
                label, n_skipped
            );
        }
        if active.is_empty() {
            return Err(WdrlError::DegenerateWeight(label.to_string()));
        }

        let contrast = PairwiseContrast::new(
            data,
            treatments,
            &self.regressor,
            &self.classifier,
            self.cfg.propensity_clip,
        );
        let results: Vec<Result<PairEstimate, WdrlError>> = if self.cfg.parallel {
            active.par_iter().map(|p| contrast.process(*p)).collect()
        } else {
            active.iter().map(|p| contrast.process(*p)).collect()
        };
        let mut estimates = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(e) => estimates.push(e),
                Err(e) => failures.push(e),
            }
        }
        if !failures.is_empty() {
            return Err(merge_pair_errors(failures));
        }

        let weighted = aggregate_scores(&estimates, table, label, data.rows())?;
        let x: Matrix<f64> = data.covariates();
        let mut last_stage = self.regressor.clone();
        last_stage.fit(&x, &weighted.scores)?;
        let unit_effects = last_stage.predict(&x);
        let ate = mean(&unit_effects)
            .ok_or_else(|| WdrlError::InsufficientData("the dataset has no units".to_string()))?;

        let w: Vec<f64> = weighted.weights.iter().map(|(_, w)| *w).collect();
        info!(
            "Treatment {}: ATE {:.4} from {} pairs, weights [{}].",
            label,
            ate,
            estimates.len(),
            fmt_vec_output(&w)
        );
        Ok(TreatmentEffect {
            treatment: label.to_string(),
            ate,
            unit_effects,
            weights: weighted.weights,
            n_pairs: estimates.len(),
            n_skipped,
            n_clipped: estimates.iter().map(|e| e.n_clipped).sum(),
        })
    }
}

/// Fold the failures of one treatment's pairs, in pair order, into one
/// error. Insufficient-data failures are joined into a single message.
fn merge_pair_errors(mut errors: Vec<WdrlError>) -> WdrlError {
    if errors.len() > 1 && errors.iter().all(|e| matches!(e, WdrlError::InsufficientData(_))) {
        let messages: Vec<String> = errors
            .into_iter()
            .filter_map(|e| match e {
                WdrlError::InsufficientData(msg) => Some(msg),
                _ => None,
            })
            .collect();
        return WdrlError::InsufficientData(format!("{} pairs failed: {}", messages.len(), messages.join("; ")));
    }
    let first = errors.remove(0);
    for other in &errors {
        warn!("Additional pair failure: {}", other);
    }
    first
}

/// Estimate per-treatment ATEs with the default estimator.
///
/// * `covariates` - `n_units x n_features` column-major matrix of the training partition.
/// * `outcomes` - One outcome per unit.
/// * `combinations` - Treatment combination of each unit.
/// * `treatments` - Ordered treatment set the combinations refer to.
pub fn estimate_ate(
    covariates: &Matrix<f64>,
    outcomes: &[f64],
    combinations: &[Combination],
    treatments: &TreatmentSet,
) -> Result<AteReport, WdrlError> {
    let data = Dataset::from_matrix(covariates, outcomes, combinations)?;
    let estimator: WdrlEstimator = WdrlEstimator::default();
    estimator.estimate(&data, treatments)
}
