//! Combinations
//!
//! Treatment sets, the bitmask encoding of treatment combinations, the
//! matched pairs that isolate a single treatment, and the empirical
//! combination frequency table used as aggregation weights.
use crate::constants::{MAX_TREATMENTS, NO_TREATMENT_LABEL};
use crate::errors::WdrlError;
use crate::utils::items_to_strings;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// The exact subset of treatments a unit received.
///
/// Bit `k` is set when treatment `k` of the owning [`TreatmentSet`] was
/// applied. The empty mask is the no-treatment combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Combination(u64);

impl Combination {
    /// No treatment applied.
    pub const NONE: Combination = Combination(0);

    pub fn from_bits(bits: u64) -> Self {
        Combination(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    /// Build a combination from per-treatment binary indicators, indexed by
    /// treatment position.
    pub fn from_indicators(indicators: &[bool]) -> Result<Self, WdrlError> {
        if indicators.len() > MAX_TREATMENTS {
            return Err(WdrlError::TooManyTreatments(indicators.len(), MAX_TREATMENTS));
        }
        let bits = indicators
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(0u64, |acc, (k, _)| acc | (1 << k));
        Ok(Combination(bits))
    }

    pub fn contains(self, treatment: usize) -> bool {
        treatment < MAX_TREATMENTS && self.0 & (1 << treatment) != 0
    }

    pub fn with(self, treatment: usize) -> Self {
        Combination(self.0 | (1 << treatment))
    }

    pub fn without(self, treatment: usize) -> Self {
        Combination(self.0 & !(1 << treatment))
    }

    /// Number of treatments in the combination.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A combination containing a treatment, and the same combination with that
/// treatment removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchedPair {
    /// Position of the isolated treatment in the treatment set.
    pub treatment: usize,
    /// The "with" arm.
    pub treated: Combination,
    /// The "without" arm, `treated` minus `treatment`.
    pub control: Combination,
}

/// Ordered set of treatment labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentSet {
    labels: Vec<String>,
}

impl TreatmentSet {
    /// Create a treatment set. Labels must be non-empty and unique, and there
    /// can be at most 63 of them.
    pub fn new<I, S>(labels: I) -> Result<Self, WdrlError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(WdrlError::InvalidParameter(
                "treatments".to_string(),
                "at least one treatment label".to_string(),
                "an empty set".to_string(),
            ));
        }
        if labels.len() > MAX_TREATMENTS {
            return Err(WdrlError::TooManyTreatments(labels.len(), MAX_TREATMENTS));
        }
        for (i, label) in labels.iter().enumerate() {
            if label.is_empty() || label == NO_TREATMENT_LABEL || labels[..i].contains(label) {
                return Err(WdrlError::InvalidParameter(
                    "treatments".to_string(),
                    format!("unique, non-empty labels other than \"{}\"", NO_TREATMENT_LABEL),
                    format!("\"{}\"", label),
                ));
            }
        }
        Ok(TreatmentSet { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, treatment: usize) -> &str {
        &self.labels[treatment]
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Bitmask with every treatment of the set switched on.
    pub fn full_mask(&self) -> u64 {
        (1u64 << self.labels.len()) - 1
    }

    /// Whether `combination` only uses treatments of this set.
    pub fn admits(&self, combination: Combination) -> bool {
        combination.bits() & !self.full_mask() == 0
    }

    /// Look up the combination made of the given labels.
    pub fn combination(&self, labels: &[&str]) -> Result<Combination, WdrlError> {
        labels.iter().try_fold(Combination::NONE, |acc, label| {
            self.position(label).map(|k| acc.with(k)).ok_or_else(|| {
                let known: Vec<&str> = self.labels.iter().map(String::as_str).collect();
                WdrlError::InvalidParameter(
                    "treatment label".to_string(),
                    format!("one of {}", items_to_strings(&known)),
                    label.to_string(),
                )
            })
        })
    }

    /// All `2^m` combinations in ascending mask order, starting with
    /// [`Combination::NONE`]. Combinations are produced lazily.
    pub fn power_set(&self) -> impl Iterator<Item = Combination> {
        (0..=self.full_mask()).map(Combination)
    }

    /// One matched pair per combination containing `treatment`, in ascending
    /// order of the treated combination.
    pub fn matched_pairs(&self, treatment: usize) -> impl Iterator<Item = MatchedPair> {
        self.power_set()
            .filter(move |c| c.contains(treatment))
            .map(move |treated| MatchedPair {
                treatment,
                treated,
                control: treated.without(treatment),
            })
    }

    /// Number of matched pairs of every treatment, `2^(m-1)`.
    pub fn n_pairs(&self) -> u64 {
        1u64 << (self.labels.len() - 1)
    }

    /// Matched pairs of `treatment` whose treated combination occurs in
    /// `table`, in ascending order of the treated combination. Only observed
    /// combinations are visited.
    pub fn observed_pairs(&self, treatment: usize, table: &CombinationProbabilities) -> Vec<MatchedPair> {
        table
            .observed()
            .into_iter()
            .filter(|c| c.contains(treatment))
            .map(|treated| MatchedPair {
                treatment,
                treated,
                control: treated.without(treatment),
            })
            .collect()
    }

    /// Render a combination as its labels joined with `+`, or `none`.
    pub fn render(&self, combination: Combination) -> String {
        if combination.is_empty() {
            return NO_TREATMENT_LABEL.to_string();
        }
        let parts: Vec<&str> = self
            .labels
            .iter()
            .enumerate()
            .filter(|(k, _)| combination.contains(*k))
            .map(|(_, l)| l.as_str())
            .collect();
        parts.join("+")
    }
}

/// Empirical relative frequency of each combination in the training data.
///
/// Combinations that never occur have probability zero.
#[derive(Debug, Clone)]
pub struct CombinationProbabilities {
    counts: HashMap<Combination, usize>,
    n_units: usize,
}

impl CombinationProbabilities {
    pub fn from_combinations(combinations: &[Combination]) -> Self {
        let mut counts = HashMap::new();
        for c in combinations {
            *counts.entry(*c).or_insert(0) += 1;
        }
        CombinationProbabilities {
            counts,
            n_units: combinations.len(),
        }
    }

    pub fn n_units(&self) -> usize {
        self.n_units
    }

    pub fn count(&self, combination: Combination) -> usize {
        self.counts.get(&combination).copied().unwrap_or(0)
    }

    pub fn probability(&self, combination: Combination) -> f64 {
        if self.n_units == 0 {
            return 0.0;
        }
        self.count(combination) as f64 / self.n_units as f64
    }

    /// Observed combinations in ascending mask order.
    pub fn observed(&self) -> Vec<Combination> {
        let mut observed: Vec<Combination> = self.counts.keys().copied().collect();
        observed.sort();
        observed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    fn abc() -> TreatmentSet {
        TreatmentSet::new(["A", "B", "C"]).unwrap()
    }

    #[test]
    fn test_power_set_order() {
        let ts = abc();
        let ps: Vec<Combination> = ts.power_set().collect();
        assert_eq!(ps.len(), 8);
        assert_eq!(ps[0], Combination::NONE);
        assert!(ps.windows(2).all(|w| w[0] < w[1]));
        let rendered: Vec<String> = ps.iter().map(|c| ts.render(*c)).collect();
        assert_eq!(rendered, vec!["none", "A", "B", "A+B", "C", "A+C", "B+C", "A+B+C"]);
    }

    #[test]
    fn test_matched_pairs_bijection() {
        for m in 1..=6 {
            let labels: Vec<String> = (0..m).map(|i| format!("T{}", i)).collect();
            let ts = TreatmentSet::new(labels).unwrap();
            for k in 0..m {
                let pairs: Vec<MatchedPair> = ts.matched_pairs(k).collect();
                assert_eq!(pairs.len(), 1 << (m - 1));
                assert_eq!(ts.n_pairs(), 1 << (m - 1));
                let mut seen = HashSet::new();
                for p in &pairs {
                    assert!(p.treated.contains(k));
                    assert!(!p.control.contains(k));
                    assert_eq!(p.treated.without(k), p.control);
                    assert_eq!(p.control.with(k), p.treated);
                    assert!(seen.insert(p.treated));
                    assert!(seen.insert(p.control));
                }
                // Every combination is used exactly once across the pairs.
                assert_eq!(seen.len(), 1 << m);
            }
        }
    }

    #[test]
    fn test_from_indicators() {
        let c = Combination::from_indicators(&[true, false, true]).unwrap();
        assert_eq!(c.bits(), 0b101);
        assert!(c.contains(0));
        assert!(!c.contains(1));
        assert_eq!(c.len(), 2);
        assert_eq!(abc().render(c), "A+C");
        assert_eq!(abc().combination(&["C", "A"]).unwrap(), c);
        assert!(Combination::from_indicators(&[false; 3]).unwrap().is_empty());
        assert!(matches!(
            Combination::from_indicators(&[false; 64]),
            Err(WdrlError::TooManyTreatments(64, 63))
        ));
    }

    #[test]
    fn test_treatment_set_validation() {
        assert!(TreatmentSet::new(Vec::<String>::new()).is_err());
        assert!(TreatmentSet::new(["A", "A"]).is_err());
        assert!(TreatmentSet::new(["A", ""]).is_err());
        assert!(TreatmentSet::new(["none"]).is_err());
        assert!(abc().combination(&["D"]).is_err());
        assert!(abc().admits(Combination::from_bits(0b111)));
        assert!(!abc().admits(Combination::from_bits(0b1000)));
    }

    #[test]
    fn test_probabilities() {
        let ts = abc();
        let a = ts.combination(&["A"]).unwrap();
        let ab = ts.combination(&["A", "B"]).unwrap();
        let data = vec![Combination::NONE, a, a, ab];
        let table = CombinationProbabilities::from_combinations(&data);
        assert_eq!(table.n_units(), 4);
        assert_relative_eq!(table.probability(a), 0.5);
        assert_relative_eq!(table.probability(ts.combination(&["C"]).unwrap()), 0.0);
        let total: f64 = ts.power_set().map(|c| table.probability(c)).sum();
        assert_relative_eq!(total, 1.0);
        assert_eq!(table.observed(), vec![Combination::NONE, a, ab]);
    }

    #[test]
    fn test_observed_pairs_on_wide_set() {
        let labels: Vec<String> = (0..63).map(|i| format!("T{}", i)).collect();
        let ts = TreatmentSet::new(labels).unwrap();
        assert_eq!(ts.n_pairs(), 1 << 62);
        let first: Vec<Combination> = ts.power_set().take(3).collect();
        assert_eq!(first, vec![Combination::NONE, Combination::from_bits(1), Combination::from_bits(2)]);

        let t0 = Combination::from_bits(1);
        let t0_t62 = Combination::from_bits(1 | (1 << 62));
        let t5 = Combination::from_bits(1 << 5);
        let table = CombinationProbabilities::from_combinations(&[t0_t62, Combination::NONE, t5, t0]);

        let pairs = ts.observed_pairs(0, &table);
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].treated, pairs[0].control), (t0, Combination::NONE));
        assert_eq!((pairs[1].treated, pairs[1].control), (t0_t62, Combination::from_bits(1 << 62)));
        assert_eq!(ts.observed_pairs(5, &table)[0].control, Combination::NONE);
        assert!(ts.observed_pairs(7, &table).is_empty());

        // Same pairs as the full enumeration restricted to observed combinations.
        let small = abc();
        let table = CombinationProbabilities::from_combinations(&[Combination::from_bits(0b011), Combination::from_bits(0b110)]);
        let expected: Vec<MatchedPair> = small.matched_pairs(1).filter(|p| table.count(p.treated) > 0).collect();
        assert_eq!(small.observed_pairs(1, &table), expected);
    }
}
