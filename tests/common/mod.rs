#![allow(dead_code)]
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use wdrl::utils::sigmoid;
use wdrl::{Combination, Dataset, TreatmentSet};

/// Simulated population with known per-treatment effects.
pub struct Simulation {
    pub data: Dataset,
    pub treatments: TreatmentSet,
    pub effects: Vec<f64>,
}

/// Units with standard normal covariates and one binary treatment per entry
/// of `effects`.
///
/// Treatment `k` is assigned with probability
/// `sigmoid(0.5 * (x_k + x_{k+1} + x_{k+2}))` so every treatment is
/// confounded with the outcome, which is linear in the covariates plus the
/// additive effect of every received treatment and standard normal noise.
pub fn simulate(n_units: usize, n_features: usize, effects: &[f64], seed: u64) -> Simulation {
    let mut rng = StdRng::seed_from_u64(seed);
    let labels: Vec<String> = (0..effects.len())
        .map(|k| ((b'A' + k as u8) as char).to_string())
        .collect();
    let treatments = TreatmentSet::new(labels).unwrap();

    let covariates: Vec<f64> = (0..n_units * n_features)
        .map(|_| rng.sample(StandardNormal))
        .collect();
    let x = |i: usize, j: usize| covariates[j * n_units + i];
    let beta: Vec<f64> = (0..n_features).map(|_| rng.gen_range(-1.0..1.0)).collect();

    let mut indicators: Vec<Vec<bool>> = vec![Vec::with_capacity(n_units); effects.len()];
    let mut outcomes = Vec::with_capacity(n_units);
    for i in 0..n_units {
        let mut y: f64 = (0..n_features).map(|j| beta[j] * x(i, j)).sum();
        for (k, effect) in effects.iter().enumerate() {
            let score: f64 = (k..k + 3).map(|j| x(i, j % n_features)).sum();
            let treated = rng.gen::<f64>() < sigmoid(0.5 * score);
            if treated {
                y += effect;
            }
            indicators[k].push(treated);
        }
        let noise: f64 = rng.sample(StandardNormal);
        outcomes.push(y + noise);
    }

    let data = Dataset::from_indicators(covariates, n_units, n_features, outcomes, &indicators, &treatments).unwrap();
    Simulation {
        data,
        treatments,
        effects: effects.to_vec(),
    }
}

/// Units cycling through the given combination masks, with two covariates
/// and an outcome that does not depend on the treatments.
pub fn cycling_data(n_units: usize, masks: &[u64], seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let covariates: Vec<f64> = (0..2 * n_units).map(|_| rng.sample(StandardNormal)).collect();
    let outcomes: Vec<f64> = (0..n_units)
        .map(|i| {
            let noise: f64 = rng.sample(StandardNormal);
            covariates[i] + noise
        })
        .collect();
    let combinations: Vec<Combination> = (0..n_units)
        .map(|i| Combination::from_bits(masks[i % masks.len()]))
        .collect();
    Dataset::new(covariates, n_units, 2, outcomes, combinations).unwrap()
}
