#![allow(dead_code)]
use rand::distributions::Uniform;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wdrl::utils::sigmoid;
use wdrl::{Dataset, TreatmentSet};

// create_data
//
// Generates a confounded population with `n_treatments`
// binary treatments, each with an additive effect of 1.0
pub(crate) fn create_data(n_samples: usize, n_features: usize, n_treatments: usize) -> (Dataset, TreatmentSet) {
    // reproducible seed
    let mut rng = StdRng::seed_from_u64(1903);

    // feature distributions
    let feature_distribution = Uniform::new(-1.0, 1.0);
    let noise_distribution = Uniform::new(-1.0, 1.0);
    let weight_distribution = Uniform::new(-1.0, 1.0);

    let weights: Vec<f64> = (0..n_features).map(|_| rng.sample(weight_distribution)).collect();

    // column-major covariates
    let data: Vec<f64> = (0..n_samples * n_features)
        .map(|_| rng.sample(feature_distribution))
        .collect();

    let mut indicators: Vec<Vec<bool>> = vec![Vec::with_capacity(n_samples); n_treatments];
    let mut y: Vec<f64> = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let linear: f64 = (0..n_features).map(|j| data[j * n_samples + i] * weights[j]).sum();
        let mut value = linear + rng.sample(noise_distribution);
        for (k, column) in indicators.iter_mut().enumerate() {
            // treatment k is confounded through feature k
            let treated = rng.gen::<f64>() < sigmoid(data[(k % n_features) * n_samples + i]);
            if treated {
                value += 1.0;
            }
            column.push(treated);
        }
        y.push(value);
    }

    let labels: Vec<String> = (0..n_treatments).map(|k| format!("t{}", k)).collect();
    let treatments = TreatmentSet::new(labels).unwrap();
    let dataset = Dataset::from_indicators(data, n_samples, n_features, y, &indicators, &treatments).unwrap();
    (dataset, treatments)
}
