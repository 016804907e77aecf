// Modules
pub mod causal;
pub mod combination;
pub mod config;
pub mod constants;
pub mod data;
pub mod errors;
pub mod models;
pub mod utils;

// Individual classes, and functions
pub use causal::engine::{estimate_ate, AteReport, TreatmentEffect, TreatmentOutcome, WdrlEstimator};
pub use combination::{Combination, CombinationProbabilities, MatchedPair, TreatmentSet};
pub use config::{ConfigIO, WdrlConfig};
pub use data::{Dataset, Matrix};
pub use errors::WdrlError;
pub use models::{Classifier, LinearRegression, LogisticRegression, Regressor};
