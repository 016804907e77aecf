// import modules
mod linear;
mod logistic;

// make models public
pub use linear::LinearRegression;
pub use logistic::LogisticRegression;

pub mod model;

pub use model::Classifier;
pub use model::Regressor;
