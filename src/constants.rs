/// Default bound used to clip propensity scores into `[clip, 1 - clip]`.
pub const PROPENSITY_CLIP: f64 = 1e-3;
/// Largest treatment set a `u64` combination mask can hold.
pub const MAX_TREATMENTS: usize = 63;
/// Largest treatment set for which every matched pair is fitted when
/// unobserved combinations are not skipped.
pub const MAX_STRICT_TREATMENTS: usize = 24;
/// Rendering of the empty combination.
pub const NO_TREATMENT_LABEL: &str = "none";
pub const LOGISTIC_MAX_ITER: usize = 100;
pub const LOGISTIC_TOLERANCE: f64 = 1e-8;
pub const MAX_STEP_HALVINGS: usize = 30;
/// Cholesky pivots below this fraction of the largest diagonal entry mark a
/// system as singular.
pub const PIVOT_TOLERANCE: f64 = 1e-12;
/// Singular values below this fraction of the largest one are treated as zero.
pub const SVD_RCOND: f64 = 1e-10;
