//! Causal
//!
//! This module implements Weighted Doubly Robust Learning (WDRL) of
//! per-treatment average effects when several binary treatments are applied
//! jointly: propensity and outcome nuisance models per matched pair,
//! doubly-robust pseudo-outcomes, frequency-weighted aggregation across
//! pairs, and the final effect regression.
pub mod aggregate;
pub mod doubly_robust;
pub mod engine;
pub mod outcome;
pub mod pairwise;
pub mod propensity;
