//! # dl-inference
//!
//! Statistical inference for direct-detection experiments.
//!
//! This crate provides:
//! - detector configuration with mode-specific background data
//! - expected-signal integration (total, binned, cumulative)
//! - test statistics: Poisson, binned Poisson, Yellin's maximum gap
//! - upper bounds on the interaction strength at a confidence level
//! - mass scans producing exclusion curves (sequential and rayon-parallel)
//!
//! ## Architecture
//!
//! This crate depends on the `ParticleModel` and `VelocityDistribution`
//! traits from dl-core, NOT on concrete physics models.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Upper bound on the interaction strength at a single mass.
pub mod bound;
/// Detector description and validating builder.
pub mod detector;
/// Expected signal counts.
pub mod rates;
/// Mass scans and exclusion curves.
pub mod scan;
/// Test statistics for the three statistical modes.
pub mod statistic;

pub use bound::{SolverConfig, upper_bound};
pub use detector::{Detector, DetectorBuilder, StatisticalMode};
pub use rates::ExpectedSignal;
pub use scan::{limit_curve, limit_curve_par, log_space};
pub use statistic::{is_excluded, p_value};
