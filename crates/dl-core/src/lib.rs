//! # dl-core
//!
//! Core types and traits for darklimit.
//!
//! The statistical engine in `dl-inference` is written against the traits
//! defined here, never against a concrete particle or halo model. Reference
//! physics lives in `dl-physics`; anything implementing [`ParticleModel`] and
//! [`VelocityDistribution`] can be plugged in instead.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{ParticleModel, VelocityDistribution};
pub use types::{BoundOutcome, ExclusionCurve, LimitPoint, LimitStatus};
