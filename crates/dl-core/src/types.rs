//! Common result types for darklimit

use serde::{Deserialize, Serialize};

/// Outcome of an upper-bound computation at a single mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundOutcome {
    /// Smallest excluded interaction strength.
    Limit(f64),
    /// No recoil above threshold is possible at this mass.
    KinematicallyForbidden,
    /// Signal vanishes at every trial strength; nothing can be excluded.
    Unconstrained,
}

impl BoundOutcome {
    /// Bound as a number, `+inf` when nothing is excluded.
    pub fn strength(&self) -> f64 {
        match *self {
            BoundOutcome::Limit(s) => s,
            BoundOutcome::KinematicallyForbidden | BoundOutcome::Unconstrained => f64::INFINITY,
        }
    }

    /// `true` if a finite bound was found.
    pub fn is_limit(&self) -> bool {
        matches!(self, BoundOutcome::Limit(_))
    }
}

/// Status of a single point on an exclusion curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitStatus {
    /// Finite bound.
    Converged,
    /// Mass below the kinematic reach of the detector.
    KinematicallyForbidden,
    /// Zero expected signal at every trial strength.
    Unconstrained,
    /// The solver failed at this mass; the message says why.
    Failed(String),
}

/// One `(mass, strength)` entry of an exclusion curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitPoint {
    /// Particle mass.
    pub mass: f64,
    /// Upper bound on the interaction strength (`+inf` if there is none;
    /// serialized as `null`).
    pub strength: f64,
    /// How the bound was obtained.
    pub status: LimitStatus,
}

impl LimitPoint {
    /// Point from a solver outcome.
    pub fn from_outcome(mass: f64, outcome: BoundOutcome) -> Self {
        let status = match outcome {
            BoundOutcome::Limit(_) => LimitStatus::Converged,
            BoundOutcome::KinematicallyForbidden => LimitStatus::KinematicallyForbidden,
            BoundOutcome::Unconstrained => LimitStatus::Unconstrained,
        };
        Self { mass, strength: outcome.strength(), status }
    }

    /// Point for a mass at which the solver failed.
    pub fn failed(mass: f64, reason: impl Into<String>) -> Self {
        Self { mass, strength: f64::INFINITY, status: LimitStatus::Failed(reason.into()) }
    }

    /// `true` if the point carries a finite bound.
    pub fn has_bound(&self) -> bool {
        self.status == LimitStatus::Converged && self.strength.is_finite()
    }
}

/// Exclusion curve: one point per scanned mass, ascending in mass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExclusionCurve {
    /// Confidence level the curve was computed at.
    pub confidence_level: f64,
    /// Curve points.
    pub points: Vec<LimitPoint>,
}

impl ExclusionCurve {
    /// Create a curve from points (already in mass order).
    pub fn new(confidence_level: f64, points: Vec<LimitPoint>) -> Self {
        Self { confidence_level, points }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` if the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points carrying a finite bound.
    pub fn bounded(&self) -> impl Iterator<Item = &LimitPoint> {
        self.points.iter().filter(|p| p.has_bound())
    }

    /// Point with the strongest (smallest) bound, if any.
    pub fn strongest(&self) -> Option<&LimitPoint> {
        self.bounded().min_by(|a, b| a.strength.total_cmp(&b.strength))
    }
}
