//! Target nuclei and the Helm nuclear form factor.

use serde::{Deserialize, Serialize};

use crate::units::{AMU, FM};

/// Target nucleus, characterized by its mass number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nucleus {
    /// Mass number `A`.
    pub mass_number: f64,
}

impl Nucleus {
    /// Nucleus with mass number `a`.
    pub fn new(mass_number: f64) -> Self {
        Self { mass_number }
    }

    /// Xenon (A = 131).
    pub fn xenon() -> Self {
        Self::new(131.0)
    }

    /// Germanium (A = 73).
    pub fn germanium() -> Self {
        Self::new(73.0)
    }

    /// Argon (A = 40).
    pub fn argon() -> Self {
        Self::new(40.0)
    }

    /// Nuclear mass.
    pub fn mass(&self) -> f64 {
        self.mass_number * AMU
    }

    /// Helm form factor `F(q)` (Lewin & Smith parameters).
    pub fn helm_form_factor(&self, q: f64) -> f64 {
        let a = 0.52 * FM;
        let s = 0.9 * FM;
        let c = (1.23 * self.mass_number.cbrt() - 0.60) * FM;
        let rn = (c * c + 7.0 / 3.0 * std::f64::consts::PI.powi(2) * a * a - 5.0 * s * s).sqrt();

        let qr = q * rn;
        if qr < 1e-4 {
            return (-(q * s).powi(2) / 2.0).exp();
        }
        let j1 = (qr.sin() - qr * qr.cos()) / (qr * qr);
        3.0 * j1 / qr * (-(q * s).powi(2) / 2.0).exp()
    }
}
