//! Natural units (`hbar = c = 1`, `GeV = 1`).
//!
//! Multiply to convert into natural units, divide to convert back:
//! `let v0 = 220.0 * KM_PER_SEC;`, `let sigma_cm2 = sigma / (CM * CM);`

/// Giga-electronvolt.
pub const GEV: f64 = 1.0;
/// Mega-electronvolt.
pub const MEV: f64 = 1e-3;
/// Kilo-electronvolt.
pub const KEV: f64 = 1e-6;
/// Electronvolt.
pub const EV: f64 = 1e-9;

/// Femtometre (`1 / (hbar c)` with `hbar c = 0.1973269804 GeV fm`).
pub const FM: f64 = 1.0 / 0.197_326_980_4;
/// Centimetre.
pub const CM: f64 = 1e13 * FM;
/// Metre.
pub const METER: f64 = 100.0 * CM;
/// Kilometre.
pub const KM: f64 = 1e3 * METER;

/// Second (`1 / hbar` with `hbar = 6.582119569e-25 GeV s`).
pub const SEC: f64 = 1.0 / 6.582_119_569e-25;
/// Julian year.
pub const YEAR: f64 = 365.25 * 24.0 * 3600.0 * SEC;
/// Day.
pub const DAY: f64 = 24.0 * 3600.0 * SEC;

/// Kilogram.
pub const KG: f64 = 5.609_588_603e26 * GEV;
/// Atomic mass unit.
pub const AMU: f64 = 0.931_494_102_42 * GEV;
/// Proton mass.
pub const PROTON_MASS: f64 = 0.938_272_088_16 * GEV;
/// Electron mass.
pub const ELECTRON_MASS: f64 = 0.510_998_950 * MEV;
/// Fine-structure constant.
pub const ALPHA_EM: f64 = 1.0 / 137.035_999_084;

/// Kilometre per second.
pub const KM_PER_SEC: f64 = KM / SEC;

/// Reduced mass of two bodies.
pub fn reduced_mass(m1: f64, m2: f64) -> f64 {
    m1 * m2 / (m1 + m2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_speed_of_light() {
        assert_relative_eq!(299_792.458 * KM_PER_SEC, 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_reduced_mass() {
        assert_relative_eq!(reduced_mass(2.0, 2.0), 1.0);
        assert!(reduced_mass(1e6, 1.0) < 1.0);
    }
}
