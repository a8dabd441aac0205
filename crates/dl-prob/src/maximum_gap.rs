//! Yellin's maximum-gap statistic (S. Yellin, Phys. Rev. D 66, 032005).
//!
//! For a Poisson process with total mean `mu` on an interval mapped to
//! expected-event space, `C0(x, mu)` is the probability that the largest gap
//! between consecutive events (interval endpoints included) is smaller than
//! `x`:
//!
//! ```text
//! C0(x, mu) = Σ_{k=0}^{⌊mu/x⌋} (kx - mu)^k e^{-kx} / k! · (1 + k / (mu - kx))
//! ```
//!
//! The series alternates, and for `mu / x` in the tens or more its terms
//! exceed the result by many orders of magnitude. Those cases are evaluated
//! from an equivalent delay differential equation instead.

use statrs::function::gamma::ln_gamma;

/// Terms below this magnitude no longer change the sum.
const TERM_CUTOFF: f64 = 1e-20;

/// Largest series term tolerated before cancellation eats into the result
/// (about 1e-12 absolute in double precision).
const SERIES_MAX_TERM: f64 = 1e4;

/// Grid points per expected event, and at least this many per gap, for the
/// delay-equation solver.
const DELAY_STEPS_PER_EVENT: usize = 32;

/// Probability that the maximum gap is smaller than `x` given mean `mu`.
///
/// Small `mu / x` uses the alternating series above. Once its terms grow
/// large enough to cancel, `C0` is instead obtained from the equivalent
/// delay equation (see [`delay_equation`]), whose terms are all positive.
pub fn cdf_maximum_gap(x: f64, mu: f64) -> f64 {
    if x.is_nan() || mu.is_nan() {
        return f64::NAN;
    }
    if mu <= 0.0 {
        return 1.0;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x > mu {
        return 1.0;
    }

    let c = series(x, mu).unwrap_or_else(|| {
        log::trace!("maximum-gap series cancels at x={} mu={}; solving delay equation", x, mu);
        delay_equation(x, mu)
    });
    c.clamp(0.0, 1.0)
}

/// Direct series, or `None` if a term exceeds [`SERIES_MAX_TERM`].
///
/// Each term `k >= 1` is expanded as
/// `(-1)^k e^{-kx} [y^k / k! + y^(k-1) / (k-1)!]` with `y = mu - kx`,
/// which removes the pole at `kx = mu` and lets the magnitudes be computed in
/// log space without factorial overflow. Terms are unimodal in `k`, so the sum
/// stops once they are decreasing and negligible.
fn series(x: f64, mu: f64) -> Option<f64> {
    let m = (mu / x).floor() as u64;
    let mut sum = 1.0;
    let mut prev = f64::INFINITY;
    for k in 1..=m {
        let kf = k as f64;
        let y = (mu - kf * x).max(0.0);
        let decay = -kf * x;
        let a = if y > 0.0 { (decay + kf * y.ln() - ln_gamma(kf + 1.0)).exp() } else { 0.0 };
        let b = if k == 1 {
            decay.exp()
        } else if y > 0.0 {
            (decay + (kf - 1.0) * y.ln() - ln_gamma(kf)).exp()
        } else {
            0.0
        };
        let magnitude = a + b;
        if magnitude > SERIES_MAX_TERM {
            return None;
        }
        if k % 2 == 0 {
            sum += magnitude;
        } else {
            sum -= magnitude;
        }
        if magnitude < TERM_CUTOFF && magnitude < prev {
            break;
        }
        prev = magnitude;
    }
    Some(sum)
}

/// `C0(x, mu) = G(mu)` where `G = 1` on `[0, x)`, `G(x) = 1 - e^{-x}` and
/// `G'(t) = -e^{-x} G(t - x)` for `t > x`.
///
/// `G(t)` is the probability that no gap reaches `x` on `[0, t]`. The
/// equation is stepped with the trapezoid rule on a grid aligned with `x`
/// (so the jump at `x` and the kinks at its multiples fall on grid points),
/// once at step `h` and once at `h / 2`, and Richardson-extrapolated.
fn delay_equation(x: f64, mu: f64) -> f64 {
    let n = ((DELAY_STEPS_PER_EVENT as f64 * x).ceil() as usize).max(DELAY_STEPS_PER_EVENT);
    let coarse = delay_trapezoid(x, mu, n);
    let fine = delay_trapezoid(x, mu, 2 * n);
    (4.0 * fine - coarse) / 3.0
}

/// Trapezoid solution with `n` steps per gap length `x`; requires `mu >= x`.
fn delay_trapezoid(x: f64, mu: f64, n: usize) -> f64 {
    let h = x / n as f64;
    let damp = (-x).exp();
    let total = mu / h;
    let steps = (total.floor() as usize).max(n);
    let frac = (total - steps as f64).max(0.0);

    // Ring buffer holding G at grid indices j - n ..= j.
    let len = n + 1;
    let mut ring = vec![1.0; len];
    ring[n] = 1.0 - damp;

    let mut j = n;
    while j < steps {
        let a = ring[(j - n) % len];
        let b = left_limit(&ring, j - n + 1, n);
        ring[(j + 1) % len] = ring[j % len] - 0.5 * damp * h * (a + b);
        j += 1;
    }

    let mut g = ring[j % len];
    if frac > 0.0 {
        let a = ring[(j - n) % len];
        let b = left_limit(&ring, j - n + 1, n);
        let end = a + (b - a) * frac;
        g -= 0.5 * damp * h * frac * (a + end);
    }
    g
}

/// `G` just left of grid index `i`; differs from the stored value only at the jump `i = n`.
fn left_limit(ring: &[f64], i: usize, n: usize) -> f64 {
    if i == n { 1.0 } else { ring[i % ring.len()] }
}

/// Maximum gap in a non-decreasing sequence of points in expected-event space.
///
/// `cumulative` must include both interval endpoints. Returns 0 for fewer
/// than two points.
pub fn maximum_gap(cumulative: &[f64]) -> f64 {
    cumulative.windows(2).map(|w| w[1] - w[0]).fold(0.0, f64::max)
}
