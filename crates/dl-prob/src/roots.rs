//! Bracketed 1-D root finding.
//!
//! Thin wrapper around argmin's `BrentRoot` with a clean interface, plus the
//! bracket expansion used by every limit search in the workspace.

use argmin::core::{CostFunction, Executor, State, TerminationReason, TerminationStatus};
use argmin::solver::brent::BrentRoot;
use dl_core::{Error, Result};

/// Default absolute tolerance on the root location.
pub const DEFAULT_TOL: f64 = 1e-10;

/// Default iteration cap for a single root search.
pub const DEFAULT_MAX_ITER: u64 = 200;

/// Wrapper to make a scalar closure compatible with argmin
struct ScalarProblem<F> {
    f: F,
}

impl<F: Fn(f64) -> f64> CostFunction for ScalarProblem<F> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        let y = (self.f)(*x);
        if y.is_nan() {
            return Err(argmin::core::Error::msg(format!("function returned NaN at x={x}")));
        }
        Ok(y)
    }
}

/// Find a root of `f` in `[lo, hi]`.
///
/// `f(lo)` and `f(hi)` must have opposite signs (or one of them be zero).
/// Fails with [`Error::Computation`] if there is no sign change or the search
/// does not converge within `max_iter` iterations.
pub fn find_root<F: Fn(f64) -> f64>(f: F, lo: f64, hi: f64, tol: f64, max_iter: u64) -> Result<f64> {
    if !(lo.is_finite() && hi.is_finite()) || hi <= lo {
        return Err(Error::Validation(format!("Invalid bracket: lo={} hi={}", lo, hi)));
    }
    if !(tol > 0.0) {
        return Err(Error::Validation(format!("tolerance must be > 0, got {}", tol)));
    }

    let flo = f(lo);
    let fhi = f(hi);
    if flo == 0.0 {
        return Ok(lo);
    }
    if fhi == 0.0 {
        return Ok(hi);
    }
    if flo.is_nan() || fhi.is_nan() || flo.signum() == fhi.signum() {
        return Err(Error::Computation(format!(
            "no sign change in [{}, {}]: f(lo)={} f(hi)={}",
            lo, hi, flo, fhi
        )));
    }

    let solver = BrentRoot::new(lo, hi, tol);
    let res = Executor::new(ScalarProblem { f }, solver)
        .configure(|state| state.max_iters(max_iter))
        .run()
        .map_err(|e| Error::Computation(format!("root search failed: {}", e)))?;

    let state = res.state();
    let root = *state
        .get_best_param()
        .ok_or_else(|| Error::Computation("root search produced no estimate".to_string()))?;

    match state.get_termination_status() {
        TerminationStatus::Terminated(TerminationReason::SolverConverged) => Ok(root),
        status => Err(Error::Computation(format!(
            "root search did not converge after {} iterations ({}), best x={}",
            state.get_iter(),
            status,
            root
        ))),
    }
}

/// Grow `hi` geometrically until `f(hi)` has the opposite sign of `f(lo)`.
///
/// Returns the expanded upper end. Gives up after `max_expansions` steps.
pub fn expand_bracket_upward<F: Fn(f64) -> f64>(
    f: F,
    lo: f64,
    mut hi: f64,
    factor: f64,
    max_expansions: usize,
) -> Result<f64> {
    if !(factor > 1.0) {
        return Err(Error::Validation(format!("expansion factor must be > 1, got {}", factor)));
    }
    let flo = f(lo);
    if flo == 0.0 {
        return Ok(lo);
    }
    let mut fhi = f(hi);
    let mut expand = 0usize;
    while fhi.signum() == flo.signum() && fhi != 0.0 && expand < max_expansions {
        hi *= factor;
        fhi = f(hi);
        expand += 1;
    }
    if fhi.signum() == flo.signum() && fhi != 0.0 {
        return Err(Error::Computation(format!(
            "failed to bracket root above {} after {} expansions (hi={}, f(hi)={})",
            lo, max_expansions, hi, fhi
        )));
    }
    log::debug!("bracket [{}, {}] found after {} expansions", lo, hi, expand);
    Ok(hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sqrt_two() {
        let r = find_root(|x| x * x - 2.0, 0.0, 2.0, 1e-12, 100).unwrap();
        assert_relative_eq!(r, std::f64::consts::SQRT_2, epsilon = 1e-10);
    }

    #[test]
    fn test_transcendental() {
        // exp(-x) = 0.05  =>  x = ln 20
        let r = find_root(|x| (-x).exp() - 0.05, 0.0, 10.0, 1e-12, 100).unwrap();
        assert_relative_eq!(r, 20f64.ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_endpoint_root() {
        assert_eq!(find_root(|x| x - 1.0, 1.0, 3.0, 1e-12, 100).unwrap(), 1.0);
    }

    #[test]
    fn test_no_sign_change_is_computation_error() {
        let err = find_root(|x| x * x + 1.0, -1.0, 1.0, 1e-12, 100).unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }

    #[test]
    fn test_invalid_bracket() {
        assert!(matches!(find_root(|x| x, 1.0, 1.0, 1e-12, 100), Err(Error::Validation(_))));
    }

    #[test]
    fn test_expand_bracket() {
        let hi = expand_bracket_upward(|x| x - 100.0, 0.0, 1.0, 2.0, 50).unwrap();
        assert!(hi >= 100.0 && hi <= 128.0, "hi={}", hi);
        assert!(expand_bracket_upward(|_| 1.0, 0.0, 1.0, 2.0, 10).is_err());
    }
}
