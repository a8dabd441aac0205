//! Special functions and numerical primitives for darklimit.
//!
//! - Poisson CDF and one-sided Poisson upper limits
//! - Yellin's maximum-gap CDF
//! - Gauss-Legendre quadrature on closed intervals
//! - bracketed root finding (Brent, via argmin)

pub mod maximum_gap;
pub mod poisson;
pub mod quadrature;
pub mod roots;

pub use maximum_gap::cdf_maximum_gap;
pub use quadrature::{Quadrature, QuadratureOrder};
pub use roots::find_root;
