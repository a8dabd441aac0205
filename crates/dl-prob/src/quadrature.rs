//! Composite Gauss-Legendre quadrature on closed intervals.
//!
//! The interval is split into equal panels and a fixed-order Gauss-Legendre
//! rule is applied on each. Nodes and weights are computed once per
//! [`Quadrature`] and reused for every integral.

/// Gauss-Legendre quadrature order (number of nodes per panel).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuadratureOrder {
    /// 8 nodes per panel.
    N8,
    /// 16 nodes per panel.
    N16,
    /// 32 nodes per panel (default).
    #[default]
    N32,
    /// 64 nodes per panel.
    N64,
}

impl QuadratureOrder {
    fn n(self) -> usize {
        match self {
            Self::N8 => 8,
            Self::N16 => 16,
            Self::N32 => 32,
            Self::N64 => 64,
        }
    }
}

/// Compute Gauss-Legendre nodes and weights on `[-1, 1]` for the given order.
///
/// Newton iteration on the roots of `P_n`, weights from `P'_n`; only half the
/// roots are computed, the rest by symmetry.
fn gauss_legendre_nodes_weights(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.0f64; n];
    let mut weights = vec![0.0f64; n];

    if n == 0 {
        return (nodes, weights);
    }
    if n == 1 {
        weights[0] = 2.0;
        return (nodes, weights);
    }

    let nf = n as f64;
    let legendre = |x: f64| {
        let mut p0 = 1.0f64;
        let mut p1 = x;
        for j in 2..=n {
            let jf = j as f64;
            let p2 = ((2.0 * jf - 1.0) * x * p1 - (jf - 1.0) * p0) / jf;
            p0 = p1;
            p1 = p2;
        }
        // (P_n(x), P'_n(x))
        (p1, nf * (x * p1 - p0) / (x * x - 1.0))
    };

    for i in 0..n.div_ceil(2) {
        // Chebyshev initial guess.
        let mut x = ((std::f64::consts::PI * (i as f64 + 0.75)) / (nf + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre(x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        let (_, dp) = legendre(x);
        let w = 2.0 / ((1.0 - x * x) * dp * dp);

        nodes[i] = -x;
        nodes[n - 1 - i] = x;
        weights[i] = w;
        weights[n - 1 - i] = w;
    }

    (nodes, weights)
}

/// Reusable composite Gauss-Legendre rule.
#[derive(Debug, Clone)]
pub struct Quadrature {
    nodes: Vec<f64>,
    weights: Vec<f64>,
    panels: usize,
}

impl Quadrature {
    /// Rule with `order` nodes on each of `panels` equal sub-intervals.
    pub fn new(order: QuadratureOrder, panels: usize) -> Self {
        let (nodes, weights) = gauss_legendre_nodes_weights(order.n());
        Self { nodes, weights, panels: panels.max(1) }
    }

    /// Number of panels.
    pub fn panels(&self) -> usize {
        self.panels
    }

    /// Integrate `f` over `[a, b]`. Returns 0 for an empty or inverted interval.
    pub fn integrate<F: Fn(f64) -> f64>(&self, f: F, a: f64, b: f64) -> f64 {
        if !(b > a) {
            return 0.0;
        }
        let width = (b - a) / self.panels as f64;
        let half = 0.5 * width;
        let mut total = 0.0;
        for p in 0..self.panels {
            let mid = a + (p as f64 + 0.5) * width;
            let mut acc = 0.0;
            for (&x, &w) in self.nodes.iter().zip(&self.weights) {
                acc += w * f(mid + half * x);
            }
            total += acc * half;
        }
        total
    }
}

impl Default for Quadrature {
    fn default() -> Self {
        Self::new(QuadratureOrder::default(), 8)
    }
}
