//! Quadrature rules for the one-dimensional domain `[-1, 1]`.

use crate::Rule1d;
use std::f64::consts::PI;

/// Value and derivative of the Legendre polynomial `P_n` at `x`.
///
/// The derivative formula is singular at `|x| == 1`, so this is only used in the open interval.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    // (m + 1) P_{m + 1}(x) = (2m + 1) x P_m(x) - m P_{m - 1}(x)
    let (mut current, mut previous) = (1.0, 0.0);
    for m in 0..n {
        let m = m as f64;
        let next = ((2.0 * m + 1.0) * x * current - m * previous) / (m + 1.0);
        previous = current;
        current = next;
    }
    let n = n as f64;
    let derivative = n * (x * current - previous) / (x * x - 1.0);
    (current, derivative)
}

/// Gauss-Legendre quadrature on `[-1, 1]` with `num_points` points.
///
/// The rule integrates polynomials of degree up to `2 * num_points - 1` exactly.
/// Points are returned in ascending order.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> Rule1d {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    let mut rule = vec![(0.0, 0.0); n];
    // Roots come in pairs +-x, so only the non-negative half is computed
    for i in 0..(n + 1) / 2 {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut derivative;
        let mut iterations = 0;
        loop {
            let (p, dp) = legendre(n, x);
            derivative = dp;
            let step = p / dp;
            x -= step;
            iterations += 1;
            if step.abs() <= 1e-15 || iterations >= 100 {
                break;
            }
        }
        let (_, dp) = legendre(n, x);
        if dp.is_finite() {
            derivative = dp;
        }
        let weight = 2.0 / ((1.0 - x * x) * derivative * derivative);
        rule[i] = (weight, -x);
        rule[n - 1 - i] = (weight, x);
    }

    let weights = rule.iter().map(|&(w, _)| w).collect();
    let points = rule.iter().map(|&(_, x)| [x]).collect();
    (weights, points)
}

/// The number of Gauss points needed to integrate polynomials of the given degree exactly.
pub fn gauss_points_for_strength(strength: usize) -> usize {
    (strength + 2) / 2
}
