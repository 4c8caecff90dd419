//! Quadrature rules for the reference domains used by `formwork`.
//!
//! Rules are returned as plain `(weights, points)` pairs of `f64` so that the crate can be
//! used without `formwork` or any linear algebra library.
//!
//! Reference domains:
//!
//! - the interval `[-1, 1]` for [univariate] rules,
//! - the unit triangle with corners `(0, 0)`, `(1, 0)`, `(0, 1)` for [simplex] rules.
//!   Its area is `1/2`, so the weights of every triangle rule sum to `1/2`.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod simplex;
pub mod univariate;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// No rule with at least the requested polynomial strength is available.
    NoRuleAvailable { strength: usize },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable { strength } => {
                write!(f, "no quadrature rule of polynomial strength {strength} is available")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional rule, stored as `(weights, points)`.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A one-dimensional rule.
pub type Rule1d = Rule<1>;

/// A two-dimensional rule.
pub type Rule2d = Rule<2>;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights.iter().zip(points).map(|(w, p)| w * f(p)).sum()
}
