//! Symmetric quadrature rules for the unit triangle `(0, 0), (1, 0), (0, 1)`.

use crate::{Error, Rule2d};

/// The highest polynomial strength for which a triangle rule is tabulated.
pub const MAX_TRIANGLE_STRENGTH: usize = 5;

/// A symmetry orbit of barycentric points sharing one weight.
///
/// Weights are normalized so that they sum to one over the triangle, and are scaled by the
/// area `1/2` when the rule is expanded.
enum Orbit {
    /// The centroid.
    Centroid { weight: f64 },
    /// The three points with barycentric coordinates `(a, a, 1 - 2a)` and permutations.
    Three { weight: f64, a: f64 },
}

fn expand(orbits: &[Orbit]) -> Rule2d {
    let mut weights = Vec::new();
    let mut points = Vec::new();
    for orbit in orbits {
        match *orbit {
            Orbit::Centroid { weight } => {
                weights.push(0.5 * weight);
                points.push([1.0 / 3.0, 1.0 / 3.0]);
            }
            Orbit::Three { weight, a } => {
                let b = 1.0 - 2.0 * a;
                for point in [[a, a], [b, a], [a, b]] {
                    weights.push(0.5 * weight);
                    points.push(point);
                }
            }
        }
    }
    (weights, points)
}

/// A quadrature rule for the unit triangle that integrates polynomials of total degree
/// up to `strength` exactly.
///
/// Rules of strength 0 through [`MAX_TRIANGLE_STRENGTH`] are available. Strength 3 is served
/// by the strength 4 rule, which has positive weights.
pub fn triangle(strength: usize) -> Result<Rule2d, Error> {
    let orbits: &[Orbit] = match strength {
        0 | 1 => &[Orbit::Centroid { weight: 1.0 }],
        2 => &[Orbit::Three {
            weight: 1.0 / 3.0,
            a: 1.0 / 6.0,
        }],
        3 | 4 => &[
            Orbit::Three {
                weight: 0.223_381_589_678_011,
                a: 0.445_948_490_915_965,
            },
            Orbit::Three {
                weight: 0.109_951_743_655_322,
                a: 0.091_576_213_509_771,
            },
        ],
        5 => &[
            Orbit::Centroid { weight: 0.225 },
            Orbit::Three {
                weight: 0.132_394_152_788_506,
                a: 0.470_142_064_105_115,
            },
            Orbit::Three {
                weight: 0.125_939_180_544_827,
                a: 0.101_286_507_323_456,
            },
        ],
        _ => return Err(Error::NoRuleAvailable { strength }),
    };
    Ok(expand(orbits))
}
