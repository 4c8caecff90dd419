//! Quadrature rules on reference cells and facets.
use crate::element::CellType;
use crate::error::AssemblyError;
use formwork_quadrature::{simplex, univariate};
use nalgebra::DMatrix;

/// A quadrature rule with points stored column-wise.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule {
    points: DMatrix<f64>,
    weights: Vec<f64>,
}

/// The quadrature strength used for an element of the given polynomial degree.
///
/// This integrates products of two shape functions exactly on affine cells.
pub fn default_strength(degree: usize) -> usize {
    2 * degree
}

/// Gauss rule on `[0, 1]` that is exact for polynomials of degree `strength`.
fn unit_interval(strength: usize) -> QuadratureRule {
    let (weights, points) = univariate::gauss(univariate::gauss_points_for_strength(strength));
    QuadratureRule {
        points: DMatrix::from_iterator(1, points.len(), points.iter().map(|[x]| 0.5 * (x + 1.0))),
        weights: weights.iter().map(|w| 0.5 * w).collect(),
    }
}

impl QuadratureRule {
    pub fn new(points: DMatrix<f64>, weights: Vec<f64>) -> eyre::Result<Self> {
        if points.ncols() != weights.len() {
            return Err(AssemblyError::ShapeMismatch {
                expected: vec![points.nrows(), weights.len()],
                actual: vec![points.nrows(), points.ncols()],
            }
            .into());
        }
        Ok(Self { points, weights })
    }

    /// A rule on the reference cell integrating polynomials of degree `strength` exactly.
    pub fn for_cell(cell_type: CellType, strength: usize) -> eyre::Result<Self> {
        match cell_type {
            CellType::Segment => Ok(unit_interval(strength)),
            CellType::Triangle => {
                let (weights, points) = simplex::triangle(strength).map_err(AssemblyError::from)?;
                let coords: Vec<f64> = points.iter().flatten().copied().collect();
                Ok(Self {
                    points: DMatrix::from_column_slice(2, weights.len(), &coords),
                    weights,
                })
            }
        }
    }

    /// A rule on the reference facet of the cell type, parametrized by `[0, 1]` for triangle
    /// edges. The facets of a segment are points, so their rule is a single point of weight one.
    pub fn for_facet(cell_type: CellType, strength: usize) -> eyre::Result<Self> {
        match cell_type {
            CellType::Segment => Ok(Self {
                points: DMatrix::zeros(0, 1),
                weights: vec![1.0],
            }),
            CellType::Triangle => Ok(unit_interval(strength)),
        }
    }

    pub fn points(&self) -> &DMatrix<f64> {
        &self.points
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn num_points(&self) -> usize {
        self.weights.len()
    }

    pub fn dim(&self) -> usize {
        self.points.nrows()
    }
}
