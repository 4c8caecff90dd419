use crate::element::{CellType, DofLayout, ScalarElement};
use nalgebra::{DMatrix, DVector};

/// Piecewise linear Lagrange element on the reference interval `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ElementLineP1;

impl ScalarElement for ElementLineP1 {
    const CELL_TYPE: CellType = CellType::Segment;
    const DEGREE: usize = 1;
    const LAYOUT: DofLayout = DofLayout {
        nodal: 1,
        facet: 0,
        interior: 0,
    };

    fn shape_value(&self, local_dof: usize, xi: &[f64]) -> f64 {
        let x = xi[0];
        match local_dof {
            0 => 1.0 - x,
            1 => x,
            _ => unreachable!("ElementLineP1 has two shape functions"),
        }
    }

    fn shape_gradient(&self, local_dof: usize, _xi: &[f64]) -> DVector<f64> {
        let dx = match local_dof {
            0 => -1.0,
            1 => 1.0,
            _ => unreachable!("ElementLineP1 has two shape functions"),
        };
        DVector::from_element(1, dx)
    }
}

/// Piecewise quadratic Lagrange element on the reference interval `[0, 1]`.
///
/// The midpoint dof is an interior dof, since the facets of a segment are its end points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ElementLineP2;

impl ScalarElement for ElementLineP2 {
    const CELL_TYPE: CellType = CellType::Segment;
    const DEGREE: usize = 2;
    const LAYOUT: DofLayout = DofLayout {
        nodal: 1,
        facet: 0,
        interior: 1,
    };

    fn shape_value(&self, local_dof: usize, xi: &[f64]) -> f64 {
        let x = xi[0];
        match local_dof {
            0 => (1.0 - x) * (1.0 - 2.0 * x),
            1 => x * (2.0 * x - 1.0),
            2 => 4.0 * x * (1.0 - x),
            _ => unreachable!("ElementLineP2 has three shape functions"),
        }
    }

    fn shape_gradient(&self, local_dof: usize, xi: &[f64]) -> DVector<f64> {
        let x = xi[0];
        let dx = match local_dof {
            0 => 4.0 * x - 3.0,
            1 => 4.0 * x - 1.0,
            2 => 4.0 - 8.0 * x,
            _ => unreachable!("ElementLineP2 has three shape functions"),
        };
        DVector::from_element(1, dx)
    }

    fn shape_hessian(&self, local_dof: usize, _xi: &[f64]) -> Option<DMatrix<f64>> {
        let dxx = match local_dof {
            0 | 1 => 4.0,
            2 => -8.0,
            _ => unreachable!("ElementLineP2 has three shape functions"),
        };
        Some(DMatrix::from_element(1, 1, dxx))
    }
}
