use crate::element::{CellType, DofLayout, ScalarElement};
use nalgebra::{DMatrix, DVector, Vector2};

const EDGES: [(usize, usize); 3] = [(0, 1), (1, 2), (0, 2)];

fn barycentric(xi: &[f64]) -> [f64; 3] {
    [1.0 - xi[0] - xi[1], xi[0], xi[1]]
}

fn barycentric_gradient(i: usize) -> Vector2<f64> {
    match i {
        0 => Vector2::new(-1.0, -1.0),
        1 => Vector2::new(1.0, 0.0),
        _ => Vector2::new(0.0, 1.0),
    }
}

fn to_dynamic(v: Vector2<f64>) -> DVector<f64> {
    DVector::from_column_slice(v.as_slice())
}

/// Piecewise linear Lagrange element on the reference triangle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ElementTriP1;

impl ScalarElement for ElementTriP1 {
    const CELL_TYPE: CellType = CellType::Triangle;
    const DEGREE: usize = 1;
    const LAYOUT: DofLayout = DofLayout {
        nodal: 1,
        facet: 0,
        interior: 0,
    };

    fn shape_value(&self, local_dof: usize, xi: &[f64]) -> f64 {
        assert!(local_dof < 3, "ElementTriP1 has three shape functions");
        barycentric(xi)[local_dof]
    }

    fn shape_gradient(&self, local_dof: usize, _xi: &[f64]) -> DVector<f64> {
        assert!(local_dof < 3, "ElementTriP1 has three shape functions");
        to_dynamic(barycentric_gradient(local_dof))
    }
}

/// Piecewise quadratic Lagrange element on the reference triangle.
///
/// Dofs 0-2 sit at the vertices, dofs 3-5 at the midpoints of the edges (0, 1), (1, 2) and (0, 2).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ElementTriP2;

impl ScalarElement for ElementTriP2 {
    const CELL_TYPE: CellType = CellType::Triangle;
    const DEGREE: usize = 2;
    const LAYOUT: DofLayout = DofLayout {
        nodal: 1,
        facet: 1,
        interior: 0,
    };

    fn shape_value(&self, local_dof: usize, xi: &[f64]) -> f64 {
        let l = barycentric(xi);
        match local_dof {
            0..=2 => l[local_dof] * (2.0 * l[local_dof] - 1.0),
            3..=5 => {
                let (a, b) = EDGES[local_dof - 3];
                4.0 * l[a] * l[b]
            }
            _ => unreachable!("ElementTriP2 has six shape functions"),
        }
    }

    fn shape_gradient(&self, local_dof: usize, xi: &[f64]) -> DVector<f64> {
        let l = barycentric(xi);
        let gradient = match local_dof {
            0..=2 => (4.0 * l[local_dof] - 1.0) * barycentric_gradient(local_dof),
            3..=5 => {
                let (a, b) = EDGES[local_dof - 3];
                4.0 * (l[b] * barycentric_gradient(a) + l[a] * barycentric_gradient(b))
            }
            _ => unreachable!("ElementTriP2 has six shape functions"),
        };
        to_dynamic(gradient)
    }

    fn shape_hessian(&self, local_dof: usize, _xi: &[f64]) -> Option<DMatrix<f64>> {
        let hessian = match local_dof {
            0..=2 => {
                let g = barycentric_gradient(local_dof);
                4.0 * g * g.transpose()
            }
            3..=5 => {
                let (a, b) = EDGES[local_dof - 3];
                let (ga, gb) = (barycentric_gradient(a), barycentric_gradient(b));
                4.0 * (ga * gb.transpose() + gb * ga.transpose())
            }
            _ => unreachable!("ElementTriP2 has six shape functions"),
        };
        Some(DMatrix::from_column_slice(2, 2, hessian.as_slice()))
    }
}
