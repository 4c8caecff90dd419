use crate::element::{CellType, DofLayout, Element, ScalarElement, ShapeFunction};
use nalgebra::DMatrix;

/// A vector-valued element whose components are each discretized with the same scalar element.
///
/// Local dof `i * dim + k` is component `k` of scalar dof `i`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ElementVector<E> {
    element: E,
    dim: usize,
}

impl<E: ScalarElement> ElementVector<E> {
    /// One component per spatial dimension of the reference cell.
    pub fn new(element: E) -> Self {
        Self::with_components(element, E::CELL_TYPE.reference_dim())
    }

    /// # Panics
    ///
    /// Panics if `dim` is zero.
    pub fn with_components(element: E, dim: usize) -> Self {
        assert!(dim > 0, "vector element needs at least one component");
        Self { element, dim }
    }

    pub fn scalar_element(&self) -> &E {
        &self.element
    }
}

impl<E: ScalarElement> Element for ElementVector<E> {
    fn cell_type(&self) -> CellType {
        E::CELL_TYPE
    }

    fn dof_layout(&self) -> DofLayout {
        E::LAYOUT.scaled(self.dim)
    }

    fn degree(&self) -> usize {
        E::DEGREE
    }

    fn value_dim(&self) -> Option<usize> {
        Some(self.dim)
    }

    fn evaluate_basis(&self, local_dof: usize, points: &DMatrix<f64>) -> ShapeFunction {
        let shape = self.element.tabulate(local_dof / self.dim, points);
        ShapeFunction {
            component: Some(local_dof % self.dim),
            ..shape
        }
    }
}
