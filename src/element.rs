//! Reference finite elements.
//!
//! An element knows how to evaluate its shape functions and their reference derivatives at
//! points of its reference cell. Mapping to physical cells is the job of the global bases in
//! [`crate::basis`].
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

mod segment;
mod triangle;
mod vector;

pub use segment::*;
pub use triangle::*;
pub use vector::*;

const SEGMENT_FACETS: &[&[usize]] = &[&[0], &[1]];
const TRIANGLE_FACETS: &[&[usize]] = &[&[0, 1], &[1, 2], &[0, 2]];

/// The reference cells supported by meshes and elements.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    /// The interval `[0, 1]`.
    Segment,
    /// The triangle with corners `(0, 0)`, `(1, 0)` and `(0, 1)`.
    Triangle,
}

impl CellType {
    pub fn reference_dim(&self) -> usize {
        match self {
            Self::Segment => 1,
            Self::Triangle => 2,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.reference_dim() + 1
    }

    /// Local vertex indices of each facet of the cell.
    ///
    /// Facets of a segment are its two end points, facets of a triangle are its edges.
    pub fn local_facets(&self) -> &'static [&'static [usize]] {
        match self {
            Self::Segment => SEGMENT_FACETS,
            Self::Triangle => TRIANGLE_FACETS,
        }
    }

    pub fn num_facets(&self) -> usize {
        self.local_facets().len()
    }

    pub fn num_facet_vertices(&self) -> usize {
        self.reference_dim()
    }

    /// Reference coordinates of the cell vertices, one column per vertex.
    pub fn reference_vertices(&self) -> DMatrix<f64> {
        match self {
            Self::Segment => DMatrix::from_row_slice(1, 2, &[0.0, 1.0]),
            Self::Triangle => DMatrix::from_column_slice(2, 3, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
        }
    }
}

/// Number of degrees of freedom attached to each vertex, each facet and the interior of a cell.
///
/// Local degrees of freedom are ordered accordingly: first all vertex dofs (vertex by vertex),
/// then all facet dofs (in the order of [`CellType::local_facets`]), then interior dofs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DofLayout {
    pub nodal: usize,
    pub facet: usize,
    pub interior: usize,
}

impl DofLayout {
    pub fn num_local_dofs(&self, cell_type: CellType) -> usize {
        cell_type.num_vertices() * self.nodal + cell_type.num_facets() * self.facet + self.interior
    }

    pub fn scaled(&self, factor: usize) -> Self {
        Self {
            nodal: self.nodal * factor,
            facet: self.facet * factor,
            interior: self.interior * factor,
        }
    }
}

/// A shape function tabulated at a set of reference points.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeFunction {
    /// The vector component the function lives in, `None` for scalar elements.
    pub component: Option<usize>,
    /// Values at each point.
    pub values: DVector<f64>,
    /// Reference gradients, one column per point.
    pub gradients: DMatrix<f64>,
    /// Reference Hessians, one per point.
    pub hessians: Option<Vec<DMatrix<f64>>>,
}

/// A finite element defined on a reference cell.
pub trait Element: Send + Sync {
    fn cell_type(&self) -> CellType;

    fn dof_layout(&self) -> DofLayout;

    /// Polynomial degree, used to choose quadrature rules.
    fn degree(&self) -> usize;

    fn num_local_dofs(&self) -> usize {
        self.dof_layout().num_local_dofs(self.cell_type())
    }

    /// Number of vector components, or `None` for a scalar element.
    fn value_dim(&self) -> Option<usize> {
        None
    }

    /// Tabulates the given local shape function at reference points, one column per point.
    ///
    /// # Panics
    ///
    /// Panics if `local_dof` is not smaller than [`num_local_dofs`](Self::num_local_dofs) or the
    /// points do not have the reference dimension as their number of rows.
    fn evaluate_basis(&self, local_dof: usize, points: &DMatrix<f64>) -> ShapeFunction;
}

/// A scalar Lagrange element described pointwise.
///
/// [`Element`] is implemented for every scalar element through `impl_element_for_scalar!`.
pub trait ScalarElement: Send + Sync {
    const CELL_TYPE: CellType;
    const DEGREE: usize;
    const LAYOUT: DofLayout;

    fn shape_value(&self, local_dof: usize, xi: &[f64]) -> f64;

    fn shape_gradient(&self, local_dof: usize, xi: &[f64]) -> DVector<f64>;

    /// Reference Hessian of the shape function, if the element provides second derivatives.
    fn shape_hessian(&self, _local_dof: usize, _xi: &[f64]) -> Option<DMatrix<f64>> {
        None
    }

    fn num_scalar_dofs(&self) -> usize {
        Self::LAYOUT.num_local_dofs(Self::CELL_TYPE)
    }

    fn tabulate(&self, local_dof: usize, points: &DMatrix<f64>) -> ShapeFunction {
        let dim = Self::CELL_TYPE.reference_dim();
        assert!(local_dof < self.num_scalar_dofs(), "local dof out of bounds");
        assert_eq!(points.nrows(), dim, "points must have the reference dimension");

        let num_points = points.ncols();
        let mut values = DVector::zeros(num_points);
        let mut gradients = DMatrix::zeros(dim, num_points);
        let mut hessians = Vec::with_capacity(num_points);
        for (q, column) in points.column_iter().enumerate() {
            let xi: Vec<f64> = column.iter().copied().collect();
            values[q] = self.shape_value(local_dof, &xi);
            gradients.set_column(q, &self.shape_gradient(local_dof, &xi));
            if let Some(hessian) = self.shape_hessian(local_dof, &xi) {
                hessians.push(hessian);
            }
        }

        ShapeFunction {
            component: None,
            values,
            gradients,
            hessians: (hessians.len() == num_points && num_points > 0).then_some(hessians),
        }
    }
}

macro_rules! impl_element_for_scalar {
    ($($element:ty),*) => {
        $(
            impl Element for $element {
                fn cell_type(&self) -> CellType {
                    <$element as ScalarElement>::CELL_TYPE
                }

                fn dof_layout(&self) -> DofLayout {
                    <$element as ScalarElement>::LAYOUT
                }

                fn degree(&self) -> usize {
                    <$element as ScalarElement>::DEGREE
                }

                fn evaluate_basis(&self, local_dof: usize, points: &DMatrix<f64>) -> ShapeFunction {
                    self.tabulate(local_dof, points)
                }
            }
        )*
    };
}

impl_element_for_scalar!(ElementLineP1, ElementLineP2, ElementTriP1, ElementTriP2);
