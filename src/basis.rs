//! Global bases: an element bound to (a part of) a mesh and tabulated at quadrature points.
//!
//! A basis owns everything assembly needs, so that forms never re-derive geometry:
//! the local-to-global dof map, the integration measure, the physical quadrature points and one
//! [`DiscreteField`] per local shape function.
use crate::assembly::{Coefficient, FormParameters};
use crate::element::{Element, ShapeFunction};
use crate::error::AssemblyError;
use crate::field::DiscreteField;
use crate::mesh::Mesh;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, ArrayD, Axis, IxDyn};

mod facet;
mod interior;

pub use facet::FacetBasis;
pub use interior::InteriorBasis;

/// Explicit configuration of basis construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasisOptions {
    /// Restrict the basis to the cells of a named subdomain.
    pub subdomain: Option<String>,
    /// Override the default quadrature strength of twice the element degree.
    pub quadrature_strength: Option<usize>,
}

impl BasisOptions {
    pub fn with_subdomain(mut self, name: impl Into<String>) -> Self {
        self.subdomain = Some(name.into());
        self
    }

    pub fn with_quadrature_strength(mut self, strength: usize) -> Self {
        self.quadrature_strength = Some(strength);
        self
    }
}

/// Quadrature-point data shared by interior and facet bases.
///
/// Arrays follow the layout of [`crate::field`]: element axis and quadrature axis last.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisData {
    num_dofs: usize,
    dofs: Array2<usize>,
    dx: Array2<f64>,
    x: ArrayD<f64>,
    h: ArrayD<f64>,
    normals: Option<ArrayD<f64>>,
    basis: Vec<DiscreteField>,
}

impl BasisData {
    /// Total number of global dofs of the mesh, regardless of the subset the basis covers.
    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    pub fn num_elements(&self) -> usize {
        self.dofs.nrows()
    }

    pub fn num_local_dofs(&self) -> usize {
        self.dofs.ncols()
    }

    pub fn num_quadrature_points(&self) -> usize {
        self.dx.ncols()
    }

    /// Local-to-global dof map `[E, n_local]`.
    pub fn dofs(&self) -> &Array2<usize> {
        &self.dofs
    }

    /// Quadrature weight times Jacobian determinant (or facet measure), `[E, Q]`.
    pub fn dx(&self) -> &Array2<f64> {
        &self.dx
    }

    /// Physical quadrature points `[d, E, Q]`.
    pub fn x(&self) -> &ArrayD<f64> {
        &self.x
    }

    /// Diameter of the cell each quadrature point belongs to, `[E, Q]`.
    pub fn h(&self) -> &ArrayD<f64> {
        &self.h
    }

    /// Outward unit normals `[d, E, Q]`, only present for facet bases.
    pub fn normals(&self) -> Option<&ArrayD<f64>> {
        self.normals.as_ref()
    }

    /// One field per local shape function.
    pub fn basis(&self) -> &[DiscreteField] {
        &self.basis
    }
}

/// A set of shape functions tabulated at the quadrature points of a set of elements.
pub trait GlobalBasis: Sync {
    fn data(&self) -> &BasisData;

    fn element(&self) -> &dyn Element;

    fn num_dofs(&self) -> usize {
        self.data().num_dofs()
    }

    fn num_elements(&self) -> usize {
        self.data().num_elements()
    }

    /// Values and derivatives of the finite element function with the given global dofs
    /// at every quadrature point.
    fn interpolate(&self, dofs: &DVector<f64>) -> eyre::Result<DiscreteField> {
        interpolate(self.data(), dofs)
    }

    /// Form parameters for this basis with the given coefficients.
    fn parameters(&self, coefficients: &[Coefficient]) -> eyre::Result<FormParameters> {
        FormParameters::from_basis(self.data(), coefficients)
    }
}

pub(crate) fn interpolate(data: &BasisData, dofs: &DVector<f64>) -> eyre::Result<DiscreteField> {
    if dofs.len() != data.num_dofs() {
        return Err(AssemblyError::ShapeMismatch {
            expected: vec![data.num_dofs()],
            actual: vec![dofs.len()],
        }
        .into());
    }

    let Some(first) = data.basis().first() else {
        return Err(AssemblyError::MissingComponent {
            name: "shape functions".to_string(),
        }
        .into());
    };
    let mut result = first.zeros_like();
    for (k, phi) in data.basis().iter().enumerate() {
        for e in 0..data.num_elements() {
            let coefficient = dofs[data.dofs()[[e, k]]];
            let targets = [&mut result.value, &mut result.grad, &mut result.ggrad];
            let sources = [&phi.value, &phi.grad, &phi.ggrad];
            for (target, source) in targets.into_iter().zip(sources) {
                if let (Some(target), Some(source)) = (target.as_mut(), source.as_ref()) {
                    let axis = Axis(target.ndim() - 2);
                    target
                        .index_axis_mut(axis, e)
                        .scaled_add(coefficient, &source.index_axis(axis, e));
                }
            }
        }
    }
    Ok(result)
}

pub(crate) fn check_cell_type(mesh: &Mesh, element: &dyn Element) -> eyre::Result<()> {
    if mesh.cell_type() != element.cell_type() {
        return Err(AssemblyError::IncompatibleElement {
            details: format!(
                "element is defined on {:?} cells, but the mesh consists of {:?} cells",
                element.cell_type(),
                mesh.cell_type()
            ),
        }
        .into());
    }
    Ok(())
}

/// Numbers dofs globally: vertex dofs first, then facet dofs, then interior dofs.
///
/// Returns the total number of dofs and the dof map of the given cells.
pub(crate) fn global_dof_map(mesh: &Mesh, element: &dyn Element, cells: &[usize]) -> (usize, Array2<usize>) {
    let layout = element.dof_layout();
    let facet_offset = mesh.num_vertices() * layout.nodal;
    let interior_offset = facet_offset + mesh.num_facets() * layout.facet;
    let num_dofs = interior_offset + mesh.num_cells() * layout.interior;

    let mut dofs = Array2::zeros((cells.len(), element.num_local_dofs()));
    for (e, &cell) in cells.iter().enumerate() {
        let vertex_dofs = mesh
            .cell_vertices(cell)
            .iter()
            .flat_map(|&v| (0..layout.nodal).map(move |k| v * layout.nodal + k));
        let facet_dofs = mesh
            .cell_facets(cell)
            .iter()
            .flat_map(|&f| (0..layout.facet).map(move |k| facet_offset + f * layout.facet + k));
        let interior_dofs = (0..layout.interior).map(|k| interior_offset + cell * layout.interior + k);

        for (local, global) in vertex_dofs.chain(facet_dofs).chain(interior_dofs).enumerate() {
            dofs[[e, local]] = global;
        }
    }
    (num_dofs, dofs)
}

/// Inverse and determinant of a cell Jacobian.
pub(crate) fn invert_jacobian(cell: usize, jacobian: &DMatrix<f64>, diameter: f64) -> eyre::Result<(DMatrix<f64>, f64)> {
    let determinant = jacobian.determinant();
    if !(determinant.abs() > 1e-14 * diameter.powi(jacobian.nrows() as i32)) {
        return Err(AssemblyError::DegenerateCell { cell }.into());
    }
    let inverse = jacobian
        .clone()
        .try_inverse()
        .ok_or(AssemblyError::DegenerateCell { cell })?;
    Ok((inverse, determinant))
}

pub(crate) fn tabulate(element: &dyn Element, points: &DMatrix<f64>) -> Vec<ShapeFunction> {
    (0..element.num_local_dofs())
        .map(|k| element.evaluate_basis(k, points))
        .collect()
}

/// Maps tabulated reference shape functions to physical fields.
///
/// Element `e` uses the tabulation `tabulations[tabulation_of_element[e]]` and the inverse
/// Jacobian `inverse_jacobians[e]`. Gradients transform with `J^-T`, Hessians with
/// `J^-T H J^-1`.
pub(crate) fn physical_fields(
    element: &dyn Element,
    inverse_jacobians: &[DMatrix<f64>],
    tabulations: &[Vec<ShapeFunction>],
    tabulation_of_element: &[usize],
) -> Vec<DiscreteField> {
    let d = element.cell_type().reference_dim();
    let num_elements = inverse_jacobians.len();
    let num_points = tabulations
        .first()
        .and_then(|t| t.first())
        .map(|phi| phi.values.len())
        .unwrap_or(0);
    let components = element.value_dim().unwrap_or(1);
    let inverse_transposes: Vec<DMatrix<f64>> = inverse_jacobians.iter().map(|j| j.transpose()).collect();

    (0..element.num_local_dofs())
        .map(|k| {
            let mut value = ArrayD::zeros(IxDyn(&[components, num_elements, num_points]));
            let mut grad = ArrayD::zeros(IxDyn(&[components, d, num_elements, num_points]));
            let has_hessians = tabulations.iter().all(|t| t[k].hessians.is_some());
            let mut ggrad = has_hessians.then(|| ArrayD::zeros(IxDyn(&[components, d, d, num_elements, num_points])));

            for e in 0..num_elements {
                let phi = &tabulations[tabulation_of_element[e]][k];
                let c = phi.component.unwrap_or(0);
                let inverse = &inverse_jacobians[e];
                let inverse_t = &inverse_transposes[e];
                for q in 0..num_points {
                    value[[c, e, q]] = phi.values[q];
                    let g = inverse_t * phi.gradients.column(q);
                    for i in 0..d {
                        grad[[c, i, e, q]] = g[i];
                    }
                    if let (Some(ggrad), Some(hessians)) = (ggrad.as_mut(), phi.hessians.as_ref()) {
                        let hq = inverse_t * &hessians[q] * inverse;
                        for i in 0..d {
                            for j in 0..d {
                                ggrad[[c, i, j, e, q]] = hq[(i, j)];
                            }
                        }
                    }
                }
            }

            if element.value_dim().is_none() {
                value = value.index_axis_move(Axis(0), 0);
                grad = grad.index_axis_move(Axis(0), 0);
                ggrad = ggrad.map(|h| h.index_axis_move(Axis(0), 0));
            }

            DiscreteField {
                value: Some(value),
                grad: Some(grad),
                ggrad,
                ..DiscreteField::default()
            }
        })
        .collect()
}
