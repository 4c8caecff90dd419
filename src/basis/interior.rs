use crate::basis::{
    check_cell_type, global_dof_map, invert_jacobian, physical_fields, tabulate, BasisData, BasisOptions, GlobalBasis,
};
use crate::element::Element;
use crate::error::AssemblyError;
use crate::mesh::Mesh;
use crate::quadrature::{default_strength, QuadratureRule};
use log::debug;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, ArrayD, IxDyn};

/// A global basis over the cells of a mesh or of one of its subdomains.
pub struct InteriorBasis<'a> {
    mesh: &'a Mesh,
    element: &'a dyn Element,
    cells: Vec<usize>,
    quadrature: QuadratureRule,
    data: BasisData,
}

impl<'a> InteriorBasis<'a> {
    /// A basis over all cells with the default quadrature strength.
    pub fn new(mesh: &'a Mesh, element: &'a dyn Element) -> eyre::Result<Self> {
        Self::with_options(mesh, element, &BasisOptions::default())
    }

    pub fn with_options(mesh: &'a Mesh, element: &'a dyn Element, options: &BasisOptions) -> eyre::Result<Self> {
        check_cell_type(mesh, element)?;
        let cells: Vec<usize> = match &options.subdomain {
            Some(name) => mesh.subdomain(name)?.to_vec(),
            None => (0..mesh.num_cells()).collect(),
        };
        let strength = options
            .quadrature_strength
            .unwrap_or_else(|| default_strength(element.degree()));
        let quadrature = QuadratureRule::for_cell(mesh.cell_type(), strength)?;

        let (num_dofs, dofs) = global_dof_map(mesh, element, &cells);
        let d = mesh.dim();
        let (num_elements, num_points) = (cells.len(), quadrature.num_points());
        let mut dx = Array2::zeros((num_elements, num_points));
        let mut x = ArrayD::zeros(IxDyn(&[d, num_elements, num_points]));
        let mut h = ArrayD::zeros(IxDyn(&[num_elements, num_points]));
        let mut inverse_jacobians = Vec::with_capacity(num_elements);

        for (e, &cell) in cells.iter().enumerate() {
            let (x0, jacobian) = mesh.cell_affine_map(cell);
            let diameter = mesh.cell_diameter(cell);
            let (inverse, determinant) = invert_jacobian(cell, &jacobian, diameter)?;
            for (q, xi) in quadrature.points().column_iter().enumerate() {
                dx[[e, q]] = quadrature.weights()[q] * determinant.abs();
                h[[e, q]] = diameter;
                let xq = &x0 + &jacobian * xi;
                for i in 0..d {
                    x[[i, e, q]] = xq[i];
                }
            }
            inverse_jacobians.push(inverse);
        }

        let tabulation = tabulate(element, quadrature.points());
        let basis = physical_fields(element, &inverse_jacobians, &[tabulation], &vec![0; num_elements]);

        debug!(
            "Built interior basis with {} elements, {} local dofs, {} quadrature points and {} global dofs",
            num_elements,
            element.num_local_dofs(),
            num_points,
            num_dofs
        );

        Ok(Self {
            mesh,
            element,
            cells,
            quadrature,
            data: BasisData {
                num_dofs,
                dofs,
                dx,
                x,
                h,
                normals: None,
                basis,
            },
        })
    }

    pub fn mesh(&self) -> &Mesh {
        self.mesh
    }

    /// Mesh cells covered by the basis, in element order.
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    pub fn quadrature(&self) -> &QuadratureRule {
        &self.quadrature
    }

    /// Evaluates the finite element function with the given global dofs at a physical point.
    ///
    /// Returns one value per vector component (a single value for scalar elements).
    pub fn probe(&self, dofs: &DVector<f64>, point: &DVector<f64>) -> eyre::Result<DVector<f64>> {
        if dofs.len() != self.data.num_dofs() {
            return Err(AssemblyError::ShapeMismatch {
                expected: vec![self.data.num_dofs()],
                actual: vec![dofs.len()],
            }
            .into());
        }
        if point.len() != self.mesh.dim() {
            return Err(AssemblyError::ShapeMismatch {
                expected: vec![self.mesh.dim()],
                actual: vec![point.len()],
            }
            .into());
        }

        let tolerance = 1e-12;
        for (e, &cell) in self.cells.iter().enumerate() {
            let (x0, jacobian) = self.mesh.cell_affine_map(cell);
            let Some(inverse) = jacobian.try_inverse() else {
                continue;
            };
            let xi = inverse * (point - x0);
            let inside = xi.iter().all(|&l| l >= -tolerance) && xi.sum() <= 1.0 + tolerance;
            if !inside {
                continue;
            }

            let reference_point = DMatrix::from_column_slice(xi.len(), 1, xi.as_slice());
            let mut value = DVector::zeros(self.element.value_dim().unwrap_or(1));
            for k in 0..self.data.num_local_dofs() {
                let phi = self.element.evaluate_basis(k, &reference_point);
                value[phi.component.unwrap_or(0)] += dofs[self.data.dofs()[[e, k]]] * phi.values[0];
            }
            return Ok(value);
        }

        Err(AssemblyError::PointOutsideMesh {
            point: point.iter().copied().collect(),
        }
        .into())
    }
}

impl GlobalBasis for InteriorBasis<'_> {
    fn data(&self) -> &BasisData {
        &self.data
    }

    fn element(&self) -> &dyn Element {
        self.element
    }
}
