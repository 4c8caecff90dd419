use crate::basis::{check_cell_type, global_dof_map, invert_jacobian, physical_fields, tabulate, BasisData, GlobalBasis};
use crate::element::Element;
use crate::error::AssemblyError;
use crate::mesh::Mesh;
use crate::quadrature::{default_strength, QuadratureRule};
use itertools::izip;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, ArrayD, IxDyn};

/// A global basis over a set of facets, for boundary integrals.
///
/// Every facet is integrated from the side of its first adjacent cell: the cell's shape
/// functions are evaluated at the facet quadrature points and its dofs are used. Normals point
/// out of that cell.
pub struct FacetBasis<'a> {
    mesh: &'a Mesh,
    element: &'a dyn Element,
    facets: Vec<usize>,
    quadrature: QuadratureRule,
    data: BasisData,
}

impl<'a> FacetBasis<'a> {
    /// A basis over the facets of a named boundary.
    pub fn new(mesh: &'a Mesh, element: &'a dyn Element, boundary: &str) -> eyre::Result<Self> {
        let facets = mesh.boundary(boundary)?.to_vec();
        Self::with_facets(mesh, element, facets, None)
    }

    /// A basis over every boundary facet of the mesh.
    pub fn on_boundary(mesh: &'a Mesh, element: &'a dyn Element) -> eyre::Result<Self> {
        Self::with_facets(mesh, element, mesh.boundary_facets(), None)
    }

    pub fn with_facets(
        mesh: &'a Mesh,
        element: &'a dyn Element,
        facets: Vec<usize>,
        quadrature_strength: Option<usize>,
    ) -> eyre::Result<Self> {
        check_cell_type(mesh, element)?;
        if let Some(facet) = facets.iter().find(|&&f| f >= mesh.num_facets()) {
            return Err(AssemblyError::InvalidMesh {
                details: format!("facet {} out of bounds", facet),
            }
            .into());
        }
        if facets.is_empty() {
            warn!("Building facet basis over an empty set of facets");
        }

        let cell_type = mesh.cell_type();
        let strength = quadrature_strength.unwrap_or_else(|| default_strength(element.degree()));
        let quadrature = QuadratureRule::for_facet(cell_type, strength)?;

        // Facet quadrature points in the reference coordinates of the cell, per local facet
        let reference_vertices = cell_type.reference_vertices();
        let facet_points: Vec<DMatrix<f64>> = cell_type
            .local_facets()
            .iter()
            .map(|local_vertices| {
                let origin = reference_vertices.column(local_vertices[0]);
                let mut points = DMatrix::zeros(cell_type.reference_dim(), quadrature.num_points());
                for (q, s) in quadrature.points().column_iter().enumerate() {
                    let mut xi = origin.into_owned();
                    for (i, &v) in local_vertices[1..].iter().enumerate() {
                        xi += s[i] * (reference_vertices.column(v) - origin);
                    }
                    points.set_column(q, &xi);
                }
                points
            })
            .collect();
        let tabulations: Vec<_> = facet_points
            .iter()
            .map(|points| tabulate(element, points))
            .collect();

        let cells: Vec<usize> = facets.iter().map(|&f| mesh.facet_cells(f).0).collect();
        let (num_dofs, dofs) = global_dof_map(mesh, element, &cells);

        let d = mesh.dim();
        let (num_elements, num_points) = (facets.len(), quadrature.num_points());
        let mut dx = Array2::zeros((num_elements, num_points));
        let mut x = ArrayD::zeros(IxDyn(&[d, num_elements, num_points]));
        let mut h = ArrayD::zeros(IxDyn(&[num_elements, num_points]));
        let mut normals = ArrayD::zeros(IxDyn(&[d, num_elements, num_points]));
        let mut inverse_jacobians = Vec::with_capacity(num_elements);
        let mut local_facets = Vec::with_capacity(num_elements);

        for (e, &facet, &cell) in izip!(0.., &facets, &cells) {
            let local_facet = mesh
                .cell_facets(cell)
                .iter()
                .position(|&f| f == facet)
                .ok_or_else(|| AssemblyError::InvalidMesh {
                    details: format!("facet {} is not a facet of its adjacent cell {}", facet, cell),
                })?;
            let (x0, jacobian) = mesh.cell_affine_map(cell);
            let diameter = mesh.cell_diameter(cell);
            let (inverse, _) = invert_jacobian(cell, &jacobian, diameter)?;
            let normal = outward_normal(mesh, facet, cell);
            let measure = facet_measure(mesh, facet);

            for (q, xi) in facet_points[local_facet].column_iter().enumerate() {
                dx[[e, q]] = quadrature.weights()[q] * measure;
                h[[e, q]] = diameter;
                let xq = &x0 + &jacobian * xi;
                for i in 0..d {
                    x[[i, e, q]] = xq[i];
                    normals[[i, e, q]] = normal[i];
                }
            }
            inverse_jacobians.push(inverse);
            local_facets.push(local_facet);
        }

        let basis = physical_fields(element, &inverse_jacobians, &tabulations, &local_facets);

        debug!(
            "Built facet basis with {} facets, {} local dofs, {} quadrature points and {} global dofs",
            num_elements,
            element.num_local_dofs(),
            num_points,
            num_dofs
        );

        Ok(Self {
            mesh,
            element,
            facets,
            quadrature,
            data: BasisData {
                num_dofs,
                dofs,
                dx,
                x,
                h,
                normals: Some(normals),
                basis,
            },
        })
    }

    pub fn mesh(&self) -> &Mesh {
        self.mesh
    }

    /// Mesh facets covered by the basis, in element order.
    pub fn facets(&self) -> &[usize] {
        &self.facets
    }

    pub fn quadrature(&self) -> &QuadratureRule {
        &self.quadrature
    }
}

impl GlobalBasis for FacetBasis<'_> {
    fn data(&self) -> &BasisData {
        &self.data
    }

    fn element(&self) -> &dyn Element {
        self.element
    }
}

/// Length of an edge, or one for a point facet.
fn facet_measure(mesh: &Mesh, facet: usize) -> f64 {
    match mesh.facet_vertices(facet) {
        [a, b] => (mesh.vertices().column(*a) - mesh.vertices().column(*b)).norm(),
        _ => 1.0,
    }
}

/// Unit normal of the facet pointing away from the given cell.
fn outward_normal(mesh: &Mesh, facet: usize, cell: usize) -> DVector<f64> {
    let mut normal = match mesh.facet_vertices(facet) {
        [a, b] => {
            let tangent = mesh.vertices().column(*b) - mesh.vertices().column(*a);
            DVector::from_column_slice(&[tangent[1], -tangent[0]]).normalize()
        }
        _ => DVector::from_element(mesh.dim(), 1.0),
    };
    let outward = mesh.facet_midpoint(facet) - mesh.cell_centroid(cell);
    if normal.dot(&outward) < 0.0 {
        normal = -normal;
    }
    normal
}
