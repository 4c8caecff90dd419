use crate::element::CellType;
use crate::error::AssemblyError;
use log::debug;
use nalgebra::{DMatrix, DVector};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod procedural;

/// A conforming simplicial mesh with named subdomains and boundaries.
///
/// Facets (the end points of segments, the edges of triangles) are derived from the cells on
/// construction. Each facet knows the one or two cells it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Vertex coordinates, one column per vertex.
    vertices: DMatrix<f64>,
    cell_type: CellType,
    cells: Vec<usize>,
    facets: Vec<usize>,
    facet_cells: Vec<(usize, Option<usize>)>,
    cell_facets: Vec<usize>,
    subdomains: BTreeMap<String, Vec<usize>>,
    boundaries: BTreeMap<String, Vec<usize>>,
}

fn invalid_mesh(details: impl Into<String>) -> eyre::Report {
    AssemblyError::InvalidMesh {
        details: details.into(),
    }
    .into()
}

impl Mesh {
    /// Constructs a mesh from vertex coordinates (one column per vertex) and flat cell
    /// connectivity.
    ///
    /// The geometric dimension must equal the reference dimension of the cell type.
    pub fn from_vertices_and_cells(vertices: DMatrix<f64>, cell_type: CellType, cells: Vec<usize>) -> eyre::Result<Self> {
        let dim = cell_type.reference_dim();
        let stride = cell_type.num_vertices();
        if vertices.nrows() != dim {
            return Err(invalid_mesh(format!(
                "{:?} cells require {}-dimensional vertices, got {}",
                cell_type,
                dim,
                vertices.nrows()
            )));
        }
        if cells.is_empty() || cells.len() % stride != 0 {
            return Err(invalid_mesh(format!(
                "connectivity of length {} does not describe a non-empty set of {:?} cells",
                cells.len(),
                cell_type
            )));
        }
        if let Some(index) = cells.iter().find(|&&v| v >= vertices.ncols()) {
            return Err(invalid_mesh(format!(
                "vertex index {} out of bounds for {} vertices",
                index,
                vertices.ncols()
            )));
        }

        let num_cells = cells.len() / stride;
        let mut facet_lookup: FxHashMap<Vec<usize>, usize> = FxHashMap::default();
        let mut facets = Vec::new();
        let mut facet_cells: Vec<(usize, Option<usize>)> = Vec::new();
        let mut cell_facets = Vec::with_capacity(num_cells * cell_type.num_facets());

        for (c, cell) in cells.chunks_exact(stride).enumerate() {
            for i in 0..stride {
                if cell[i + 1..].contains(&cell[i]) {
                    return Err(invalid_mesh(format!("cell {} has repeated vertices", c)));
                }
            }

            for local_facet in cell_type.local_facets() {
                let mut key: Vec<usize> = local_facet.iter().map(|&i| cell[i]).collect();
                key.sort_unstable();
                match facet_lookup.get(&key) {
                    Some(&f) => {
                        if facet_cells[f].1.is_some() {
                            return Err(invalid_mesh(format!("facet {:?} is shared by more than two cells", key)));
                        }
                        facet_cells[f].1 = Some(c);
                        cell_facets.push(f);
                    }
                    None => {
                        let f = facet_cells.len();
                        facets.extend_from_slice(&key);
                        facet_cells.push((c, None));
                        facet_lookup.insert(key, f);
                        cell_facets.push(f);
                    }
                }
            }
        }

        debug!(
            "Constructed {:?} mesh with {} vertices, {} cells and {} facets",
            cell_type,
            vertices.ncols(),
            num_cells,
            facet_cells.len()
        );

        Ok(Self {
            vertices,
            cell_type,
            cells,
            facets,
            facet_cells,
            cell_facets,
            subdomains: BTreeMap::new(),
            boundaries: BTreeMap::new(),
        })
    }

    pub fn dim(&self) -> usize {
        self.vertices.nrows()
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn vertices(&self) -> &DMatrix<f64> {
        &self.vertices
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.ncols()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len() / self.cell_type.num_vertices()
    }

    pub fn num_facets(&self) -> usize {
        self.facet_cells.len()
    }

    pub fn vertex(&self, index: usize) -> DVector<f64> {
        self.vertices.column(index).into_owned()
    }

    pub fn cell_vertices(&self, cell: usize) -> &[usize] {
        let stride = self.cell_type.num_vertices();
        &self.cells[stride * cell..stride * (cell + 1)]
    }

    /// Sorted vertex indices of a facet.
    pub fn facet_vertices(&self, facet: usize) -> &[usize] {
        let stride = self.cell_type.num_facet_vertices();
        &self.facets[stride * facet..stride * (facet + 1)]
    }

    /// The cells adjacent to the facet. The second cell is absent for boundary facets.
    pub fn facet_cells(&self, facet: usize) -> (usize, Option<usize>) {
        self.facet_cells[facet]
    }

    /// Global facet indices of a cell, in the order of [`CellType::local_facets`].
    pub fn cell_facets(&self, cell: usize) -> &[usize] {
        let stride = self.cell_type.num_facets();
        &self.cell_facets[stride * cell..stride * (cell + 1)]
    }

    /// Facets that belong to a single cell.
    pub fn boundary_facets(&self) -> Vec<usize> {
        self.facet_cells
            .iter()
            .enumerate()
            .filter(|(_, (_, neighbor))| neighbor.is_none())
            .map(|(f, _)| f)
            .collect()
    }

    fn centroid_of(&self, vertex_indices: &[usize]) -> DVector<f64> {
        let mut centroid = DVector::zeros(self.dim());
        for &v in vertex_indices {
            centroid += self.vertices.column(v);
        }
        centroid / vertex_indices.len() as f64
    }

    pub fn cell_centroid(&self, cell: usize) -> DVector<f64> {
        self.centroid_of(self.cell_vertices(cell))
    }

    pub fn facet_midpoint(&self, facet: usize) -> DVector<f64> {
        self.centroid_of(self.facet_vertices(facet))
    }

    /// Largest distance between two vertices of the cell.
    pub fn cell_diameter(&self, cell: usize) -> f64 {
        let vertices = self.cell_vertices(cell);
        let mut diameter: f64 = 0.0;
        for (i, &a) in vertices.iter().enumerate() {
            for &b in &vertices[i + 1..] {
                diameter = diameter.max((self.vertices.column(a) - self.vertices.column(b)).norm());
            }
        }
        diameter
    }

    /// Affine map `x = x0 + J xi` from the reference cell to the given cell.
    pub fn cell_affine_map(&self, cell: usize) -> (DVector<f64>, DMatrix<f64>) {
        let vertices = self.cell_vertices(cell);
        let x0 = self.vertex(vertices[0]);
        let jacobian = DMatrix::from_fn(self.dim(), self.dim(), |i, j| {
            self.vertices[(i, vertices[j + 1])] - x0[i]
        });
        (x0, jacobian)
    }

    /// Tags a set of cells with a name, replacing any subdomain of the same name.
    pub fn with_subdomain(mut self, name: impl Into<String>, cells: Vec<usize>) -> eyre::Result<Self> {
        if let Some(cell) = cells.iter().find(|&&c| c >= self.num_cells()) {
            return Err(invalid_mesh(format!("subdomain cell {} out of bounds", cell)));
        }
        self.subdomains.insert(name.into(), cells);
        Ok(self)
    }

    /// Tags a set of facets with a name, replacing any boundary of the same name.
    pub fn with_boundary(mut self, name: impl Into<String>, facets: Vec<usize>) -> eyre::Result<Self> {
        if let Some(facet) = facets.iter().find(|&&f| f >= self.num_facets()) {
            return Err(invalid_mesh(format!("boundary facet {} out of bounds", facet)));
        }
        self.boundaries.insert(name.into(), facets);
        Ok(self)
    }

    /// Tags the boundary facets whose midpoint satisfies the predicate.
    pub fn define_boundary(mut self, name: impl Into<String>, predicate: impl Fn(&DVector<f64>) -> bool) -> Self {
        let facets = self
            .boundary_facets()
            .into_iter()
            .filter(|&f| predicate(&self.facet_midpoint(f)))
            .collect();
        self.boundaries.insert(name.into(), facets);
        self
    }

    /// Tags the cells whose centroid satisfies the predicate.
    pub fn define_subdomain(mut self, name: impl Into<String>, predicate: impl Fn(&DVector<f64>) -> bool) -> Self {
        let cells = (0..self.num_cells())
            .filter(|&c| predicate(&self.cell_centroid(c)))
            .collect();
        self.subdomains.insert(name.into(), cells);
        self
    }

    pub fn subdomain(&self, name: &str) -> eyre::Result<&[usize]> {
        self.subdomains
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| unknown_region(name))
    }

    pub fn boundary(&self, name: &str) -> eyre::Result<&[usize]> {
        self.boundaries
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| unknown_region(name))
    }

    pub fn subdomains(&self) -> &BTreeMap<String, Vec<usize>> {
        &self.subdomains
    }

    pub fn boundaries(&self) -> &BTreeMap<String, Vec<usize>> {
        &self.boundaries
    }

    /// For every cell, whether it belongs to the named subdomain.
    pub fn subdomain_indicator(&self, name: &str) -> eyre::Result<Vec<bool>> {
        let mut indicator = vec![false; self.num_cells()];
        for &cell in self.subdomain(name)? {
            indicator[cell] = true;
        }
        Ok(indicator)
    }
}

fn unknown_region(name: &str) -> eyre::Report {
    AssemblyError::UnknownRegion { name: name.to_string() }.into()
}
