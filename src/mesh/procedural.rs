//! Basic procedural mesh generation routines.
use crate::element::CellType;
use crate::error::AssemblyError;
use crate::mesh::Mesh;
use nalgebra::DMatrix;
use std::f64::consts::PI;

fn invalid_arguments(details: impl Into<String>) -> eyre::Report {
    AssemblyError::InvalidMesh {
        details: details.into(),
    }
    .into()
}

/// Uniform mesh of the interval `[a, b]` with boundaries `left` and `right`.
pub fn create_interval_mesh(a: f64, b: f64, num_cells: usize) -> eyre::Result<Mesh> {
    if num_cells == 0 || !(a < b) {
        return Err(invalid_arguments("interval mesh needs a < b and at least one cell"));
    }

    let h = (b - a) / num_cells as f64;
    let vertices = DMatrix::from_fn(1, num_cells + 1, |_, i| a + i as f64 * h);
    let cells = (0..num_cells).flat_map(|i| [i, i + 1]).collect();
    let midpoint = 0.5 * (a + b);

    Ok(Mesh::from_vertices_and_cells(vertices, CellType::Segment, cells)?
        .define_boundary("left", |x| x[0] < midpoint)
        .define_boundary("right", |x| x[0] > midpoint))
}

pub fn create_unit_interval_mesh(num_cells: usize) -> eyre::Result<Mesh> {
    create_interval_mesh(0.0, 1.0, num_cells)
}

/// Uniform triangulation of `[0, width] x [0, height]`.
///
/// Every rectangular cell is split into two triangles along its diagonal. The boundaries
/// `left`, `right`, `bottom` and `top` are defined.
pub fn create_rectangular_uniform_tri_mesh_2d(
    width: f64,
    height: f64,
    cells_x: usize,
    cells_y: usize,
) -> eyre::Result<Mesh> {
    if cells_x == 0 || cells_y == 0 || !(width > 0.0) || !(height > 0.0) {
        return Err(invalid_arguments("rectangle mesh needs positive extents and cell counts"));
    }

    let (hx, hy) = (width / cells_x as f64, height / cells_y as f64);
    let num_vertices_x = cells_x + 1;
    let to_global_vertex_index = |i: usize, j: usize| num_vertices_x * j + i;

    let mut coords = Vec::with_capacity(2 * num_vertices_x * (cells_y + 1));
    for j in 0..=cells_y {
        for i in 0..=cells_x {
            coords.push(i as f64 * hx);
            coords.push(j as f64 * hy);
        }
    }

    let mut cells = Vec::with_capacity(6 * cells_x * cells_y);
    for j in 0..cells_y {
        for i in 0..cells_x {
            let v00 = to_global_vertex_index(i, j);
            let v10 = to_global_vertex_index(i + 1, j);
            let v11 = to_global_vertex_index(i + 1, j + 1);
            let v01 = to_global_vertex_index(i, j + 1);
            cells.extend_from_slice(&[v00, v10, v11, v00, v11, v01]);
        }
    }

    let vertices = DMatrix::from_column_slice(2, coords.len() / 2, &coords);
    let eps = 1e-10 * width.max(height);
    Ok(Mesh::from_vertices_and_cells(vertices, CellType::Triangle, cells)?
        .define_boundary("left", |x| x[0] < eps)
        .define_boundary("right", |x| x[0] > width - eps)
        .define_boundary("bottom", |x| x[1] < eps)
        .define_boundary("top", |x| x[1] > height - eps))
}

pub fn create_unit_square_uniform_tri_mesh_2d(cells_per_dim: usize) -> eyre::Result<Mesh> {
    create_rectangular_uniform_tri_mesh_2d(1.0, 1.0, cells_per_dim, cells_per_dim)
}

/// Triangulates a disk centered at the origin from concentric rings of vertices.
///
/// `layers` lists `(name, outer radius)` pairs with increasing radii. Each layer is meshed with
/// rings roughly `spacing` apart, the ring at each layer radius being shared by neighboring
/// layers, and its cells are tagged as a subdomain with the layer name. The facets on the outermost
/// ring are tagged as the boundary `boundary`.
pub fn create_concentric_disk_mesh(layers: &[(&str, f64)], spacing: f64, boundary: &str) -> eyre::Result<Mesh> {
    if layers.is_empty() || !(spacing > 0.0) {
        return Err(invalid_arguments("disk mesh needs at least one layer and a positive spacing"));
    }
    if layers.windows(2).any(|pair| !(pair[0].1 < pair[1].1)) || !(layers[0].1 > 0.0) {
        return Err(invalid_arguments("layer radii must be positive and increasing"));
    }

    // Ring radii, each with the index of the layer that the annulus inside the ring belongs to
    let mut rings = Vec::new();
    let mut inner_radius = 0.0;
    for (layer, &(_, outer_radius)) in layers.iter().enumerate() {
        let steps = ((outer_radius - inner_radius) / spacing - 1e-9).ceil().max(1.0) as usize;
        for k in 1..=steps {
            let t = k as f64 / steps as f64;
            rings.push((inner_radius + t * (outer_radius - inner_radius), layer));
        }
        inner_radius = outer_radius;
    }

    let mut coords = vec![0.0, 0.0];
    let mut ring_offsets = Vec::with_capacity(rings.len());
    for &(radius, _) in &rings {
        let n = ring_vertex_count(radius, spacing);
        ring_offsets.push((coords.len() / 2, n));
        for i in 0..n {
            let theta = 2.0 * PI * i as f64 / n as f64;
            coords.push(radius * theta.cos());
            coords.push(radius * theta.sin());
        }
    }

    let mut cells = Vec::new();
    let mut cell_layers = Vec::new();

    let (first_offset, first_count) = ring_offsets[0];
    for i in 0..first_count {
        cells.extend_from_slice(&[0, first_offset + i, first_offset + (i + 1) % first_count]);
        cell_layers.push(rings[0].1);
    }

    for (ring, pair) in ring_offsets.windows(2).enumerate() {
        let (inner_offset, n_in) = pair[0];
        let (outer_offset, n_out) = pair[1];
        let layer = rings[ring + 1].1;
        let inner = |i: usize| inner_offset + i % n_in;
        let outer = |j: usize| outer_offset + j % n_out;

        // Walk both rings counterclockwise, always advancing along the ring whose next vertex
        // has the smaller angle
        let (mut i, mut j) = (0, 0);
        while i < n_in || j < n_out {
            let advance_inner = j == n_out || (i < n_in && (i + 1) * n_out <= (j + 1) * n_in);
            if advance_inner {
                cells.extend_from_slice(&[inner(i), outer(j), inner(i + 1)]);
                i += 1;
            } else {
                cells.extend_from_slice(&[inner(i), outer(j), outer(j + 1)]);
                j += 1;
            }
            cell_layers.push(layer);
        }
    }

    let vertices = DMatrix::from_column_slice(2, coords.len() / 2, &coords);
    let mut mesh = Mesh::from_vertices_and_cells(vertices, CellType::Triangle, cells)?;
    for (layer, &(name, _)) in layers.iter().enumerate() {
        let layer_cells = (0..cell_layers.len())
            .filter(|&c| cell_layers[c] == layer)
            .collect();
        mesh = mesh.with_subdomain(name, layer_cells)?;
    }
    let boundary_facets = mesh.boundary_facets();
    mesh.with_boundary(boundary, boundary_facets)
}

fn ring_vertex_count(radius: f64, spacing: f64) -> usize {
    ((2.0 * PI * radius / spacing).round() as usize).max(6)
}
