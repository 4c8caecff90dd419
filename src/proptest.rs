//! Strategies for property-based testing with `proptest`.
use crate::field::DiscreteField;
use crate::mesh::procedural::{create_interval_mesh, create_rectangular_uniform_tri_mesh_2d};
use crate::mesh::Mesh;
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use ndarray::{ArrayD, IxDyn};

/// Uniform triangulations of rectangles with extents in `[0.1, 10]` and at most
/// `max_cells_per_dim` cells along each axis.
pub fn rectangle_tri_mesh(max_cells_per_dim: usize) -> impl Strategy<Value = Mesh> {
    let extent = 0.1..10.0;
    (1..=max_cells_per_dim.max(1), 1..=max_cells_per_dim.max(1), extent.clone(), extent)
        .prop_filter_map("mesh construction must succeed", |(cells_x, cells_y, width, height)| {
            create_rectangular_uniform_tri_mesh_2d(width, height, cells_x, cells_y).ok()
        })
}

/// Uniform interval meshes of `[a, a + length]` with at most `max_cells` cells.
pub fn interval_mesh(max_cells: usize) -> impl Strategy<Value = Mesh> {
    (1..=max_cells.max(1), -10.0..10.0, 0.1..10.0)
        .prop_filter_map("mesh construction must succeed", |(cells, a, length)| {
            create_interval_mesh(a, a + length, cells).ok()
        })
}

fn array(shape: Vec<usize>) -> impl Strategy<Value = ArrayD<f64>> {
    let len: usize = shape.iter().product();
    vec(-10.0..10.0, len).prop_filter_map("shape must match data", move |data| {
        ArrayD::from_shape_vec(IxDyn(&shape), data).ok()
    })
}

/// Scalar fields on `num_elements x num_points` quadrature points with `value` and a
/// `dim`-dimensional `grad`.
pub fn scalar_field(num_elements: usize, num_points: usize, dim: usize) -> impl Strategy<Value = DiscreteField> {
    (
        array(vec![num_elements, num_points]),
        array(vec![dim, num_elements, num_points]),
    )
        .prop_map(|(value, grad)| DiscreteField::from_value(value).with_grad(grad))
}
