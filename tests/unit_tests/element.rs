use formwork::element::{
    CellType, DofLayout, Element, ElementLineP1, ElementLineP2, ElementTriP1, ElementTriP2, ElementVector,
    ScalarElement,
};
use matrixcompare::{assert_scalar_eq, prop_assert_scalar_eq};
use nalgebra::DMatrix;
use proptest::prelude::*;

fn point(coords: &[f64]) -> DMatrix<f64> {
    DMatrix::from_column_slice(coords.len(), 1, coords)
}

fn elements() -> Vec<Box<dyn Element>> {
    vec![
        Box::new(ElementLineP1),
        Box::new(ElementLineP2),
        Box::new(ElementTriP1),
        Box::new(ElementTriP2),
    ]
}

#[test]
fn dof_layouts() {
    assert_eq!(ElementLineP1.num_local_dofs(), 2);
    assert_eq!(ElementLineP2.num_local_dofs(), 3);
    assert_eq!(ElementTriP1.num_local_dofs(), 3);
    assert_eq!(ElementTriP2.num_local_dofs(), 6);
    assert_eq!(
        ElementTriP2.dof_layout(),
        DofLayout {
            nodal: 1,
            facet: 1,
            interior: 0
        }
    );

    let vector = ElementVector::new(ElementTriP2);
    assert_eq!(vector.value_dim(), Some(2));
    assert_eq!(vector.num_local_dofs(), 12);
    assert_eq!(vector.dof_layout(), ElementTriP2.dof_layout().scaled(2));
    assert_eq!(vector.degree(), 2);
}

#[test]
fn line_p2_is_nodal() {
    let nodes = [0.0, 1.0, 0.5];
    for (i, &x) in nodes.iter().enumerate() {
        for j in 0..3 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_scalar_eq!(ElementLineP2.shape_value(j, &[x]), expected, comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn vector_element_assigns_components() {
    let element = ElementVector::new(ElementTriP1);
    let xi = point(&[0.2, 0.3]);
    let phi = element.evaluate_basis(3, &xi);
    let scalar = ElementTriP1.evaluate_basis(1, &xi);

    assert_eq!(phi.component, Some(1));
    assert_eq!(phi.values, scalar.values);
    assert_eq!(phi.gradients, scalar.gradients);
    assert_eq!(element.evaluate_basis(4, &xi).component, Some(0));
}

#[test]
fn p2_hessians_match_finite_differences() {
    let h = 1e-4;
    let xi = [0.3, 0.2];
    for k in 0..6 {
        let hessian = ElementTriP2.shape_hessian(k, &xi).unwrap();
        for i in 0..2 {
            let mut forward = xi;
            let mut backward = xi;
            forward[i] += h;
            backward[i] -= h;
            let fd = (ElementTriP2.shape_gradient(k, &forward) - ElementTriP2.shape_gradient(k, &backward)) / (2.0 * h);
            for j in 0..2 {
                assert_scalar_eq!(hessian[(j, i)], fd[j], comp = abs, tol = 1e-8);
            }
        }
    }
    assert!(ElementTriP1.shape_hessian(0, &xi).is_none());
}

#[test]
fn reference_cells() {
    assert_eq!(CellType::Triangle.local_facets(), &[&[0, 1][..], &[1, 2][..], &[0, 2][..]]);
    assert_eq!(CellType::Segment.num_facets(), 2);
    let vertices = CellType::Triangle.reference_vertices();
    assert_eq!((vertices[(0, 2)], vertices[(1, 2)]), (0.0, 1.0));
}

proptest! {
    #[test]
    fn shape_functions_are_a_partition_of_unity(x in 0.0..1.0, t in 0.0..1.0) {
        let y = t * (1.0 - x);
        for element in elements() {
            let xi = match element.cell_type() {
                CellType::Segment => point(&[x]),
                CellType::Triangle => point(&[x, y]),
            };
            let mut value_sum = 0.0;
            let mut gradient_sum = DMatrix::zeros(xi.nrows(), 1);
            for k in 0..element.num_local_dofs() {
                let phi = element.evaluate_basis(k, &xi);
                value_sum += phi.values[0];
                gradient_sum += &phi.gradients;
            }
            prop_assert_scalar_eq!(value_sum, 1.0, comp = abs, tol = 1e-12);
            prop_assert_scalar_eq!(gradient_sum.norm(), 0.0, comp = abs, tol = 1e-12);
        }
    }
}
