use formwork::assembly::{BilinearForm, Coefficient, FormParameters, Functional};
use formwork::basis::{BasisOptions, InteriorBasis};
use formwork::element::{ElementLineP1, ElementTriP1, ElementTriP2};
use formwork::field::{dot, DiscreteField};
use formwork::mesh::procedural::{
    create_concentric_disk_mesh, create_rectangular_uniform_tri_mesh_2d, create_unit_interval_mesh,
};
use formwork::models::{Laplace, Measure};
use matrixcompare::assert_scalar_eq;
use nalgebra::SymmetricEigen;
use ndarray::ArrayD;
use std::f64::consts::PI;
use util::{assert_approx_matrix_eq, csr_to_dense, max_asymmetry};

fn conduction(u: &DiscreteField, v: &DiscreteField, w: &FormParameters) -> eyre::Result<ArrayD<f64>> {
    Ok(w.w()? * &dot(u.try_df()?, v.try_df()?)?)
}

#[test]
fn unit_disk_area() {
    let mesh = create_concentric_disk_mesh(&[("disk", 1.0)], 1.0 / 32.0, "boundary").unwrap();
    let basis = InteriorBasis::new(&mesh, &ElementTriP1).unwrap();
    let area = Functional::from_integrand(Measure)
        .assemble_scalar(&basis, &[], 1)
        .unwrap();
    assert!((area - PI).abs() < 1e-3, "area {} deviates from pi", area);
    assert!(area < PI);
}

#[test]
fn conduction_matrix_is_symmetric_positive_semidefinite() {
    let mesh = create_rectangular_uniform_tri_mesh_2d(2.0, 1.5, 5, 4).unwrap();
    for element in [&ElementTriP1 as &dyn formwork::element::Element, &ElementTriP2] {
        let basis = InteriorBasis::new(&mesh, element).unwrap();
        let conductivity = Coefficient::elemental((0..mesh.num_cells()).map(|c| 1.0 + (c % 3) as f64));
        let matrix = csr_to_dense(
            &BilinearForm::new(conduction)
                .assemble(&basis, None, &[conductivity], 1)
                .unwrap(),
        );

        let norm = matrix.abs().max();
        assert!(max_asymmetry(&matrix) <= 1e-12 * norm);
        let eigenvalues = SymmetricEigen::new(matrix).eigenvalues;
        assert!(eigenvalues.min() >= -1e-10 * norm);
    }
}

#[test]
fn assembly_is_additive_over_elements() {
    let mesh = create_unit_interval_mesh(2)
        .unwrap()
        .define_subdomain("left", |x| x[0] < 0.5)
        .define_subdomain("right", |x| x[0] > 0.5);
    let form = BilinearForm::from_integrand(Laplace);

    let assemble = |options: &BasisOptions| {
        let basis = InteriorBasis::with_options(&mesh, &ElementLineP1, options).unwrap();
        csr_to_dense(&form.assemble(&basis, None, &[], 1).unwrap())
    };
    let full = assemble(&BasisOptions::default());
    let left = assemble(&BasisOptions::default().with_subdomain("left"));
    let right = assemble(&BasisOptions::default().with_subdomain("right"));

    // Each element has length 1/2, so its local stiffness is 2 * [[1, -1], [-1, 1]]
    assert_scalar_eq!(left[(1, 1)], 2.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(right[(1, 1)], 2.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(full[(1, 1)], left[(1, 1)] + right[(1, 1)], comp = abs, tol = 1e-12);
    assert_approx_matrix_eq!(full, &left + &right, reltol = 1e-12);
}
