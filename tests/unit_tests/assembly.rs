use formwork::assembly::global::{partition_elements, scatter_add_vector, TripletAssembler};
use formwork::assembly::{BilinearForm, Coefficient, FormParameters, Functional, LinearForm};
use formwork::basis::{BasisOptions, FacetBasis, GlobalBasis, InteriorBasis};
use formwork::element::{CellType, ElementLineP1, ElementLineP2, ElementTriP1, ElementTriP2, ElementVector};
use formwork::field::{dot, DiscreteField};
use formwork::mesh::procedural::{create_interval_mesh, create_unit_interval_mesh, create_unit_square_uniform_tri_mesh_2d};
use formwork::mesh::Mesh;
use formwork::models::{Laplace, Mass, Measure, UnitLoad};
use formwork::proptest::{interval_mesh, rectangle_tri_mesh};
use formwork::AssemblyError;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq, prop_assert_scalar_eq};
use nalgebra::{DMatrix, DVector};
use ndarray::{arr1, ArrayD, IxDyn};
use proptest::prelude::*;
use util::{csr_to_dense, max_asymmetry};

use super::assembly_error;

fn reference_triangle() -> Mesh {
    let vertices = DMatrix::from_column_slice(2, 3, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    Mesh::from_vertices_and_cells(vertices, CellType::Triangle, vec![0, 1, 2]).unwrap()
}

fn scaled_mass(u: &DiscreteField, v: &DiscreteField, w: &FormParameters) -> eyre::Result<ArrayD<f64>> {
    Ok(w.w()? * &(u.try_f()? * v.try_f()?))
}

#[test]
fn laplace_on_reference_triangle() {
    let mesh = reference_triangle();
    let basis = InteriorBasis::new(&mesh, &ElementTriP1).unwrap();
    let stiffness = BilinearForm::from_integrand(Laplace)
        .assemble(&basis, None, &[], 1)
        .unwrap();

    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(3, 3, &[
         1.0, -0.5, -0.5,
        -0.5,  0.5,  0.0,
        -0.5,  0.0,  0.5,
    ]);
    assert_matrix_eq!(csr_to_dense(&stiffness), expected, comp = abs, tol = 1e-12);
}

#[test]
fn mass_on_segment() {
    let h = 0.5;
    let mesh = create_interval_mesh(1.0, 1.0 + h, 1).unwrap();
    let basis = InteriorBasis::new(&mesh, &ElementLineP1).unwrap();
    let mass = BilinearForm::from_integrand(Mass)
        .assemble(&basis, None, &[], 1)
        .unwrap();

    let expected = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]) * (h / 6.0);
    assert_matrix_eq!(csr_to_dense(&mass), expected, comp = abs, tol = 1e-14);
}

#[test]
fn unit_load_on_interval() {
    let mesh = create_unit_interval_mesh(2).unwrap();
    let basis = InteriorBasis::new(&mesh, &ElementLineP1).unwrap();
    let load = LinearForm::from_integrand(UnitLoad)
        .assemble(&basis, &[], 1)
        .unwrap();
    let expected = DVector::from_column_slice(&[0.25, 0.5, 0.25]);
    assert_matrix_eq!(load, expected, comp = abs, tol = 1e-14);
}

#[test]
fn constant_coefficient_scales_mass() {
    let mesh = create_unit_square_uniform_tri_mesh_2d(2).unwrap();
    let basis = InteriorBasis::new(&mesh, &ElementTriP1).unwrap();
    let mass = csr_to_dense(&BilinearForm::from_integrand(Mass).assemble(&basis, None, &[], 1).unwrap());
    let scaled = csr_to_dense(
        &BilinearForm::new(scaled_mass)
            .assemble(&basis, None, &[Coefficient::Constant(2.0)], 1)
            .unwrap(),
    );
    assert_matrix_eq!(scaled, &mass * 2.0, comp = abs, tol = 1e-14);

    let elemental = Coefficient::elemental((0..mesh.num_cells()).map(|_| 2.0));
    let piecewise = csr_to_dense(&BilinearForm::new(scaled_mass).assemble(&basis, None, &[elemental], 1).unwrap());
    assert_matrix_eq!(piecewise, scaled, comp = abs, tol = 1e-14);

    // Total mass is the area
    assert_scalar_eq!(mass.sum(), 1.0, comp = abs, tol = 1e-12);
}

#[test]
fn mixed_trial_and_test_spaces() {
    let mesh = create_unit_square_uniform_tri_mesh_2d(2).unwrap();
    let options = BasisOptions::default().with_quadrature_strength(4);
    let trial = InteriorBasis::with_options(&mesh, &ElementTriP1, &options).unwrap();
    let test = InteriorBasis::with_options(&mesh, &ElementTriP2, &options).unwrap();

    let matrix = BilinearForm::from_integrand(Mass)
        .assemble(&trial, Some(&test), &[], 1)
        .unwrap();
    assert_eq!((matrix.nrows(), matrix.ncols()), (25, 9));
    // P2 reproduces the constant one, so column sums equal the P1 load
    let dense = csr_to_dense(&matrix);
    let load = LinearForm::from_integrand(UnitLoad)
        .assemble(&trial, &[], 1)
        .unwrap();
    let column_sums = dense.row_sum().transpose();
    assert_matrix_eq!(column_sums, load, comp = abs, tol = 1e-12);

    // Default quadrature strengths differ between the two elements
    let test = InteriorBasis::new(&mesh, &ElementTriP2).unwrap();
    let trial = InteriorBasis::new(&mesh, &ElementTriP1).unwrap();
    let err = BilinearForm::from_integrand(Mass)
        .assemble(&trial, Some(&test), &[], 1)
        .unwrap_err();
    assert!(matches!(assembly_error(&err), AssemblyError::ShapeMismatch { .. }));
}

#[test]
fn vector_laplace_interleaves_components() {
    let mesh = reference_triangle();
    let scalar_basis = InteriorBasis::new(&mesh, &ElementTriP1).unwrap();
    let element = ElementVector::new(ElementTriP1);
    let vector_basis = InteriorBasis::new(&mesh, &element).unwrap();

    let form = BilinearForm::from_integrand(Laplace);
    let scalar = csr_to_dense(&form.assemble(&scalar_basis, None, &[], 1).unwrap());
    let vector = csr_to_dense(&form.assemble(&vector_basis, None, &[], 1).unwrap());
    assert_eq!(vector.shape(), (6, 6));
    for i in 0..6 {
        for j in 0..6 {
            let expected = if i % 2 == j % 2 { scalar[(i / 2, j / 2)] } else { 0.0 };
            assert_scalar_eq!(vector[(i, j)], expected, comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn facet_mass_measures_boundary() {
    let mesh = create_unit_square_uniform_tri_mesh_2d(3).unwrap();
    let basis = FacetBasis::new(&mesh, &ElementTriP1, "right").unwrap();
    let mass = BilinearForm::from_integrand(Mass)
        .assemble(&basis, None, &[], 1)
        .unwrap();
    assert_eq!(mass.nrows(), mesh.num_vertices());
    assert_scalar_eq!(mass.values().iter().sum::<f64>(), 1.0, comp = abs, tol = 1e-12);
}

#[test]
fn functionals() {
    let mesh = create_unit_square_uniform_tri_mesh_2d(4).unwrap();
    let basis = InteriorBasis::new(&mesh, &ElementTriP1).unwrap();

    let areas = Functional::from_integrand(Measure)
        .assemble(&basis, None, &[], 1)
        .unwrap();
    assert_eq!(areas.shape(), &[mesh.num_cells()]);
    for &area in areas.iter() {
        assert_scalar_eq!(area, 1.0 / 32.0, comp = abs, tol = 1e-14);
    }

    // Components of the integrand are kept
    let moments = Functional::new(|w: &FormParameters| Ok(w.x().clone()))
        .assemble(&basis, None, &[], 1)
        .unwrap();
    assert_eq!(moments.shape(), &[2, mesh.num_cells()]);
    assert_scalar_eq!(moments.sum(), 1.0, comp = abs, tol = 1e-12);

    // Coefficients given as dofs are interpolated
    let x_dofs = DVector::from_iterator(mesh.num_vertices(), (0..mesh.num_vertices()).map(|v| mesh.vertex(v)[0]));
    let second_moment = Functional::new(|w: &FormParameters| Ok(w.w()? * w.w()?))
        .assemble_scalar(&basis, &[Coefficient::Dofs(x_dofs)], 1)
        .unwrap();
    assert_scalar_eq!(second_moment, 1.0 / 3.0, comp = abs, tol = 1e-12);
}

#[test]
fn boundary_flux_of_position() {
    let mesh = create_unit_square_uniform_tri_mesh_2d(3).unwrap();
    let basis = FacetBasis::on_boundary(&mesh, &ElementTriP1).unwrap();
    // The divergence of x is 2 and the square has unit area
    let flux = Functional::new(|w: &FormParameters| dot(w.x(), w.n()?))
        .assemble_scalar(&basis, &[], 1)
        .unwrap();
    assert_scalar_eq!(flux, 2.0, comp = abs, tol = 1e-12);

    let interior = InteriorBasis::new(&mesh, &ElementTriP1).unwrap();
    let err = Functional::new(|w: &FormParameters| dot(w.x(), w.n()?))
        .assemble(&interior, None, &[], 1)
        .unwrap_err();
    assert!(matches!(assembly_error(&err), AssemblyError::MissingComponent { .. }));
}

#[test]
fn assembly_errors() {
    let mesh = create_unit_square_uniform_tri_mesh_2d(2).unwrap();
    let basis = InteriorBasis::new(&mesh, &ElementTriP1).unwrap();

    let err = Functional::from_integrand(Measure)
        .assemble(&basis, Some(&basis), &[], 1)
        .unwrap_err();
    assert_eq!(assembly_error(&err), &AssemblyError::FunctionalTestBasis);

    let err = BilinearForm::from_integrand(Laplace)
        .assemble(&basis, None, &[], 0)
        .unwrap_err();
    assert_eq!(assembly_error(&err), &AssemblyError::InvalidThreadCount);

    let wrong_shape = |_: &DiscreteField, _: &FormParameters| -> eyre::Result<ArrayD<f64>> {
        Ok(ArrayD::zeros(IxDyn(&[3, 7])))
    };
    let err = LinearForm::new(wrong_shape).assemble(&basis, &[], 1).unwrap_err();
    assert!(matches!(assembly_error(&err), AssemblyError::ShapeMismatch { .. }));

    let err = BilinearForm::new(scaled_mass)
        .assemble(&basis, None, &[Coefficient::elemental([1.0, 2.0, 3.0])], 1)
        .unwrap_err();
    assert!(matches!(assembly_error(&err), AssemblyError::ShapeMismatch { .. }));

    // No coefficient was supplied
    let err = BilinearForm::new(scaled_mass)
        .assemble(&basis, None, &[], 1)
        .unwrap_err();
    assert!(matches!(assembly_error(&err), AssemblyError::MissingComponent { .. }));
}

#[test]
fn triplets_are_summed() {
    let mut assembler = TripletAssembler::new(2, 3);
    assert!(assembler.is_empty());
    assembler.push(0, 0, 1.0);
    assembler.push(1, 2, 3.0);
    let mut other = TripletAssembler::new(2, 3);
    other.push(0, 0, 1.0);
    assembler.merge(other).unwrap();
    assert_eq!(assembler.len(), 3);

    let expected = DMatrix::from_row_slice(2, 3, &[2.0, 0.0, 0.0, 0.0, 0.0, 3.0]);
    assert_matrix_eq!(csr_to_dense(&assembler.into_csr().unwrap()), expected);

    let mut assembler = TripletAssembler::new(2, 3);
    let err = assembler.merge(TripletAssembler::new(3, 2)).unwrap_err();
    assert!(matches!(assembly_error(&err), AssemblyError::ShapeMismatch { .. }));
}

#[test]
#[should_panic]
fn triplet_out_of_bounds_panics() {
    TripletAssembler::new(2, 2).push(2, 0, 1.0);
}

#[test]
fn scatter_add() {
    let mut global = DVector::zeros(4);
    scatter_add_vector(&mut global, arr1(&[3, 0, 3]).view(), arr1(&[1.0, 2.0, 0.5]).view());
    assert_eq!(global, DVector::from_column_slice(&[2.0, 0.0, 0.0, 1.5]));
}

#[test]
fn partitions_are_contiguous() {
    for (num_elements, nthreads) in [(0, 1), (1, 3), (7, 2), (100, 8)] {
        let partitions = partition_elements(num_elements, nthreads);
        assert!(partitions.len() <= nthreads);
        let covered: Vec<usize> = partitions.iter().cloned().flatten().collect();
        assert_eq!(covered, (0..num_elements).collect::<Vec<_>>());
        assert!(partitions.iter().all(|range| !range.is_empty()));
    }
}

proptest! {
    #[test]
    fn laplace_is_symmetric_with_constant_kernel(mesh in rectangle_tri_mesh(4), nthreads in 1..4usize) {
        let basis = InteriorBasis::new(&mesh, &ElementTriP1).unwrap();
        let stiffness = csr_to_dense(
            &BilinearForm::from_integrand(Laplace)
                .assemble(&basis, None, &[], nthreads)
                .unwrap(),
        );
        let scale = stiffness.abs().max();
        prop_assert!(max_asymmetry(&stiffness) <= 1e-12 * scale);
        for row_sum in stiffness.column_sum().iter() {
            prop_assert_scalar_eq!(*row_sum, 0.0, comp = abs, tol = 1e-12 * scale);
        }
    }

    #[test]
    fn line_stiffness_is_symmetric_with_zero_row_sums(mesh in interval_mesh(8), nthreads in 1..4usize) {
        let p1 = InteriorBasis::new(&mesh, &ElementLineP1).unwrap();
        let p2 = InteriorBasis::new(&mesh, &ElementLineP2).unwrap();
        prop_assert_eq!(p1.num_dofs(), mesh.num_cells() + 1);
        prop_assert_eq!(p2.num_dofs(), 2 * mesh.num_cells() + 1);

        for basis in [&p1, &p2] {
            let stiffness = csr_to_dense(
                &BilinearForm::from_integrand(Laplace)
                    .assemble(basis, None, &[], nthreads)
                    .unwrap(),
            );
            let scale = stiffness.abs().max();
            prop_assert!(max_asymmetry(&stiffness) <= 1e-12 * scale);
            for row_sum in stiffness.column_sum().iter() {
                prop_assert_scalar_eq!(*row_sum, 0.0, comp = abs, tol = 1e-12 * scale);
            }
        }
    }
}
