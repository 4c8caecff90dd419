//! Helpers shared by the `formwork` test suites.
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;

/// Poor man's approx assertion for matrices, relative to the largest entry of the right-hand side.
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, reltol = $tol:expr) => {{
        let scale = $y.abs().max().max(1e-300);
        let diff = &$x - &$y;
        let max_reldiff = diff.abs().max() / scale;

        if !(max_reldiff <= $tol) {
            println!("reltol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("relative diff: {:e}", max_reldiff);
        }
        assert!(max_reldiff <= $tol);
    }};
}

pub fn csr_to_dense(matrix: &CsrMatrix<f64>) -> DMatrix<f64> {
    DMatrix::from(matrix)
}

/// Largest absolute difference between `a` and its transpose.
pub fn max_asymmetry(a: &DMatrix<f64>) -> f64 {
    (a - a.transpose()).abs().max()
}

/// Solves `A x = b` for a symmetric positive definite `A` with Jacobi-preconditioned
/// conjugate gradients, starting from zero.
///
/// Returns the iterate and the number of iterations, or `None` if the relative residual did not
/// drop below `tol` within `max_iter` iterations.
pub fn conjugate_gradient(
    a: &CsrMatrix<f64>,
    b: &DVector<f64>,
    tol: f64,
    max_iter: usize,
) -> Option<(DVector<f64>, usize)> {
    assert_eq!(a.nrows(), a.ncols(), "matrix must be square");
    assert_eq!(a.nrows(), b.len(), "right-hand side must match matrix dimensions");

    let mut diagonal = DVector::<f64>::zeros(b.len());
    for (i, j, &v) in a.triplet_iter() {
        if i == j {
            diagonal[i] += v;
        }
    }
    let inverse_diagonal = diagonal.map(|d| if d != 0.0 { 1.0 / d } else { 1.0 });

    let b_norm = b.norm();
    let mut x = DVector::zeros(b.len());
    if b_norm == 0.0 {
        return Some((x, 0));
    }

    let mut r = b.clone();
    let mut z = r.component_mul(&inverse_diagonal);
    let mut p = z.clone();
    let mut rz = r.dot(&z);

    for iteration in 0..max_iter {
        let ap: DVector<f64> = a * &p;
        let alpha = rz / p.dot(&ap);
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        if r.norm() <= tol * b_norm {
            return Some((x, iteration + 1));
        }

        z = r.component_mul(&inverse_diagonal);
        let rz_next = r.dot(&z);
        let beta = rz_next / rz;
        rz = rz_next;
        p = &z + beta * &p;
    }

    None
}
