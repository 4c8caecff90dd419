//! Standard integrands of the Poisson problem.
use crate::assembly::{BilinearIntegrand, FormParameters, FunctionalIntegrand, LinearIntegrand};
use crate::field::{ddot, dot, DiscreteField};
use ndarray::ArrayD;

/// Inner product of two values: a plain product for scalars, a dot product for vectors.
fn inner(a: &ArrayD<f64>, b: &ArrayD<f64>) -> eyre::Result<ArrayD<f64>> {
    if a.ndim() > 2 {
        dot(a, b)
    } else {
        Ok(a * b)
    }
}

/// The stiffness form `grad u : grad v`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Laplace;

impl BilinearIntegrand for Laplace {
    fn evaluate(&self, u: &DiscreteField, v: &DiscreteField, _: &FormParameters) -> eyre::Result<ArrayD<f64>> {
        let (du, dv) = (u.try_df()?, v.try_df()?);
        if du.ndim() > 3 {
            ddot(du, dv)
        } else {
            dot(du, dv)
        }
    }
}

/// The mass form `u . v`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Mass;

impl BilinearIntegrand for Mass {
    fn evaluate(&self, u: &DiscreteField, v: &DiscreteField, _: &FormParameters) -> eyre::Result<ArrayD<f64>> {
        inner(u.try_f()?, v.try_f()?)
    }
}

/// The load `v` of a unit source.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct UnitLoad;

impl LinearIntegrand for UnitLoad {
    fn evaluate(&self, v: &DiscreteField, _: &FormParameters) -> eyre::Result<ArrayD<f64>> {
        Ok(v.try_f()?.clone())
    }
}

/// The integrand `1`, measuring the area (length) of each element.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Measure;

impl FunctionalIntegrand for Measure {
    fn evaluate(&self, w: &FormParameters) -> eyre::Result<ArrayD<f64>> {
        Ok(w.dx().mapv(|_| 1.0))
    }
}
