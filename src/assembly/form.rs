use crate::assembly::global::{evaluate_partitioned, scatter_add_vector, TripletAssembler};
use crate::assembly::{Coefficient, FormParameters};
use crate::basis::GlobalBasis;
use crate::error::AssemblyError;
use crate::field::{broadcast_shape, DiscreteField};
use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use ndarray::{concatenate, s, Array1, Array2, Array3, ArrayD, ArrayView2, Axis, Ix2, IxDyn};
use std::ops::Range;

/// The integrand of a bilinear form, evaluated for one trial and one test shape function at
/// every quadrature point of a range of elements.
///
/// The result must broadcast to `[E, Q]`. Implemented for closures with the same signature.
pub trait BilinearIntegrand: Sync {
    fn evaluate(&self, u: &DiscreteField, v: &DiscreteField, w: &FormParameters) -> eyre::Result<ArrayD<f64>>;
}

impl<F> BilinearIntegrand for F
where
    F: Fn(&DiscreteField, &DiscreteField, &FormParameters) -> eyre::Result<ArrayD<f64>> + Sync,
{
    fn evaluate(&self, u: &DiscreteField, v: &DiscreteField, w: &FormParameters) -> eyre::Result<ArrayD<f64>> {
        self(u, v, w)
    }
}

/// The integrand of a linear form, evaluated for one test shape function.
pub trait LinearIntegrand: Sync {
    fn evaluate(&self, v: &DiscreteField, w: &FormParameters) -> eyre::Result<ArrayD<f64>>;
}

impl<F> LinearIntegrand for F
where
    F: Fn(&DiscreteField, &FormParameters) -> eyre::Result<ArrayD<f64>> + Sync,
{
    fn evaluate(&self, v: &DiscreteField, w: &FormParameters) -> eyre::Result<ArrayD<f64>> {
        self(v, w)
    }
}

/// The integrand of a functional. The result must broadcast against `[E, Q]`; leading axes
/// are kept as components of the result.
pub trait FunctionalIntegrand: Sync {
    fn evaluate(&self, w: &FormParameters) -> eyre::Result<ArrayD<f64>>;
}

impl<F> FunctionalIntegrand for F
where
    F: Fn(&FormParameters) -> eyre::Result<ArrayD<f64>> + Sync,
{
    fn evaluate(&self, w: &FormParameters) -> eyre::Result<ArrayD<f64>> {
        self(w)
    }
}

/// Sums `integrand * dx` over the quadrature points, giving one value per element.
fn integrate_elementwise(integrand: &ArrayD<f64>, dx: &ArrayView2<f64>) -> eyre::Result<Array1<f64>> {
    let broadcast = integrand
        .broadcast(IxDyn(dx.shape()))
        .ok_or_else(|| AssemblyError::ShapeMismatch {
            expected: dx.shape().to_vec(),
            actual: integrand.shape().to_vec(),
        })?
        .into_dimensionality::<Ix2>()?;
    Ok((&broadcast * dx).sum_axis(Axis(1)))
}

fn check_same_elements(trial: &dyn GlobalBasis, test: &dyn GlobalBasis) -> eyre::Result<()> {
    let (trial, test) = (trial.data(), test.data());
    let trial_shape = [trial.num_elements(), trial.num_quadrature_points()];
    let test_shape = [test.num_elements(), test.num_quadrature_points()];
    if trial_shape != test_shape {
        return Err(AssemblyError::ShapeMismatch {
            expected: trial_shape.to_vec(),
            actual: test_shape.to_vec(),
        }
        .into());
    }
    Ok(())
}

fn select_basis(basis: &dyn GlobalBasis, elements: &Range<usize>) -> Vec<DiscreteField> {
    basis
        .data()
        .basis()
        .iter()
        .map(|phi| phi.select_elements(elements.clone()))
        .collect()
}

/// A bilinear form `a(u, v)`, assembled into a sparse matrix with rows indexed by test dofs and
/// columns by trial dofs.
#[derive(Debug, Clone, Copy)]
pub struct BilinearForm<K> {
    kernel: K,
}

impl<K> BilinearForm<K> {
    /// Wraps a closure as the integrand.
    pub fn new(kernel: K) -> Self
    where
        K: Fn(&DiscreteField, &DiscreteField, &FormParameters) -> eyre::Result<ArrayD<f64>> + Sync,
    {
        Self { kernel }
    }
}

impl<K: BilinearIntegrand> BilinearForm<K> {
    pub fn from_integrand(kernel: K) -> Self {
        Self { kernel }
    }

    pub fn integrand(&self) -> &K {
        &self.kernel
    }

    /// Assembles the global matrix.
    ///
    /// If `test` is `None`, the trial basis is also used as the test basis. Coefficients are
    /// made available to the integrand through the parameters of the trial basis.
    pub fn assemble(
        &self,
        trial: &dyn GlobalBasis,
        test: Option<&dyn GlobalBasis>,
        w: &[Coefficient],
        nthreads: usize,
    ) -> eyre::Result<CsrMatrix<f64>> {
        let test = test.unwrap_or(trial);
        check_same_elements(trial, test)?;
        let params = trial.parameters(w)?;

        let chunks = evaluate_partitioned(trial.num_elements(), nthreads, |elements| {
            self.assemble_elements(trial, test, &params, elements)
        })?;

        let mut assembler = TripletAssembler::new(test.num_dofs(), trial.num_dofs());
        for chunk in chunks {
            assembler.merge(chunk)?;
        }
        debug!(
            "Assembled {}x{} matrix from {} elements and {} triplets using {} threads",
            assembler.nrows(),
            assembler.ncols(),
            trial.num_elements(),
            assembler.len(),
            nthreads
        );
        assembler.into_csr()
    }

    fn assemble_elements(
        &self,
        trial: &dyn GlobalBasis,
        test: &dyn GlobalBasis,
        params: &FormParameters,
        elements: Range<usize>,
    ) -> eyre::Result<TripletAssembler> {
        let params = params.select_elements(elements.clone());
        let dx = trial.data().dx().slice(s![elements.clone(), ..]);
        let trial_fields = select_basis(trial, &elements);
        let test_fields = select_basis(test, &elements);
        let (trial_dofs, test_dofs) = (trial.data().dofs(), test.data().dofs());

        // Local blocks [element, test dof, trial dof]
        let mut local = Array3::zeros((elements.len(), test_fields.len(), trial_fields.len()));
        for (j, u) in trial_fields.iter().enumerate() {
            for (i, v) in test_fields.iter().enumerate() {
                let integrand = self.kernel.evaluate(u, v, &params)?;
                local
                    .slice_mut(s![.., i, j])
                    .assign(&integrate_elementwise(&integrand, &dx)?);
            }
        }

        let mut assembler = TripletAssembler::with_capacity(test.num_dofs(), trial.num_dofs(), local.len());
        for (e, block) in elements.zip(local.outer_iter()) {
            for ((i, j), &value) in block.indexed_iter() {
                assembler.push(test_dofs[[e, i]], trial_dofs[[e, j]], value);
            }
        }
        Ok(assembler)
    }
}

/// A linear form `l(v)`, assembled into a dense vector indexed by test dofs.
#[derive(Debug, Clone, Copy)]
pub struct LinearForm<K> {
    kernel: K,
}

impl<K> LinearForm<K> {
    /// Wraps a closure as the integrand.
    pub fn new(kernel: K) -> Self
    where
        K: Fn(&DiscreteField, &FormParameters) -> eyre::Result<ArrayD<f64>> + Sync,
    {
        Self { kernel }
    }
}

impl<K: LinearIntegrand> LinearForm<K> {
    pub fn from_integrand(kernel: K) -> Self {
        Self { kernel }
    }

    pub fn integrand(&self) -> &K {
        &self.kernel
    }

    pub fn assemble(&self, test: &dyn GlobalBasis, w: &[Coefficient], nthreads: usize) -> eyre::Result<DVector<f64>> {
        let params = test.parameters(w)?;
        let chunks = evaluate_partitioned(test.num_elements(), nthreads, |elements| {
            self.assemble_elements(test, &params, elements)
        })?;

        let dofs = test.data().dofs();
        let mut global = DVector::zeros(test.num_dofs());
        for (elements, local) in chunks {
            for (e, row) in elements.zip(local.rows()) {
                scatter_add_vector(&mut global, dofs.row(e), row);
            }
        }
        debug!(
            "Assembled vector of length {} from {} elements using {} threads",
            global.len(),
            test.num_elements(),
            nthreads
        );
        Ok(global)
    }

    /// Local vectors of a range of elements, one row per element.
    fn assemble_elements(
        &self,
        test: &dyn GlobalBasis,
        params: &FormParameters,
        elements: Range<usize>,
    ) -> eyre::Result<(Range<usize>, Array2<f64>)> {
        let params = params.select_elements(elements.clone());
        let dx = test.data().dx().slice(s![elements.clone(), ..]);
        let test_fields = select_basis(test, &elements);

        let mut local = Array2::zeros((elements.len(), test_fields.len()));
        for (i, v) in test_fields.iter().enumerate() {
            let integrand = self.kernel.evaluate(v, &params)?;
            local
                .column_mut(i)
                .assign(&integrate_elementwise(&integrand, &dx)?);
        }
        Ok((elements, local))
    }
}

/// A functional `J(w)`, integrated separately over each element.
#[derive(Debug, Clone, Copy)]
pub struct Functional<K> {
    kernel: K,
}

impl<K> Functional<K> {
    /// Wraps a closure as the integrand.
    pub fn new(kernel: K) -> Self
    where
        K: Fn(&FormParameters) -> eyre::Result<ArrayD<f64>> + Sync,
    {
        Self { kernel }
    }
}

impl<K: FunctionalIntegrand> Functional<K> {
    pub fn from_integrand(kernel: K) -> Self {
        Self { kernel }
    }

    pub fn integrand(&self) -> &K {
        &self.kernel
    }

    /// Integrates the functional over each element of `u`.
    ///
    /// The result has the element axis last, preceded by any component axes of the integrand.
    /// A functional has no test space: passing `v` fails with
    /// [`AssemblyError::FunctionalTestBasis`].
    pub fn assemble(
        &self,
        u: &dyn GlobalBasis,
        v: Option<&dyn GlobalBasis>,
        w: &[Coefficient],
        nthreads: usize,
    ) -> eyre::Result<ArrayD<f64>> {
        if v.is_some() {
            return Err(AssemblyError::FunctionalTestBasis.into());
        }
        let params = u.parameters(w)?;
        let chunks = evaluate_partitioned(u.num_elements(), nthreads, |elements| {
            let params = params.select_elements(elements);
            let integrand = self.kernel.evaluate(&params)?;
            let shape = broadcast_shape(integrand.shape(), params.dx().shape())?;
            if shape.len() < 2 || shape[shape.len() - 2..] != *params.dx().shape() {
                return Err(eyre::Report::from(AssemblyError::ShapeMismatch {
                    expected: params.dx().shape().to_vec(),
                    actual: integrand.shape().to_vec(),
                }));
            }
            let product = &integrand * params.dx();
            Ok(product.sum_axis(Axis(product.ndim() - 1)))
        })?;

        debug!(
            "Assembled functional over {} elements using {} threads",
            u.num_elements(),
            nthreads
        );
        match chunks.first() {
            None => Ok(ArrayD::zeros(IxDyn(&[0]))),
            Some(first) => {
                let element_axis = Axis(first.ndim() - 1);
                let views: Vec<_> = chunks.iter().map(|chunk| chunk.view()).collect();
                Ok(concatenate(element_axis, &views)?)
            }
        }
    }

    /// Integrates the functional over the whole basis and sums all entries.
    pub fn assemble_scalar(&self, u: &dyn GlobalBasis, w: &[Coefficient], nthreads: usize) -> eyre::Result<f64> {
        Ok(self.assemble(u, None, w, nthreads)?.sum())
    }
}
