//! Local-to-global accumulation and element partitioning.
use crate::error::AssemblyError;
use eyre::eyre;
use log::{trace, warn};
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use ndarray::ArrayView1;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::ops::Range;

/// Accumulates matrix contributions as `(row, col, value)` triplets.
///
/// Duplicate entries are kept until conversion, where they are summed.
#[derive(Debug, Clone, PartialEq)]
pub struct TripletAssembler {
    nrows: usize,
    ncols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl TripletAssembler {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn with_capacity(nrows: usize, ncols: usize, capacity: usize) -> Self {
        Self {
            nrows,
            ncols,
            rows: Vec::with_capacity(capacity),
            cols: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored triplets, duplicates included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// # Panics
    ///
    /// Panics if the indices are out of bounds.
    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.nrows, "row index out of bounds");
        assert!(col < self.ncols, "column index out of bounds");
        self.rows.push(row);
        self.cols.push(col);
        self.values.push(value);
    }

    /// Appends the triplets of another assembler of the same dimensions.
    pub fn merge(&mut self, other: TripletAssembler) -> eyre::Result<()> {
        if (self.nrows, self.ncols) != (other.nrows, other.ncols) {
            return Err(AssemblyError::ShapeMismatch {
                expected: vec![self.nrows, self.ncols],
                actual: vec![other.nrows, other.ncols],
            }
            .into());
        }
        self.rows.extend(other.rows);
        self.cols.extend(other.cols);
        self.values.extend(other.values);
        Ok(())
    }

    /// Converts to CSR format, summing duplicate entries.
    pub fn into_csr(self) -> eyre::Result<CsrMatrix<f64>> {
        let coo = CooMatrix::try_from_triplets(self.nrows, self.ncols, self.rows, self.cols, self.values)
            .map_err(|err| eyre!("invalid triplets: {}", err))?;
        Ok(CsrMatrix::from(&coo))
    }
}

/// Adds local contributions to the entries of a global vector.
///
/// # Panics
///
/// Panics if the lengths of `global_indices` and `local` differ or an index is out of bounds.
pub fn scatter_add_vector(global: &mut DVector<f64>, global_indices: ArrayView1<usize>, local: ArrayView1<f64>) {
    assert_eq!(global_indices.len(), local.len(), "index and value counts must match");
    for (&index, &value) in global_indices.iter().zip(local.iter()) {
        global[index] += value;
    }
}

/// Splits `0..num_elements` into at most `nthreads` contiguous, non-empty ranges of nearly
/// equal length.
///
/// # Panics
///
/// Panics if `nthreads` is zero.
pub fn partition_elements(num_elements: usize, nthreads: usize) -> Vec<Range<usize>> {
    assert!(nthreads > 0, "number of threads must be positive");
    let num_partitions = nthreads.min(num_elements);
    if num_partitions == 0 {
        return Vec::new();
    }

    let base = num_elements / num_partitions;
    let remainder = num_elements % num_partitions;
    let mut start = 0;
    (0..num_partitions)
        .map(|i| {
            let len = base + usize::from(i < remainder);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

pub(crate) fn check_thread_count(nthreads: usize) -> eyre::Result<()> {
    if nthreads == 0 {
        Err(AssemblyError::InvalidThreadCount.into())
    } else {
        Ok(())
    }
}

/// Evaluates `evaluate` on every partition of the elements. With more than one thread the
/// partitions run as parallel tasks on the current rayon pool, so `nthreads` fixes the
/// partitioning and the pool bounds the concurrency.
///
/// Results are returned in partition order.
pub(crate) fn evaluate_partitioned<T, F>(num_elements: usize, nthreads: usize, evaluate: F) -> eyre::Result<Vec<T>>
where
    T: Send,
    F: Fn(Range<usize>) -> eyre::Result<T> + Sync,
{
    check_thread_count(nthreads)?;
    if nthreads > num_elements && num_elements > 0 {
        warn!(
            "Requested {} threads for {} elements, some threads will be idle",
            nthreads, num_elements
        );
    }

    let partitions = partition_elements(num_elements, nthreads);
    if nthreads == 1 || partitions.len() <= 1 {
        return partitions.into_iter().map(evaluate).collect();
    }

    partitions
        .into_par_iter()
        .map(|range| {
            trace!("Evaluating elements {:?}", range);
            evaluate(range)
        })
        .collect()
}
