//! Weak-form assembly of matrices, vectors and functionals.
//!
//! Integrands are evaluated for whole ranges of elements at once: every argument is a
//! [`DiscreteField`](crate::field::DiscreteField) or array with the element and quadrature axes
//! last, and the integrand returns an array that broadcasts to `[E, Q]`. The assembler weights
//! the result with the integration measure, sums over quadrature points and scatters the local
//! contributions into the global system, summing at shared dofs.
//!
//! Elements are split into contiguous partitions that are evaluated independently, in parallel
//! when more than one thread is requested. Partition results are merged in order on the calling
//! thread, so the assembled system does not depend on the number of threads.
mod form;
pub mod global;
mod parameters;

pub use form::*;
pub use parameters::*;
