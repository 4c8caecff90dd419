//! Assembly of finite element matrices, vectors and functionals from weak forms.
//!
//! The typical workflow builds a [`Mesh`](mesh::Mesh), binds an [`Element`](element::Element)
//! to it through an [`InteriorBasis`](basis::InteriorBasis) or a
//! [`FacetBasis`](basis::FacetBasis), and assembles
//! [`BilinearForm`](assembly::BilinearForm)s, [`LinearForm`](assembly::LinearForm)s and
//! [`Functional`](assembly::Functional)s against it.
pub mod assembly;
pub mod basis;
pub mod element;
pub mod error;
pub mod field;
pub mod mesh;
pub mod models;
pub mod quadrature;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
pub extern crate ndarray;

pub use error::AssemblyError;
