//! Quadrature-point representation of finite element functions.
//!
//! Every array stored in a [`DiscreteField`] has the element (or facet) axis and the quadrature
//! point axis as its two *trailing* axes. Component axes, if any, come first:
//!
//! | quantity                | shape          |
//! |-------------------------|----------------|
//! | scalar value            | `[E, Q]`       |
//! | scalar gradient         | `[d, E, Q]`    |
//! | scalar Hessian          | `[d, d, E, Q]` |
//! | vector value            | `[c, E, Q]`    |
//! | vector gradient         | `[c, d, E, Q]` |
use crate::error::AssemblyError;
use eyre::eyre;
use ndarray::{ArrayD, Axis, Slice};
use std::ops::{Mul, Range};

/// Values and derivatives of a function sampled at the quadrature points of a set of elements.
///
/// Any component may be absent. By convention a scalar field carries `grad`, whereas a vector
/// field carries either `div` or `curl`, but the container itself does not enforce this;
/// use [`DiscreteField::try_new`] for a checked construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscreteField {
    pub value: Option<ArrayD<f64>>,
    pub grad: Option<ArrayD<f64>>,
    pub div: Option<ArrayD<f64>>,
    pub curl: Option<ArrayD<f64>>,
    pub ggrad: Option<ArrayD<f64>>,
}

/// Value of the field, if present.
pub fn value_of(field: &DiscreteField) -> Option<&ArrayD<f64>> {
    field.value.as_ref()
}

/// The first present derivative among `grad`, `div` and `curl`.
pub fn first_derivative_of(field: &DiscreteField) -> Option<&ArrayD<f64>> {
    field
        .grad
        .as_ref()
        .or(field.div.as_ref())
        .or(field.curl.as_ref())
}

pub fn second_derivative_of(field: &DiscreteField) -> Option<&ArrayD<f64>> {
    field.ggrad.as_ref()
}

impl DiscreteField {
    /// Constructs a field, rejecting fields with more than one first-order derivative.
    pub fn try_new(
        value: Option<ArrayD<f64>>,
        grad: Option<ArrayD<f64>>,
        div: Option<ArrayD<f64>>,
        curl: Option<ArrayD<f64>>,
        ggrad: Option<ArrayD<f64>>,
    ) -> eyre::Result<Self> {
        let num_derivatives = [&grad, &div, &curl]
            .iter()
            .filter(|d| d.is_some())
            .count();
        if num_derivatives > 1 {
            return Err(AssemblyError::AmbiguousDerivative.into());
        }
        Ok(Self {
            value,
            grad,
            div,
            curl,
            ggrad,
        })
    }

    pub fn from_value(value: ArrayD<f64>) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: ArrayD<f64>) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_grad(mut self, grad: ArrayD<f64>) -> Self {
        self.grad = Some(grad);
        self
    }

    pub fn with_div(mut self, div: ArrayD<f64>) -> Self {
        self.div = Some(div);
        self
    }

    pub fn with_curl(mut self, curl: ArrayD<f64>) -> Self {
        self.curl = Some(curl);
        self
    }

    pub fn with_ggrad(mut self, ggrad: ArrayD<f64>) -> Self {
        self.ggrad = Some(ggrad);
        self
    }

    pub fn f(&self) -> Option<&ArrayD<f64>> {
        value_of(self)
    }

    pub fn df(&self) -> Option<&ArrayD<f64>> {
        first_derivative_of(self)
    }

    pub fn ddf(&self) -> Option<&ArrayD<f64>> {
        second_derivative_of(self)
    }

    /// Like [`f`](Self::f), but reports a missing value as [`AssemblyError::MissingComponent`].
    pub fn try_f(&self) -> eyre::Result<&ArrayD<f64>> {
        self.f().ok_or_else(|| missing("value"))
    }

    pub fn try_df(&self) -> eyre::Result<&ArrayD<f64>> {
        self.df().ok_or_else(|| missing("grad/div/curl"))
    }

    pub fn try_ddf(&self) -> eyre::Result<&ArrayD<f64>> {
        self.ddf().ok_or_else(|| missing("ggrad"))
    }

    fn components(&self) -> [&Option<ArrayD<f64>>; 5] {
        [&self.value, &self.grad, &self.div, &self.curl, &self.ggrad]
    }

    fn map_components(&self, mut f: impl FnMut(&ArrayD<f64>) -> ArrayD<f64>) -> Self {
        Self {
            value: self.value.as_ref().map(&mut f),
            grad: self.grad.as_ref().map(&mut f),
            div: self.div.as_ref().map(&mut f),
            curl: self.curl.as_ref().map(&mut f),
            ggrad: self.ggrad.as_ref().map(&mut f),
        }
    }

    /// A field of the same shape with every present component set to zero.
    ///
    /// Absent components stay absent.
    pub fn zeros_like(&self) -> Self {
        self.map_components(|array| ArrayD::zeros(array.raw_dim()))
    }

    /// The `(elements, quadrature points)` shape shared by all present components.
    pub fn quadrature_shape(&self) -> eyre::Result<(usize, usize)> {
        let mut shape = None;
        for array in self.components().into_iter().flatten() {
            let trailing = trailing_shape(array)?;
            match shape {
                None => shape = Some(trailing),
                Some(expected) if expected != trailing => {
                    return Err(AssemblyError::ShapeMismatch {
                        expected: vec![expected.0, expected.1],
                        actual: vec![trailing.0, trailing.1],
                    }
                    .into())
                }
                Some(_) => {}
            }
        }
        shape.ok_or_else(|| missing("value"))
    }

    /// Splits a vector-valued field into one field per component, slicing axis 0 of every
    /// present component.
    pub fn split(&self) -> eyre::Result<Vec<Self>> {
        let mut num_components = None;
        for array in self.components().into_iter().flatten() {
            if array.ndim() < 3 {
                return Err(eyre!(AssemblyError::ShapeMismatch {
                    expected: vec![0, 0, 0],
                    actual: array.shape().to_vec(),
                })
                .wrap_err("only fields with a component axis can be split"));
            }
            match num_components {
                None => num_components = Some(array.len_of(Axis(0))),
                Some(n) if n != array.len_of(Axis(0)) => {
                    return Err(AssemblyError::ShapeMismatch {
                        expected: vec![n],
                        actual: vec![array.len_of(Axis(0))],
                    }
                    .into())
                }
                Some(_) => {}
            }
        }

        let num_components = num_components.ok_or_else(|| missing("value"))?;
        Ok((0..num_components)
            .map(|i| self.map_components(|array| array.index_axis(Axis(0), i).to_owned()))
            .collect())
    }

    /// Restricts every present component to the given range of elements.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds for the element axis.
    pub fn select_elements(&self, elements: Range<usize>) -> Self {
        self.map_components(|array| select_elements(array, elements.clone()))
    }

    /// Multiplies the values of two fields. Derivatives are discarded.
    pub fn try_mul(&self, other: &Self) -> eyre::Result<Self> {
        self.try_mul_array(other.try_f()?)
    }

    /// Multiplies the value of the field by a broadcastable array. Derivatives are discarded.
    pub fn try_mul_array(&self, array: &ArrayD<f64>) -> eyre::Result<Self> {
        let value = self.try_f()?;
        broadcast_shape(value.shape(), array.shape())?;
        Ok(Self::from_value(value * array))
    }
}

impl<'a> Mul<&'a DiscreteField> for &'a DiscreteField {
    type Output = DiscreteField;

    /// # Panics
    ///
    /// Panics if either value is absent or the values cannot be broadcast together.
    fn mul(self, rhs: &'a DiscreteField) -> DiscreteField {
        match self.try_mul(rhs) {
            Ok(product) => product,
            Err(err) => panic!("cannot multiply discrete fields: {}", err),
        }
    }
}

impl<'a> Mul<&'a ArrayD<f64>> for &'a DiscreteField {
    type Output = DiscreteField;

    fn mul(self, rhs: &'a ArrayD<f64>) -> DiscreteField {
        match self.try_mul_array(rhs) {
            Ok(product) => product,
            Err(err) => panic!("cannot multiply discrete field by array: {}", err),
        }
    }
}

impl Mul<f64> for &DiscreteField {
    type Output = DiscreteField;

    fn mul(self, rhs: f64) -> DiscreteField {
        match self.f() {
            Some(value) => DiscreteField::from_value(value * rhs),
            None => panic!("cannot multiply discrete field without a value"),
        }
    }
}

/// Shape obtained by broadcasting two shapes against each other, aligning trailing axes.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> eyre::Result<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let padded = |shape: &[usize], axis: usize| {
        let offset = ndim - shape.len();
        if axis < offset {
            1
        } else {
            shape[axis - offset]
        }
    };

    (0..ndim)
        .map(|axis| match (padded(a, axis), padded(b, axis)) {
            (m, n) if m == n => Ok(m),
            (1, n) => Ok(n),
            (m, 1) => Ok(m),
            _ => Err(AssemblyError::ShapeMismatch {
                expected: a.to_vec(),
                actual: b.to_vec(),
            }
            .into()),
        })
        .collect()
}

/// Elementwise product of `a` and `b` summed over axis 0.
///
/// For gradients `[d, E, Q]` this is the pointwise inner product `[E, Q]`.
pub fn dot(a: &ArrayD<f64>, b: &ArrayD<f64>) -> eyre::Result<ArrayD<f64>> {
    broadcast_shape(a.shape(), b.shape())?;
    let product = a * b;
    if product.ndim() == 0 {
        return Err(missing("component axis"));
    }
    Ok(product.sum_axis(Axis(0)))
}

/// Elementwise product of `a` and `b` summed over axes 0 and 1.
///
/// For vector gradients `[c, d, E, Q]` this is the pointwise Frobenius product `[E, Q]`.
pub fn ddot(a: &ArrayD<f64>, b: &ArrayD<f64>) -> eyre::Result<ArrayD<f64>> {
    let inner = dot(a, b)?;
    if inner.ndim() == 0 {
        return Err(missing("component axis"));
    }
    Ok(inner.sum_axis(Axis(0)))
}

pub(crate) fn trailing_shape(array: &ArrayD<f64>) -> eyre::Result<(usize, usize)> {
    match array.shape() {
        [.., e, q] => Ok((*e, *q)),
        shape => Err(AssemblyError::ShapeMismatch {
            expected: vec![0, 0],
            actual: shape.to_vec(),
        }
        .into()),
    }
}

/// Slices the element axis (the second to last axis) of a quadrature-point array.
pub(crate) fn select_elements(array: &ArrayD<f64>, elements: Range<usize>) -> ArrayD<f64> {
    let axis = Axis(array.ndim() - 2);
    array.slice_axis(axis, Slice::from(elements)).to_owned()
}

fn missing(name: &str) -> eyre::Report {
    AssemblyError::MissingComponent { name: name.to_string() }.into()
}
