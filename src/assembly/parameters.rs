use crate::basis::{interpolate, BasisData};
use crate::error::AssemblyError;
use crate::field::{select_elements, DiscreteField};
use nalgebra::DVector;
use ndarray::{Array2, ArrayD, IxDyn};
use std::ops::Range;

/// Externally supplied data made available to integrands through [`FormParameters`].
#[derive(Debug, Clone, PartialEq)]
pub enum Coefficient {
    /// A field already sampled at the quadrature points of the basis.
    Field(DiscreteField),
    /// One value per basis element, repeated at each of its quadrature points.
    ///
    /// This is the usual way to pass piecewise constant material parameters.
    Elemental(Vec<f64>),
    /// The same value everywhere.
    Constant(f64),
    /// Global dofs of a finite element function, interpolated through the basis.
    Dofs(DVector<f64>),
}

impl Coefficient {
    /// Tiles per-element values over the quadrature points of the basis.
    pub fn elemental(values: impl IntoIterator<Item = f64>) -> Self {
        Self::Elemental(values.into_iter().collect())
    }

    fn to_field(&self, data: &BasisData) -> eyre::Result<DiscreteField> {
        let (num_elements, num_points) = (data.num_elements(), data.num_quadrature_points());
        match self {
            Self::Field(field) => {
                let shape = field.quadrature_shape()?;
                if shape != (num_elements, num_points) {
                    return Err(AssemblyError::ShapeMismatch {
                        expected: vec![num_elements, num_points],
                        actual: vec![shape.0, shape.1],
                    }
                    .into());
                }
                Ok(field.clone())
            }
            Self::Elemental(values) => {
                if values.len() != num_elements {
                    return Err(AssemblyError::ShapeMismatch {
                        expected: vec![num_elements],
                        actual: vec![values.len()],
                    }
                    .into());
                }
                let tiled = Array2::from_shape_fn((num_elements, num_points), |(e, _)| values[e]);
                Ok(DiscreteField::from_value(tiled.into_dyn()))
            }
            Self::Constant(value) => Ok(DiscreteField::from_value(ArrayD::from_elem(
                IxDyn(&[num_elements, num_points]),
                *value,
            ))),
            Self::Dofs(dofs) => interpolate(data, dofs),
        }
    }
}

/// Geometric quadrature data of a basis together with the coefficients of an assembly.
///
/// Every array has the element and quadrature axes last, see [`crate::field`].
#[derive(Debug, Clone, PartialEq)]
pub struct FormParameters {
    x: ArrayD<f64>,
    h: ArrayD<f64>,
    dx: ArrayD<f64>,
    n: Option<ArrayD<f64>>,
    fields: Vec<DiscreteField>,
}

fn missing(name: impl Into<String>) -> eyre::Report {
    AssemblyError::MissingComponent { name: name.into() }.into()
}

impl FormParameters {
    pub(crate) fn from_basis(data: &BasisData, coefficients: &[Coefficient]) -> eyre::Result<Self> {
        let fields = coefficients
            .iter()
            .map(|coefficient| coefficient.to_field(data))
            .collect::<eyre::Result<Vec<_>>>()?;
        Ok(Self {
            x: data.x().clone(),
            h: data.h().clone(),
            dx: data.dx().clone().into_dyn(),
            n: data.normals().cloned(),
            fields,
        })
    }

    /// Physical coordinates of the quadrature points, `[d, E, Q]`.
    pub fn x(&self) -> &ArrayD<f64> {
        &self.x
    }

    /// Cell diameters, `[E, Q]`.
    pub fn h(&self) -> &ArrayD<f64> {
        &self.h
    }

    /// Integration measure, `[E, Q]`.
    pub fn dx(&self) -> &ArrayD<f64> {
        &self.dx
    }

    /// Outward unit normals, `[d, E, Q]`. Only available for facet bases.
    pub fn n(&self) -> eyre::Result<&ArrayD<f64>> {
        self.n.as_ref().ok_or_else(|| missing("normals"))
    }

    /// Value of the first coefficient.
    pub fn w(&self) -> eyre::Result<&ArrayD<f64>> {
        self.field(0)?.try_f()
    }

    /// First derivative of the first coefficient.
    pub fn dw(&self) -> eyre::Result<&ArrayD<f64>> {
        self.field(0)?.try_df()
    }

    pub fn field(&self, index: usize) -> eyre::Result<&DiscreteField> {
        self.fields
            .get(index)
            .ok_or_else(|| missing(format!("coefficient {}", index)))
    }

    pub fn fields(&self) -> &[DiscreteField] {
        &self.fields
    }

    pub(crate) fn select_elements(&self, elements: Range<usize>) -> Self {
        Self {
            x: select_elements(&self.x, elements.clone()),
            h: select_elements(&self.h, elements.clone()),
            dx: select_elements(&self.dx, elements.clone()),
            n: self.n.as_ref().map(|n| select_elements(n, elements.clone())),
            fields: self
                .fields
                .iter()
                .map(|field| field.select_elements(elements.clone()))
                .collect(),
        }
    }
}
