//! Errors reported by mesh construction, basis construction and form assembly.
use std::error::Error;
use std::fmt;

/// Recoverable failures of the assembly pipeline.
///
/// Operations return `eyre::Result`; callers that need to branch on the failure can recover
/// the variant with `report.downcast_ref::<AssemblyError>()`.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AssemblyError {
    /// A named subdomain or boundary does not exist on the mesh.
    UnknownRegion { name: String },
    /// A functional was given a test basis.
    FunctionalTestBasis,
    /// Two arrays could not be combined because their shapes are incompatible.
    ShapeMismatch { expected: Vec<usize>, actual: Vec<usize> },
    /// A field component or form parameter was requested but is absent.
    MissingComponent { name: String },
    /// More than one first-order derivative was supplied for a discrete field.
    AmbiguousDerivative,
    /// The requested number of worker threads is zero.
    InvalidThreadCount,
    /// The element is defined on a different reference cell than the mesh.
    IncompatibleElement { details: String },
    /// A cell has a (numerically) vanishing Jacobian determinant.
    DegenerateCell { cell: usize },
    /// Mesh connectivity or region data is inconsistent.
    InvalidMesh { details: String },
    /// No quadrature rule exists for the requested strength.
    Quadrature { strength: usize },
    /// A point to evaluate at lies outside every cell of a basis.
    PointOutsideMesh { point: Vec<f64> },
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownRegion { name } => write!(f, "unknown mesh region \"{}\"", name),
            Self::FunctionalTestBasis => write!(f, "functionals do not accept a test basis"),
            Self::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {:?}, got {:?}", expected, actual)
            }
            Self::MissingComponent { name } => write!(f, "missing component \"{}\"", name),
            Self::AmbiguousDerivative => {
                write!(f, "at most one of grad, div and curl may be present in a discrete field")
            }
            Self::InvalidThreadCount => write!(f, "number of threads must be at least 1"),
            Self::IncompatibleElement { details } => write!(f, "incompatible element: {}", details),
            Self::DegenerateCell { cell } => write!(f, "cell {} is degenerate", cell),
            Self::InvalidMesh { details } => write!(f, "invalid mesh: {}", details),
            Self::Quadrature { strength } => {
                write!(f, "no quadrature rule available for strength {}", strength)
            }
            Self::PointOutsideMesh { point } => write!(f, "point {:?} lies outside the mesh", point),
        }
    }
}

impl Error for AssemblyError {}

impl From<formwork_quadrature::Error> for AssemblyError {
    fn from(error: formwork_quadrature::Error) -> Self {
        match error {
            formwork_quadrature::Error::NoRuleAvailable { strength } => Self::Quadrature { strength },
            other => Self::IncompatibleElement {
                details: other.to_string(),
            },
        }
    }
}
