use thiserror::Error;

use crate::{
    error::ErrorKind,
    support::{constraint::ConstraintError, units::UnitError},
};

/// Errors raised while building a domain or managing its variables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// A mesh length violates its numeric constraint.
    #[error("invalid {quantity}: {source}")]
    Geometry {
        quantity: &'static str,
        source: ConstraintError,
    },

    /// The sediment column holds fewer than the minimum number of cells.
    #[error("sediment holds {cells} cells, at least {min} are required")]
    SedimentTooShort { cells: usize, min: usize },

    /// Sediment porosity is outside the open interval (0.1, 0.9).
    #[error("sediment porosity {value} should be between (0.1, 0.9): {source}")]
    Porosity {
        value: f64,
        source: ConstraintError,
    },

    /// A variable name is empty.
    #[error("variable name must not be empty")]
    EmptyName,

    /// A variable name is already registered.
    #[error("domain variable {name:?} already exists")]
    DuplicateName { name: String },

    /// No variable is registered under the name.
    #[error("no domain variable named {name:?}")]
    UnknownVariable { name: String },

    /// A value cannot be broadcast onto the mesh.
    #[error("value of length {found} for {name:?} is not compatible with {expected} cells")]
    ShapeMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    /// A location name is not one of the recognized domain locations.
    #[error("location {location:?} unknown, should be one of top, bottom, dbl, sediment")]
    UnknownLocation { location: String },

    /// A domain configuration value has the wrong shape.
    #[error("invalid domain config: {context}")]
    Config { context: String },

    #[error(transparent)]
    Unit(#[from] UnitError),
}

impl DomainError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Unit(_) => ErrorKind::Unit,
            _ => ErrorKind::Validation,
        }
    }
}
