use thiserror::Error;

use crate::error::ErrorKind;

/// Errors raised while parsing or converting physical units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// The unit string could not be parsed.
    #[error("invalid unit {unit:?}: {reason}")]
    Parse { unit: String, reason: String },

    /// The text does not describe a number followed by an optional unit.
    #[error("invalid quantity {text:?}")]
    Quantity { text: String },

    /// Two units do not share the same physical dimension.
    #[error("unit {from:?} is not compatible with {to:?}")]
    Incompatible { from: String, to: String },
}

impl UnitError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Unit
    }

    pub(crate) fn parse(unit: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            unit: unit.to_owned(),
            reason: reason.into(),
        }
    }
}
