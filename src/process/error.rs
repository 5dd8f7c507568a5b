use thiserror::Error;

use crate::error::ErrorKind;

/// Errors raised while parsing a formula or checking its symbols.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// The formula text is not a valid expression.
    #[error("could not parse formula at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Names that cannot be used as formula symbols.
    #[error("improper names found: {names:?}")]
    InvalidName { names: Vec<String> },

    /// Names declared more than once across variables and parameters.
    #[error("duplicate argument names: {names:?}")]
    DuplicateName { names: Vec<String> },

    /// The formula's free symbols differ from the declared variables and parameters.
    #[error("expression and var/params mismatch: missing {missing:?}, unused {unused:?}")]
    Mismatch {
        /// Symbols in the formula that are neither variables nor parameters.
        missing: Vec<String>,
        /// Declared variables or parameters that the formula never uses.
        unused: Vec<String>,
    },
}

impl FormulaError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Formula
    }

    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

/// Errors raised while evaluating a process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// No values were supplied for a variable the formula needs.
    #[error("no values supplied for variable {name:?}")]
    MissingVariable { name: String },

    /// A compiled formula received the wrong number of arguments.
    #[error("formula takes {expected} arguments, got {found}")]
    Arity { expected: usize, found: usize },

    /// Two per-cell fields have different lengths.
    #[error("cannot combine fields of length {left} and {right}")]
    ShapeMismatch { left: usize, right: usize },
}

impl EvalError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingVariable { .. } => ErrorKind::Lookup,
            Self::Arity { .. } | Self::ShapeMismatch { .. } => ErrorKind::Validation,
        }
    }
}
