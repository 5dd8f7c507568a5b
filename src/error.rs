//! Error categories shared by every module.
//!
//! Each module defines its own error enum, and every one of them reports an
//! [`ErrorKind`] so drivers can react to the category of failure without
//! matching on module-specific variants.

use std::fmt;

/// The category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An entity type path could not be resolved.
    Lookup,
    /// A required configuration key is missing or a value has the wrong shape.
    Config,
    /// An entity was used in the wrong lifecycle state.
    State,
    /// A value failed validation (range, shape, location, duplicate name).
    Validation,
    /// A unit failed to parse or two units are dimensionally incompatible.
    Unit,
    /// A formula failed to parse or its symbols do not match its arguments.
    Formula,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lookup => "lookup",
            Self::Config => "config",
            Self::State => "state",
            Self::Validation => "validation",
            Self::Unit => "unit",
            Self::Formula => "formula",
        };
        f.write_str(name)
    }
}
