use thiserror::Error;

use crate::{
    domain::DomainError, error::ErrorKind, process::FormulaError, support::units::UnitError,
};

/// Errors raised while constructing, attaching or setting up entities.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntityError {
    /// No constructor is registered for the type path.
    #[error("entity type {path:?} could not be found")]
    Lookup { path: String },

    /// A config is missing a required key.
    #[error("config missing required key {key:?}")]
    MissingKey { key: &'static str },

    /// A config value has the wrong shape.
    #[error("invalid entity config: {context}")]
    Config { context: String },

    /// The entity already has a domain.
    #[error("entity already has a domain, cannot set again")]
    AlreadyAttached,

    /// The operation needs a domain and none is attached.
    #[error("a domain is required before setup")]
    NotAttached,

    /// The attached domain no longer exists.
    #[error("the attached domain has been dropped")]
    DomainDropped,

    /// The variable has not been created on the domain yet.
    #[error("variable {name:?} does not exist yet")]
    NotCreated { name: String },

    /// A value that must be a single number is not.
    #[error("{key} should be single-valued, not {value}")]
    NotSingleValued { key: String, value: String },

    /// A seed profile name is not recognized.
    #[error("unknown profile {profile:?}, should be one of linear, normal")]
    UnknownProfile { profile: String },

    /// A seed profile is missing one of its parameters.
    #[error("{profile} profile requires parameter {param:?}")]
    MissingProfileParam {
        profile: &'static str,
        param: &'static str,
    },

    /// A response entity is not a process.
    #[error("response {name:?} built a {type_name}, which is not a process")]
    NotAProcess {
        name: String,
        type_name: &'static str,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Formula(#[from] FormulaError),
}

impl EntityError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Lookup { .. } => ErrorKind::Lookup,
            Self::MissingKey { .. }
            | Self::Config { .. }
            | Self::MissingProfileParam { .. }
            | Self::NotAProcess { .. } => ErrorKind::Config,
            Self::AlreadyAttached
            | Self::NotAttached
            | Self::DomainDropped
            | Self::NotCreated { .. } => ErrorKind::State,
            Self::NotSingleValued { .. } | Self::UnknownProfile { .. } => ErrorKind::Validation,
            Self::Domain(err) => err.kind(),
            Self::Unit(err) => err.kind(),
            Self::Formula(err) => err.kind(),
        }
    }

    pub(crate) fn config(context: impl Into<String>) -> Self {
        Self::Config {
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_kind() {
        let unit = EntityError::from(UnitError::Incompatible {
            from: "s".into(),
            to: "m".into(),
        });
        assert_eq!(unit.kind(), ErrorKind::Unit);

        let location = EntityError::from(DomainError::UnknownLocation {
            location: "middle".into(),
        });
        assert_eq!(location.kind(), ErrorKind::Validation);

        assert_eq!(EntityError::AlreadyAttached.kind(), ErrorKind::State);
        assert_eq!(EntityError::MissingKey { key: "cls" }.kind(), ErrorKind::Config);
    }
}
