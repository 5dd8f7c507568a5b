use serde::{Deserialize, Serialize};
use uom::si::{f64::Length, length::millimeter};

use crate::support::{logging::Logger, units::Quantity};

use super::{DomainError, Geometry, SedimentDbl};

/// A mesh length as written in a model definition.
///
/// Plain numbers are millimetres; strings are quantities such as `"100 um"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LengthSpec {
    Millimeters(f64),
    Quantity(String),
}

impl LengthSpec {
    /// Converts to a length; plain numbers are millimetres.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Unit`] if the text is not a length quantity.
    pub fn to_length(&self) -> Result<Length, DomainError> {
        match self {
            Self::Millimeters(mm) => Ok(Length::new::<millimeter>(*mm)),
            Self::Quantity(text) => Ok(text.parse::<Quantity>()?.to_length()?),
        }
    }
}

/// Serializable description of a [`SedimentDbl`].
///
/// Missing fields take the defaults of [`Geometry::default`] and a sediment
/// porosity of 0.6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DomainConfig {
    pub cell_size: LengthSpec,
    pub sediment_length: LengthSpec,
    pub dbl_length: LengthSpec,
    pub porosity: f64,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            cell_size: LengthSpec::Millimeters(0.1),
            sediment_length: LengthSpec::Millimeters(10.0),
            dbl_length: LengthSpec::Millimeters(1.0),
            porosity: 0.6,
        }
    }
}

impl DomainConfig {
    /// Reads a config from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Config`] if the value does not describe a domain.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, DomainError> {
        Self::deserialize(value).map_err(|err| DomainError::Config {
            context: err.to_string(),
        })
    }

    /// Resolves the configured lengths.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Unit`] if any length is not a length quantity.
    pub fn geometry(&self) -> Result<Geometry, DomainError> {
        Ok(Geometry {
            cell_size: self.cell_size.to_length()?,
            sediment_length: self.sediment_length.to_length()?,
            dbl_length: self.dbl_length.to_length()?,
        })
    }

    /// Builds the domain.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the lengths or porosity are invalid.
    pub fn build(&self, logger: Logger) -> Result<SedimentDbl, DomainError> {
        SedimentDbl::new(self.geometry()?, self.porosity, logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::error::ErrorKind;

    #[test]
    fn numbers_are_millimeters() {
        let config = DomainConfig::from_json(&json!({
            "cell_size": 0.1,
            "sediment_length": 10,
            "dbl_length": 1,
        }))
        .unwrap();
        let domain = config.build(Logger::noop()).unwrap();
        assert_eq!(domain.sediment_cells(), 100);
        assert_eq!(domain.dbl_cells(), 10);
        assert_eq!(domain.sediment_porosity(), 0.6);
    }

    #[test]
    fn quantities_are_converted() {
        let config = DomainConfig::from_json(&json!({
            "cell_size": "50 um",
            "sediment_length": "0.5 cm",
            "dbl_length": "0 mm",
            "porosity": 0.4,
        }))
        .unwrap();
        let domain = config.build(Logger::noop()).unwrap();
        assert_eq!(domain.sediment_cells(), 100);
        assert_eq!(domain.dbl_cells(), 0);
    }

    #[test]
    fn rejects_bad_configs() {
        let unknown = DomainConfig::from_json(&json!({ "cells": 3 })).unwrap_err();
        assert_eq!(unknown.kind(), ErrorKind::Config);

        let not_length = DomainConfig {
            cell_size: LengthSpec::Quantity("1 s".to_owned()),
            ..DomainConfig::default()
        };
        assert_eq!(not_length.build(Logger::noop()).unwrap_err().kind(), ErrorKind::Unit);
    }
}
