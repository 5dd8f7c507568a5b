use std::f64::consts::PI;

use ndarray::{Array1, ArrayView1};
use uom::si::length::meter;

use crate::{
    entity::{ConfigMap, EntityError},
    support::{constraint::StrictlyPositive, units::Unit},
};

use super::ScalarValue;

/// An initial profile for a variable's values.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    /// Evenly spaced values from `start` to `stop`, both inclusive.
    Linear { start: ScalarValue, stop: ScalarValue },
    /// A Gaussian over depth peaking at `coeff` at depth `loc`.
    ///
    /// Bare `loc` and `scale` values are metres.
    Normal {
        loc: ScalarValue,
        scale: ScalarValue,
        coeff: ScalarValue,
    },
}

impl Profile {
    /// Reads a profile by name from its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::UnknownProfile`] for an unrecognized name,
    /// [`EntityError::MissingProfileParam`] if a parameter is absent, and
    /// [`EntityError::NotSingleValued`] if one is not a scalar.
    pub fn from_params(profile: &str, params: &ConfigMap) -> Result<Self, EntityError> {
        match profile {
            "linear" => Ok(Self::Linear {
                start: param(params, "linear", "start")?,
                stop: param(params, "linear", "stop")?,
            }),
            "normal" => Ok(Self::Normal {
                loc: param(params, "normal", "loc")?,
                scale: param(params, "normal", "scale")?,
                coeff: param(params, "normal", "coeff")?,
            }),
            _ => Err(EntityError::UnknownProfile {
                profile: profile.to_owned(),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear { .. } => "linear",
            Self::Normal { .. } => "normal",
        }
    }

    /// Evaluates the profile in `unit` on cells at `depths` (metres).
    ///
    /// # Errors
    ///
    /// Returns a unit error if a value is incompatible with `unit` (or with a
    /// length for `loc` and `scale`), and a config error if `scale` is not
    /// strictly positive.
    pub fn values(&self, unit: &Unit, depths: ArrayView1<'_, f64>) -> Result<Array1<f64>, EntityError> {
        match self {
            Self::Linear { start, stop } => {
                let start = start.in_units_of(unit)?;
                let stop = stop.in_units_of(unit)?;
                Ok(Array1::linspace(start, stop, depths.len()))
            }
            Self::Normal { loc, scale, coeff } => {
                let loc = loc.to_length()?.get::<meter>();
                let scale = StrictlyPositive::new(scale.to_length()?.get::<meter>())
                    .map_err(|err| EntityError::config(format!("normal profile scale: {err}")))?
                    .into_inner();
                let coeff = coeff.in_units_of(unit)?;

                let sigma = scale / (2.0 * PI);
                Ok(depths.mapv(|z| coeff * (-(z - loc).powi(2) / (2.0 * sigma * sigma)).exp()))
            }
        }
    }
}

fn param(
    params: &ConfigMap,
    profile: &'static str,
    name: &'static str,
) -> Result<ScalarValue, EntityError> {
    let value = params
        .get(name)
        .ok_or(EntityError::MissingProfileParam {
            profile,
            param: name,
        })?;
    ScalarValue::from_json(name, value)
}
