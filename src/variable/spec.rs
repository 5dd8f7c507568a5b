use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uom::si::{f64::Length, length::meter};

use crate::{
    domain::{InitialValue, Location},
    entity::{ConfigMap, EntityError},
    support::units::{Quantity, Unit},
};

/// Init parameters of a [`Variable`](super::Variable).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableParams {
    pub name: String,
    pub create: ConfigMap,
    #[serde(default)]
    pub constraints: Option<Value>,
    #[serde(default)]
    pub seed: Option<SeedSpec>,
}

/// How the cell variable is created on the domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSpec {
    pub value: CreateValue,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, alias = "hasOld")]
    pub retain_previous: bool,
}

/// Initial value of a variable as written in a model definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreateValue {
    Number(f64),
    /// A quantity such as `"3.3 mol/l"`.
    Text(String),
    Cells(Vec<f64>),
}

impl CreateValue {
    pub(super) fn to_initial(&self) -> Result<InitialValue, EntityError> {
        Ok(match self {
            Self::Number(value) => InitialValue::Scalar(*value),
            Self::Text(text) => InitialValue::Quantity(text.parse()?),
            Self::Cells(cells) => InitialValue::from(cells.clone()),
        })
    }
}

/// Parameters of a seed profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedSpec {
    pub profile: String,
    #[serde(default)]
    pub params: ConfigMap,
}

/// A single number, either bare or carrying its own unit.
///
/// Bare numbers are read in whatever unit the context expects.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Number(f64),
    Quantity(Quantity),
}

impl ScalarValue {
    /// Reads a scalar from JSON, accepting numbers and quantity strings.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NotSingleValued`] for arrays, maps, booleans,
    /// nulls and strings that are not quantities.
    pub fn from_json(key: &str, value: &Value) -> Result<Self, EntityError> {
        let not_single = || EntityError::NotSingleValued {
            key: key.to_owned(),
            value: value.to_string(),
        };
        match value {
            Value::Number(number) => number.as_f64().map(Self::Number).ok_or_else(not_single),
            Value::String(text) => {
                let quantity: Quantity = text.parse().map_err(|_| not_single())?;
                Ok(if quantity.unit.is_dimensionless() {
                    Self::Number(quantity.value)
                } else {
                    Self::Quantity(quantity)
                })
            }
            _ => Err(not_single()),
        }
    }

    /// Returns the value in `unit`; bare numbers are taken as already in it.
    ///
    /// # Errors
    ///
    /// Returns a unit error if the quantity is not compatible with `unit`.
    pub fn in_units_of(&self, unit: &Unit) -> Result<f64, EntityError> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Quantity(quantity) => Ok(quantity.in_units_of(unit)?),
        }
    }

    /// Returns the value as a length; bare numbers are metres.
    ///
    /// # Errors
    ///
    /// Returns a unit error if the quantity is not a length.
    pub fn to_length(&self) -> Result<Length, EntityError> {
        match self {
            Self::Number(value) => Ok(Length::new::<meter>(*value)),
            Self::Quantity(quantity) => Ok(quantity.to_length()?),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Quantity(quantity) => write!(f, "{quantity}"),
        }
    }
}

/// Validates the creation spec of a variable.
///
/// # Errors
///
/// Returns a config error if `create` contains `name` or does not describe a
/// creation spec, and a unit error if `unit` does not parse.
pub fn check_create_params(create: &ConfigMap) -> Result<CreateSpec, EntityError> {
    if create.contains_key("name") {
        return Err(EntityError::config(
            "create params should not contain name, it is set from the variable name",
        ));
    }

    let spec = CreateSpec::deserialize(Value::Object(create.clone()))
        .map_err(|err| EntityError::config(format!("create params: {err}")))?;

    if let Some(unit) = &spec.unit {
        Unit::parse(unit)?;
    }
    Ok(spec)
}

/// Validates a mapping of location to boundary value.
///
/// Entries keep their declaration order.
///
/// # Errors
///
/// Returns a config error if `constraints` is not a map, a validation error
/// for an unknown location, and [`EntityError::NotSingleValued`] for a value
/// that is not one number.
pub fn check_constraints(constraints: &Value) -> Result<IndexMap<Location, ScalarValue>, EntityError> {
    let Value::Object(entries) = constraints else {
        return Err(EntityError::config(format!(
            "constraints should be a mapping of location to value, not {constraints}"
        )));
    };

    entries
        .iter()
        .map(|(loc, value)| -> Result<_, EntityError> {
            let location: Location = loc.parse()?;
            Ok((location, ScalarValue::from_json(loc, value)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::error::ErrorKind;

    fn map(value: Value) -> ConfigMap {
        match value {
            Value::Object(map) => map,
            other => panic!("not a map: {other}"),
        }
    }

    #[test]
    fn create_params_accept_valid_units() {
        for unit in ["mol", "kg/s", "m/s", "umol/cm**3", "1/cm"] {
            let spec = check_create_params(&map(json!({ "value": 3, "unit": unit }))).unwrap();
            assert_eq!(spec.unit.as_deref(), Some(unit));
        }
    }

    #[test]
    fn create_params_reject_bad_units_and_names() {
        let junk = check_create_params(&map(json!({ "value": 3, "unit": "junk" }))).unwrap_err();
        assert_eq!(junk.kind(), ErrorKind::Unit);

        let pair = check_create_params(&map(json!({ "value": 3, "unit": ["kg", "m"] }))).unwrap_err();
        assert_eq!(pair.kind(), ErrorKind::Config);

        let named = check_create_params(&map(json!({ "value": 3, "name": "heh ho" }))).unwrap_err();
        assert_eq!(named.kind(), ErrorKind::Config);
    }

    #[test]
    fn has_old_is_an_alias() {
        let spec = check_create_params(&map(json!({ "value": 1.0, "hasOld": true }))).unwrap();
        assert!(spec.retain_previous);
        assert_eq!(spec.value, CreateValue::Number(1.0));
    }

    #[test]
    fn constraints_accept_scalars() {
        for constraints in [
            json!({ "top": 1 }),
            json!({ "bottom": 1 }),
            json!({ "dbl": 1 }),
            json!({ "sediment": 1 }),
            json!({ "top": 0, "bottom": 1 }),
            json!({ "top": "1.3" }),
            json!({ "top": "0.2e-3 mol/l" }),
        ] {
            assert!(check_constraints(&constraints).is_ok(), "{constraints}");
        }
    }

    #[test]
    fn constraints_reject_bad_shapes() {
        for (constraints, kind) in [
            (json!({ "atop": 0, "bottom": 1 }), ErrorKind::Validation),
            (json!({ "unknown": 1 }), ErrorKind::Validation),
            (json!(["top", 1]), ErrorKind::Config),
            (Value::Null, ErrorKind::Config),
            (json!("234"), ErrorKind::Config),
            (json!({ "top": [3, 4] }), ErrorKind::Validation),
            (json!({ "top": "abc" }), ErrorKind::Validation),
            (json!({ "top": ["1.3"] }), ErrorKind::Validation),
        ] {
            let err = check_constraints(&constraints).unwrap_err();
            assert_eq!(err.kind(), kind, "{constraints}");
        }
    }

    #[test]
    fn constraints_keep_declaration_order() {
        let checked = check_constraints(&json!({ "sediment": 2, "top": 1, "dbl": 3 })).unwrap();
        assert_eq!(
            checked.keys().copied().collect::<Vec<_>>(),
            [Location::Sediment, Location::Top, Location::Dbl]
        );
    }

    #[test]
    fn scalars_convert_units() {
        let mol_l = Unit::parse("mol/l").unwrap();
        let quantity = ScalarValue::from_json("top", &json!("0.2 mmol/l")).unwrap();
        assert!((quantity.in_units_of(&mol_l).unwrap() - 0.2e-3).abs() < 1e-15);
        assert_eq!(ScalarValue::Number(4.0).in_units_of(&mol_l).unwrap(), 4.0);

        let seconds = ScalarValue::from_json("top", &json!("3 s")).unwrap();
        assert_eq!(seconds.in_units_of(&mol_l).unwrap_err().kind(), ErrorKind::Unit);
    }
}
