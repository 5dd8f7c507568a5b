//! Processes: rate expressions over domain variables.
//!
//! An [`ExprProcess`] evaluates a formula over named per-cell variables and
//! scalar parameters, optionally scaled by the product of its response
//! processes:
//!
//! ```
//! use std::collections::HashMap;
//!
//! use microbenthos::{entity::Registry, process::{ExprProcess, Process}};
//! use ndarray::array;
//! use serde_json::json;
//!
//! let registry = Registry::new();
//! let uptake = ExprProcess::from_json(
//!     &registry,
//!     &json!({
//!         "formula": "Vmax * oxy / (Km + oxy)",
//!         "varnames": ["oxy"],
//!         "params": { "Vmax": 2.0, "Km": 1.0 },
//!     }),
//! )
//! .unwrap();
//!
//! let vars = HashMap::from([("oxy".to_owned(), array![1.0, 3.0])]);
//! let rate = uptake.evaluate(&vars, None, true).unwrap().into_cells(2);
//! assert_eq!(rate, array![1.0, 1.5]);
//! ```

mod compile;
mod error;
mod expr;
mod field;
pub mod formula;
mod params;

pub use compile::Compiled;
pub use error::{EvalError, FormulaError};
pub use expr::{ExprProcess, ExprProcessParams};
pub use field::Field;
pub use params::ParamSet;

use std::{
    collections::{BTreeSet, HashMap},
    hash::BuildHasher,
};

use indexmap::IndexMap;
use ndarray::Array1;

use crate::{
    domain::SedimentDbl,
    entity::{ConfigMap, Entity, EntityError, Registry},
};

/// Named per-cell values a process can read.
pub trait Variables {
    /// Values of the variable `name`, or `None` if it is unknown.
    fn field(&self, name: &str) -> Option<Field>;
}

impl<S: BuildHasher> Variables for HashMap<String, Array1<f64>, S> {
    fn field(&self, name: &str) -> Option<Field> {
        self.get(name).cloned().map(Field::Cells)
    }
}

impl<S: BuildHasher> Variables for HashMap<String, Field, S> {
    fn field(&self, name: &str) -> Option<Field> {
        self.get(name).cloned()
    }
}

impl Variables for IndexMap<String, Array1<f64>> {
    fn field(&self, name: &str) -> Option<Field> {
        self.get(name).cloned().map(Field::Cells)
    }
}

/// Reads registered variables in their own units.
impl Variables for SedimentDbl {
    fn field(&self, name: &str) -> Option<Field> {
        self.var(name)
            .ok()
            .map(|var| Field::Cells(var.values().to_owned()))
    }
}

/// An entity that computes a rate over domain variables.
pub trait Process: Entity {
    /// Names of every variable this process and its responses read.
    fn dependent_vars(&self) -> BTreeSet<String>;

    /// Builds a response process from `config` and stores it under `name`.
    ///
    /// # Errors
    ///
    /// Returns an [`EntityError`] if the name is not an identifier, the config
    /// does not construct, or the constructed entity is not a process.
    fn add_response(
        &mut self,
        registry: &Registry,
        name: &str,
        config: ConfigMap,
    ) -> Result<(), EntityError>;

    /// Evaluates the process.
    ///
    /// `params` overrides declared parameter values. With `full`, the result
    /// is multiplied by every response evaluated with its own overrides.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if a variable is missing or per-cell values
    /// differ in length.
    fn evaluate(
        &self,
        vars: &dyn Variables,
        params: Option<&ParamSet>,
        full: bool,
    ) -> Result<Field, EvalError>;
}
