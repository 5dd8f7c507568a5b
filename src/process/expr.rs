use std::{any::Any, collections::BTreeSet, fmt};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    entity::{ConfigMap, Entity, EntityError, Registry, Snapshot},
    support::logging::Logger,
};

use super::{
    Compiled, EvalError, Field, ParamSet, Process, Variables,
    formula::{Expr, check_names},
};

/// Init parameters of an [`ExprProcess`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExprProcessParams {
    pub formula: String,
    pub varnames: Vec<String>,
    #[serde(default)]
    pub params: IndexMap<String, f64>,
    /// Entity configs of the response processes, by name.
    #[serde(default)]
    pub responses: IndexMap<String, ConfigMap>,
}

/// A process defined by a formula over variables and parameters.
///
/// Arguments are passed to the formula as the variables, in declaration
/// order, followed by the parameters.
#[derive(Debug)]
pub struct ExprProcess {
    formula: String,
    expr: Expr,
    varnames: Vec<String>,
    params: IndexMap<String, f64>,
    responses: IndexMap<String, Box<dyn Process>>,
    compiled: Compiled,
    logger: Logger,
}

impl ExprProcess {
    /// Parses and compiles the formula, then builds each response.
    ///
    /// # Errors
    ///
    /// Returns a formula error if a name is not an identifier or is declared
    /// twice, the formula does not parse, or its free symbols differ from the
    /// variables and parameters. Errors from building responses are returned as is.
    pub fn new(
        params: ExprProcessParams,
        registry: &Registry,
        logger: Logger,
    ) -> Result<Self, EntityError> {
        logger.debug(format_args!("Init in ExprProcess"));

        check_names(params.params.keys().map(String::as_str))?;
        check_names(params.varnames.iter().map(String::as_str))?;
        check_names(params.responses.keys().map(String::as_str))?;

        logger.debug(format_args!("Parsing formula: {}", params.formula));
        let expr = Expr::parse(&params.formula)?;
        logger.info(format_args!("Created expression: {expr}"));

        let argnames: Vec<String> = params
            .varnames
            .iter()
            .chain(params.params.keys())
            .cloned()
            .collect();
        let compiled = Compiled::new(&expr, &argnames).inspect_err(|err| {
            logger.error(format_args!(
                "Expression symbols {:?} mismatch with vars & params {argnames:?}: {err}",
                expr.symbols()
            ));
        })?;

        let mut process = Self {
            formula: params.formula,
            expr,
            varnames: params.varnames,
            params: params.params,
            responses: IndexMap::new(),
            compiled,
            logger,
        };
        for (name, config) in params.responses {
            process.add_response(registry, &name, config)?;
        }
        Ok(process)
    }

    /// Builds a process from a JSON map of init parameters.
    ///
    /// The process logs through the registry's logger.
    ///
    /// # Errors
    ///
    /// Returns a config error if the value is not a process definition, or
    /// any error from [`ExprProcess::new`].
    pub fn from_json(registry: &Registry, params: &Value) -> Result<Self, EntityError> {
        let params = ExprProcessParams::deserialize(params)
            .map_err(|err| EntityError::config(format!("process params: {err}")))?;
        Self::new(params, registry, registry.logger().clone())
    }

    /// [`Constructor`](crate::entity::Constructor) for the registry.
    ///
    /// # Errors
    ///
    /// See [`ExprProcess::new`].
    pub fn construct(
        registry: &Registry,
        params: ConfigMap,
        logger: Logger,
    ) -> Result<Box<dyn Entity>, EntityError> {
        let params = ExprProcessParams::deserialize(Value::Object(params))
            .map_err(|err| EntityError::config(format!("process params: {err}")))?;
        Ok(Box::new(Self::new(params, registry, logger)?))
    }

    #[must_use]
    pub fn formula(&self) -> &str {
        &self.formula
    }

    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    #[must_use]
    pub fn varnames(&self) -> &[String] {
        &self.varnames
    }

    #[must_use]
    pub fn params(&self) -> &IndexMap<String, f64> {
        &self.params
    }

    /// Formula argument names: variables, then parameters.
    pub fn argnames(&self) -> impl Iterator<Item = &str> {
        self.varnames
            .iter()
            .chain(self.params.keys())
            .map(String::as_str)
    }

    /// Response processes in insertion order.
    pub fn responses(&self) -> impl Iterator<Item = (&str, &dyn Process)> {
        self.responses
            .iter()
            .map(|(name, response)| (name.as_str(), response.as_ref()))
    }
}

impl fmt::Display for ExprProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({}, {:?})", self.expr, self.varnames)
    }
}

impl Entity for ExprProcess {
    fn type_name(&self) -> &'static str {
        "ExprProcess"
    }

    fn logger(&self) -> &Logger {
        &self.logger
    }

    fn snapshot(&self, base: bool) -> Result<Snapshot, EntityError> {
        self.logger.debug(format_args!("Snapshot: {self}"));

        let mut snapshot = Snapshot::default()
            .with_metadata("formula", &self.formula)
            .with_metadata("varnames", self.varnames.join(", "));
        for (name, value) in &self.params {
            snapshot = snapshot.with_metadata(format!("param_{name}"), value);
        }
        for (name, response) in &self.responses {
            snapshot = snapshot.with_child(name, response.snapshot(base)?);
        }
        Ok(snapshot)
    }

    fn into_process(self: Box<Self>) -> Option<Box<dyn Process>> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Process for ExprProcess {
    fn dependent_vars(&self) -> BTreeSet<String> {
        let mut vars: BTreeSet<String> = self.varnames.iter().cloned().collect();
        for response in self.responses.values() {
            vars.extend(response.dependent_vars());
        }
        vars
    }

    fn add_response(
        &mut self,
        registry: &Registry,
        name: &str,
        config: ConfigMap,
    ) -> Result<(), EntityError> {
        self.logger
            .debug(format_args!("Adding response {name:?}"));
        check_names([name])?;

        let entity = registry.construct_from_config(&Value::Object(config))?;
        let type_name = entity.type_name();
        let response = entity.into_process().ok_or_else(|| EntityError::NotAProcess {
            name: name.to_owned(),
            type_name,
        })?;

        if self.responses.contains_key(name) {
            self.logger.warn(format_args!(
                "Process {name:?} already exists. Over-writing with {response:?}"
            ));
        }
        self.logger
            .info(format_args!("Added response {name:?}"));
        self.responses.insert(name.to_owned(), response);
        Ok(())
    }

    fn evaluate(
        &self,
        vars: &dyn Variables,
        params: Option<&ParamSet>,
        full: bool,
    ) -> Result<Field, EvalError> {
        let mut args = Vec::with_capacity(self.compiled.arity());
        for name in &self.varnames {
            args.push(
                vars.field(name)
                    .ok_or_else(|| EvalError::MissingVariable { name: name.clone() })?,
            );
        }
        for (name, declared) in &self.params {
            let value = params.and_then(|p| p.get(name)).unwrap_or(*declared);
            args.push(Field::Scalar(value));
        }

        self.logger
            .debug(format_args!("Evaluating {} with {} args", self.expr, args.len()));
        let mut result = self.compiled.eval(&args)?;

        if full {
            for (name, response) in &self.responses {
                self.logger
                    .debug(format_args!("Evaluating response {name}"));
                let overrides = params.and_then(|p| p.response(name));
                let factor = response.evaluate(vars, overrides, true)?;
                result = result.zip_with(factor, |a, b| a * b)?;
            }
        }
        Ok(result)
    }
}
