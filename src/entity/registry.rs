use std::{collections::HashMap, fmt};

use serde_json::Value;

use crate::{process::ExprProcess, support::logging::Logger, variable::Variable};

use super::{ConfigMap, Entity, EntityError};

/// Namespace used for type paths without a dot.
pub const DEFAULT_NAMESPACE: &str = "microbenthos";

/// Builds an entity from its `init_params`.
///
/// The registry is passed along so that entities can build sub-entities.
pub type Constructor = fn(&Registry, ConfigMap, Logger) -> Result<Box<dyn Entity>, EntityError>;

/// A table of entity constructors keyed by namespace and type name.
///
/// [`Registry::new`] is pre-loaded with the built-in `Variable` and
/// `ExprProcess` types under [`DEFAULT_NAMESPACE`].
#[derive(Clone)]
pub struct Registry {
    constructors: HashMap<(String, String), Constructor>,
    logger: Logger,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFAULT_NAMESPACE, "Variable", Variable::construct);
        registry.register(DEFAULT_NAMESPACE, "ExprProcess", ExprProcess::construct);
        registry
    }

    /// A registry with no types registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
            logger: Logger::noop(),
        }
    }

    /// Hands `logger` to every entity this registry constructs.
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Registers a constructor, returning the one it replaces.
    pub fn register(
        &mut self,
        namespace: &str,
        name: &str,
        constructor: Constructor,
    ) -> Option<Constructor> {
        self.constructors
            .insert((namespace.to_owned(), name.to_owned()), constructor)
    }

    /// Resolves a type path such as `"Variable"` or `"microbenthos.ExprProcess"`.
    ///
    /// A dotted path splits at its last dot into namespace and type name; a
    /// bare name is looked up in [`DEFAULT_NAMESPACE`].
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::Lookup`] if nothing is registered for the path.
    pub fn resolve(&self, path: &str) -> Result<Constructor, EntityError> {
        let (namespace, name) = path.rsplit_once('.').unwrap_or((DEFAULT_NAMESPACE, path));
        self.constructors
            .get(&(namespace.to_owned(), name.to_owned()))
            .copied()
            .ok_or_else(|| EntityError::Lookup {
                path: path.to_owned(),
            })
    }

    /// Constructs an entity of type `path`, then runs its post-init hook.
    ///
    /// # Errors
    ///
    /// Returns an [`EntityError`] if the path does not resolve or the entity
    /// rejects its parameters.
    pub fn construct_from_spec(
        &self,
        path: &str,
        init_params: ConfigMap,
        post_params: ConfigMap,
    ) -> Result<Box<dyn Entity>, EntityError> {
        self.logger
            .debug(format_args!("Setting up entity from cls: {path}"));
        let constructor = self.resolve(path)?;

        let mut entity = constructor(self, init_params, self.logger.clone())?;
        entity.post_init(post_params)?;

        self.logger
            .debug(format_args!("Created entity: {entity:?}"));
        Ok(entity)
    }

    /// Constructs an entity from a `{cls, init_params?, post_params?}` map.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::MissingKey`] without `cls`, a config error if
    /// the config or either params value is not a map, and otherwise any error
    /// from [`construct_from_spec`](Registry::construct_from_spec).
    pub fn construct_from_config(&self, config: &Value) -> Result<Box<dyn Entity>, EntityError> {
        let Value::Object(config) = config else {
            return Err(EntityError::config(format!(
                "entity config should be a map, not {config}"
            )));
        };

        let cls = config
            .get("cls")
            .ok_or(EntityError::MissingKey { key: "cls" })?
            .as_str()
            .ok_or_else(|| EntityError::config("cls should be a type path string"))?;

        let init_params = params_at(config, "init_params")?;
        let post_params = params_at(config, "post_params")?;

        self.construct_from_spec(cls, init_params, post_params)
    }
}

fn params_at(config: &ConfigMap, key: &str) -> Result<ConfigMap, EntityError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(ConfigMap::new()),
        Some(Value::Object(params)) => Ok(params.clone()),
        Some(other) => Err(EntityError::config(format!(
            "{key} should be a map, not {other}"
        ))),
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<_> = self
            .constructors
            .keys()
            .map(|(namespace, name)| format!("{namespace}.{name}"))
            .collect();
        paths.sort();
        f.debug_struct("Registry")
            .field("types", &paths)
            .field("logger", &self.logger)
            .finish()
    }
}
