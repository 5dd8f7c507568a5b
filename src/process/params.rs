use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Parameter overrides for evaluating a process and its responses.
///
/// Parameters missing from an override keep their declared values.
///
/// ```
/// use microbenthos::process::ParamSet;
///
/// let overrides = ParamSet::new()
///     .with_value("Km", 0.002)
///     .with_response("inhibition", ParamSet::new().with_value("Ki", 0.1));
/// assert_eq!(overrides.get("Km"), Some(0.002));
/// assert_eq!(overrides.response("inhibition").and_then(|p| p.get("Ki")), Some(0.1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamSet {
    pub values: IndexMap<String, f64>,
    pub responses: IndexMap<String, ParamSet>,
}

impl ParamSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_response(mut self, name: impl Into<String>, params: ParamSet) -> Self {
        self.responses.insert(name.into(), params);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Overrides for the response named `name`.
    #[must_use]
    pub fn response(&self, name: &str) -> Option<&ParamSet> {
        self.responses.get(name)
    }
}
