//! Model entities and their construction from configuration.
//!
//! Every model component is an [`Entity`]. Entities that live on the mesh
//! are also [`DomainEntity`]s: they are attached to a [`SharedDomain`] once,
//! then set up. Entities are built by type path through a [`Registry`]:
//!
//! ```
//! use microbenthos::entity::Registry;
//! use serde_json::json;
//!
//! let registry = Registry::new();
//! let process = registry
//!     .construct_from_config(&json!({
//!         "cls": "ExprProcess",
//!         "init_params": { "formula": "k * oxy", "varnames": ["oxy"], "params": { "k": 0.5 } },
//!     }))
//!     .unwrap();
//! assert_eq!(process.type_name(), "ExprProcess");
//! ```
//!
//! [`SharedDomain`]: crate::domain::SharedDomain

mod attachment;
mod error;
mod registry;
mod snapshot;

pub use attachment::{Attachment, DomainEntity};
pub use error::EntityError;
pub use registry::{Constructor, DEFAULT_NAMESPACE, Registry};
pub use snapshot::{Snapshot, SnapshotData};

use std::{any::Any, fmt};

use crate::{process::Process, support::logging::Logger};

/// Keyword parameters handed to entity constructors and hooks.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// A model component.
pub trait Entity: fmt::Debug {
    /// The registered type name, such as `"Variable"`.
    fn type_name(&self) -> &'static str;

    fn logger(&self) -> &Logger;

    /// Finishes initialization after construction.
    ///
    /// Called by the [`Registry`] with the `post_params` of a config. The
    /// default does nothing.
    ///
    /// # Errors
    ///
    /// Implementations return an [`EntityError`] for unusable parameters.
    fn post_init(&mut self, params: ConfigMap) -> Result<(), EntityError> {
        if !params.is_empty() {
            self.logger().debug(format_args!(
                "Empty post_init on {} ignores {} params",
                self.type_name(),
                params.len()
            ));
        }
        Ok(())
    }

    /// Updates the entity for the simulation clock time.
    fn update_time(&mut self, clocktime: f64) {
        self.logger().debug(format_args!(
            "Updating {} for clocktime {clocktime}",
            self.type_name()
        ));
    }

    /// Captures the entity's state, converting data to SI units when `base`.
    ///
    /// # Errors
    ///
    /// Returns an [`EntityError`] if the entity has no state to capture yet.
    fn snapshot(&self, base: bool) -> Result<Snapshot, EntityError>;

    /// Converts into a [`Process`], or `None` if this entity is not one.
    fn into_process(self: Box<Self>) -> Option<Box<dyn Process>> {
        None
    }

    /// Views this entity as a [`DomainEntity`], if it is one.
    fn as_domain_entity(&mut self) -> Option<&mut dyn DomainEntity> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

impl dyn Entity {
    /// Returns the concrete entity if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Entity + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}
