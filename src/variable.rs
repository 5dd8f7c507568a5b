//! Domain variables configured from model definitions.
//!
//! A [`Variable`] describes how to create a named [`CellVariable`] on the
//! domain, how to seed its initial profile and which boundary values to hold
//! fixed. Nothing touches the domain until [`DomainEntity::setup`]:
//!
//! ```
//! use microbenthos::{
//!     domain::{Geometry, SedimentDbl},
//!     entity::DomainEntity,
//!     support::logging::Logger,
//!     variable::Variable,
//! };
//! use serde_json::json;
//!
//! let domain = SedimentDbl::new(Geometry::default(), 0.6, Logger::noop())
//!     .unwrap()
//!     .into_shared();
//!
//! let mut oxy = Variable::from_json(
//!     &json!({
//!         "name": "oxy",
//!         "create": { "value": 3.3, "unit": "mol/l" },
//!         "constraints": { "top": "0.2e-3 mol/l" },
//!     }),
//!     Logger::noop(),
//! )
//! .unwrap();
//! oxy.set_domain(Some(&domain)).unwrap();
//! oxy.setup().unwrap();
//!
//! let domain = domain.borrow();
//! let values = domain.var("oxy").unwrap().values();
//! assert!((values[0] - 0.2e-3).abs() < 1e-15);
//! assert_eq!(values[1], 3.3);
//! ```
//!
//! [`CellVariable`]: crate::domain::CellVariable

mod seed;
mod spec;

pub use seed::Profile;
pub use spec::{
    CreateSpec, CreateValue, ScalarValue, SeedSpec, VariableParams, check_constraints,
    check_create_params,
};

use std::any::Any;

use indexmap::IndexMap;
use ndarray::Array1;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    domain::{Location, SedimentDbl, SharedDomain},
    entity::{Attachment, ConfigMap, DomainEntity, Entity, EntityError, Registry, Snapshot},
    support::{logging::Logger, units::Unit},
};

/// Pairs of locations that cover the same boundary cell.
const OVERLAPPING_PAIRS: [(Location, Location); 2] = [
    (Location::Top, Location::Dbl),
    (Location::Bottom, Location::Sediment),
];

/// A named domain variable with its creation, seed and boundary settings.
#[derive(Debug)]
pub struct Variable {
    name: String,
    create: CreateSpec,
    constraints: IndexMap<Location, ScalarValue>,
    seed: Option<Profile>,
    created: bool,
    attachment: Attachment,
    logger: Logger,
}

impl Variable {
    /// Builds a variable from validated init parameters.
    ///
    /// # Errors
    ///
    /// Returns an [`EntityError`] if the creation parameters, constraints or seed
    /// profile are invalid.
    pub fn new(params: VariableParams, logger: Logger) -> Result<Self, EntityError> {
        logger.debug(format_args!("Init in Variable for {:?}", params.name));

        let create = check_create_params(&params.create)?;
        let constraints = params
            .constraints
            .as_ref()
            .map(check_constraints)
            .transpose()?
            .unwrap_or_default();
        let seed = params
            .seed
            .as_ref()
            .map(|seed| Profile::from_params(&seed.profile, &seed.params))
            .transpose()?;

        Ok(Self {
            name: params.name,
            create,
            constraints,
            seed,
            created: false,
            attachment: Attachment::new(),
            logger,
        })
    }

    /// Builds a variable from a JSON map of init parameters.
    ///
    /// # Errors
    ///
    /// Returns a config error if the value is not a variable definition, or
    /// any error from [`Variable::new`].
    pub fn from_json(params: &Value, logger: Logger) -> Result<Self, EntityError> {
        let params = VariableParams::deserialize(params)
            .map_err(|err| EntityError::config(format!("variable params: {err}")))?;
        Self::new(params, logger)
    }

    /// [`Constructor`](crate::entity::Constructor) for the registry.
    ///
    /// # Errors
    ///
    /// See [`Variable::from_json`].
    pub fn construct(
        _registry: &Registry,
        params: ConfigMap,
        logger: Logger,
    ) -> Result<Box<dyn Entity>, EntityError> {
        Ok(Box::new(Self::from_json(&Value::Object(params), logger)?))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn create_spec(&self) -> &CreateSpec {
        &self.create
    }

    #[must_use]
    pub fn constraints(&self) -> &IndexMap<Location, ScalarValue> {
        &self.constraints
    }

    #[must_use]
    pub fn seed(&self) -> Option<&Profile> {
        self.seed.as_ref()
    }

    /// Returns `true` once the cell variable exists on the domain.
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// A copy of the current cell values, in the variable's unit.
    ///
    /// # Errors
    ///
    /// Returns a state error if the variable has not been created.
    pub fn values(&self) -> Result<Array1<f64>, EntityError> {
        let shared = self.created_domain()?;
        let domain = shared.borrow();
        Ok(domain.var(&self.name)?.values().to_owned())
    }

    /// Fixes the values at `location`, converting `value` into the variable's unit.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NotCreated`] before setup, or a unit error if
    /// `value` is incompatible with the variable's unit.
    pub fn constrain(&mut self, location: Location, value: &ScalarValue) -> Result<(), EntityError> {
        let shared = self.created_domain()?;
        let mut domain = shared.borrow_mut();
        self.constrain_on(&mut domain, location, value)
    }

    /// Overwrites the values with a seed profile.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NotCreated`] before setup, or any profile error.
    pub fn seed_with(&mut self, profile: &Profile) -> Result<(), EntityError> {
        let shared = self.created_domain()?;
        let mut domain = shared.borrow_mut();
        self.seed_on(&mut domain, profile)
    }

    fn created_domain(&self) -> Result<SharedDomain, EntityError> {
        let domain = self.domain()?;
        if !self.created {
            return Err(EntityError::NotCreated {
                name: self.name.clone(),
            });
        }
        Ok(domain)
    }

    fn seed_on(&self, domain: &mut SedimentDbl, profile: &Profile) -> Result<(), EntityError> {
        let depths = domain.depths().to_owned();
        let var = domain.var_mut(&self.name)?;
        let values = profile.values(var.unit(), depths.view())?;

        self.logger.info(format_args!(
            "Seeding {:?} with profile {}",
            self.name,
            profile.name()
        ));
        var.set_values(values.view())?;
        Ok(())
    }

    fn constrain_on(
        &self,
        domain: &mut SedimentDbl,
        location: Location,
        value: &ScalarValue,
    ) -> Result<(), EntityError> {
        let cells = domain.cells_at(location);
        let var = domain.var_mut(&self.name)?;
        let fixed = value.in_units_of(var.unit())?;

        self.logger.info(format_args!(
            "Constraining {:?} at {location} = {value}",
            self.name
        ));
        var.constrain(location, cells, fixed);
        Ok(())
    }
}

impl Entity for Variable {
    fn type_name(&self) -> &'static str {
        "Variable"
    }

    fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Captures the values (in SI units when `base`) and the constraints.
    fn snapshot(&self, base: bool) -> Result<Snapshot, EntityError> {
        self.logger
            .debug(format_args!("Snapshot: Variable({})", self.name));

        let shared = self.created_domain()?;
        let domain = shared.borrow();
        let var = domain.var(&self.name)?;
        let (values, unit) = if base {
            var.in_base_units()
        } else {
            (var.values().to_owned(), var.unit().clone())
        };

        let snapshot = Snapshot::default().with_data(values.to_vec(), unit.symbol());
        Ok(self
            .constraints
            .iter()
            .fold(snapshot, |snapshot, (location, value)| {
                snapshot.with_metadata(format!("constraint_{location}"), value)
            }))
    }

    fn as_domain_entity(&mut self) -> Option<&mut dyn DomainEntity> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DomainEntity for Variable {
    fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    fn attachment_mut(&mut self) -> &mut Attachment {
        &mut self.attachment
    }

    /// Creates the cell variable, seeds it and applies the constraints in
    /// declaration order.
    ///
    /// Seed and constraint values are resolved against the variable's unit
    /// before anything is registered, so a failed setup leaves the domain
    /// untouched.
    fn setup(&mut self) -> Result<(), EntityError> {
        let shared = self.domain()?;
        {
            let mut domain = shared.borrow_mut();

            self.logger.debug(format_args!(
                "Creating variable {:?} with unit {:?}",
                self.name, self.create.unit
            ));
            let requested = self.create.unit.as_deref().map(Unit::parse).transpose()?;
            let initial = self.create.value.to_initial()?;
            let unit = initial.resolve_unit(requested.clone());

            let seeded = match &self.seed {
                Some(profile) => Some((profile, profile.values(&unit, domain.depths())?)),
                None => None,
            };
            let fixed = self
                .constraints
                .iter()
                .map(|(location, value)| -> Result<_, EntityError> {
                    let cells = domain.cells_at(*location);
                    Ok((*location, value, cells, value.in_units_of(&unit)?))
                })
                .collect::<Result<Vec<_>, EntityError>>()?;

            for (first, second) in OVERLAPPING_PAIRS {
                if self.constraints.contains_key(&first) && self.constraints.contains_key(&second) {
                    self.logger.warn(format_args!(
                        "Constraints for {:?} specified with overlapping pair: ({first}, {second})",
                        self.name
                    ));
                }
            }

            let var = domain.create_var(
                &self.name,
                initial,
                requested,
                self.create.retain_previous,
            )?;

            if let Some((profile, values)) = seeded {
                self.logger.info(format_args!(
                    "Seeding {:?} with profile {}",
                    self.name,
                    profile.name()
                ));
                var.set_values(values.view())?;
                var.update_old();
            }

            for (location, value, cells, converted) in fixed {
                self.logger.info(format_args!(
                    "Constraining {:?} at {location} = {value}",
                    self.name
                ));
                var.constrain(location, cells, converted);
            }
        }

        self.created = true;
        self.attachment.mark_setup();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use serde_json::json;
    use uom::si::{f64::Length, length::millimeter};

    use crate::{
        domain::Geometry,
        error::ErrorKind,
        support::logging::testing::CaptureLog,
    };

    fn shared() -> SharedDomain {
        SedimentDbl::new(Geometry::default(), 0.6, Logger::noop())
            .unwrap()
            .into_shared()
    }

    fn set_up(params: Value, logger: Logger) -> (Variable, SharedDomain) {
        let domain = shared();
        let mut var = Variable::from_json(&params, logger).unwrap();
        var.set_domain(Some(&domain)).unwrap();
        var.setup().unwrap();
        (var, domain)
    }

    #[test]
    fn creates_variable_on_domain() {
        for (value, unit, has_old) in [
            (json!(3), Some("mol/l"), false),
            (json!(3.0), Some("mol/l"), true),
            (json!(2.3), None, false),
        ] {
            let (var, domain) = set_up(
                json!({ "name": "myVar", "create": { "value": value, "unit": unit, "hasOld": has_old } }),
                Logger::noop(),
            );
            assert!(var.is_setup());
            assert!(var.is_created());

            let domain = domain.borrow();
            let cells = domain.var("myVar").unwrap();
            assert_eq!(cells.len(), domain.cell_count());
            assert_eq!(cells.retains_previous(), has_old);
            assert_eq!(cells.unit().symbol(), unit.unwrap_or("1"));
            let expected = value.as_f64().unwrap();
            assert!(cells.values().iter().all(|&v| v == expected));
        }
    }

    #[test]
    fn oxygen_top_boundary() {
        let (var, domain) = set_up(
            json!({
                "name": "oxy",
                "create": { "value": 3.3, "unit": "mol/l" },
                "constraints": { "top": "0.2e-3 mol/l" },
            }),
            Logger::noop(),
        );

        let values = var.values().unwrap();
        assert_relative_eq!(values[0], 0.2e-3, max_relative = 1e-12);
        assert!(values.iter().skip(1).all(|&v| v == 3.3));

        let domain = domain.borrow();
        assert!(domain.var("oxy").unwrap().is_fixed(0));
    }

    #[test]
    fn constraints_cover_their_locations() {
        let (var, domain) = set_up(
            json!({
                "name": "h2s",
                "create": { "value": 1.0, "unit": "mmol/l" },
                "constraints": { "dbl": "0.4 mmol/l", "bottom": 0.8 },
            }),
            Logger::noop(),
        );
        let values = var.values().unwrap();
        let domain = domain.borrow();
        let surface = domain.surface_index();
        let n = domain.cell_count();

        assert!(values.iter().take(surface).all(|&v| (v - 0.4).abs() < 1e-12));
        assert!(values.iter().skip(surface).take(n - surface - 1).all(|&v| v == 1.0));
        assert_eq!(values[n - 1], 0.8);
    }

    #[test]
    fn later_constraints_win_and_pairs_warn() {
        let (logger, capture) = CaptureLog::logger();
        let (var, _domain) = set_up(
            json!({
                "name": "oxy",
                "create": { "value": 0.0, "unit": "mol/l" },
                "constraints": { "dbl": 1.0, "top": 2.0 },
            }),
            logger,
        );

        let values = var.values().unwrap();
        assert_eq!(values[0], 2.0);
        assert_eq!(values[1], 1.0);
        assert_eq!(capture.messages(log::Level::Warn).len(), 1);
    }

    #[test]
    fn linear_seed_then_constraints() {
        let domain = SedimentDbl::new(
            Geometry {
                dbl_length: Length::new::<millimeter>(0.0),
                sediment_length: Length::new::<millimeter>(1.0),
                ..Geometry::default()
            },
            0.6,
            Logger::noop(),
        )
        .unwrap()
        .into_shared();
        assert_eq!(domain.borrow().cell_count(), 10);

        let mut var = Variable::from_json(
            &json!({
                "name": "temp",
                "create": { "value": 0.0, "hasOld": true },
                "seed": { "profile": "linear", "params": { "start": 0, "stop": 10 } },
            }),
            Logger::noop(),
        )
        .unwrap();
        var.set_domain(Some(&domain)).unwrap();
        var.setup().unwrap();

        let values = var.values().unwrap();
        assert_eq!(values[0], 0.0);
        assert_eq!(values[9], 10.0);
        assert!(values.windows(2).into_iter().all(|w| w[1] > w[0]));

        let domain = domain.borrow();
        assert_eq!(domain.var("temp").unwrap().old().unwrap(), values);
    }

    #[test]
    fn normal_seed_checks_coeff_unit() {
        let params = |coeff: &str| {
            json!({
                "name": "biomass",
                "create": { "value": 0.0, "unit": "mg/cm**3" },
                "seed": { "profile": "normal", "params": { "loc": "1 mm", "scale": "1 mm", "coeff": coeff } },
            })
        };

        let (var, domain) = set_up(params("12 mg/cm**3"), Logger::noop());
        let values = var.values().unwrap();
        let peak = domain
            .borrow()
            .depths()
            .iter()
            .position(|&z| (z - 1e-3).abs() < 1e-9)
            .unwrap();
        assert_relative_eq!(values[peak], 12.0, max_relative = 1e-9);

        let domain = shared();
        let mut bad = Variable::from_json(&params("12 mol/l"), Logger::noop()).unwrap();
        bad.set_domain(Some(&domain)).unwrap();
        assert_eq!(bad.setup().unwrap_err().kind(), ErrorKind::Unit);
        assert!(!bad.is_setup());
    }

    #[test]
    fn failed_setup_registers_nothing() {
        let domain = shared();
        let mut var = Variable::from_json(
            &json!({
                "name": "biomass",
                "create": { "value": 0.0, "unit": "mg/cm**3" },
                "seed": { "profile": "normal", "params": { "loc": "1 mm", "scale": "1 mm", "coeff": "12 mol/l" } },
            }),
            Logger::noop(),
        )
        .unwrap();
        var.set_domain(Some(&domain)).unwrap();

        for _ in 0..2 {
            let err = var.setup().unwrap_err();
            assert!(matches!(err, EntityError::Unit(_)), "{err:?}");
            assert!(!domain.borrow().contains("biomass"));
            assert!(!var.is_created());
        }
    }

    #[test]
    fn incompatible_constraint_fails_setup() {
        let domain = shared();
        let mut var = Variable::from_json(
            &json!({
                "name": "oxy",
                "create": { "value": 3.3, "unit": "mol/l" },
                "constraints": { "bottom": 0.1, "top": "3 s" },
            }),
            Logger::noop(),
        )
        .unwrap();
        var.set_domain(Some(&domain)).unwrap();

        assert_eq!(var.setup().unwrap_err().kind(), ErrorKind::Unit);
        assert!(!var.is_setup());
        assert!(!domain.borrow().contains("oxy"));
    }

    #[test]
    fn construction_validates_params() {
        for (params, kind) in [
            (json!({ "create": { "value": 1 } }), ErrorKind::Config),
            (json!({ "name": "a", "create": { "value": 1, "name": "b" } }), ErrorKind::Config),
            (json!({ "name": "a", "create": { "value": 1, "unit": "junk" } }), ErrorKind::Unit),
            (json!({ "name": "a", "create": { "value": 1 }, "constraints": { "middle": 1 } }), ErrorKind::Validation),
            (json!({ "name": "a", "create": { "value": 1 }, "constraints": { "top": [3, 4] } }), ErrorKind::Validation),
            (json!({ "name": "a", "create": { "value": 1 }, "seed": { "profile": "cubic" } }), ErrorKind::Validation),
            (json!({ "name": "a", "create": { "value": 1 }, "seed": { "profile": "normal", "params": { "loc": 0 } } }), ErrorKind::Config),
        ] {
            let err = Variable::from_json(&params, Logger::noop()).unwrap_err();
            assert_eq!(err.kind(), kind, "{params}");
        }
    }

    #[test]
    fn lifecycle_errors_are_state_errors() {
        let mut var = Variable::from_json(
            &json!({ "name": "oxy", "create": { "value": 1.0 } }),
            Logger::noop(),
        )
        .unwrap();

        assert_eq!(var.setup().unwrap_err(), EntityError::NotAttached);
        assert_eq!(var.snapshot(false).unwrap_err().kind(), ErrorKind::State);

        let domain = shared();
        var.set_domain(Some(&domain)).unwrap();
        let err = var.constrain(Location::Top, &ScalarValue::Number(1.0)).unwrap_err();
        assert_eq!(err, EntityError::NotCreated { name: "oxy".into() });

        var.setup().unwrap();
        var.constrain(Location::Bottom, &ScalarValue::Number(0.5)).unwrap();
        assert_eq!(var.values().unwrap()[domain.borrow().cell_count() - 1], 0.5);

        let duplicate = Variable::from_json(
            &json!({ "name": "oxy", "create": { "value": 2.0 } }),
            Logger::noop(),
        );
        let mut duplicate = duplicate.unwrap();
        duplicate.set_domain(Some(&domain)).unwrap();
        assert_eq!(duplicate.setup().unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn snapshot_reports_values_and_constraints() {
        let (var, _domain) = set_up(
            json!({
                "name": "oxy",
                "create": { "value": 3.3, "unit": "mmol/l" },
                "constraints": { "top": "0.2 mmol/l", "bottom": 0 },
            }),
            Logger::noop(),
        );

        let local = var.snapshot(false).unwrap();
        let data = local.data.unwrap();
        assert_eq!(data.unit, "mmol/l");
        assert_relative_eq!(data.values[0], 0.2, max_relative = 1e-12);
        assert_eq!(local.metadata["constraint_top"], "0.2 mmol/l");
        assert_eq!(local.metadata["constraint_bottom"], "0");

        let base = var.snapshot(true).unwrap().data.unwrap();
        assert_eq!(base.unit, "mol/m**3");
        assert_relative_eq!(base.values[1], 3.3, max_relative = 1e-12);
    }

    #[test]
    fn builds_through_the_registry() {
        let registry = Registry::new();
        let mut entity = registry
            .construct_from_config(&json!({
                "cls": "microbenthos.Variable",
                "init_params": { "name": "oxy", "create": { "value": 1.0 } },
            }))
            .unwrap();
        assert!(entity.downcast_ref::<Variable>().is_some());

        let domain = shared();
        let var = entity.as_domain_entity().unwrap();
        var.set_domain(Some(&domain)).unwrap();
        var.setup().unwrap();
        assert!(domain.borrow().contains("oxy"));
        assert!(entity.into_process().is_none());
    }
}
