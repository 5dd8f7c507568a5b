use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::domain::{SedimentDbl, SharedDomain};

use super::{Entity, EntityError};

/// Tracks the domain an entity is attached to and whether it is set up.
///
/// The domain is held weakly. Once attached it can never be replaced.
#[derive(Debug, Clone, Default)]
pub struct Attachment {
    domain: Option<Weak<RefCell<SedimentDbl>>>,
    setup: bool,
}

impl Attachment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches to `domain`.
    ///
    /// Returns `Ok(true)` when a domain was attached and `Ok(false)` when
    /// `domain` is `None`, which leaves the attachment untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::AlreadyAttached`] if a domain was attached before.
    pub fn attach(&mut self, domain: Option<&SharedDomain>) -> Result<bool, EntityError> {
        let Some(domain) = domain else {
            return Ok(false);
        };
        if self.domain.is_some() {
            return Err(EntityError::AlreadyAttached);
        }
        self.domain = Some(Rc::downgrade(domain));
        Ok(true)
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.domain.is_some()
    }

    /// Returns the attached domain.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NotAttached`] if no domain was attached, or
    /// [`EntityError::DomainDropped`] if it no longer exists.
    pub fn domain(&self) -> Result<SharedDomain, EntityError> {
        self.domain
            .as_ref()
            .ok_or(EntityError::NotAttached)?
            .upgrade()
            .ok_or(EntityError::DomainDropped)
    }

    pub fn mark_setup(&mut self) {
        self.setup = true;
    }

    #[must_use]
    pub fn is_setup(&self) -> bool {
        self.setup
    }
}

/// An entity that lives on the model domain.
pub trait DomainEntity: Entity {
    fn attachment(&self) -> &Attachment;

    fn attachment_mut(&mut self) -> &mut Attachment;

    /// Attaches the entity to `domain`; `None` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::AlreadyAttached`] on a second attach, or any
    /// error from [`on_domain_set`](DomainEntity::on_domain_set).
    fn set_domain(&mut self, domain: Option<&SharedDomain>) -> Result<(), EntityError> {
        if self.attachment_mut().attach(domain)? {
            self.logger()
                .debug(format_args!("Added {} to domain", self.type_name()));
            self.on_domain_set()?;
        }
        Ok(())
    }

    /// Hook run once right after a domain is attached.
    ///
    /// # Errors
    ///
    /// Implementations return an [`EntityError`] if sub-entities fail to attach.
    fn on_domain_set(&mut self) -> Result<(), EntityError> {
        Ok(())
    }

    fn has_domain(&self) -> bool {
        self.attachment().is_attached()
    }

    /// Returns the attached domain.
    ///
    /// # Errors
    ///
    /// Returns a state error if the entity is not attached or the domain has
    /// been dropped.
    fn domain(&self) -> Result<SharedDomain, EntityError> {
        self.attachment().domain()
    }

    /// Prepares the entity on its domain.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NotAttached`] if no domain is attached.
    fn setup(&mut self) -> Result<(), EntityError> {
        self.domain()?;
        self.logger()
            .debug(format_args!("Setup empty: {}", self.type_name()));
        self.attachment_mut().mark_setup();
        Ok(())
    }

    fn is_setup(&self) -> bool {
        self.attachment().is_setup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::any::Any;

    use crate::{
        domain::Geometry,
        entity::Snapshot,
        error::ErrorKind,
        support::logging::{Logger, testing::CaptureLog},
    };

    #[derive(Debug, Default)]
    struct Probe {
        attachment: Attachment,
        logger: Logger,
        domain_sets: usize,
    }

    impl Entity for Probe {
        fn type_name(&self) -> &'static str {
            "Probe"
        }

        fn logger(&self) -> &Logger {
            &self.logger
        }

        fn snapshot(&self, _base: bool) -> Result<Snapshot, EntityError> {
            Ok(Snapshot::default())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl DomainEntity for Probe {
        fn attachment(&self) -> &Attachment {
            &self.attachment
        }

        fn attachment_mut(&mut self) -> &mut Attachment {
            &mut self.attachment
        }

        fn on_domain_set(&mut self) -> Result<(), EntityError> {
            self.domain_sets += 1;
            Ok(())
        }
    }

    fn shared() -> SharedDomain {
        SedimentDbl::new(Geometry::default(), 0.6, Logger::noop())
            .unwrap()
            .into_shared()
    }

    #[test]
    fn attaches_once() {
        let domain = shared();
        let mut probe = Probe::default();

        probe.set_domain(Some(&domain)).unwrap();
        assert!(probe.has_domain());
        assert!(Rc::ptr_eq(&probe.domain().unwrap(), &domain));
        assert_eq!(probe.domain_sets, 1);

        let again = probe.set_domain(Some(&shared())).unwrap_err();
        assert_eq!(again, EntityError::AlreadyAttached);
        assert_eq!(again.kind(), ErrorKind::State);
        assert!(Rc::ptr_eq(&probe.domain().unwrap(), &domain));
    }

    #[test]
    fn attaching_none_is_a_no_op() {
        let domain = shared();
        let mut probe = Probe::default();

        probe.set_domain(None).unwrap();
        assert!(!probe.has_domain());

        probe.set_domain(Some(&domain)).unwrap();
        probe.set_domain(None).unwrap();
        assert!(probe.has_domain());
        assert_eq!(probe.domain_sets, 1);
    }

    #[test]
    fn setup_requires_a_domain() {
        let (logger, capture) = CaptureLog::logger();
        let mut probe = Probe {
            logger,
            ..Probe::default()
        };
        assert_eq!(probe.setup().unwrap_err(), EntityError::NotAttached);
        assert!(!probe.is_setup());

        let domain = shared();
        probe.set_domain(Some(&domain)).unwrap();
        probe.setup().unwrap();
        assert!(probe.is_setup());
        assert_eq!(capture.messages(log::Level::Debug).len(), 2);
    }

    #[test]
    fn dropped_domain_is_a_state_error() {
        let mut probe = Probe::default();
        probe.set_domain(Some(&shared())).unwrap();

        let err = probe.domain().unwrap_err();
        assert_eq!(err, EntityError::DomainDropped);
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn default_hooks_log_and_succeed() {
        let (logger, capture) = CaptureLog::logger();
        let mut probe = Probe {
            logger,
            ..Probe::default()
        };
        probe.update_time(3.5);
        probe.post_init(crate::entity::ConfigMap::new()).unwrap();
        assert_eq!(
            capture.messages(log::Level::Debug),
            ["Updating Probe for clocktime 3.5"]
        );
    }
}
