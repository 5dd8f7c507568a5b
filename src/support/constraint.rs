//! Checked numeric invariants for mesh geometry and scalar fields.
//!
//! A value wrapped in [`Constrained<T, C>`] has passed the check of the
//! marker `C` exactly once, when it was built. The mesh stores its porosity
//! that way and checks every length before deriving cell counts from it.
//!
//! Markers:
//!
//! - [`StrictlyPositive`]: cell size, sediment length, normal profile scale
//! - [`NonNegative`]: DBL length, which may be zero
//! - [`Porosity`]: sediment porosity, exclusive bounds 0.1 and 0.9

mod porosity;
mod sign;

use std::marker::PhantomData;

use thiserror::Error;

pub use porosity::Porosity;
pub use sign::{NonNegative, StrictlyPositive};

/// A check that a value of type `T` must pass to be wrapped.
pub trait Constraint<T> {
    /// # Errors
    ///
    /// Returns the [`ConstraintError`] describing why `value` is rejected.
    fn check(value: &T) -> Result<(), ConstraintError>;
}

/// Why a value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("value must not be negative")]
    Negative,
    #[error("value must not be zero")]
    Zero,
    #[error("value is not a number")]
    NotANumber,
    #[error("value is at or below the lower bound")]
    BelowMinimum,
    #[error("value is at or above the upper bound")]
    AboveMaximum,
}

/// A value that satisfied the constraint `C` when it was built.
///
/// ```
/// use microbenthos::support::constraint::{Constrained, StrictlyPositive};
/// use uom::si::{f64::Length, length::millimeter};
///
/// let dx = Constrained::<_, StrictlyPositive>::new(Length::new::<millimeter>(0.1)).unwrap();
/// assert!(dx.into_inner().get::<millimeter>() > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Constrained<T, C: Constraint<T>> {
    value: T,
    _marker: PhantomData<C>,
}

impl<T, C: Constraint<T>> Constrained<T, C> {
    /// Checks `value` against `C` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns the error reported by `C::check`.
    pub fn new(value: T) -> Result<Self, ConstraintError> {
        C::check(&value)?;
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Copy, C: Constraint<T>> Constrained<T, C> {
    #[must_use]
    pub fn get(&self) -> T {
        self.value
    }
}
