use std::cmp::Ordering;

use num_traits::Zero;

use super::{Constrained, Constraint, ConstraintError};

/// Accepts values greater than zero.
///
/// ```
/// use microbenthos::support::constraint::StrictlyPositive;
///
/// assert!(StrictlyPositive::new(0.1).is_ok());
/// assert!(StrictlyPositive::new(0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictlyPositive;

/// Accepts zero and values greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonNegative;

impl StrictlyPositive {
    /// # Errors
    ///
    /// Returns an error if `value` is zero, negative, or `NaN`.
    pub fn new<T: PartialOrd + Zero>(
        value: T,
    ) -> Result<Constrained<T, Self>, ConstraintError> {
        Constrained::new(value)
    }
}

impl NonNegative {
    /// # Errors
    ///
    /// Returns an error if `value` is negative or `NaN`.
    pub fn new<T: PartialOrd + Zero>(
        value: T,
    ) -> Result<Constrained<T, Self>, ConstraintError> {
        Constrained::new(value)
    }
}

fn sign<T: PartialOrd + Zero>(value: &T) -> Result<Ordering, ConstraintError> {
    value
        .partial_cmp(&T::zero())
        .ok_or(ConstraintError::NotANumber)
}

impl<T: PartialOrd + Zero> Constraint<T> for StrictlyPositive {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match sign(value)? {
            Ordering::Greater => Ok(()),
            Ordering::Equal => Err(ConstraintError::Zero),
            Ordering::Less => Err(ConstraintError::Negative),
        }
    }
}

impl<T: PartialOrd + Zero> Constraint<T> for NonNegative {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match sign(value)? {
            Ordering::Less => Err(ConstraintError::Negative),
            Ordering::Equal | Ordering::Greater => Ok(()),
        }
    }
}
