use std::cmp::Ordering;

use super::{Constrained, Constraint, ConstraintError};

/// Marker type enforcing a plausible sediment porosity: `0.1 < x < 0.9`.
///
/// Both bounds are exclusive.
///
/// # Examples
///
/// ```
/// use microbenthos::support::constraint::Porosity;
///
/// assert_eq!(Porosity::new(0.6).unwrap().into_inner(), 0.6);
/// assert!(Porosity::new(0.1).is_err());
/// assert!(Porosity::new(0.9).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Porosity;

impl Porosity {
    /// Exclusive lower bound.
    pub const MIN: f64 = 0.1;

    /// Exclusive upper bound.
    pub const MAX: f64 = 0.9;

    /// Constructs `Constrained<f64, Porosity>` if `0.1 < value < 0.9`.
    ///
    /// # Errors
    ///
    /// - [`ConstraintError::BelowMinimum`] if less than or equal to 0.1.
    /// - [`ConstraintError::AboveMaximum`] if greater than or equal to 0.9.
    /// - [`ConstraintError::NotANumber`] for `NaN`.
    pub fn new(value: f64) -> Result<Constrained<f64, Porosity>, ConstraintError> {
        Constrained::<f64, Porosity>::new(value)
    }
}

impl Constraint<f64> for Porosity {
    fn check(value: &f64) -> Result<(), ConstraintError> {
        match (value.partial_cmp(&Self::MIN), value.partial_cmp(&Self::MAX)) {
            (None, _) | (_, None) => Err(ConstraintError::NotANumber),
            (Some(Ordering::Less | Ordering::Equal), _) => Err(ConstraintError::BelowMinimum),
            (_, Some(Ordering::Greater | Ordering::Equal)) => Err(ConstraintError::AboveMaximum),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_bounds() {
        assert!(Porosity::new(0.11).is_ok());
        assert!(Porosity::new(0.5).is_ok());
        assert!(Porosity::new(0.89).is_ok());
    }

    #[test]
    fn bounds_are_exclusive() {
        assert_eq!(Porosity::new(0.1), Err(ConstraintError::BelowMinimum));
        assert_eq!(Porosity::new(0.0), Err(ConstraintError::BelowMinimum));
        assert_eq!(Porosity::new(0.9), Err(ConstraintError::AboveMaximum));
        assert_eq!(Porosity::new(1.0), Err(ConstraintError::AboveMaximum));
        assert_eq!(Porosity::new(f64::NAN), Err(ConstraintError::NotANumber));
    }
}
