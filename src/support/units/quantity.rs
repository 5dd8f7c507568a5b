use std::{fmt, str::FromStr};

use uom::si::{f64::Length, length::meter};

use super::{Unit, UnitError};

/// A number paired with a [`Unit`].
///
/// Parses from text of the form `"<number> <unit>"`, e.g. `"0.2e-3 mol/l"` or
/// `"35 s"`. A bare number is dimensionless.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    #[must_use]
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Returns the value expressed in `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Incompatible`] if the dimensions differ.
    pub fn in_units_of(&self, unit: &Unit) -> Result<f64, UnitError> {
        Ok(self.value * self.unit.factor_to(unit)?)
    }

    /// Returns the value in SI base units.
    #[must_use]
    pub fn to_si(&self) -> f64 {
        self.value * self.unit.scale()
    }

    /// Converts into a [`uom`] length.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Incompatible`] if this quantity is not a length.
    pub fn to_length(&self) -> Result<Length, UnitError> {
        Ok(Length::new::<meter>(self.in_units_of(&Unit::meter())?))
    }
}

impl From<Length> for Quantity {
    fn from(length: Length) -> Self {
        Self::new(length.get::<meter>(), Unit::meter())
    }
}

impl FromStr for Quantity {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let (number, unit) = match text.find(char::is_whitespace) {
            Some(idx) => (&text[..idx], &text[idx..]),
            None => (text, ""),
        };

        let value: f64 = number.parse().map_err(|_| UnitError::Quantity {
            text: text.to_owned(),
        })?;

        Ok(Self::new(value, Unit::parse(unit)?))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_dimensionless() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::length::millimeter;

    #[test]
    fn parses_value_and_unit() {
        let q: Quantity = "0.2e-3 mol/l".parse().unwrap();
        assert_relative_eq!(q.value, 0.2e-3, max_relative = 1e-12);
        assert_eq!(q.unit.symbol(), "mol/l");
        assert_relative_eq!(q.to_si(), 0.2, max_relative = 1e-12);
    }

    #[test]
    fn bare_numbers_are_dimensionless() {
        let q: Quantity = "42".parse().unwrap();
        assert!(q.unit.is_dimensionless());
        assert_eq!(q.to_string(), "42");
    }

    #[test]
    fn rejects_non_numeric_text() {
        assert!(matches!(
            "high mol/l".parse::<Quantity>(),
            Err(UnitError::Quantity { .. })
        ));
        assert!(matches!(
            "3 bananas".parse::<Quantity>(),
            Err(UnitError::Parse { .. })
        ));
    }

    #[test]
    fn bridges_to_uom_lengths() {
        let q: Quantity = "100 um".parse().unwrap();
        assert_relative_eq!(q.to_length().unwrap().get::<millimeter>(), 0.1, max_relative = 1e-12);

        let back = Quantity::from(Length::new::<millimeter>(2.0));
        assert_relative_eq!(back.in_units_of(&Unit::parse("mm").unwrap()).unwrap(), 2.0, max_relative = 1e-12);

        let time: Quantity = "35 s".parse().unwrap();
        assert!(matches!(
            time.to_length(),
            Err(UnitError::Incompatible { .. })
        ));
    }
}
