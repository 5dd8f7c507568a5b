//! Physical units for domain variables.
//!
//! Mesh geometry is expressed with [`uom`] lengths, which catch dimension
//! errors at compile time. Variable units, however, arrive as strings in
//! model definitions (`"mol/l"`, `"1/cm"`, `"umol/cm**3"`), so this module
//! adds a small runtime unit system that parses such strings into a
//! [`Unit`] with an SI scale factor and a dimension vector.
//!
//! A [`Quantity`] pairs a number with a [`Unit`] and converts into any
//! dimensionally compatible unit:
//!
//! ```
//! use microbenthos::support::units::{Quantity, Unit};
//!
//! let q: Quantity = "0.2 mmol/l".parse().unwrap();
//! let molar = Unit::parse("mol/m**3").unwrap();
//! assert!((q.in_units_of(&molar).unwrap() - 0.2).abs() < 1e-12);
//! ```
//!
//! Length quantities bridge back into [`uom`] through [`Quantity::to_length`].

mod error;
mod quantity;
mod unit;

pub use error::UnitError;
pub use quantity::Quantity;
pub use unit::{Dimension, Unit};
