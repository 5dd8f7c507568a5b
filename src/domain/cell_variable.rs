use std::ops::Range;

use ndarray::{Array1, ArrayView1, ArrayViewMut1, s};

use crate::support::units::{Quantity, Unit};

use super::{DomainError, Location};

/// The value used to initialize a [`CellVariable`].
///
/// Scalars and length-1 arrays are broadcast over every cell.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialValue {
    /// A number in the variable's unit.
    Scalar(f64),
    /// A number carrying its own unit, which becomes the variable's unit.
    Quantity(Quantity),
    /// One value per cell.
    Cells(Array1<f64>),
}

impl InitialValue {
    /// The unit of a variable created from this value with `requested` unit.
    ///
    /// A quantity with a dimension keeps its own unit; otherwise `requested`
    /// is used, defaulting to dimensionless.
    #[must_use]
    pub fn resolve_unit(&self, requested: Option<Unit>) -> Unit {
        match self {
            Self::Quantity(q) if !q.unit.is_dimensionless() => q.unit.clone(),
            _ => requested.unwrap_or_else(Unit::dimensionless),
        }
    }
}

impl From<f64> for InitialValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Quantity> for InitialValue {
    fn from(value: Quantity) -> Self {
        Self::Quantity(value)
    }
}

impl From<Array1<f64>> for InitialValue {
    fn from(value: Array1<f64>) -> Self {
        Self::Cells(value)
    }
}

impl From<Vec<f64>> for InitialValue {
    fn from(value: Vec<f64>) -> Self {
        Self::Cells(Array1::from(value))
    }
}

/// A value held fixed on a range of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedBoundary {
    pub location: Location,
    pub cells: Range<usize>,
    /// The fixed value, in the variable's unit.
    pub value: f64,
}

/// A per-cell numeric field registered by name in a domain.
///
/// Values are stored in the variable's own [`Unit`]. Cells covered by a
/// [`FixedBoundary`] keep their fixed value across [`set_values`] calls.
///
/// [`set_values`]: CellVariable::set_values
#[derive(Debug, Clone)]
pub struct CellVariable {
    name: String,
    unit: Unit,
    values: Array1<f64>,
    old: Option<Array1<f64>>,
    fixed: Vec<FixedBoundary>,
}

impl CellVariable {
    pub(super) fn new(name: String, unit: Unit, values: Array1<f64>, retain_previous: bool) -> Self {
        let old = retain_previous.then(|| values.clone());
        Self {
            name,
            unit,
            values,
            old,
            fixed: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    #[must_use]
    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values from the previous step, if this variable retains them.
    #[must_use]
    pub fn old(&self) -> Option<ArrayView1<'_, f64>> {
        self.old.as_ref().map(Array1::view)
    }

    #[must_use]
    pub fn retains_previous(&self) -> bool {
        self.old.is_some()
    }

    /// Copies the current values into the previous-step slot.
    ///
    /// Does nothing for variables that do not retain previous values.
    pub fn update_old(&mut self) {
        if let Some(old) = self.old.as_mut() {
            old.assign(&self.values);
        }
    }

    /// Replaces the free values and re-applies every fixed boundary.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::ShapeMismatch`] if `values` does not hold one
    /// value per cell.
    pub fn set_values(&mut self, values: ArrayView1<'_, f64>) -> Result<(), DomainError> {
        if values.len() != self.values.len() {
            return Err(DomainError::ShapeMismatch {
                name: self.name.clone(),
                expected: self.values.len(),
                found: values.len(),
            });
        }
        self.values.assign(&values);
        self.apply_fixed();
        Ok(())
    }

    /// Fixes `cells` to `value` (in this variable's unit).
    ///
    /// A later constraint on the same location replaces the earlier one.
    /// Constraints on overlapping cells are applied in the order they were
    /// added, so the most recent one wins.
    pub fn constrain(&mut self, location: Location, cells: Range<usize>, value: f64) {
        self.fixed.retain(|f| f.location != location);
        self.fixed.push(FixedBoundary {
            location,
            cells,
            value,
        });
        self.apply_fixed();
    }

    #[must_use]
    pub fn fixed(&self) -> &[FixedBoundary] {
        &self.fixed
    }

    /// Returns `true` if cell `index` is held by a fixed boundary.
    #[must_use]
    pub fn is_fixed(&self, index: usize) -> bool {
        self.fixed.iter().any(|f| f.cells.contains(&index))
    }

    /// Returns the values converted to SI base units, with the base unit.
    #[must_use]
    pub fn in_base_units(&self) -> (Array1<f64>, Unit) {
        let scale = self.unit.scale();
        (self.values.mapv(|v| v * scale), self.unit.to_base())
    }

    pub(super) fn values_mut(&mut self) -> ArrayViewMut1<'_, f64> {
        self.values.view_mut()
    }

    fn apply_fixed(&mut self) {
        for f in &self.fixed {
            self.values.slice_mut(s![f.cells.clone()]).fill(f.value);
        }
    }
}
