//! The 1-D sediment + diffusive boundary layer (DBL) domain.
//!
//! A [`SedimentDbl`] owns the mesh geometry, a registry of named
//! [`CellVariable`]s and the porosity field. Cells are indexed from the top
//! of the DBL downwards; the DBL occupies `0..surface_index()` and the
//! sediment occupies `surface_index()..cell_count()`.
//!
//! The domain is shared by every entity attached to it, so drivers usually
//! wrap it in a [`SharedDomain`]:
//!
//! ```
//! use microbenthos::domain::{Geometry, SedimentDbl};
//! use microbenthos::support::logging::Logger;
//!
//! let domain = SedimentDbl::new(Geometry::default(), 0.6, Logger::noop()).unwrap();
//! assert_eq!(domain.sediment_cells(), 100);
//! assert_eq!(domain.dbl_cells(), 10);
//! assert_eq!(domain.surface_index(), 10);
//! let shared = domain.into_shared();
//! ```

mod cell_variable;
mod config;
mod error;
mod location;

pub use cell_variable::{CellVariable, FixedBoundary, InitialValue};
pub use config::{DomainConfig, LengthSpec};
pub use error::DomainError;
pub use location::Location;

use std::{cell::RefCell, fmt, ops::Range, rc::Rc};

use indexmap::IndexMap;
use ndarray::{Array1, ArrayView1, s};
use uom::si::{
    f64::Length,
    length::{meter, millimeter},
};

use crate::support::{
    constraint::{Constrained, NonNegative, Porosity, StrictlyPositive},
    logging::Logger,
    units::Unit,
};

/// A domain shared by the entities attached to it.
pub type SharedDomain = Rc<RefCell<SedimentDbl>>;

/// Name under which the porosity field is registered.
pub const POROSITY: &str = "porosity";

/// Minimum number of cells in the sediment column.
pub const MIN_SEDIMENT_CELLS: usize = 10;

/// Requested mesh dimensions, before truncation to whole cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub cell_size: Length,
    pub sediment_length: Length,
    pub dbl_length: Length,
}

impl Default for Geometry {
    /// 100 µm cells, a 1 cm sediment column and a 1 mm DBL.
    fn default() -> Self {
        Self {
            cell_size: Length::new::<millimeter>(0.1),
            sediment_length: Length::new::<millimeter>(10.0),
            dbl_length: Length::new::<millimeter>(1.0),
        }
    }
}

/// A sediment column of at least ten cells topped by an optional DBL.
#[derive(Debug)]
pub struct SedimentDbl {
    cell_size: Length,
    sediment_length: Length,
    dbl_length: Length,
    sediment_cells: usize,
    dbl_cells: usize,
    cell_centers: Array1<f64>,
    depths: Array1<f64>,
    distances: Array1<f64>,
    sediment_porosity: Constrained<f64, Porosity>,
    vars: IndexMap<String, CellVariable>,
    logger: Logger,
}

impl SedimentDbl {
    /// Builds the mesh and sets the sediment porosity.
    ///
    /// Lengths are truncated to a whole number of cells, then re-derived so
    /// that every length is an exact multiple of the cell size.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the cell size is not strictly positive,
    /// the sediment length is not strictly positive, the DBL length is
    /// negative, the sediment holds fewer than [`MIN_SEDIMENT_CELLS`] cells, or
    /// the porosity is outside (0.1, 0.9).
    pub fn new(geometry: Geometry, porosity: f64, logger: Logger) -> Result<Self, DomainError> {
        let cell_size = StrictlyPositive::new(geometry.cell_size)
            .map_err(|source| DomainError::Geometry {
                quantity: "cell size",
                source,
            })?
            .into_inner();
        let sediment_length = StrictlyPositive::new(geometry.sediment_length)
            .map_err(|source| DomainError::Geometry {
                quantity: "sediment length",
                source,
            })?
            .into_inner();
        let dbl_length = NonNegative::new(geometry.dbl_length)
            .map_err(|source| DomainError::Geometry {
                quantity: "DBL length",
                source,
            })?
            .into_inner();
        let sediment_porosity = Porosity::new(porosity)
            .map_err(|source| DomainError::Porosity {
                value: porosity,
                source,
            })?;

        let sediment_cells = whole_cells(sediment_length, cell_size);
        if sediment_cells < MIN_SEDIMENT_CELLS {
            return Err(DomainError::SedimentTooShort {
                cells: sediment_cells,
                min: MIN_SEDIMENT_CELLS,
            });
        }
        let dbl_cells = whole_cells(dbl_length, cell_size);

        #[allow(clippy::cast_precision_loss)]
        let (sediment_length, dbl_length) = (
            cell_size * sediment_cells as f64,
            cell_size * dbl_cells as f64,
        );

        let n = sediment_cells + dbl_cells;
        let dx = cell_size.get::<meter>();
        #[allow(clippy::cast_precision_loss)]
        let cell_centers = Array1::from_shape_fn(n, |i| (i as f64 + 0.5) * dx);
        let surface = cell_centers[dbl_cells];
        let depths = cell_centers.mapv(|x| x - surface);
        let distances = Array1::from_shape_fn(n, |i| if i == 0 { 0.5 * dx } else { dx });

        logger.info(format_args!(
            "Creating 1-D mesh with {sediment_cells} sediment and {dbl_cells} DBL cells of {} mm",
            cell_size.get::<millimeter>()
        ));

        let mut domain = Self {
            cell_size,
            sediment_length,
            dbl_length,
            sediment_cells,
            dbl_cells,
            cell_centers,
            depths,
            distances,
            sediment_porosity,
            vars: IndexMap::new(),
            logger,
        };
        domain.set_porosity(porosity)?;
        Ok(domain)
    }

    /// Wraps the domain for sharing between entities.
    #[must_use]
    pub fn into_shared(self) -> SharedDomain {
        Rc::new(RefCell::new(self))
    }

    #[must_use]
    pub fn cell_size(&self) -> Length {
        self.cell_size
    }

    #[must_use]
    pub fn sediment_length(&self) -> Length {
        self.sediment_length
    }

    #[must_use]
    pub fn dbl_length(&self) -> Length {
        self.dbl_length
    }

    #[must_use]
    pub fn domain_length(&self) -> Length {
        self.sediment_length + self.dbl_length
    }

    #[must_use]
    pub fn sediment_cells(&self) -> usize {
        self.sediment_cells
    }

    #[must_use]
    pub fn dbl_cells(&self) -> usize {
        self.dbl_cells
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.sediment_cells + self.dbl_cells
    }

    /// Index of the first sediment cell.
    #[must_use]
    pub fn surface_index(&self) -> usize {
        self.dbl_cells
    }

    /// Cell centre coordinates in metres, measured from the top of the DBL.
    #[must_use]
    pub fn cell_centers(&self) -> ArrayView1<'_, f64> {
        self.cell_centers.view()
    }

    /// Depth of each cell centre in metres, zero at the first sediment cell.
    #[must_use]
    pub fn depths(&self) -> ArrayView1<'_, f64> {
        self.depths.view()
    }

    /// Distance in metres from each cell centre to the previous one.
    ///
    /// The first entry is the half-cell distance to the top face.
    #[must_use]
    pub fn distances(&self) -> ArrayView1<'_, f64> {
        self.distances.view()
    }

    #[must_use]
    pub fn sediment_porosity(&self) -> f64 {
        self.sediment_porosity.get()
    }

    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Resolves a location into the range of cells it covers.
    #[must_use]
    pub fn cells_at(&self, location: Location) -> Range<usize> {
        let n = self.cell_count();
        match location {
            Location::Top => 0..1,
            Location::Bottom => n - 1..n,
            Location::Dbl => 0..self.surface_index(),
            Location::Sediment => self.surface_index()..n,
        }
    }

    /// Creates and registers a variable over every cell.
    ///
    /// A [`InitialValue::Quantity`] carries its own unit, which overrides
    /// `unit`. Scalars and length-1 arrays are broadcast to all cells.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if `name` is empty or already registered, or
    /// if an array value is neither length 1 nor one value per cell.
    pub fn create_var(
        &mut self,
        name: &str,
        value: impl Into<InitialValue>,
        unit: Option<Unit>,
        retain_previous: bool,
    ) -> Result<&mut CellVariable, DomainError> {
        self.logger
            .info(format_args!("Creating domain variable {name:?}"));

        if name.is_empty() {
            return Err(DomainError::EmptyName);
        }
        if self.vars.contains_key(name) {
            return Err(DomainError::DuplicateName {
                name: name.to_owned(),
            });
        }

        let value: InitialValue = value.into();
        if let InitialValue::Quantity(q) = &value {
            if let Some(requested) = unit.as_ref().filter(|_| !q.unit.is_dimensionless()) {
                self.logger.warn(format_args!(
                    "{name:?} value has units {:?}, which will override supplied {requested}",
                    q.unit.symbol()
                ));
            }
        }
        let unit = value.resolve_unit(unit);

        let n = self.cell_count();
        let values = match value {
            InitialValue::Scalar(v) => Array1::from_elem(n, v),
            InitialValue::Quantity(q) => Array1::from_elem(n, q.value),
            InitialValue::Cells(cells) if cells.len() == n => cells,
            InitialValue::Cells(cells) if cells.len() == 1 => Array1::from_elem(n, cells[0]),
            InitialValue::Cells(cells) => {
                return Err(DomainError::ShapeMismatch {
                    name: name.to_owned(),
                    expected: n,
                    found: cells.len(),
                });
            }
        };

        self.logger.debug(format_args!(
            "Created variable {name:?}: cells: {n} unit: {unit}"
        ));

        let var = CellVariable::new(name.to_owned(), unit, values, retain_previous);
        Ok(self.vars.entry(name.to_owned()).or_insert(var))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Registered variable names in creation order.
    pub fn var_names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Looks up a registered variable.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownVariable`] if `name` is not registered.
    pub fn var(&self, name: &str) -> Result<&CellVariable, DomainError> {
        self.vars
            .get(name)
            .ok_or_else(|| DomainError::UnknownVariable {
                name: name.to_owned(),
            })
    }

    /// Looks up a registered variable for modification.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownVariable`] if `name` is not registered.
    pub fn var_mut(&mut self, name: &str) -> Result<&mut CellVariable, DomainError> {
        self.vars
            .get_mut(name)
            .ok_or_else(|| DomainError::UnknownVariable {
                name: name.to_owned(),
            })
    }

    /// Values of a variable within the sediment.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownVariable`] if `name` is not registered.
    pub fn slice_in_sediment(&self, name: &str) -> Result<ArrayView1<'_, f64>, DomainError> {
        let surface = self.surface_index();
        Ok(self.var(name)?.values().slice_move(s![surface..]))
    }

    /// Values of a variable within the DBL.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownVariable`] if `name` is not registered.
    pub fn slice_in_dbl(&self, name: &str) -> Result<ArrayView1<'_, f64>, DomainError> {
        let surface = self.surface_index();
        Ok(self.var(name)?.values().slice_move(s![..surface]))
    }

    /// Sets the sediment porosity; the DBL porosity is always 1.0.
    ///
    /// Creates the [`POROSITY`] variable on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Porosity`] if `value` is outside (0.1, 0.9).
    pub fn set_porosity(&mut self, value: f64) -> Result<(), DomainError> {
        self.sediment_porosity = Porosity::new(value)
            .map_err(|source| DomainError::Porosity { value, source })?;

        if !self.contains(POROSITY) {
            self.create_var(POROSITY, 1.0, None, false)?;
        }

        let surface = self.surface_index();
        let var = self.var_mut(POROSITY)?;
        let mut values = var.values_mut();
        values.slice_mut(s![..surface]).fill(1.0);
        values.slice_mut(s![surface..]).fill(value);

        self.logger.info(format_args!(
            "Set sediment porosity to {value} and DBL porosity to 1.0"
        ));
        Ok(())
    }
}

impl fmt::Display for SedimentDbl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SedimentDbl(cell_size={} mm, sed={}, DBL={})",
            self.cell_size.get::<millimeter>(),
            self.sediment_cells,
            self.dbl_cells
        )
    }
}

/// Number of whole cells of `cell_size` that fit in `length`.
///
/// Ratios within floating-point noise of an integer count as that integer,
/// so 1 mm of 0.1 mm cells is 10 cells rather than 9.
fn whole_cells(length: Length, cell_size: Length) -> usize {
    let exact = length.get::<meter>() / cell_size.get::<meter>();
    let nearest = exact.round();
    let cells = if (exact - nearest).abs() <= 1e-9 * nearest.max(1.0) {
        nearest
    } else {
        exact.floor()
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cells = cells as usize;
    cells
}
