use ndarray::{Array1, Zip};

use super::EvalError;

/// A value a formula operates on: one number, or one number per cell.
///
/// Scalars broadcast against per-cell values.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Scalar(f64),
    Cells(Array1<f64>),
}

impl Field {
    /// Number of cells, or `None` for a scalar.
    #[must_use]
    pub fn cell_count(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::Cells(cells) => Some(cells.len()),
        }
    }

    #[must_use]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            Self::Cells(_) => None,
        }
    }

    /// Expands into `n` per-cell values, broadcasting a scalar.
    #[must_use]
    pub fn into_cells(self, n: usize) -> Array1<f64> {
        match self {
            Self::Scalar(value) => Array1::from_elem(n, value),
            Self::Cells(cells) => cells,
        }
    }

    #[must_use]
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Self::Scalar(value) => Self::Scalar(f(value)),
            Self::Cells(cells) => Self::Cells(cells.mapv_into(f)),
        }
    }

    /// Combines two fields elementwise.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::ShapeMismatch`] if both are per-cell with
    /// different lengths.
    pub fn zip_with(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Result<Self, EvalError> {
        Ok(match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(f(a, b)),
            (Self::Scalar(a), Self::Cells(b)) => Self::Cells(b.mapv_into(|b| f(a, b))),
            (Self::Cells(a), Self::Scalar(b)) => Self::Cells(a.mapv_into(|a| f(a, b))),
            (Self::Cells(a), Self::Cells(b)) => {
                if a.len() != b.len() {
                    return Err(EvalError::ShapeMismatch {
                        left: a.len(),
                        right: b.len(),
                    });
                }
                Self::Cells(Zip::from(&a).and(&b).map_collect(|&a, &b| f(a, b)))
            }
        })
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Array1<f64>> for Field {
    fn from(cells: Array1<f64>) -> Self {
        Self::Cells(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn scalars_broadcast() {
        let cells = Field::from(array![1.0, 2.0, 3.0]);
        let sum = Field::Scalar(10.0).zip_with(cells.clone(), |a, b| a + b).unwrap();
        assert_eq!(sum, Field::Cells(array![11.0, 12.0, 13.0]));

        let quotient = cells.zip_with(Field::Scalar(2.0), |a, b| a / b).unwrap();
        assert_eq!(quotient, Field::Cells(array![0.5, 1.0, 1.5]));

        let product = Field::Scalar(2.0).zip_with(Field::Scalar(4.0), |a, b| a * b).unwrap();
        assert_eq!(product.as_scalar(), Some(8.0));
        assert_eq!(product.into_cells(2), array![8.0, 8.0]);
    }

    #[test]
    fn mismatched_lengths_fail() {
        let err = Field::from(array![1.0, 2.0])
            .zip_with(Field::from(array![1.0, 2.0, 3.0]), |a, b| a * b)
            .unwrap_err();
        assert_eq!(err, EvalError::ShapeMismatch { left: 2, right: 3 });
    }
}
