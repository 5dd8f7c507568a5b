use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::DomainError;

/// A named subset of the domain's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// The outermost cell at the top of the column.
    Top,
    /// The outermost cell at the bottom of the column.
    Bottom,
    /// Every cell above the sediment surface.
    Dbl,
    /// Every cell at or below the sediment surface.
    Sediment,
}

impl Location {
    pub const ALL: [Location; 4] = [Self::Top, Self::Bottom, Self::Dbl, Self::Sediment];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Dbl => "dbl",
            Self::Sediment => "sediment",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|loc| loc.as_str() == s)
            .ok_or_else(|| DomainError::UnknownLocation {
                location: s.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_locations() {
        for loc in Location::ALL {
            assert_eq!(loc.as_str().parse::<Location>().unwrap(), loc);
        }
    }

    #[test]
    fn rejects_unknown_locations() {
        for text in ["middle", "TOP", "", "surface"] {
            assert!(matches!(
                text.parse::<Location>(),
                Err(DomainError::UnknownLocation { .. })
            ));
        }
    }
}
