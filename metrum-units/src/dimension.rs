//! Base dimensions
//!
//! Dimensionalities are plain units containers keyed by bracketed dimension
//! names, e.g. `{[length]: 1, [time]: -1}` for a velocity. The seven SI base
//! dimensions are the only keys the default registry produces.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::UnitsContainer;

/// One of the seven SI base dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseDimension {
    Length,
    Mass,
    Time,
    Current,
    Temperature,
    Substance,
    Luminosity,
}

impl BaseDimension {
    pub const ALL: [BaseDimension; 7] = [
        BaseDimension::Length,
        BaseDimension::Mass,
        BaseDimension::Time,
        BaseDimension::Current,
        BaseDimension::Temperature,
        BaseDimension::Substance,
        BaseDimension::Luminosity,
    ];

    /// Bracketed key used inside dimensionality containers
    pub fn name(&self) -> &'static str {
        match self {
            BaseDimension::Length => "[length]",
            BaseDimension::Mass => "[mass]",
            BaseDimension::Time => "[time]",
            BaseDimension::Current => "[current]",
            BaseDimension::Temperature => "[temperature]",
            BaseDimension::Substance => "[substance]",
            BaseDimension::Luminosity => "[luminosity]",
        }
    }

    pub fn from_name(name: &str) -> Option<BaseDimension> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }

    /// `{[dim]: 1}`
    pub fn container(&self) -> UnitsContainer {
        UnitsContainer::single(self.name())
    }

    /// `{[dim]: exp}`
    pub fn power(&self, exp: i32) -> UnitsContainer {
        UnitsContainer::from_pairs([(self.name(), exp)])
    }
}

impl fmt::Display for BaseDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Product of base-dimension powers, e.g. `dimensions(&[(Length, 1), (Time, -1)])`
pub fn dimensions(parts: &[(BaseDimension, i32)]) -> UnitsContainer {
    UnitsContainer::from_pairs(parts.iter().map(|(d, e)| (d.name(), *e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrum_core::Number;

    #[test]
    fn test_names_round_trip() {
        for dim in BaseDimension::ALL {
            assert_eq!(BaseDimension::from_name(dim.name()), Some(dim));
        }
        assert_eq!(BaseDimension::from_name("[colour]"), None);
    }

    #[test]
    fn test_velocity() {
        let velocity = dimensions(&[(BaseDimension::Length, 1), (BaseDimension::Time, -1)]);
        let expected = BaseDimension::Length.container().div(&BaseDimension::Time.container());
        assert_eq!(velocity, expected);
        assert_eq!(velocity.to_string(), "[length] / [time]");
    }

    #[test]
    fn test_power() {
        let area = BaseDimension::Length.power(2);
        assert_eq!(area.get("[length]"), Some(&Number::from_i64(2)));
        assert!(BaseDimension::Mass.power(0).is_empty());
    }
}
