//! Errors raised by unit algebra, conversion and the registry

use metrum_core::NumberError;
use thiserror::Error;

use crate::UnitsContainer;

/// Error type for every fallible operation in this crate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// Construction was handed something that is not a container,
    /// definition, string or unit.
    #[error("units must be of type str, Unit, UnitsContainer or UnitDefinition; not {0}")]
    InvalidUnitInput(String),

    #[error("Cannot power Unit by {0}")]
    UnsupportedExponent(String),

    #[error("Provide a `locale` value to localize translation")]
    MissingLocale,

    #[error("Invalid locale identifier: {0}")]
    InvalidLocale(String),

    /// The one error the compatibility check turns into `false`.
    #[error("Cannot convert from '{from}' ({from_dim}) to '{to}' ({to_dim})")]
    Dimensionality {
        from: String,
        to: String,
        from_dim: String,
        to_dim: String,
    },

    #[error("'{0}' is not defined in the unit registry")]
    UndefinedUnit(String),

    #[error("Context '{0}' is not defined in the unit registry")]
    UndefinedContext(String),

    #[error("Unit expression error: {0}")]
    Parse(String),

    #[error("{name} must be a Quantity, got {value}")]
    StrictValue { name: String, value: String },

    #[error("Unsupported operand type for {op}: {type_name}")]
    UnsupportedOperand { op: &'static str, type_name: String },

    #[error("Cannot compare a non-dimensionless Quantity in '{0}' with a plain number")]
    Incomparable(String),

    #[error("Cannot operate with units and quantities of different registries")]
    RegistryMismatch,

    #[error("No handler for elementwise '{ufunc}' with operand types [{types}]")]
    UfuncNotHandled { ufunc: &'static str, types: String },

    #[error("Invalid registry configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Number(#[from] NumberError),
}

impl UnitError {
    /// Dimensionality mismatch between two unit containers
    pub fn dimensionality(
        from: &UnitsContainer,
        to: &UnitsContainer,
        from_dim: &UnitsContainer,
        to_dim: &UnitsContainer,
    ) -> Self {
        UnitError::Dimensionality {
            from: from.to_string(),
            to: to.to_string(),
            from_dim: from_dim.to_string(),
            to_dim: to_dim.to_string(),
        }
    }

    pub fn unsupported(op: &'static str, type_name: impl Into<String>) -> Self {
        UnitError::UnsupportedOperand { op, type_name: type_name.into() }
    }

    pub fn is_dimensionality(&self) -> bool {
        matches!(self, UnitError::Dimensionality { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensionality_message() {
        let err = UnitError::dimensionality(
            &UnitsContainer::single("meter"),
            &UnitsContainer::single("second"),
            &UnitsContainer::single("[length]"),
            &UnitsContainer::single("[time]"),
        );
        assert!(err.is_dimensionality());
        assert_eq!(
            err.to_string(),
            "Cannot convert from 'meter' ([length]) to 'second' ([time])"
        );
    }

    #[test]
    fn test_number_error_converts() {
        let err: UnitError = NumberError::DivisionByZero.into();
        assert!(matches!(err, UnitError::Number(NumberError::DivisionByZero)));
        assert!(!err.is_dimensionality());
    }
}
