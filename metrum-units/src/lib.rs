//! Metrum Units - physical units as algebraic values
//!
//! A [`Unit`] is a [`UnitsContainer`] (unit name to exponent) bound to the
//! [`UnitRegistry`] that defines its names. Units multiply, divide and raise
//! to powers; multiplying by a number gives a [`Quantity`]. Units compare
//! with units, quantities and plain numbers, know their dimensionality, and
//! check compatibility with other units, optionally under contexts such as
//! `spectroscopy` that link otherwise unrelated dimensions.
//!
//! ```no_run
//! use metrum_units::UnitRegistry;
//!
//! let ureg = UnitRegistry::new();
//! let speed = ureg.unit("km/h")?;
//! assert!(speed.is_compatible("m/s")?);
//! assert_eq!(speed.format("~P"), "km/h");
//! # Ok::<(), metrum_units::UnitError>(())
//! ```
//!
//! Operations that may defer to the other operand return [`Dispatch`];
//! everything else fails with [`UnitError`].

mod algebra;
mod config;
mod container;
mod context;
mod definition;
mod dimension;
mod elementwise;
mod error;
mod format;
mod locale;
mod operand;
mod parse;
mod quantity;
mod registry;
mod system;
mod unit;
mod units;

pub use config::RegistryConfig;
pub use container::UnitsContainer;
pub use context::{Context, ContextGuard, ContextParams, ContextRef, Relation, Transform};
pub use definition::{DefinitionKind, UnitDefinition};
pub use dimension::{dimensions, BaseDimension};
pub use elementwise::{dispatch, ArrayUfunc, Ufunc, UfuncCall, UfuncMethod};
pub use error::UnitError;
pub use format::{extract_short_flag, format_unit, FormatStyle, SHORT_FLAG};
pub use locale::{localized_name, Locale};
pub use operand::{CompareOp, Dispatch, Operand};
pub use quantity::Quantity;
pub use registry::UnitRegistry;
pub use system::System;
pub use unit::Unit;

pub use metrum_core::{Number, NumberError};
