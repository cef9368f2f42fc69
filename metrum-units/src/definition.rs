//! Unit definitions held by a registry

use serde::{Serialize, Deserialize};
use metrum_core::Number;

use crate::{BaseDimension, UnitsContainer};

/// How a unit relates to the rest of the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefinitionKind {
    /// Root unit of a base dimension (meter for `[length]`)
    Base(BaseDimension),
    /// `factor * reference`, where `reference` names previously defined units.
    /// An empty reference makes a dimensionless unit (radian, percent).
    Scaled { factor: Number, reference: UnitsContainer },
}

/// A named unit with its symbol, aliases and definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefinition {
    /// Canonical name, the key used in units containers
    pub name: String,
    pub symbol: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub kind: DefinitionKind,
}

impl UnitDefinition {
    pub fn base(name: &str, symbol: &str, dimension: BaseDimension) -> Self {
        UnitDefinition {
            name: name.to_string(),
            symbol: Some(symbol.to_string()),
            aliases: Vec::new(),
            kind: DefinitionKind::Base(dimension),
        }
    }

    pub fn scaled(name: &str, symbol: &str, factor: Number, reference: UnitsContainer) -> Self {
        UnitDefinition {
            name: name.to_string(),
            symbol: Some(symbol.to_string()),
            aliases: Vec::new(),
            kind: DefinitionKind::Scaled { factor, reference },
        }
    }

    /// Dimensionless unit equal to `factor`
    pub fn dimensionless(name: &str, symbol: &str, factor: Number) -> Self {
        Self::scaled(name, symbol, factor, UnitsContainer::new())
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(aliases.iter().map(|a| a.to_string()));
        self
    }

    pub fn is_base(&self) -> bool {
        matches!(self.kind, DefinitionKind::Base(_))
    }

    /// The symbol, falling back to the canonical name
    pub fn symbol_or_name(&self) -> &str {
        self.symbol.as_deref().unwrap_or(&self.name)
    }
}
