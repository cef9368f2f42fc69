//! Units container - the exponent map every unit is made of
//!
//! A container maps a unit name (or a dimension name such as `[length]`) to
//! its exponent. Containers are values: every operation returns a new one,
//! and zero exponents are pruned on construction so that `meter / meter`
//! is the empty (dimensionless) container.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use metrum_core::Number;

use crate::format::format_unit;

/// Immutable mapping from unit name to exponent
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Number>", into = "BTreeMap<String, Number>")]
pub struct UnitsContainer {
    exponents: BTreeMap<String, Number>,
}

impl UnitsContainer {
    /// The empty, dimensionless container
    pub fn new() -> Self {
        Self::default()
    }

    /// `{name: 1}`
    pub fn single(name: impl Into<String>) -> Self {
        let mut exponents = BTreeMap::new();
        exponents.insert(name.into(), Number::one());
        Self { exponents }
    }

    /// Build from (name, exponent) pairs; repeated names add up
    pub fn from_pairs<I, S, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, N)>,
        S: Into<String>,
        N: Into<Number>,
    {
        let mut exponents: BTreeMap<String, Number> = BTreeMap::new();
        for (name, exp) in pairs {
            let exp = exp.into();
            exponents
                .entry(name.into())
                .and_modify(|e| *e = e.add(&exp))
                .or_insert(exp);
        }
        Self::pruned(exponents)
    }

    fn pruned(mut exponents: BTreeMap<String, Number>) -> Self {
        exponents.retain(|_, exp| !exp.is_zero());
        Self { exponents }
    }

    pub fn is_empty(&self) -> bool {
        self.exponents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.exponents.len()
    }

    pub fn get(&self, name: &str) -> Option<&Number> {
        self.exponents.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.exponents.contains_key(name)
    }

    /// Entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Number)> {
        self.exponents.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.exponents.keys().map(String::as_str)
    }

    /// Exponent addition
    pub fn mul(&self, other: &UnitsContainer) -> UnitsContainer {
        let mut exponents = self.exponents.clone();
        for (name, exp) in &other.exponents {
            exponents
                .entry(name.clone())
                .and_modify(|e| *e = e.add(exp))
                .or_insert_with(|| exp.clone());
        }
        Self::pruned(exponents)
    }

    /// Exponent subtraction
    pub fn div(&self, other: &UnitsContainer) -> UnitsContainer {
        let mut exponents = self.exponents.clone();
        for (name, exp) in &other.exponents {
            exponents
                .entry(name.clone())
                .and_modify(|e| *e = e.sub(exp))
                .or_insert_with(|| exp.neg());
        }
        Self::pruned(exponents)
    }

    /// Exponent scaling
    pub fn pow(&self, power: &Number) -> UnitsContainer {
        let exponents = self
            .exponents
            .iter()
            .map(|(name, exp)| (name.clone(), exp.mul(power)))
            .collect();
        Self::pruned(exponents)
    }

    pub fn invert(&self) -> UnitsContainer {
        self.pow(&Number::from_i64(-1))
    }

    /// Rename every entry; names that collide have their exponents added
    pub fn map_names<F>(&self, mut rename: F) -> UnitsContainer
    where
        F: FnMut(&str) -> String,
    {
        Self::from_pairs(self.exponents.iter().map(|(k, v)| (rename(k), v.clone())))
    }
}

impl From<BTreeMap<String, Number>> for UnitsContainer {
    fn from(exponents: BTreeMap<String, Number>) -> Self {
        Self::pruned(exponents)
    }
}

impl From<UnitsContainer> for BTreeMap<String, Number> {
    fn from(container: UnitsContainer) -> Self {
        container.exponents
    }
}

impl<S: Into<String>> FromIterator<(S, Number)> for UnitsContainer {
    fn from_iter<T: IntoIterator<Item = (S, Number)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

impl fmt::Display for UnitsContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_unit(self, "D"))
    }
}
