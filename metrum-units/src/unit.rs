//! Unit - a units container bound to its registry
//!
//! A unit is an immutable value: every algebraic operation returns a new
//! unit (or a quantity). The only interior state is the `used` debug flag
//! and the write-once dimensionality cache.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use num_complex::Complex64;
use serde::{Serialize, Serializer};
use metrum_core::Number;
use tracing::trace;

use crate::context::{ContextParams, ContextRef};
use crate::format::{extract_short_flag, format_unit};
use crate::locale::{format_localized as localize, Locale};
use crate::{CompareOp, Dispatch, Operand, Quantity, UnitError, UnitRegistry, UnitsContainer};

pub struct Unit {
    registry: Arc<UnitRegistry>,
    units: UnitsContainer,
    used: AtomicBool,
    dimensionality: OnceLock<UnitsContainer>,
}

impl Unit {
    /// Build from a string, container, definition or another unit
    pub fn new(registry: &Arc<UnitRegistry>, input: impl Into<Operand>) -> Result<Unit, UnitError> {
        let units = match input.into() {
            Operand::Container(units) => units,
            Operand::Text(text) => registry.parse_units(&text)?,
            Operand::Definition(def) => UnitsContainer::single(def.name),
            Operand::Unit(unit) => unit.units,
            other => return Err(UnitError::InvalidUnitInput(other.type_name().to_string())),
        };
        Ok(Unit::from_container(registry, units))
    }

    pub fn from_container(registry: &Arc<UnitRegistry>, units: UnitsContainer) -> Unit {
        Unit {
            registry: Arc::clone(registry),
            units,
            used: AtomicBool::new(false),
            dimensionality: OnceLock::new(),
        }
    }

    /// The dimensionless unit of a registry
    pub fn dimensionless(registry: &Arc<UnitRegistry>) -> Unit {
        Unit::from_container(registry, UnitsContainer::new())
    }

    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.registry
    }

    pub fn units(&self) -> &UnitsContainer {
        &self.units
    }

    pub fn same_registry(&self, other: &Arc<UnitRegistry>) -> bool {
        Arc::ptr_eq(&self.registry, other)
    }

    /// Debug flag; never read by unit algebra
    pub fn debug_used(&self) -> bool {
        self.used.load(Ordering::Relaxed)
    }

    pub fn mark_used(&self) {
        self.used.store(true, Ordering::Relaxed);
    }

    /// `Quantity(1, self)`
    pub fn unit_quantity(&self) -> Quantity {
        Quantity::new(Number::one(), self.clone())
    }

    // ========== Dimensionality ==========

    /// Dimensionality from the registry, cached after the first success
    pub fn dimensionality(&self) -> Result<&UnitsContainer, UnitError> {
        if let Some(cached) = self.dimensionality.get() {
            return Ok(cached);
        }
        let computed = self.registry.get_dimensionality(&self.units)?;
        trace!(unit = %self.units, dimensionality = %computed, "caching dimensionality");
        Ok(self.dimensionality.get_or_init(|| computed))
    }

    pub fn is_dimensionless(&self) -> Result<bool, UnitError> {
        Ok(self.dimensionality()?.is_empty())
    }

    // ========== Compatibility ==========

    /// Whether `other` can be converted to this unit without contexts
    /// beyond the already active ones
    pub fn is_compatible(&self, other: impl Into<Operand>) -> Result<bool, UnitError> {
        self.is_compatible_with(other, &[], &ContextParams::new())
    }

    /// Whether a quantity in this unit converts to `other`.
    ///
    /// With contexts given or active, a trial conversion decides and only a
    /// dimensionality failure means "no". Otherwise units and quantities
    /// compare dimensionalities, strings are parsed first, and anything else
    /// is compatible exactly when this unit is dimensionless.
    pub fn is_compatible_with(
        &self,
        other: impl Into<Operand>,
        contexts: &[ContextRef],
        params: &ContextParams,
    ) -> Result<bool, UnitError> {
        let other = other.into();

        if !contexts.is_empty() || self.registry.has_active_contexts() {
            trace!(unit = %self.units, other = %other, "compatibility by trial conversion");
            return match self.unit_quantity().to_with(other, contexts, params) {
                Ok(_) => Ok(true),
                Err(e) if e.is_dimensionality() => Ok(false),
                Err(e) => Err(e),
            };
        }

        match &other {
            Operand::Unit(u) => Ok(self.dimensionality()? == u.dimensionality()?),
            Operand::Quantity(q) => Ok(self.dimensionality()? == q.dimensionality()?),
            Operand::Text(text) => {
                let units = self.registry.parse_units(text)?;
                Ok(*self.dimensionality()? == self.registry.get_dimensionality(&units)?)
            }
            _ => self.is_dimensionless(),
        }
    }

    /// Every registry unit this one converts to, optionally under contexts
    pub fn compatible_units(&self, contexts: &[ContextRef], params: &ContextParams) -> Result<Vec<Unit>, UnitError> {
        Ok(self
            .registry
            .get_compatible_units(&self.units, contexts, params)?
            .into_iter()
            .map(|units| Unit::from_container(&self.registry, units))
            .collect())
    }

    // ========== Algebra ==========

    /// `self * other`: units combine into a unit, anything numeric gives a
    /// quantity
    pub fn multiply(&self, other: &Operand) -> Result<Operand, UnitError> {
        match other {
            Operand::Unit(u) => {
                self.check_registry(u)?;
                Ok(Operand::Unit(self.with_units(self.units.mul(&u.units))))
            }
            Operand::Container(c) => Ok(Operand::Unit(self.with_units(self.units.mul(c)))),
            Operand::Number(n) if n.is_one() => Ok(Operand::Quantity(Quantity::new(n.clone(), self.clone()))),
            other => Ok(Operand::Quantity(self.unit_quantity().multiply(other)?)),
        }
    }

    /// `self / other`
    pub fn divide(&self, other: &Operand) -> Result<Operand, UnitError> {
        match other {
            Operand::Unit(u) => {
                self.check_registry(u)?;
                Ok(Operand::Unit(self.with_units(self.units.div(&u.units))))
            }
            Operand::Container(c) => Ok(Operand::Unit(self.with_units(self.units.div(c)))),
            other => Ok(Operand::Quantity(self.unit_quantity().divide(other)?)),
        }
    }

    /// `other / self` for operands that cannot divide by a unit themselves
    pub fn rdivide(&self, other: &Operand) -> Result<Dispatch<Operand>, UnitError> {
        match other {
            Operand::Number(n) => {
                let inverse = self.with_units(self.units.invert());
                Ok(Dispatch::Handled(Operand::Quantity(Quantity::new(n.clone(), inverse))))
            }
            Operand::Container(c) => Ok(Dispatch::Handled(Operand::Unit(self.with_units(c.div(&self.units))))),
            _ => Ok(Dispatch::NotApplicable),
        }
    }

    /// `self ** other`; only plain numbers are accepted as exponents
    pub fn pow(&self, other: &Operand) -> Result<Unit, UnitError> {
        match other {
            Operand::Number(n) => Ok(self.with_units(self.units.pow(n))),
            other => Err(UnitError::UnsupportedExponent(other.type_name().to_string())),
        }
    }

    pub fn powi(&self, exp: i32) -> Unit {
        self.with_units(self.units.pow(&Number::from(exp)))
    }

    fn with_units(&self, units: UnitsContainer) -> Unit {
        Unit::from_container(&self.registry, units)
    }

    fn check_registry(&self, other: &Unit) -> Result<(), UnitError> {
        if self.same_registry(&other.registry) {
            Ok(())
        } else {
            Err(UnitError::RegistryMismatch)
        }
    }

    // ========== Equality and ordering ==========

    /// Equality against any operand; unit-like values of another registry
    /// are never equal
    pub fn eq_operand(&self, other: &Operand) -> bool {
        match other {
            Operand::Unit(u) => self.same_registry(&u.registry) && self.units == u.units,
            Operand::Quantity(q) => q.same_registry(&self.registry) && *q == self.unit_quantity(),
            Operand::Number(n) => self.unit_quantity() == *n,
            Operand::Container(c) => self.units == *c,
            Operand::Text(text) => self
                .registry
                .parse_units(text)
                .map(|parsed| parsed == self.units)
                .unwrap_or(false),
            Operand::Definition(_) | Operand::Foreign(_) => false,
        }
    }

    /// Ordering via `Quantity(1, self)`. Quantities and strings are left to
    /// the other operand.
    pub fn compare(&self, other: &Operand, op: CompareOp) -> Result<Dispatch<bool>, UnitError> {
        match other {
            Operand::Number(_) | Operand::Unit(_) | Operand::Container(_) => {
                self.unit_quantity().compare(other, op)
            }
            _ => Ok(Dispatch::NotApplicable),
        }
    }

    fn ordered(&self, other: Operand, op: CompareOp) -> Result<bool, UnitError> {
        if let Dispatch::Handled(result) = self.compare(&other, op)? {
            return Ok(result);
        }
        if let Operand::Quantity(q) = &other {
            let self_operand = Operand::Unit(self.clone());
            if let Dispatch::Handled(result) = q.compare(&self_operand, op.reflect())? {
                return Ok(result);
            }
        }
        Err(UnitError::unsupported(op.symbol(), other.type_name()))
    }

    pub fn lt(&self, other: impl Into<Operand>) -> Result<bool, UnitError> {
        self.ordered(other.into(), CompareOp::Lt)
    }

    pub fn le(&self, other: impl Into<Operand>) -> Result<bool, UnitError> {
        self.ordered(other.into(), CompareOp::Le)
    }

    pub fn ge(&self, other: impl Into<Operand>) -> Result<bool, UnitError> {
        self.ordered(other.into(), CompareOp::Ge)
    }

    pub fn gt(&self, other: impl Into<Operand>) -> Result<bool, UnitError> {
        self.ordered(other.into(), CompareOp::Gt)
    }

    // ========== Numeric coercion ==========

    pub fn to_f64(&self) -> Result<f64, UnitError> {
        self.unit_quantity().to_f64()
    }

    /// Truncates toward zero
    pub fn to_i64(&self) -> Result<i64, UnitError> {
        self.unit_quantity().to_i64()
    }

    pub fn to_complex(&self) -> Result<Complex64, UnitError> {
        self.unit_quantity().to_complex()
    }

    // ========== Systems ==========

    /// Systems any constituent unit belongs to, read fresh from the registry
    pub fn systems(&self) -> BTreeSet<String> {
        self.registry.systems_of(&self.units)
    }

    // ========== Value conversion ==========

    /// Turn a value into a quantity in this unit.
    ///
    /// Units and quantities are converted. Other values are rejected in
    /// strict mode and multiplied by this unit otherwise.
    pub fn from_value(&self, value: impl Into<Operand>, strict: bool, name: &str) -> Result<Quantity, UnitError> {
        let value = value.into();
        match &value {
            Operand::Unit(u) => return u.unit_quantity().to(self),
            Operand::Quantity(q) => return q.to(self),
            _ => {}
        }
        if strict {
            return Err(UnitError::StrictValue {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
        match self.multiply(&value)? {
            Operand::Quantity(q) => Ok(q),
            Operand::Unit(u) => Ok(u.unit_quantity()),
            other => Err(UnitError::unsupported("from_value", other.type_name())),
        }
    }

    /// Magnitude of [`from_value`](Self::from_value)
    pub fn m_from(&self, value: impl Into<Operand>, strict: bool, name: &str) -> Result<Number, UnitError> {
        Ok(self.from_value(value, strict, name)?.magnitude().clone())
    }

    // ========== Formatting ==========

    /// Render with a format spec; `~` switches to symbols
    pub fn format(&self, spec: &str) -> String {
        let (short, spec) = extract_short_flag(spec);
        if short {
            if self.units.is_empty() {
                return String::new();
            }
            format_unit(&self.symbol_units(), &spec)
        } else {
            format_unit(&self.units, &spec)
        }
    }

    /// Render with localized unit names. Without an explicit locale the
    /// registry's `fmt_locale` is used.
    pub fn format_localized(&self, spec: &str, locale: Option<&str>) -> Result<String, UnitError> {
        let spec = if spec.is_empty() { self.registry.default_format() } else { spec };
        let (short, style) = extract_short_flag(spec);
        let units = if short {
            if self.is_dimensionless()? {
                return Ok(String::new());
            }
            self.symbol_units()
        } else {
            self.units.clone()
        };

        let locale = match locale {
            Some(id) => id.to_string(),
            None => self.registry.fmt_locale().ok_or(UnitError::MissingLocale)?,
        };
        Ok(localize(&units, &style, &Locale::parse(&locale)?))
    }

    fn symbol_units(&self) -> UnitsContainer {
        self.units.map_names(|name| self.registry.get_symbol(name))
    }
}

impl Clone for Unit {
    fn clone(&self) -> Self {
        Unit {
            registry: Arc::clone(&self.registry),
            units: self.units.clone(),
            used: AtomicBool::new(self.debug_used()),
            dimensionality: OnceLock::new(),
        }
    }
}

impl Hash for Unit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.units.hash(state);
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Unit) -> bool {
        self.same_registry(&other.registry) && self.units == other.units
    }
}

impl Eq for Unit {}

impl PartialEq<Quantity> for Unit {
    fn eq(&self, other: &Quantity) -> bool {
        other.same_registry(&self.registry) && *other == self.unit_quantity()
    }
}

impl PartialEq<Number> for Unit {
    fn eq(&self, other: &Number) -> bool {
        self.unit_quantity() == *other
    }
}

impl PartialEq<i64> for Unit {
    fn eq(&self, other: &i64) -> bool {
        *self == Number::from_i64(*other)
    }
}

impl PartialEq<f64> for Unit {
    fn eq(&self, other: &f64) -> bool {
        *self == Number::from_f64(*other)
    }
}

impl PartialEq<UnitsContainer> for Unit {
    fn eq(&self, other: &UnitsContainer) -> bool {
        self.units == *other
    }
}

impl PartialEq<&str> for Unit {
    fn eq(&self, other: &&str) -> bool {
        self.eq_operand(&Operand::from(*other))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(self.registry.default_format()))
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Unit('{}')>", self)
    }
}

/// Serialized as its container; restore with
/// [`UnitRegistry::unit_from_json`]
impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.units.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use crate::{dimensions, BaseDimension, Context, UnitDefinition};

    fn ureg() -> Arc<UnitRegistry> {
        UnitRegistry::new()
    }

    #[test]
    fn test_construct_from_inputs() {
        let ureg = ureg();
        let from_text = Unit::new(&ureg, "m/s").unwrap();
        let from_container = Unit::new(&ureg, UnitsContainer::from_pairs([("meter", 1), ("second", -1)])).unwrap();
        let from_unit = Unit::new(&ureg, &from_text).unwrap();
        assert_eq!(from_text, from_container);
        assert_eq!(from_unit, from_text);

        let def = UnitDefinition::base("meter", "m", BaseDimension::Length);
        assert_eq!(Unit::new(&ureg, def).unwrap().units(), &UnitsContainer::single("meter"));
    }

    #[test]
    fn test_construct_invalid_input() {
        let err = Unit::new(&ureg(), 5).unwrap_err();
        assert_eq!(err, UnitError::InvalidUnitInput("Number".to_string()));
        assert_eq!(
            err.to_string(),
            "units must be of type str, Unit, UnitsContainer or UnitDefinition; not Number"
        );
    }

    #[test]
    fn test_clone_keeps_used_flag() {
        let m = ureg().unit("m").unwrap();
        m.mark_used();
        let copy = m.clone();
        assert!(copy.debug_used());
        assert_eq!(copy, m);
        assert!(!ureg().unit("m").unwrap().debug_used());
    }

    #[test]
    fn test_dimensionality_cached() {
        let ureg = ureg();
        let speed = ureg.unit("km/h").unwrap();
        let before = ureg.dimensionality_lookups();
        let first = speed.dimensionality().unwrap().clone();
        let second = speed.dimensionality().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(ureg.dimensionality_lookups(), before + 1);
        assert_eq!(first, dimensions(&[(BaseDimension::Length, 1), (BaseDimension::Time, -1)]));
    }

    #[test]
    fn test_dimensionless() {
        let ureg = ureg();
        assert!(ureg.unit("m/km").unwrap().is_dimensionless().unwrap());
        assert!(ureg.unit("radian").unwrap().is_dimensionless().unwrap());
        assert!(!ureg.unit("m").unwrap().is_dimensionless().unwrap());
    }

    #[test]
    fn test_compatibility_tiers() {
        let ureg = ureg();
        let m = ureg.unit("m").unwrap();
        assert!(m.is_compatible(ureg.unit("ft").unwrap()).unwrap());
        assert!(m.is_compatible(ureg.quantity(3, "km").unwrap()).unwrap());
        assert!(m.is_compatible("inch").unwrap());
        assert!(!m.is_compatible("second").unwrap());
        assert!(!m.is_compatible(5).unwrap());
        assert!(ureg.unit("percent").unwrap().is_compatible(5).unwrap());
    }

    #[test]
    fn test_compatibility_bad_string_propagates() {
        let m = ureg().unit("m").unwrap();
        assert!(matches!(m.is_compatible("furlong"), Err(UnitError::UndefinedUnit(_))));
    }

    #[test]
    fn test_compatibility_under_context() {
        let ureg = ureg();
        let m = ureg.unit("m").unwrap();
        let hz = ureg.unit("Hz").unwrap();
        assert!(!m.is_compatible(&hz).unwrap());
        assert!(m.is_compatible_with(&hz, &["sp".into()], &ContextParams::new()).unwrap());
        assert!(!m.is_compatible_with("second", &["sp".into()], &ContextParams::new()).unwrap());
        assert!(!ureg.has_active_contexts());
    }

    #[test]
    fn test_compatibility_uses_active_contexts() {
        let ureg = ureg();
        let k = ureg.unit("K").unwrap();
        let _guard = ureg.enter(&[Context::boltzmann().into()], &ContextParams::new()).unwrap();
        assert!(k.is_compatible("J").unwrap());
    }

    #[test]
    fn test_multiply_and_divide_units() {
        let ureg = ureg();
        let m = ureg.unit("m").unwrap();
        let s = ureg.unit("s").unwrap();
        let speed = m.divide(&Operand::from(&s)).unwrap().into_unit().unwrap();
        assert_eq!(speed.units(), &UnitsContainer::from_pairs([("meter", 1), ("second", -1)]));
        let back = speed.multiply(&Operand::from(&s)).unwrap().into_unit().unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_multiply_by_one_and_number() {
        let ureg = ureg();
        let m = ureg.unit("m").unwrap();
        let one = m.multiply(&Operand::from(1)).unwrap().into_quantity().unwrap();
        assert!(one.magnitude().is_one());
        assert_eq!(one.unit(), &m);
        let three = m.multiply(&Operand::from(3)).unwrap().into_quantity().unwrap();
        assert_eq!(three.magnitude(), &Number::from_i64(3));
    }

    #[test]
    fn test_divide_by_number() {
        let m = ureg().unit("m").unwrap();
        let q = m.divide(&Operand::from(4)).unwrap().into_quantity().unwrap();
        assert_eq!(q.magnitude(), &Number::from_str("0.25").unwrap());
        assert!(matches!(m.divide(&Operand::from(0)), Err(UnitError::Number(_))));
    }

    #[test]
    fn test_rdivide() {
        let ureg = ureg();
        let s = ureg.unit("s").unwrap();
        let freq = s.rdivide(&Operand::from(2)).unwrap().handled().unwrap().into_quantity().unwrap();
        assert_eq!(freq.magnitude(), &Number::from_i64(2));
        assert_eq!(freq.units(), &UnitsContainer::from_pairs([("second", -1)]));

        let c = UnitsContainer::single("meter");
        let speed = s.rdivide(&Operand::from(c)).unwrap().handled().unwrap().into_unit().unwrap();
        assert_eq!(speed, ureg.unit("m/s").unwrap());

        assert!(s.rdivide(&Operand::from("m")).unwrap().is_not_applicable());
    }

    #[test]
    fn test_registry_mismatch() {
        let a = ureg().unit("m").unwrap();
        let b = ureg().unit("m").unwrap();
        assert_eq!(a.multiply(&Operand::from(&b)).unwrap_err(), UnitError::RegistryMismatch);
        assert_ne!(a, b);
    }

    #[test]
    fn test_pow() {
        let m = ureg().unit("m").unwrap();
        let area = m.pow(&Operand::from(2)).unwrap();
        assert_eq!(area.units().get("meter"), Some(&Number::from_i64(2)));
        assert_eq!(m.powi(-1).units().get("meter"), Some(&Number::from_i64(-1)));
        let err = m.pow(&Operand::from("2")).unwrap_err();
        assert_eq!(err, UnitError::UnsupportedExponent("str".to_string()));
        assert_eq!(err.to_string(), "Cannot power Unit by str");
    }

    #[test]
    fn test_hash_matches_container() {
        let ureg = ureg();
        let mut set = HashSet::new();
        set.insert(ureg.unit("m/s").unwrap());
        set.insert(ureg.unit("meter / second").unwrap());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_equality_across_types() {
        let ureg = ureg();
        let m = ureg.unit("m").unwrap();
        assert_eq!(m, ureg.quantity(1, "m").unwrap());
        assert_ne!(m, ureg.quantity(2, "m").unwrap());
        assert_eq!(m, UnitsContainer::single("meter"));
        assert_eq!(m, "meter");
        assert_ne!(m, "furlong");
        assert_ne!(m, 1_i64);

        let percent = ureg.unit("percent").unwrap();
        assert_eq!(percent, 0.01_f64);
        let dimensionless = ureg.unit("m/m").unwrap();
        assert_eq!(dimensionless, 1_i64);
    }

    #[test]
    fn test_ordering() {
        let ureg = ureg();
        let m = ureg.unit("m").unwrap();
        let km = ureg.unit("km").unwrap();
        assert!(m.lt(&km).unwrap());
        assert!(km.gt(&m).unwrap());
        assert!(m.le(&m).unwrap());
        assert!(m.lt(ureg.quantity(2, "m").unwrap()).unwrap());
        assert!(m.ge(ureg.quantity(50, "cm").unwrap()).unwrap());
    }

    #[test]
    fn test_ordering_errors() {
        let ureg = ureg();
        let m = ureg.unit("m").unwrap();
        assert!(m.lt(ureg.unit("s").unwrap()).unwrap_err().is_dimensionality());
        assert!(matches!(m.lt(5), Err(UnitError::Incomparable(_))));
        assert!(matches!(m.lt("km"), Err(UnitError::UnsupportedOperand { op: "<", .. })));
        assert!(ureg.unit("percent").unwrap().lt(1).unwrap());
    }

    #[test]
    fn test_coercion() {
        let ureg = ureg();
        assert_eq!(ureg.unit("m/km").unwrap().to_f64().unwrap(), 0.001);
        assert_eq!(ureg.unit("dozen").unwrap().to_i64().unwrap(), 12);
        assert_eq!(ureg.unit("dozen").unwrap().to_complex().unwrap(), Complex64::new(12.0, 0.0));
        assert!(ureg.unit("m").unwrap().to_f64().unwrap_err().is_dimensionality());
    }

    #[test]
    fn test_systems() {
        let ureg = ureg();
        let m = ureg.unit("m").unwrap();
        assert!(m.systems().contains("SI"));
        assert!(!m.systems().contains("imperial"));
        ureg.extend_system("imperial", &["meter"]);
        assert!(m.systems().contains("imperial"));
        assert!(ureg.unit("ft").unwrap().systems().contains("imperial"));
    }

    #[test]
    fn test_from_value() {
        let ureg = ureg();
        let m = ureg.unit("m").unwrap();
        let converted = m.from_value(ureg.quantity(2, "km").unwrap(), true, "value").unwrap();
        assert_eq!(converted.magnitude(), &Number::from_i64(2000));
        assert_eq!(m.m_from(ureg.quantity(30, "cm").unwrap(), true, "value").unwrap(), Number::from_str("0.3").unwrap());

        let err = m.from_value(5, true, "length").unwrap_err();
        assert_eq!(err.to_string(), "length must be a Quantity, got 5");

        let lenient = m.from_value(5, false, "length").unwrap();
        assert_eq!(lenient, ureg.quantity(5, "m").unwrap());

        let percent = ureg.unit("percent").unwrap();
        assert!(matches!(percent.m_from(7, true, "value"), Err(UnitError::StrictValue { .. })));
        assert_eq!(percent.m_from(7, false, "value").unwrap(), Number::from_i64(7));
    }

    #[test]
    fn test_from_value_converts_units() {
        let ureg = ureg();
        let km = ureg.unit("km").unwrap();
        let m = ureg.unit("m").unwrap();
        for strict in [true, false] {
            let converted = km.from_value(&m, strict, "value").unwrap();
            assert_eq!(converted.magnitude(), &Number::from_str("0.001").unwrap());
            assert_eq!(converted.unit(), &km);
        }
        assert!(km.from_value(ureg.unit("s").unwrap(), false, "value").unwrap_err().is_dimensionality());
    }

    #[test]
    fn test_format() {
        let ureg = ureg();
        let accel = ureg.unit("m/s**2").unwrap();
        assert_eq!(accel.format("D"), "meter / second ** 2");
        assert_eq!(accel.format("~"), "m / s ** 2");
        assert_eq!(accel.format("~P"), "m/s²");
        assert_eq!(accel.to_string(), "meter / second ** 2");
        assert_eq!(format!("{:?}", accel), "<Unit('meter / second ** 2')>");
    }

    #[test]
    fn test_format_short_form_empty() {
        let ureg = ureg();
        let dimensionless = Unit::dimensionless(&ureg);
        assert_eq!(dimensionless.format("~"), "");
        assert_eq!(dimensionless.format("D"), "dimensionless");
        // dimensionless but not empty
        assert_eq!(ureg.unit("radian").unwrap().format("~"), "rad");
    }

    #[test]
    fn test_format_localized() {
        let ureg = ureg();
        let speed = ureg.unit("km/h").unwrap();
        assert_eq!(speed.format_localized("", Some("fr_FR")).unwrap(), "kilomètre par heure");
        assert_eq!(speed.format_localized("", None).unwrap_err(), UnitError::MissingLocale);

        ureg.set_fmt_locale(Some("de")).unwrap();
        assert_eq!(speed.format_localized("", None).unwrap(), "Kilometer pro Stunde");
        assert!(matches!(speed.format_localized("", Some("x")), Err(UnitError::InvalidLocale(_))));
    }

    #[test]
    fn test_format_localized_style() {
        let accel = ureg().unit("m/s**2").unwrap();
        assert_eq!(accel.format_localized("P", Some("en")).unwrap(), "meter per second²");
        assert_eq!(accel.format_localized("D", Some("en")).unwrap(), "meter per second ** 2");
        assert_eq!(accel.format_localized("~C", Some("en")).unwrap(), "m per s**2");
    }

    #[test]
    fn test_format_localized_short_form() {
        let ureg = ureg();
        assert_eq!(ureg.unit("radian").unwrap().format_localized("~", Some("fr")).unwrap(), "");
        assert_eq!(ureg.unit("km/h").unwrap().format_localized("~", Some("fr")).unwrap(), "km par h");
    }

    #[test]
    fn test_serialize() {
        let ureg = ureg();
        let speed = ureg.unit("m/s").unwrap();
        let json = serde_json::to_string(&speed).unwrap();
        let restored = ureg.unit_from_json(&json).unwrap();
        assert_eq!(restored, speed);
    }

    #[test]
    fn test_serialize_fractional_exponent() {
        let ureg = ureg();
        let third = Number::from_str("1/3").unwrap();
        let root = ureg.unit("m").unwrap().pow(&Operand::from(&third)).unwrap();
        let json = serde_json::to_string(&root).unwrap();
        let restored = ureg.unit_from_json(&json).unwrap();
        assert_eq!(restored.units().get("meter"), Some(&third));
        assert_eq!(restored, root);
    }
}
