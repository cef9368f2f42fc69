//! Quantity - a magnitude with a unit
//!
//! Quantities convert between units of equal dimensionality, or between
//! dimensionalities linked by the registry's active contexts.

use std::fmt;
use std::sync::Arc;
use num_complex::Complex64;
use metrum_core::{Number, NumberError};

use crate::context::{ContextParams, ContextRef};
use crate::{CompareOp, Dispatch, Operand, Unit, UnitError, UnitRegistry, UnitsContainer};

#[derive(Clone)]
pub struct Quantity {
    magnitude: Number,
    unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: impl Into<Number>, unit: Unit) -> Self {
        Self { magnitude: magnitude.into(), unit }
    }

    /// Plain number as a dimensionless quantity of `registry`
    pub fn dimensionless(registry: &Arc<UnitRegistry>, magnitude: impl Into<Number>) -> Self {
        Self::new(magnitude, Unit::dimensionless(registry))
    }

    pub fn magnitude(&self) -> &Number {
        &self.magnitude
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn units(&self) -> &UnitsContainer {
        self.unit.units()
    }

    pub fn registry(&self) -> &Arc<UnitRegistry> {
        self.unit.registry()
    }

    pub fn same_registry(&self, other: &Arc<UnitRegistry>) -> bool {
        self.unit.same_registry(other)
    }

    pub fn dimensionality(&self) -> Result<&UnitsContainer, UnitError> {
        self.unit.dimensionality()
    }

    pub fn is_dimensionless(&self) -> Result<bool, UnitError> {
        self.unit.is_dimensionless()
    }

    // ========== Conversion ==========

    pub fn to(&self, target: impl Into<Operand>) -> Result<Quantity, UnitError> {
        self.to_with(target, &[], &ContextParams::new())
    }

    /// Convert, with `contexts` active for the duration of the call
    pub fn to_with(
        &self,
        target: impl Into<Operand>,
        contexts: &[ContextRef],
        params: &ContextParams,
    ) -> Result<Quantity, UnitError> {
        let target = self.target_unit(target.into())?;
        let _guard = self.registry().enter(contexts, params)?;
        let magnitude = self.registry().convert(&self.magnitude, self.units(), target.units())?;
        Ok(Quantity::new(magnitude, target))
    }

    /// Magnitude in `target` units
    pub fn m_as(&self, target: impl Into<Operand>) -> Result<Number, UnitError> {
        Ok(self.to(target)?.magnitude)
    }

    pub fn to_root_units(&self) -> Result<Quantity, UnitError> {
        let (factor, root) = self.registry().get_root_units(self.units())?;
        Ok(Quantity::new(
            self.magnitude.mul(&factor),
            Unit::from_container(self.registry(), root),
        ))
    }

    /// Conversion target; a plain number stands for the dimensionless unit
    fn target_unit(&self, target: Operand) -> Result<Unit, UnitError> {
        match target {
            Operand::Unit(u) => self.checked(u),
            Operand::Quantity(q) => self.checked(q.unit),
            Operand::Number(_) => Ok(Unit::dimensionless(self.registry())),
            other => Unit::new(self.registry(), other),
        }
    }

    fn checked(&self, unit: Unit) -> Result<Unit, UnitError> {
        if unit.same_registry(self.registry()) {
            Ok(unit)
        } else {
            Err(UnitError::RegistryMismatch)
        }
    }

    /// Lift a numeric or unit-like operand to a quantity of this registry
    fn lift(&self, other: &Operand, op: &'static str) -> Result<Quantity, UnitError> {
        match other {
            Operand::Number(n) => Ok(Quantity::dimensionless(self.registry(), n.clone())),
            Operand::Unit(u) => Ok(self.checked(u.clone())?.unit_quantity()),
            Operand::Quantity(q) => {
                self.checked(q.unit.clone())?;
                Ok(q.clone())
            }
            Operand::Container(c) => Ok(Unit::from_container(self.registry(), c.clone()).unit_quantity()),
            other => Err(UnitError::unsupported(op, other.type_name())),
        }
    }

    // ========== Arithmetic ==========

    pub fn multiply(&self, other: &Operand) -> Result<Quantity, UnitError> {
        let other = self.lift(other, "*")?;
        Ok(Quantity::new(
            self.magnitude.mul(&other.magnitude),
            Unit::from_container(self.registry(), self.units().mul(other.units())),
        ))
    }

    pub fn divide(&self, other: &Operand) -> Result<Quantity, UnitError> {
        let other = self.lift(other, "/")?;
        Ok(Quantity::new(
            self.magnitude.checked_div(&other.magnitude)?,
            Unit::from_container(self.registry(), self.units().div(other.units())),
        ))
    }

    pub fn add(&self, other: &Operand) -> Result<Quantity, UnitError> {
        let other = self.lift(other, "+")?.m_as(&self.unit)?;
        Ok(Quantity::new(self.magnitude.add(&other), self.unit.clone()))
    }

    pub fn subtract(&self, other: &Operand) -> Result<Quantity, UnitError> {
        let other = self.lift(other, "-")?.m_as(&self.unit)?;
        Ok(Quantity::new(self.magnitude.sub(&other), self.unit.clone()))
    }

    /// Floor of the ratio after converting `other` to these units;
    /// dimensionless
    pub fn floor_divide(&self, other: &Operand) -> Result<Quantity, UnitError> {
        let other = self.lift(other, "//")?.m_as(&self.unit)?;
        let ratio = self.magnitude.checked_div(&other)?;
        Ok(Quantity::dimensionless(self.registry(), ratio.floor()))
    }

    /// Raise to a number or a dimensionless quantity
    pub fn pow(&self, exponent: &Operand) -> Result<Quantity, UnitError> {
        let exp = match exponent {
            Operand::Number(n) => n.clone(),
            Operand::Quantity(q) => {
                if !q.is_dimensionless()? {
                    return Err(UnitError::unsupported("**", exponent.type_name()));
                }
                q.m_as(UnitsContainer::new())?
            }
            other => return Err(UnitError::unsupported("**", other.type_name())),
        };
        let magnitude = self.magnitude.pow_real(&exp, self.registry().precision())?;
        Ok(Quantity::new(
            magnitude,
            Unit::from_container(self.registry(), self.units().pow(&exp)),
        ))
    }

    // ========== Equality and ordering ==========

    /// Equality against any operand. Zero compares by magnitude alone,
    /// dimensionless quantities compare with plain numbers, and quantities
    /// that cannot be converted are unequal.
    pub fn eq_operand(&self, other: &Operand) -> bool {
        match other {
            Operand::Quantity(q) => self.same_registry(q.registry()) && self.eq_quantity(q),
            Operand::Unit(u) => self.same_registry(u.registry()) && self.eq_quantity(&u.unit_quantity()),
            Operand::Number(n) => self.eq_number(n),
            _ => false,
        }
    }

    fn eq_number(&self, n: &Number) -> bool {
        if n.is_zero() {
            return self.magnitude.is_zero();
        }
        match self.is_dimensionless() {
            Ok(true) => self
                .m_as(UnitsContainer::new())
                .map(|m| m == *n)
                .unwrap_or(false),
            _ => false,
        }
    }

    fn eq_quantity(&self, other: &Quantity) -> bool {
        if self.magnitude.is_zero() && other.magnitude.is_zero() {
            return match (self.dimensionality(), other.dimensionality()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            };
        }
        if self.units() == other.units() {
            return self.magnitude == other.magnitude;
        }
        match self.m_as(&other.unit) {
            Ok(m) => m == other.magnitude,
            Err(_) => false,
        }
    }

    /// Ordering against numbers (dimensionless or zero only) and unit-like
    /// operands; anything else is left to the other operand
    pub fn compare(&self, other: &Operand, op: CompareOp) -> Result<Dispatch<bool>, UnitError> {
        let other = match other {
            Operand::Number(n) => return self.compare_number(n, op).map(Dispatch::Handled),
            Operand::Unit(_) | Operand::Container(_) | Operand::Quantity(_) => self.lift(other, op.symbol())?,
            _ => return Ok(Dispatch::NotApplicable),
        };

        if self.units() == other.units() {
            return Ok(Dispatch::Handled(op.apply(self.magnitude.cmp(&other.magnitude))));
        }
        let (dim, other_dim) = (self.dimensionality()?, other.dimensionality()?);
        if dim != other_dim {
            return Err(UnitError::dimensionality(self.units(), other.units(), dim, other_dim));
        }
        let lhs = self.to_root_units()?.magnitude;
        let rhs = other.to_root_units()?.magnitude;
        Ok(Dispatch::Handled(op.apply(lhs.cmp(&rhs))))
    }

    fn compare_number(&self, n: &Number, op: CompareOp) -> Result<bool, UnitError> {
        if self.is_dimensionless()? {
            let m = self.m_as(UnitsContainer::new())?;
            return Ok(op.apply(m.cmp(n)));
        }
        if n.is_zero() {
            return Ok(op.apply(self.magnitude.cmp(n)));
        }
        Err(UnitError::Incomparable(self.units().to_string()))
    }

    fn ordered(&self, other: Operand, op: CompareOp) -> Result<bool, UnitError> {
        match self.compare(&other, op)? {
            Dispatch::Handled(result) => Ok(result),
            Dispatch::NotApplicable => Err(UnitError::unsupported(op.symbol(), other.type_name())),
        }
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

    fn dimensionless_magnitude(&self) -> Result<Number, UnitError> {
        if !self.is_dimensionless()? {
            let empty = UnitsContainer::new();
            return Err(UnitError::dimensionality(self.units(), &empty, self.dimensionality()?, &empty));
        }
        self.m_as(UnitsContainer::new())
    }

    pub fn to_f64(&self) -> Result<f64, UnitError> {
        self.dimensionless_magnitude()?
            .to_f64()
            .ok_or(UnitError::Number(NumberError::Overflow))
    }

    /// Truncates toward zero
    pub fn to_i64(&self) -> Result<i64, UnitError> {
        self.dimensionless_magnitude()?
            .trunc()
            .to_i64()
            .ok_or(UnitError::Number(NumberError::Overflow))
    }

    pub fn to_complex(&self) -> Result<Complex64, UnitError> {
        Ok(Complex64::new(self.to_f64()?, 0.0))
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Quantity) -> bool {
        self.same_registry(other.registry()) && self.eq_quantity(other)
    }
}

impl PartialEq<Unit> for Quantity {
    fn eq(&self, other: &Unit) -> bool {
        other == self
    }
}

impl PartialEq<Number> for Quantity {
    fn eq(&self, other: &Number) -> bool {
        self.eq_number(other)
    }
}

impl PartialEq<i64> for Quantity {
    fn eq(&self, other: &i64) -> bool {
        self.eq_number(&Number::from_i64(*other))
    }
}

impl PartialEq<f64> for Quantity {
    fn eq(&self, other: &f64) -> bool {
        self.eq_number(&Number::from_f64(*other))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Quantity({}, '{}')>", self.magnitude, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ureg() -> Arc<UnitRegistry> {
        UnitRegistry::new()
    }

    #[test]
    fn test_to() {
        let ureg = ureg();
        let q = ureg.quantity(3, "km").unwrap();
        assert_eq!(q.m_as("m").unwrap(), Number::from_i64(3000));
        assert_eq!(q.to(ureg.unit("m").unwrap()).unwrap().units(), &UnitsContainer::single("meter"));
        assert!(q.to("s").unwrap_err().is_dimensionality());
    }

    #[test]
    fn test_to_dimensionless_target() {
        let ureg = ureg();
        let q = ureg.quantity(250, "percent").unwrap();
        assert_eq!(q.m_as(1).unwrap(), Number::from_str("2.5").unwrap());
    }

    #[test]
    fn test_to_with_context() {
        let ureg = ureg();
        let wavelength = ureg.quantity(500, "nm").unwrap();
        let frequency = wavelength
            .to_with("Hz", &["sp".into()], &ContextParams::new())
            .unwrap();
        let expected = 299_792_458.0 / 500e-9;
        let got = frequency.magnitude().to_f64().unwrap();
        assert!((got - expected).abs() / expected < 1e-12);
        assert!(!ureg.has_active_contexts());
    }

    #[test]
    fn test_to_with_refractive_index() {
        let ureg = ureg();
        let mut params = ContextParams::new();
        params.insert("n".to_string(), Number::from_i64(2));
        let q = ureg.quantity(1, "m").unwrap();
        let hz = q.to_with("Hz", &["sp".into()], &params).unwrap();
        assert_eq!(hz.magnitude(), &Number::from_i64(149_896_229));
    }

    #[test]
    fn test_to_root_units() {
        let ureg = ureg();
        let q = ureg.quantity(2, "kWh").unwrap();
        let root = q.to_root_units().unwrap();
        assert_eq!(
            root.units(),
            &UnitsContainer::from_pairs([("kilogram", 1), ("meter", 2), ("second", -2)])
        );
        assert_eq!(root.magnitude(), &Number::from_i64(7_200_000));
    }

    #[test]
    fn test_arithmetic() {
        let ureg = ureg();
        let a = ureg.quantity(1, "km").unwrap();
        let b = ureg.quantity(500, "m").unwrap();
        assert_eq!(a.add(&Operand::from(&b)).unwrap().magnitude(), &Number::from_str("1.5").unwrap());
        assert_eq!(a.subtract(&Operand::from(&b)).unwrap().magnitude(), &Number::from_str("0.5").unwrap());
        assert!(a.add(&Operand::from(ureg.quantity(1, "s").unwrap())).unwrap_err().is_dimensionality());

        let area = a.multiply(&Operand::from(&b)).unwrap();
        assert_eq!(area.units(), &UnitsContainer::from_pairs([("kilometer", 1), ("meter", 1)]));
        assert_eq!(area.magnitude(), &Number::from_i64(500));

        let ratio = a.floor_divide(&Operand::from(ureg.quantity(300, "m").unwrap())).unwrap();
        assert_eq!(ratio.magnitude(), &Number::from_i64(3));
        assert!(ratio.units().is_empty());
    }

    #[test]
    fn test_pow() {
        let ureg = ureg();
        let side = ureg.quantity(3, "m").unwrap();
        let area = side.pow(&Operand::from(2)).unwrap();
        assert_eq!(area.magnitude(), &Number::from_i64(9));
        assert_eq!(area.units().get("meter"), Some(&Number::from_i64(2)));
        assert!(matches!(side.pow(&Operand::from(&side)), Err(UnitError::UnsupportedOperand { .. })));
        let half = ureg.quantity(50, "percent").unwrap();
        assert_eq!(side.pow(&Operand::from(&half)).unwrap().units().get("meter"), Some(&Number::from_str("0.5").unwrap()));
    }

    #[test]
    fn test_pow_undefined_exponent_unit() {
        let ureg = ureg();
        let side = ureg.quantity(3, "m").unwrap();
        let bogus = Quantity::new(2, Unit::from_container(&ureg, UnitsContainer::single("furlong")));
        assert_eq!(
            side.pow(&Operand::from(&bogus)).unwrap_err(),
            UnitError::UndefinedUnit("furlong".to_string())
        );
    }

    #[test]
    fn test_unsupported_operand() {
        let q = ureg().quantity(1, "m").unwrap();
        let err = q.multiply(&Operand::from("m")).unwrap_err();
        assert_eq!(err, UnitError::unsupported("*", "str"));
    }

    #[test]
    fn test_equality() {
        let ureg = ureg();
        let km = ureg.quantity(1, "km").unwrap();
        assert_eq!(km, ureg.quantity(1000, "m").unwrap());
        assert_ne!(km, ureg.quantity(1, "m").unwrap());
        assert_ne!(km, ureg.quantity(1, "s").unwrap());
        assert_eq!(ureg.quantity(0, "m").unwrap(), ureg.quantity(0, "km").unwrap());
        assert_ne!(ureg.quantity(0, "m").unwrap(), ureg.quantity(0, "s").unwrap());
        assert_eq!(ureg.quantity(0, "m").unwrap(), 0_i64);
        assert_ne!(km, 1_i64);
        assert_eq!(ureg.quantity(50, "percent").unwrap(), 0.5_f64);
    }

    #[test]
    fn test_compare() {
        let ureg = ureg();
        let a = ureg.quantity(1, "km").unwrap();
        let b = ureg.quantity(999, "m").unwrap();
        assert!(a.gt(&b).unwrap());
        assert!(b.lt(&a).unwrap());
        assert!(a.ge(ureg.unit("m").unwrap()).unwrap());
        assert!(ureg.quantity(-1, "m").unwrap().lt(0).unwrap());
        assert!(matches!(a.lt(1), Err(UnitError::Incomparable(_))));
        assert!(a.lt(ureg.quantity(1, "s").unwrap()).unwrap_err().is_dimensionality());
        assert!(matches!(a.lt("m"), Err(UnitError::UnsupportedOperand { .. })));
    }

    #[test]
    fn test_coercion() {
        let ureg = ureg();
        let q = ureg.quantity(250, "percent").unwrap();
        assert_eq!(q.to_f64().unwrap(), 2.5);
        assert_eq!(q.to_i64().unwrap(), 2);
        assert_eq!(ureg.quantity(-250, "percent").unwrap().to_i64().unwrap(), -2);
        assert_eq!(q.to_complex().unwrap(), Complex64::new(2.5, 0.0));
        let err = ureg.quantity(1, "m").unwrap().to_f64().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot convert from 'meter' ([length]) to 'dimensionless' (dimensionless)"
        );
    }

    #[test]
    fn test_display() {
        let q = ureg().quantity(5, "m/s").unwrap();
        assert_eq!(q.to_string(), "5 meter / second");
        assert_eq!(format!("{:?}", q), "<Quantity(5, 'meter / second')>");
    }
}
