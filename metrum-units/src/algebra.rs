//! Operator overloads for units and quantities
//!
//! | op  | left      | right     | result                              |
//! |-----|-----------|-----------|-------------------------------------|
//! | `*` | Unit      | Unit      | Unit, exponents added               |
//! | `*` | Unit      | Container | Unit, exponents added               |
//! | `*` | Unit      | 1         | `Quantity(1, unit)`                 |
//! | `*` | Unit      | number    | `Quantity(n, unit)`                 |
//! | `*` | Unit      | Quantity  | `Quantity(1, unit) * q`             |
//! | `*` | number    | Unit      | same as Unit * number               |
//! | `/` | Unit      | Unit      | Unit, exponents subtracted          |
//! | `/` | Unit      | number    | `Quantity(1/n, unit)`               |
//! | `/` | Unit      | Quantity  | `Quantity(1, unit) / q`             |
//! | `/` | number    | Unit      | `Quantity(n, 1/unit)`               |
//! | `/` | Container | Unit      | Unit                                |
//! | `**`| Unit      | number    | Unit, exponents scaled              |
//! | `**`| Unit      | other     | `UnitError::UnsupportedExponent`    |
//!
//! Operators that can fail (registry mismatch, division by zero) return
//! `Result`.

use std::ops::{Div, Mul};
use metrum_core::Number;

use crate::{Operand, Quantity, Unit, UnitError};

fn expect_unit(result: Operand) -> Result<Unit, UnitError> {
    match result {
        Operand::Unit(u) => Ok(u),
        other => Err(UnitError::unsupported("unit algebra", other.type_name())),
    }
}

fn expect_quantity(result: Operand) -> Result<Quantity, UnitError> {
    match result {
        Operand::Quantity(q) => Ok(q),
        other => Err(UnitError::unsupported("unit algebra", other.type_name())),
    }
}

impl Mul<&Unit> for &Unit {
    type Output = Result<Unit, UnitError>;

    fn mul(self, rhs: &Unit) -> Self::Output {
        expect_unit(self.multiply(&Operand::from(rhs))?)
    }
}

impl Div<&Unit> for &Unit {
    type Output = Result<Unit, UnitError>;

    fn div(self, rhs: &Unit) -> Self::Output {
        expect_unit(self.divide(&Operand::from(rhs))?)
    }
}

impl Mul for Unit {
    type Output = Result<Unit, UnitError>;

    fn mul(self, rhs: Unit) -> Self::Output {
        &self * &rhs
    }
}

impl Div for Unit {
    type Output = Result<Unit, UnitError>;

    fn div(self, rhs: Unit) -> Self::Output {
        &self / &rhs
    }
}

impl Mul<Number> for &Unit {
    type Output = Quantity;

    fn mul(self, rhs: Number) -> Quantity {
        Quantity::new(rhs, self.clone())
    }
}

impl Mul<f64> for &Unit {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        self * Number::from_f64(rhs)
    }
}

impl Mul<&Unit> for Number {
    type Output = Quantity;

    fn mul(self, rhs: &Unit) -> Quantity {
        rhs * self
    }
}

impl Mul<&Unit> for f64 {
    type Output = Quantity;

    fn mul(self, rhs: &Unit) -> Quantity {
        rhs * self
    }
}

impl Div<Number> for &Unit {
    type Output = Result<Quantity, UnitError>;

    fn div(self, rhs: Number) -> Self::Output {
        expect_quantity(self.divide(&Operand::Number(rhs))?)
    }
}

impl Div<f64> for &Unit {
    type Output = Result<Quantity, UnitError>;

    fn div(self, rhs: f64) -> Self::Output {
        self / Number::from_f64(rhs)
    }
}

impl Div<&Unit> for Number {
    type Output = Quantity;

    fn div(self, rhs: &Unit) -> Quantity {
        Quantity::new(self, Unit::from_container(rhs.registry(), rhs.units().invert()))
    }
}

impl Div<&Unit> for f64 {
    type Output = Quantity;

    fn div(self, rhs: &Unit) -> Quantity {
        Number::from_f64(self) / rhs
    }
}

impl Mul<&Quantity> for &Unit {
    type Output = Result<Quantity, UnitError>;

    fn mul(self, rhs: &Quantity) -> Self::Output {
        expect_quantity(self.multiply(&Operand::from(rhs))?)
    }
}

impl Div<&Quantity> for &Unit {
    type Output = Result<Quantity, UnitError>;

    fn div(self, rhs: &Quantity) -> Self::Output {
        expect_quantity(self.divide(&Operand::from(rhs))?)
    }
}

impl Mul<&Unit> for &Quantity {
    type Output = Result<Quantity, UnitError>;

    fn mul(self, rhs: &Unit) -> Self::Output {
        self.multiply(&Operand::from(rhs))
    }
}

impl Div<&Unit> for &Quantity {
    type Output = Result<Quantity, UnitError>;

    fn div(self, rhs: &Unit) -> Self::Output {
        self.divide(&Operand::from(rhs))
    }
}

impl Mul<&Quantity> for &Quantity {
    type Output = Result<Quantity, UnitError>;

    fn mul(self, rhs: &Quantity) -> Self::Output {
        self.multiply(&Operand::from(rhs))
    }
}

impl Div<&Quantity> for &Quantity {
    type Output = Result<Quantity, UnitError>;

    fn div(self, rhs: &Quantity) -> Self::Output {
        self.divide(&Operand::from(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{UnitRegistry, UnitsContainer};

    #[test]
    fn test_unit_operators() {
        let ureg = UnitRegistry::new();
        let m = ureg.unit("m").unwrap();
        let s = ureg.unit("s").unwrap();
        let speed = (&m / &s).unwrap();
        assert_eq!(speed, ureg.unit("m/s").unwrap());
        assert_eq!((&speed * &s).unwrap(), m);
        assert_eq!((m.clone() * m.clone()).unwrap(), m.powi(2));
    }

    #[test]
    fn test_scalar_operators() {
        let ureg = UnitRegistry::new();
        let m = ureg.unit("m").unwrap();
        assert_eq!(&m * 2.0, ureg.quantity(2, "m").unwrap());
        assert_eq!(2.0 * &m, ureg.quantity(2, "m").unwrap());
        assert_eq!((&m / 4.0).unwrap().magnitude(), &Number::from_str("0.25").unwrap());
        assert!((&m / 0.0).is_err());

        let inverse = Number::from_i64(3) / &m;
        assert_eq!(inverse.magnitude(), &Number::from_i64(3));
        assert_eq!(inverse.units(), &UnitsContainer::from_pairs([("meter", -1)]));
    }

    #[test]
    fn test_quantity_operators() {
        let ureg = UnitRegistry::new();
        let s = ureg.unit("s").unwrap();
        let distance = ureg.quantity(10, "m").unwrap();
        let speed = (&distance / &s).unwrap();
        assert_eq!(speed, ureg.quantity(10, "m/s").unwrap());
        assert_eq!((&s * &speed).unwrap(), distance);
        assert_eq!((&speed * &s).unwrap(), distance);
        let rate = (&s / &distance).unwrap();
        assert_eq!(rate.units(), &UnitsContainer::from_pairs([("second", 1), ("meter", -1)]));
    }

    #[test]
    fn test_operator_registry_mismatch() {
        let a = UnitRegistry::new().unit("m").unwrap();
        let b = UnitRegistry::new().unit("m").unwrap();
        assert_eq!((&a * &b).unwrap_err(), UnitError::RegistryMismatch);
    }
}
