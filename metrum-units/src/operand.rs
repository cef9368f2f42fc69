//! Operands and cooperative dispatch results
//!
//! Every operation that accepts "anything" takes an [`Operand`]: the closed
//! set of values units know how to meet. Operations that may decline return
//! [`Dispatch::NotApplicable`] so the caller can try the other operand's
//! handler instead.

use std::cmp::Ordering;
use std::fmt;
use metrum_core::Number;

use crate::{Quantity, Unit, UnitDefinition, UnitsContainer};

/// A value participating in unit algebra
#[derive(Debug, Clone)]
pub enum Operand {
    Number(Number),
    Text(String),
    Container(UnitsContainer),
    Definition(UnitDefinition),
    Unit(Unit),
    Quantity(Quantity),
    /// A value of a type this crate does not model, known by its type name
    Foreign(String),
}

impl Operand {
    /// Type name for error messages
    pub fn type_name(&self) -> &str {
        match self {
            Operand::Number(_) => "Number",
            Operand::Text(_) => "str",
            Operand::Container(_) => "UnitsContainer",
            Operand::Definition(_) => "UnitDefinition",
            Operand::Unit(_) => "Unit",
            Operand::Quantity(_) => "Quantity",
            Operand::Foreign(name) => name,
        }
    }

    pub fn into_unit(self) -> Option<Unit> {
        match self {
            Operand::Unit(u) => Some(u),
            _ => None,
        }
    }

    pub fn into_quantity(self) -> Option<Quantity> {
        match self {
            Operand::Quantity(q) => Some(q),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(n) => write!(f, "{}", n),
            Operand::Text(s) => write!(f, "'{}'", s),
            Operand::Container(c) => write!(f, "{}", c),
            Operand::Definition(d) => write!(f, "{}", d.name),
            Operand::Unit(u) => write!(f, "{}", u),
            Operand::Quantity(q) => write!(f, "{}", q),
            Operand::Foreign(name) => write!(f, "<{}>", name),
        }
    }
}

impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Operand::Unit(u), other) | (other, Operand::Unit(u)) => u.eq_operand(other),
            (Operand::Quantity(q), other) | (other, Operand::Quantity(q)) => q.eq_operand(other),
            (Operand::Number(a), Operand::Number(b)) => a == b,
            (Operand::Text(a), Operand::Text(b)) => a == b,
            (Operand::Container(a), Operand::Container(b)) => a == b,
            (Operand::Definition(a), Operand::Definition(b)) => a == b,
            (Operand::Foreign(a), Operand::Foreign(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Number> for Operand {
    fn from(n: Number) -> Self {
        Operand::Number(n)
    }
}

impl From<&Number> for Operand {
    fn from(n: &Number) -> Self {
        Operand::Number(n.clone())
    }
}

impl From<i64> for Operand {
    fn from(n: i64) -> Self {
        Operand::Number(Number::from_i64(n))
    }
}

impl From<i32> for Operand {
    fn from(n: i32) -> Self {
        Operand::Number(Number::from(n))
    }
}

impl From<f64> for Operand {
    fn from(f: f64) -> Self {
        Operand::Number(Number::from_f64(f))
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Text(s.to_string())
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::Text(s)
    }
}

impl From<UnitsContainer> for Operand {
    fn from(c: UnitsContainer) -> Self {
        Operand::Container(c)
    }
}

impl From<&UnitsContainer> for Operand {
    fn from(c: &UnitsContainer) -> Self {
        Operand::Container(c.clone())
    }
}

impl From<UnitDefinition> for Operand {
    fn from(d: UnitDefinition) -> Self {
        Operand::Definition(d)
    }
}

impl From<Unit> for Operand {
    fn from(u: Unit) -> Self {
        Operand::Unit(u)
    }
}

impl From<&Unit> for Operand {
    fn from(u: &Unit) -> Self {
        Operand::Unit(u.clone())
    }
}

impl From<Quantity> for Operand {
    fn from(q: Quantity) -> Self {
        Operand::Quantity(q)
    }
}

impl From<&Quantity> for Operand {
    fn from(q: &Quantity) -> Self {
        Operand::Quantity(q.clone())
    }
}

/// Outcome of an operation that may defer to the other operand
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch<T> {
    Handled(T),
    NotApplicable,
}

impl<T> Dispatch<T> {
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, Dispatch::NotApplicable)
    }

    pub fn handled(self) -> Option<T> {
        match self {
            Dispatch::Handled(v) => Some(v),
            Dispatch::NotApplicable => None,
        }
    }
}

/// Ordering comparisons routed through quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Ge,
    Gt,
}

impl CompareOp {
    pub fn apply(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Gt => ordering == Ordering::Greater,
        }
    }

    /// The operator to use with the operands swapped
    pub fn reflect(&self) -> CompareOp {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Ge => CompareOp::Le,
            CompareOp::Gt => CompareOp::Lt,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Operand::from(3).type_name(), "Number");
        assert_eq!(Operand::from("m").type_name(), "str");
        assert_eq!(Operand::from(UnitsContainer::new()).type_name(), "UnitsContainer");
        assert_eq!(Operand::Foreign("Series".to_string()).type_name(), "Series");
    }

    #[test]
    fn test_dispatch_handled() {
        let handled: Dispatch<i32> = Dispatch::Handled(2);
        assert_eq!(handled.handled(), Some(2));
        let declined: Dispatch<i32> = Dispatch::NotApplicable;
        assert!(declined.is_not_applicable());
        assert_eq!(declined.handled(), None);
    }

    #[test]
    fn test_compare_op() {
        assert!(CompareOp::Lt.apply(Ordering::Less));
        assert!(CompareOp::Le.apply(Ordering::Equal));
        assert!(!CompareOp::Gt.apply(Ordering::Equal));
        assert_eq!(CompareOp::Lt.reflect(), CompareOp::Gt);
        assert_eq!(CompareOp::Ge.reflect().reflect(), CompareOp::Ge);
    }

    #[test]
    fn test_plain_operand_equality() {
        assert_eq!(Operand::from(2), Operand::from(2.0));
        assert_ne!(Operand::from("m"), Operand::from(1));
    }
}
