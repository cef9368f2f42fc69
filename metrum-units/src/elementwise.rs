//! Elementwise numeric dispatch
//!
//! A [`UfuncCall`] names a binary numeric operation, how it is applied
//! (plain call, reduce, ...) and its operands. [`dispatch`] offers the call
//! to the handlers of the unit-like operands, highest priority first, one
//! handler per operand type. A handler may decline with
//! [`Dispatch::NotApplicable`]; when every handler declines the call fails
//! with [`UnitError::UfuncNotHandled`].

use std::collections::BTreeMap;
use metrum_core::Number;
use tracing::trace;

use crate::{Dispatch, Operand, Quantity, Unit, UnitError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ufunc {
    Add,
    Subtract,
    Multiply,
    Divide,
    TrueDivide,
    FloorDivide,
    Power,
}

impl Ufunc {
    pub fn name(&self) -> &'static str {
        match self {
            Ufunc::Add => "add",
            Ufunc::Subtract => "subtract",
            Ufunc::Multiply => "multiply",
            Ufunc::Divide => "divide",
            Ufunc::TrueDivide => "true_divide",
            Ufunc::FloorDivide => "floor_divide",
            Ufunc::Power => "power",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UfuncMethod {
    Call,
    Reduce,
    Accumulate,
    Outer,
    At,
    ReduceAt,
}

#[derive(Debug, Clone)]
pub struct UfuncCall {
    pub ufunc: Ufunc,
    pub method: UfuncMethod,
    pub inputs: Vec<Operand>,
    pub kwargs: BTreeMap<String, Operand>,
}

impl UfuncCall {
    /// Plain call with two inputs
    pub fn call(ufunc: Ufunc, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        UfuncCall {
            ufunc,
            method: UfuncMethod::Call,
            inputs: vec![lhs.into(), rhs.into()],
            kwargs: BTreeMap::new(),
        }
    }

    pub fn with_method(mut self, method: UfuncMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_kwarg(mut self, name: &str, value: impl Into<Operand>) -> Self {
        self.kwargs.insert(name.to_string(), value.into());
        self
    }

    /// Inputs followed by keyword values
    pub fn operands(&self) -> impl Iterator<Item = &Operand> {
        self.inputs.iter().chain(self.kwargs.values())
    }

    fn type_names(&self) -> String {
        self.operands().map(Operand::type_name).collect::<Vec<_>>().join(", ")
    }
}

/// Handler side of elementwise dispatch
pub trait ArrayUfunc {
    fn array_priority(&self) -> i32 {
        17
    }

    fn array_ufunc(&self, call: &UfuncCall) -> Result<Dispatch<Operand>, UnitError>;
}

/// Run an elementwise call
pub fn dispatch(call: &UfuncCall) -> Result<Operand, UnitError> {
    let mut unit_seen = false;
    let mut quantity_seen = false;
    let mut handlers: Vec<&dyn ArrayUfunc> = Vec::new();
    for operand in call.operands() {
        match operand {
            Operand::Unit(u) if !unit_seen => {
                unit_seen = true;
                handlers.push(u);
            }
            Operand::Quantity(q) if !quantity_seen => {
                quantity_seen = true;
                handlers.push(q);
            }
            _ => {}
        }
    }
    handlers.sort_by_key(|h| std::cmp::Reverse(h.array_priority()));

    for handler in handlers {
        if let Dispatch::Handled(result) = handler.array_ufunc(call)? {
            return Ok(result);
        }
    }

    if call.method == UfuncMethod::Call {
        if let [Operand::Number(a), Operand::Number(b)] = call.inputs.as_slice() {
            return Ok(Operand::Number(apply_numbers(call.ufunc, a, b)?));
        }
    }

    Err(UnitError::UfuncNotHandled { ufunc: call.ufunc.name(), types: call.type_names() })
}

fn apply_numbers(ufunc: Ufunc, a: &Number, b: &Number) -> Result<Number, UnitError> {
    let result = match ufunc {
        Ufunc::Add => a.add(b),
        Ufunc::Subtract => a.sub(b),
        Ufunc::Multiply => a.mul(b),
        Ufunc::Divide | Ufunc::TrueDivide => a.checked_div(b)?,
        Ufunc::FloorDivide => a.checked_div(b)?.floor(),
        Ufunc::Power => a.pow_real(b, metrum_core::DEFAULT_PRECISION)?,
    };
    Ok(result)
}

/// Whether any operand is a foreign type the registry defers to
fn has_upcast_operand(call: &UfuncCall, is_upcast: impl Fn(&str) -> bool) -> bool {
    call.operands().any(|op| matches!(op, Operand::Foreign(name) if is_upcast(name)))
}

impl ArrayUfunc for Unit {
    /// Only plain calls of the multiplicative operations are handled, by
    /// standing in `Quantity(1, self)` for this very operand
    fn array_ufunc(&self, call: &UfuncCall) -> Result<Dispatch<Operand>, UnitError> {
        if call.method != UfuncMethod::Call {
            return Ok(Dispatch::NotApplicable);
        }
        if has_upcast_operand(call, |name| self.registry().is_upcast_type(name)) {
            trace!(ufunc = call.ufunc.name(), "unit defers to upcast type");
            return Ok(Dispatch::NotApplicable);
        }

        match call.ufunc {
            Ufunc::Multiply | Ufunc::TrueDivide | Ufunc::Divide | Ufunc::FloorDivide => {
                let is_self = |arg: &Operand| matches!(arg, Operand::Unit(u) if std::ptr::eq(u, self));
                // only reachable as a keyword value; redispatching would loop
                if !call.inputs.iter().any(is_self) {
                    return Ok(Dispatch::NotApplicable);
                }
                let inputs = call
                    .inputs
                    .iter()
                    .map(|arg| if is_self(arg) { Operand::Quantity(self.unit_quantity()) } else { arg.clone() })
                    .collect();
                let substituted = UfuncCall { inputs, ..call.clone() };
                dispatch(&substituted).map(Dispatch::Handled)
            }
            _ => Ok(Dispatch::NotApplicable),
        }
    }
}

impl ArrayUfunc for Quantity {
    fn array_ufunc(&self, call: &UfuncCall) -> Result<Dispatch<Operand>, UnitError> {
        if call.method != UfuncMethod::Call {
            return Ok(Dispatch::NotApplicable);
        }
        if has_upcast_operand(call, |name| self.registry().is_upcast_type(name)) {
            trace!(ufunc = call.ufunc.name(), "quantity defers to upcast type");
            return Ok(Dispatch::NotApplicable);
        }
        let [lhs, rhs] = call.inputs.as_slice() else {
            return Ok(Dispatch::NotApplicable);
        };
        let liftable = |op: &Operand| {
            matches!(op, Operand::Number(_) | Operand::Unit(_) | Operand::Quantity(_) | Operand::Container(_))
        };
        if !liftable(lhs) || !liftable(rhs) {
            return Ok(Dispatch::NotApplicable);
        }

        let lhs = match lhs {
            Operand::Quantity(q) => q.clone(),
            other => Quantity::dimensionless(self.registry(), 1).multiply(other)?,
        };
        let result = match call.ufunc {
            Ufunc::Add => lhs.add(rhs)?,
            Ufunc::Subtract => lhs.subtract(rhs)?,
            Ufunc::Multiply => lhs.multiply(rhs)?,
            Ufunc::Divide | Ufunc::TrueDivide => lhs.divide(rhs)?,
            Ufunc::FloorDivide => lhs.floor_divide(rhs)?,
            Ufunc::Power => lhs.pow(rhs)?,
        };
        Ok(Dispatch::Handled(Operand::Quantity(result)))
    }
}
