//! Systems of units
//!
//! A system is a named set of member unit names. A unit belongs to every
//! system that lists at least one of its constituent names.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    pub name: String,
    pub members: BTreeSet<String>,
}

impl System {
    pub fn new(name: &str, members: &[&str]) -> Self {
        System {
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn with_member(mut self, member: &str) -> Self {
        self.members.insert(member.to_string());
        self
    }

    pub fn contains(&self, unit_name: &str) -> bool {
        self.members.contains(unit_name)
    }
}

/// Systems every default registry starts with
pub(crate) fn builtin_systems() -> Vec<System> {
    vec![
        System::new(
            "SI",
            &[
                "meter", "kilogram", "second", "ampere", "kelvin", "mole", "candela",
                "newton", "joule", "watt", "pascal", "hertz", "coulomb", "volt", "radian",
            ],
        ),
        System::new("mks", &["meter", "kilogram", "second"]),
        System::new("cgs", &["centimeter", "gram", "second", "dyne", "erg"]),
        System::new("imperial", &["inch", "foot", "yard", "mile", "pound", "ounce"]),
    ]
}
