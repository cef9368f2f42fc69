//! Built-in unit definitions, organized by category
//!
//! Each definition refers only to units defined before it, so the table can
//! be fed to [`UnitRegistry::define`](crate::UnitRegistry::define) in order.

use metrum_core::Number;

use crate::{BaseDimension, UnitDefinition, UnitsContainer};

struct DefinitionTable {
    definitions: Vec<UnitDefinition>,
}

impl DefinitionTable {
    fn base(&mut self, name: &str, symbol: &str, dimension: BaseDimension, aliases: &[&str]) {
        self.definitions
            .push(UnitDefinition::base(name, symbol, dimension).with_aliases(aliases));
    }

    fn scaled(&mut self, name: &str, symbol: &str, factor: Number, reference: &[(&str, i32)], aliases: &[&str]) {
        let reference = UnitsContainer::from_pairs(reference.iter().copied());
        self.definitions
            .push(UnitDefinition::scaled(name, symbol, factor, reference).with_aliases(aliases));
    }

    fn dimensionless(&mut self, name: &str, symbol: &str, factor: Number, aliases: &[&str]) {
        self.definitions
            .push(UnitDefinition::dimensionless(name, symbol, factor).with_aliases(aliases));
    }

    fn register_base_units(&mut self) {
        use BaseDimension::*;
        self.base("meter", "m", Length, &["metre"]);
        self.base("kilogram", "kg", Mass, &["kilogramme"]);
        self.base("second", "s", Time, &["sec"]);
        self.base("ampere", "A", Current, &["amp"]);
        self.base("kelvin", "K", Temperature, &[]);
        self.base("mole", "mol", Substance, &[]);
        self.base("candela", "cd", Luminosity, &[]);
    }

    fn register_length_units(&mut self) {
        let m = &[("meter", 1)];
        self.scaled("kilometer", "km", Number::from_i64(1000), m, &["kilometre"]);
        self.scaled("centimeter", "cm", Number::from_scientific(1, -2), m, &["centimetre"]);
        self.scaled("millimeter", "mm", Number::from_scientific(1, -3), m, &["millimetre"]);
        self.scaled("micrometer", "um", Number::from_scientific(1, -6), m, &["µm", "micron"]);
        self.scaled("nanometer", "nm", Number::from_scientific(1, -9), m, &["nanometre"]);
        self.scaled("angstrom", "Å", Number::from_scientific(1, -10), m, &[]);

        self.scaled("inch", "in", Number::from_scientific(254, -4), m, &[]);
        self.scaled("foot", "ft", Number::from_scientific(3048, -4), m, &["feet"]);
        self.scaled("yard", "yd", Number::from_scientific(9144, -4), m, &[]);
        self.scaled("mile", "mi", Number::from_scientific(1609344, -3), m, &[]);
    }

    fn register_mass_units(&mut self) {
        let kg = &[("kilogram", 1)];
        self.scaled("gram", "g", Number::from_scientific(1, -3), kg, &["gramme"]);
        self.scaled("milligram", "mg", Number::from_scientific(1, -6), kg, &[]);
        self.scaled("tonne", "t", Number::from_i64(1000), kg, &["metric_ton"]);
        self.scaled("pound", "lb", Number::from_scientific(45359237, -8), kg, &["lbs"]);
        self.scaled("ounce", "oz", Number::from_scientific(28349523125, -12), kg, &[]);
    }

    fn register_time_units(&mut self) {
        let s = &[("second", 1)];
        self.scaled("millisecond", "ms", Number::from_scientific(1, -3), s, &[]);
        self.scaled("minute", "min", Number::from_i64(60), s, &[]);
        self.scaled("hour", "h", Number::from_i64(3600), s, &["hr"]);
        self.scaled("day", "d", Number::from_i64(86400), s, &[]);
        self.scaled("week", "wk", Number::from_i64(604800), s, &[]);
    }

    fn register_derived_units(&mut self) {
        let one = Number::one;
        self.scaled("hertz", "Hz", one(), &[("second", -1)], &[]);
        self.scaled("newton", "N", one(), &[("kilogram", 1), ("meter", 1), ("second", -2)], &[]);
        self.scaled("joule", "J", one(), &[("newton", 1), ("meter", 1)], &[]);
        self.scaled("watt", "W", one(), &[("joule", 1), ("second", -1)], &[]);
        self.scaled("pascal", "Pa", one(), &[("newton", 1), ("meter", -2)], &[]);
        self.scaled("coulomb", "C", one(), &[("ampere", 1), ("second", 1)], &[]);
        self.scaled("volt", "V", one(), &[("watt", 1), ("ampere", -1)], &[]);
        self.scaled("ohm", "Ω", one(), &[("volt", 1), ("ampere", -1)], &[]);
        self.scaled("liter", "L", Number::from_scientific(1, -3), &[("meter", 3)], &["litre", "l"]);

        self.scaled("dyne", "dyn", Number::from_scientific(1, -5), &[("newton", 1)], &[]);
        self.scaled("erg", "erg", Number::from_scientific(1, -7), &[("joule", 1)], &[]);
        self.scaled("calorie", "cal", Number::from_scientific(4184, -3), &[("joule", 1)], &[]);
        self.scaled("electron_volt", "eV", Number::from_scientific(1602176634, -28), &[("joule", 1)], &[]);
        self.scaled("kilowatt_hour", "kWh", Number::from_i64(3_600_000), &[("joule", 1)], &[]);
        self.scaled("bar", "bar", Number::from_i64(100_000), &[("pascal", 1)], &[]);
    }

    fn register_dimensionless_units(&mut self) {
        self.dimensionless("radian", "rad", Number::one(), &[]);
        // pi / 180
        self.dimensionless("degree", "deg", Number::from_scientific(1745329251994329577, -20), &["°"]);
        self.dimensionless("percent", "%", Number::from_scientific(1, -2), &[]);
        self.dimensionless("dozen", "dz", Number::from_i64(12), &[]);
    }
}

/// Every definition of the default registry, dependencies first
pub(crate) fn default_definitions() -> Vec<UnitDefinition> {
    let mut table = DefinitionTable { definitions: Vec::new() };
    table.register_base_units();
    table.register_length_units();
    table.register_mass_units();
    table.register_time_units();
    table.register_derived_units();
    table.register_dimensionless_units();
    table.definitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seven_base_units() {
        let count = default_definitions().iter().filter(|d| d.is_base()).count();
        assert_eq!(count, 7);
    }

    #[test]
    fn test_names_are_unique() {
        let defs = default_definitions();
        let names: HashSet<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), defs.len());
    }

    #[test]
    fn test_references_defined_earlier() {
        let mut seen = HashSet::new();
        for def in default_definitions() {
            if let crate::DefinitionKind::Scaled { reference, .. } = &def.kind {
                for name in reference.names() {
                    assert!(seen.contains(name), "{} refers to {} before it is defined", def.name, name);
                }
            }
            seen.insert(def.name.clone());
        }
    }
}
