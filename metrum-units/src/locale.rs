//! Locale parsing and localized unit names
//!
//! A small built-in table covers common units in a handful of languages.
//! Anything missing falls back to the canonical name, so every valid locale
//! renders something sensible.

use std::fmt;

use crate::format::{FormatStyle, TermFormat};
use crate::{UnitError, UnitsContainer};

/// A parsed locale identifier such as `fr_FR`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    pub language: String,
    pub territory: Option<String>,
}

impl Locale {
    /// Parse `ll`, `ll_TT` or `ll-TT`
    pub fn parse(identifier: &str) -> Result<Locale, UnitError> {
        let invalid = || UnitError::InvalidLocale(identifier.to_string());
        let mut parts = identifier.trim().split(|c| c == '_' || c == '-');

        let language = parts.next().filter(|l| is_alpha(l, 2, 3)).ok_or_else(invalid)?;
        let territory = match parts.next() {
            Some(t) if is_alpha(t, 2, 2) => Some(t.to_uppercase()),
            Some(_) => return Err(invalid()),
            None => None,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Locale { language: language.to_lowercase(), territory })
    }
}

fn is_alpha(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphabetic())
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.territory {
            Some(t) => write!(f, "{}_{}", self.language, t),
            None => f.write_str(&self.language),
        }
    }
}

/// (canonical name, en, fr, de, es, it)
const UNIT_NAMES: &[(&str, [&str; 5])] = &[
    ("meter", ["meter", "mètre", "Meter", "metro", "metro"]),
    ("kilometer", ["kilometer", "kilomètre", "Kilometer", "kilómetro", "chilometro"]),
    ("centimeter", ["centimeter", "centimètre", "Zentimeter", "centímetro", "centimetro"]),
    ("millimeter", ["millimeter", "millimètre", "Millimeter", "milímetro", "millimetro"]),
    ("second", ["second", "seconde", "Sekunde", "segundo", "secondo"]),
    ("minute", ["minute", "minute", "Minute", "minuto", "minuto"]),
    ("hour", ["hour", "heure", "Stunde", "hora", "ora"]),
    ("day", ["day", "jour", "Tag", "día", "giorno"]),
    ("gram", ["gram", "gramme", "Gramm", "gramo", "grammo"]),
    ("kilogram", ["kilogram", "kilogramme", "Kilogramm", "kilogramo", "chilogrammo"]),
    ("liter", ["liter", "litre", "Liter", "litro", "litro"]),
    ("newton", ["newton", "newton", "Newton", "newton", "newton"]),
    ("joule", ["joule", "joule", "Joule", "julio", "joule"]),
    ("watt", ["watt", "watt", "Watt", "vatio", "watt"]),
    ("pascal", ["pascal", "pascal", "Pascal", "pascal", "pascal"]),
    ("kelvin", ["kelvin", "kelvin", "Kelvin", "kelvin", "kelvin"]),
    ("ampere", ["ampere", "ampère", "Ampere", "amperio", "ampere"]),
    ("mile", ["mile", "mille", "Meile", "milla", "miglio"]),
    ("foot", ["foot", "pied", "Fuß", "pie", "piede"]),
    ("inch", ["inch", "pouce", "Zoll", "pulgada", "pollice"]),
];

/// (language, "per" joiner)
const PER_PATTERNS: &[(&str, &str)] = &[
    ("en", "per"),
    ("fr", "par"),
    ("de", "pro"),
    ("es", "por"),
    ("it", "per"),
];

fn language_index(language: &str) -> Option<usize> {
    ["en", "fr", "de", "es", "it"].iter().position(|l| *l == language)
}

/// Localized name of a unit, falling back to the name itself
pub fn localized_name(name: &str, locale: &Locale) -> String {
    language_index(&locale.language)
        .and_then(|idx| {
            UNIT_NAMES
                .iter()
                .find(|(canonical, _)| *canonical == name)
                .map(|(_, names)| names[idx].to_string())
        })
        .unwrap_or_else(|| name.to_string())
}

fn per_word(locale: &Locale) -> &'static str {
    PER_PATTERNS
        .iter()
        .find(|(lang, _)| *lang == locale.language)
        .map(|(_, per)| *per)
        .unwrap_or("per")
}

/// Render a container in words for a locale: `kilomètre par heure`. The
/// style letters of `spec` pick products and exponents; division is always
/// the localized "per".
pub fn format_localized(units: &UnitsContainer, spec: &str, locale: &Locale) -> String {
    if units.is_empty() {
        return "dimensionless".to_string();
    }
    let localized = units.map_names(|name| localized_name(name, locale));
    let per = per_word(locale);

    let formatter = TermFormat {
        division: |a, b| format!("{a} {{per}} {b}"),
        single_denominator: true,
        ..TermFormat::for_style(FormatStyle::from_spec(spec))
    };
    formatter.render(&localized).replace("{per}", per)
}
