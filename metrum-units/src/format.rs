//! Unit formatting
//!
//! A format spec is a short string of flags. `~` asks for symbols instead of
//! names and is handled by the caller (it needs the registry); the last style
//! letter picks the layout:
//!
//! | flag | example                          |
//! |------|----------------------------------|
//! | `D`  | `kilogram * meter / second ** 2` |
//! | `P`  | `kilogram·meter/second²`         |
//! | `C`  | `kilogram*meter/second**2`       |
//! | `L`  | `\frac{\mathrm{kilogram} \cdot \mathrm{meter}}{\mathrm{second}^{2}}` |
//! | `H`  | `kilogram meter/second<sup>2</sup>` |

use metrum_core::Number;

use crate::UnitsContainer;

/// Short-form flag: render registry symbols instead of names
pub const SHORT_FLAG: char = '~';

/// Layout selected by a format spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatStyle {
    #[default]
    Default,
    Pretty,
    Compact,
    Latex,
    Html,
}

impl FormatStyle {
    /// Last recognised style letter wins; unknown characters are ignored
    pub fn from_spec(spec: &str) -> FormatStyle {
        spec.chars()
            .filter_map(|c| match c {
                'D' => Some(FormatStyle::Default),
                'P' => Some(FormatStyle::Pretty),
                'C' => Some(FormatStyle::Compact),
                'L' => Some(FormatStyle::Latex),
                'H' => Some(FormatStyle::Html),
                _ => None,
            })
            .last()
            .unwrap_or_default()
    }
}

/// Split the short-form flag off a spec: `("~P")` gives `(true, "P")`
pub fn extract_short_flag(spec: &str) -> (bool, String) {
    if spec.contains(SHORT_FLAG) {
        (true, spec.replace(SHORT_FLAG, ""))
    } else {
        (false, spec.to_string())
    }
}

/// How terms of a container are joined
pub(crate) struct TermFormat {
    pub product: &'static str,
    /// `{num}` / `{den}` joiner, applied pairwise
    pub division: fn(&str, &str) -> String,
    pub power: fn(&str, &Number) -> String,
    pub name: fn(&str) -> String,
    pub single_denominator: bool,
    pub parentheses: fn(&str) -> String,
}

impl TermFormat {
    pub(crate) fn for_style(style: FormatStyle) -> TermFormat {
        match style {
            FormatStyle::Default => TermFormat {
                product: " * ",
                division: |a, b| format!("{} / {}", a, b),
                power: |name, exp| format!("{} ** {}", name, exponent_text(exp)),
                name: str::to_string,
                single_denominator: false,
                parentheses: |s| format!("({})", s),
            },
            FormatStyle::Pretty => TermFormat {
                product: "·",
                division: |a, b| format!("{}/{}", a, b),
                power: |name, exp| format!("{}{}", name, superscript(&exponent_text(exp))),
                name: str::to_string,
                single_denominator: false,
                parentheses: |s| format!("({})", s),
            },
            FormatStyle::Compact => TermFormat {
                product: "*",
                division: |a, b| format!("{}/{}", a, b),
                power: |name, exp| format!("{}**{}", name, exponent_text(exp)),
                name: str::to_string,
                single_denominator: false,
                parentheses: |s| format!("({})", s),
            },
            FormatStyle::Latex => TermFormat {
                product: " \\cdot ",
                division: |a, b| format!("\\frac{{{}}}{{{}}}", a, b),
                power: |name, exp| format!("{}^{{{}}}", name, exponent_text(exp)),
                name: |n| format!("\\mathrm{{{}}}", n.replace('_', "\\_")),
                single_denominator: true,
                parentheses: |s| s.to_string(),
            },
            FormatStyle::Html => TermFormat {
                product: " ",
                division: |a, b| format!("{}/{}", a, b),
                power: |name, exp| format!("{}<sup>{}</sup>", name, exponent_text(exp)),
                name: str::to_string,
                single_denominator: true,
                parentheses: |s| format!("({})", s),
            },
        }
    }

    /// Numerator terms over denominator terms, `1` standing in for an
    /// empty numerator
    pub fn render(&self, units: &UnitsContainer) -> String {
        let mut pos_terms = Vec::new();
        let mut neg_terms = Vec::new();
        let minus_one = Number::from_i64(-1);

        for (name, exp) in units.iter() {
            let name = (self.name)(name);
            if exp.is_one() {
                pos_terms.push(name);
            } else if !exp.is_negative() {
                pos_terms.push((self.power)(&name, exp));
            } else if *exp == minus_one {
                neg_terms.push(name);
            } else {
                neg_terms.push((self.power)(&name, &exp.neg()));
            }
        }

        let numerator = if pos_terms.is_empty() {
            "1".to_string()
        } else {
            pos_terms.join(self.product)
        };
        if neg_terms.is_empty() {
            return numerator;
        }

        if self.single_denominator {
            let mut denominator = neg_terms.join(self.product);
            if neg_terms.len() > 1 {
                denominator = (self.parentheses)(&denominator);
            }
            (self.division)(&numerator, &denominator)
        } else {
            neg_terms
                .iter()
                .fold(numerator, |acc, term| (self.division)(&acc, term))
        }
    }
}

/// Render a container with a format spec (the short-form flag must already
/// be resolved by the caller)
pub fn format_unit(units: &UnitsContainer, spec: &str) -> String {
    if units.is_empty() {
        return if spec.ends_with('%') {
            String::new()
        } else {
            "dimensionless".to_string()
        };
    }
    TermFormat::for_style(FormatStyle::from_spec(spec)).render(units)
}

/// Exponent text: `2`, `0.5`, `-1`
pub fn exponent_text(exp: &Number) -> String {
    exp.as_compact()
}

/// Unicode superscript form of an exponent, e.g. `-2` becomes `⁻²`
pub fn superscript(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '0' => '⁰',
            '1' => '¹',
            '2' => '²',
            '3' => '³',
            '4' => '⁴',
            '5' => '⁵',
            '6' => '⁶',
            '7' => '⁷',
            '8' => '⁸',
            '9' => '⁹',
            '-' => '⁻',
            '.' => '·',
            other => other,
        })
        .collect()
}
