//! Unit expression parsing - expressions like "km/h", "kg*m/s^2" or "m²"
//!
//! Grammar:
//!
//! ```text
//! expr   := term (('*' | '·' | '/' | <juxtaposition>) term)*
//! term   := factor (('**' | '^') exponent | superscript)?
//! factor := name | '1' | '(' expr ')'
//! exponent := signed decimal, optionally parenthesised
//! ```
//!
//! Multiplication and division share one precedence level and associate to
//! the left, so `J/kg/K` is `J / (kg K)`.

use metrum_core::Number;

use crate::{UnitError, UnitsContainer};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Number(String),
    Star,
    Slash,
    Pow,
    Superscript(String),
    LParen,
    RParen,
}

fn superscript_digit(c: char) -> Option<char> {
    let digit = match c {
        '⁰' => '0',
        '¹' => '1',
        '²' => '2',
        '³' => '3',
        '⁴' => '4',
        '⁵' => '5',
        '⁶' => '6',
        '⁷' => '7',
        '⁸' => '8',
        '⁹' => '9',
        '⁻' => '-',
        _ => return None,
    };
    Some(digit)
}

fn is_name_start(c: char) -> bool {
    (c.is_alphabetic() || c == '_' || c == '%' || c == 'Ω') && superscript_digit(c).is_none()
}

fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn tokenize(input: &str) -> Result<Vec<Token>, UnitError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            '*' | '·' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Pow);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if superscript_digit(c).is_some() => {
                let mut exp = String::new();
                while let Some(d) = chars.get(i).and_then(|c| superscript_digit(*c)) {
                    exp.push(d);
                    i += 1;
                }
                tokens.push(Token::Superscript(exp));
            }
            c if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                tokens.push(Token::Number(chars[start..i].iter().collect()));
            }
            c if is_name_start(c) => {
                let start = i;
                i += 1;
                while i < chars.len() && is_name_char(chars[i]) && superscript_digit(chars[i]).is_none() {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            other => {
                return Err(UnitError::Parse(format!("unexpected character '{}' in '{}'", other, input)));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a, F> {
    tokens: Vec<Token>,
    pos: usize,
    input: &'a str,
    resolve: F,
}

impl<'a, F> Parser<'a, F>
where
    F: Fn(&str) -> Result<String, UnitError>,
{
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn error(&self, msg: &str) -> UnitError {
        UnitError::Parse(format!("{} in '{}'", msg, self.input))
    }

    fn expr(&mut self) -> Result<UnitsContainer, UnitError> {
        let mut result = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    result = result.mul(&self.term()?);
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    result = result.div(&self.term()?);
                }
                Some(Token::Name(_)) | Some(Token::Number(_)) | Some(Token::LParen) => {
                    result = result.mul(&self.term()?);
                }
                _ => return Ok(result),
            }
        }
    }

    fn term(&mut self) -> Result<UnitsContainer, UnitError> {
        let base = self.factor()?;
        match self.peek() {
            Some(Token::Pow) => {
                self.pos += 1;
                let exp = self.exponent()?;
                Ok(base.pow(&exp))
            }
            Some(Token::Superscript(text)) => {
                let exp = Number::from_str(text).map_err(|_| self.error("invalid superscript exponent"))?;
                self.pos += 1;
                Ok(base.pow(&exp))
            }
            _ => Ok(base),
        }
    }

    fn exponent(&mut self) -> Result<Number, UnitError> {
        match self.next() {
            Some(Token::Number(text)) => {
                Number::from_str(&text).map_err(|_| self.error("invalid exponent"))
            }
            Some(Token::LParen) => {
                let exp = self.exponent()?;
                match self.next() {
                    Some(Token::RParen) => Ok(exp),
                    _ => Err(self.error("expected ')' after exponent")),
                }
            }
            _ => Err(self.error("expected exponent")),
        }
    }

    fn factor(&mut self) -> Result<UnitsContainer, UnitError> {
        match self.next() {
            Some(Token::Name(name)) => Ok(UnitsContainer::single((self.resolve)(&name)?)),
            Some(Token::Number(text)) => match Number::from_str(&text) {
                Ok(n) if n.is_one() => Ok(UnitsContainer::new()),
                _ => Err(self.error("unit expressions cannot have a scaling factor")),
            },
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.error("unbalanced parentheses")),
                }
            }
            Some(_) => Err(self.error("unexpected operator")),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

/// Parse a unit expression into a container of canonical names.
///
/// `resolve` maps each name, symbol or alias to its canonical name.
/// The empty string and `dimensionless` give the empty container.
pub(crate) fn parse_expression<F>(input: &str, resolve: F) -> Result<UnitsContainer, UnitError>
where
    F: Fn(&str) -> Result<String, UnitError>,
{
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed == "dimensionless" {
        return Ok(UnitsContainer::new());
    }

    let tokens = tokenize(trimmed)?;
    let mut parser = Parser { tokens, pos: 0, input: trimmed, resolve };
    let units = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(units)
}

/// Split "5.2e3 km/h" into its magnitude text and unit text. Text without a
/// leading number has an implicit magnitude of one.
pub(crate) fn split_quantity(input: &str) -> Result<(Number, &str), UnitError> {
    let s = input.trim();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    if end == digits_start {
        return Ok((Number::one(), s));
    }
    // Exponent only when digits follow, so "5 erg" and "5em" keep their units
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    let magnitude = Number::from_str(&s[..end])
        .map_err(|_| UnitError::Parse(format!("invalid magnitude in '{}'", s)))?;
    Ok((magnitude, s[end..].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(name: &str) -> Result<String, UnitError> {
        match name {
            "m" | "meter" => Ok("meter".to_string()),
            "s" | "second" => Ok("second".to_string()),
            "kg" => Ok("kilogram".to_string()),
            "km" => Ok("kilometer".to_string()),
            "h" => Ok("hour".to_string()),
            other => Err(UnitError::UndefinedUnit(other.to_string())),
        }
    }

    fn parse(s: &str) -> Result<UnitsContainer, UnitError> {
        parse_expression(s, resolve)
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(parse("m").unwrap(), UnitsContainer::single("meter"));
    }

    #[test]
    fn test_quotient() {
        let expected = UnitsContainer::from_pairs([("kilometer", 1), ("hour", -1)]);
        assert_eq!(parse("km/h").unwrap(), expected);
    }

    #[test]
    fn test_powers() {
        let expected = UnitsContainer::from_pairs([("kilogram", 1), ("meter", 1), ("second", -2)]);
        assert_eq!(parse("kg*m/s^2").unwrap(), expected);
        assert_eq!(parse("kg * m / s ** 2").unwrap(), expected);
        assert_eq!(parse("kg·m/s²").unwrap(), expected);
        assert_eq!(parse("kg m s⁻²").unwrap(), expected);
        assert_eq!(parse("kg m s**(-2)").unwrap(), expected);
    }

    #[test]
    fn test_left_associative_division() {
        let expected = UnitsContainer::from_pairs([("meter", 1), ("second", -1), ("kilogram", -1)]);
        assert_eq!(parse("m/s/kg").unwrap(), expected);
        assert_eq!(parse("m/(s*kg)").unwrap(), expected);
    }

    #[test]
    fn test_decimal_exponent() {
        let c = parse("m**0.5").unwrap();
        assert_eq!(c.get("meter"), Some(&Number::from_str("0.5").unwrap()));
    }

    #[test]
    fn test_one_and_dimensionless() {
        assert_eq!(parse("1/s").unwrap(), UnitsContainer::from_pairs([("second", -1)]));
        assert!(parse("").unwrap().is_empty());
        assert!(parse("dimensionless").unwrap().is_empty());
        assert!(parse("m/m").unwrap().is_empty());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("furlong"), Err(UnitError::UndefinedUnit(_))));
        assert!(matches!(parse("m/"), Err(UnitError::Parse(_))));
        assert!(matches!(parse("(m"), Err(UnitError::Parse(_))));
        assert!(matches!(parse("2 m"), Err(UnitError::Parse(_))));
        assert!(matches!(parse("m ** x"), Err(UnitError::Parse(_))));
        assert!(matches!(parse("m $"), Err(UnitError::Parse(_))));
    }

    #[test]
    fn test_split_quantity() {
        let (mag, units) = split_quantity("5 km/h").unwrap();
        assert_eq!(mag, Number::from_i64(5));
        assert_eq!(units, "km/h");

        let (mag, units) = split_quantity("-2.5e3m").unwrap();
        assert_eq!(mag, Number::from_i64(-2500));
        assert_eq!(units, "m");

        let (mag, units) = split_quantity("5 erg").unwrap();
        assert_eq!(mag, Number::from_i64(5));
        assert_eq!(units, "erg");

        let (mag, units) = split_quantity("meter").unwrap();
        assert!(mag.is_one());
        assert_eq!(units, "meter");
    }
}
