//! Contains the parsing of [`Literal`]s into values.
//!
//! Every spelling of a number (`16`, `0x10`, `1_6`) parses to the same
//! payload so that the instantiation keys built from them agree.

use constgen_term::{
    constant::{ConstValue, Value},
    expression::Literal,
    r#type::{Primitive, Type},
};

use crate::EvaluationError;

/// Parses the literal into a value of the expected domain.
///
/// The suffix of the literal takes part in deciding the domain: an
/// unsuffixed literal takes the expected domain, and without any context
/// integers default to `i32` and other numbers to `f64`.
///
/// # Errors
///
/// - [`EvaluationError::TypeMismatch`] if the suffix disagrees with the
///   expected domain.
/// - [`EvaluationError::InvalidLiteral`] if the text isn't a literal of the
///   domain.
/// - [`EvaluationError::Overflow`] if an integer doesn't fit the domain.
pub fn parse(
    literal: &Literal,
    expected: Option<&Type>,
) -> Result<ConstValue, EvaluationError> {
    let text = literal.text.trim();

    let expected = match expected {
        Some(Type::Primitive(primitive)) => Some(*primitive),
        Some(domain) => {
            return Err(EvaluationError::InvalidLiteral {
                text: literal.text.clone(),
                domain: domain.clone(),
            })
        }
        None => None,
    };

    let primitive = match (literal.suffix, expected) {
        (Some(suffix), Some(expected)) if suffix != expected => {
            return Err(EvaluationError::TypeMismatch {
                expected: Type::Primitive(expected),
                found: Type::Primitive(suffix),
            })
        }
        (Some(primitive), _) | (None, Some(primitive)) => primitive,
        (None, None) => default_primitive(text),
    };

    let invalid = || EvaluationError::InvalidLiteral {
        text: literal.text.clone(),
        domain: Type::Primitive(primitive),
    };

    match primitive {
        Primitive::Bool => match text {
            "true" => Ok(ConstValue::bool(true)),
            "false" => Ok(ConstValue::bool(false)),
            _ => Err(invalid()),
        },

        Primitive::Char => parse_char(text)
            .map(|character| {
                ConstValue::new(
                    Type::Primitive(Primitive::Char),
                    Value::Char(character),
                )
            })
            .ok_or_else(invalid),

        Primitive::Float32 | Primitive::Float64 => {
            let value = text
                .replace('_', "")
                .parse::<f64>()
                .map_err(|_| invalid())?;

            ConstValue::float(primitive, value).ok_or_else(invalid)
        }

        integer => {
            let value = parse_integer(text).ok_or_else(invalid)?;

            ConstValue::integer(integer, value)
                .ok_or(EvaluationError::Overflow(integer))
        }
    }
}

fn default_primitive(text: &str) -> Primitive {
    if text == "true" || text == "false" {
        Primitive::Bool
    } else if text.starts_with('\'') {
        Primitive::Char
    } else if parse_integer(text).is_some() {
        Primitive::Int32
    } else {
        Primitive::Float64
    }
}

/// Parses a decimal, `0x`, `0o` or `0b` integer with optional `_`
/// separators and an optional leading `-`.
fn parse_integer(text: &str) -> Option<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let digits = digits.replace('_', "");

    let (radix, body) = [("0x", 16), ("0o", 8), ("0b", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| {
            digits.strip_prefix(prefix).map(|body| (radix, body))
        })
        .unwrap_or((10, digits.as_str()));

    if body.is_empty() || body.starts_with(['+', '-']) {
        return None;
    }

    let magnitude = i128::from_str_radix(body, radix).ok()?;

    Some(if negative { -magnitude } else { magnitude })
}

fn parse_char(text: &str) -> Option<char> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();

    let character = match chars.next()? {
        '\\' => match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            _ => return None,
        },
        character => character,
    };

    chars.next().is_none().then_some(character)
}

#[cfg(test)]
mod test;
