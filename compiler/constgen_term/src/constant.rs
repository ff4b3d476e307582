//! Contains the definition of [`ConstValue`], the fully-reduced value bound to
//! a value parameter.

use std::fmt;

use enum_as_inner::EnumAsInner;
use getset::Getters;
use serde::{Deserialize, Serialize};

use crate::{
    r#type::{Primitive, Type},
    write_separated,
};

/// A floating-point number stored as its raw IEEE-754 bits.
///
/// The derived equality, ordering and hashing are *structural*: `0.0` and
/// `-0.0` differ and `NaN` equals itself. Semantic comparison goes through
/// [`Value::semantic_eq`].
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Float(u64);

impl Float {
    /// Creates a [`Float`] from the given number.
    #[must_use]
    pub fn new(value: f64) -> Self { Self(value.to_bits()) }

    /// Returns the number this [`Float`] holds.
    #[must_use]
    pub fn get(self) -> f64 { f64::from_bits(self.0) }

    /// Returns the canonical representative of the number, `None` for `NaN`
    /// which has no representative since it's unequal to itself.
    #[must_use]
    pub fn canonical(self) -> Option<Self> {
        let value = self.get();

        if value.is_nan() {
            None
        } else if value == 0.0 {
            Some(Self::new(0.0))
        } else {
            Some(self)
        }
    }
}

impl fmt::Debug for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.get())
    }
}

impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.get())
    }
}

/// An enum variant value, e.g. `Mode::Fast` or `Shape::Square(3)`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Variant {
    /// The name of the variant.
    pub name: String,

    /// The field values of the variant, in declaration order.
    #[serde(default)]
    pub fields: Vec<Value>,
}

/// The payload of a [`ConstValue`].
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumAsInner,
    Serialize,
    Deserialize,
)]
#[allow(missing_docs)]
pub enum Value {
    /// Any fixed-width integer, range-checked against its domain.
    Integer(i128),
    Bool(bool),
    Char(char),
    Float(Float),
    Tuple(Vec<Value>),
    Array(Vec<Value>),
    Variant(Variant),
}

impl Value {
    /// Compares two values with the equality the language gives them: floats
    /// compare numerically (`0.0 == -0.0`, `NaN != NaN`), everything else
    /// structurally.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(lhs), Self::Float(rhs)) => lhs.get() == rhs.get(),
            (Self::Tuple(lhs), Self::Tuple(rhs))
            | (Self::Array(lhs), Self::Array(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs.iter().zip(rhs).all(|(lhs, rhs)| lhs.semantic_eq(rhs))
            }
            (Self::Variant(lhs), Self::Variant(rhs)) => {
                lhs.name == rhs.name
                    && lhs.fields.len() == rhs.fields.len()
                    && lhs
                        .fields
                        .iter()
                        .zip(&rhs.fields)
                        .all(|(lhs, rhs)| lhs.semantic_eq(rhs))
            }
            (lhs, rhs) => lhs == rhs,
        }
    }

    /// Returns `true` if the value is equal to itself under
    /// [`Self::semantic_eq`].
    #[must_use]
    pub fn is_reflexive(&self) -> bool { self.semantic_eq(self) }

    /// Returns the structural representative shared by every value that is
    /// semantically equal to this one, or `None` if the value isn't equal to
    /// itself.
    #[must_use]
    pub fn canonical(&self) -> Option<Self> {
        Some(match self {
            Self::Integer(_) | Self::Bool(_) | Self::Char(_) => self.clone(),
            Self::Float(float) => Self::Float(float.canonical()?),
            Self::Tuple(elements) => Self::Tuple(
                elements.iter().map(Self::canonical).collect::<Option<_>>()?,
            ),
            Self::Array(elements) => Self::Array(
                elements.iter().map(Self::canonical).collect::<Option<_>>()?,
            ),
            Self::Variant(variant) => Self::Variant(Variant {
                name: variant.name.clone(),
                fields: variant
                    .fields
                    .iter()
                    .map(Self::canonical)
                    .collect::<Option<_>>()?,
            }),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(integer) => write!(f, "{integer}"),
            Self::Bool(boolean) => write!(f, "{boolean}"),
            Self::Char(character) => write!(f, "{character:?}"),
            Self::Float(float) => write!(f, "{float}"),
            Self::Tuple(elements) => {
                write!(f, "(")?;
                write_separated(f, elements)?;
                if elements.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Self::Array(elements) => {
                write!(f, "[")?;
                write_separated(f, elements)?;
                write!(f, "]")
            }
            Self::Variant(variant) => {
                write!(f, "{}", variant.name)?;
                if !variant.fields.is_empty() {
                    write!(f, "(")?;
                    write_separated(f, &variant.fields)?;
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

/// A canonical, fully-reduced value tagged with its domain type.
///
/// Instances are produced by the constant evaluator or directly from a
/// literal and never change afterwards.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Getters,
)]
pub struct ConstValue {
    /// The domain type the value inhabits.
    #[get = "pub"]
    domain: Type,

    /// The payload of the value.
    #[get = "pub"]
    value: Value,
}

impl ConstValue {
    /// Creates a new [`ConstValue`] without checking the payload against the
    /// domain.
    #[must_use]
    pub const fn new(domain: Type, value: Value) -> Self {
        Self { domain, value }
    }

    /// Creates an integer value, returns `None` if `primitive` isn't an
    /// integer type or the value is out of its range.
    #[must_use]
    pub fn integer(primitive: Primitive, value: i128) -> Option<Self> {
        let (min, max) = primitive.integer_range()?;

        (min..=max).contains(&value).then(|| Self {
            domain: Type::Primitive(primitive),
            value: Value::Integer(value),
        })
    }

    /// Creates a `usize` value.
    #[must_use]
    pub fn usize(value: u64) -> Self {
        Self {
            domain: Type::Primitive(Primitive::Usize),
            value: Value::Integer(i128::from(value)),
        }
    }

    /// Creates a `bool` value.
    #[must_use]
    pub const fn bool(value: bool) -> Self {
        Self { domain: Type::Primitive(Primitive::Bool), value: Value::Bool(value) }
    }

    /// Creates a floating-point value; an `f32` domain rounds the number to
    /// single precision.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn float(primitive: Primitive, value: f64) -> Option<Self> {
        let value = match primitive {
            Primitive::Float32 => f64::from(value as f32),
            Primitive::Float64 => value,
            _ => return None,
        };

        Some(Self {
            domain: Type::Primitive(primitive),
            value: Value::Float(Float::new(value)),
        })
    }

    /// Returns the integer payload, if any.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i128> {
        match self.value {
            Value::Integer(integer) => Some(integer),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self.value {
            Value::Bool(boolean) => Some(boolean),
            _ => None,
        }
    }

    /// Converts an integer value into another integer domain, `None` if
    /// either side isn't an integer or the value doesn't fit.
    #[must_use]
    pub fn cast_integer(&self, target: Primitive) -> Option<Self> {
        Self::integer(target, self.as_integer()?)
    }

    /// Compares the values under the domain equality; values of different
    /// domains are never equal.
    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        self.domain == other.domain && self.value.semantic_eq(&other.value)
    }

    /// Returns `true` if the value is equal to itself under the domain
    /// equality.
    #[must_use]
    pub fn is_reflexive(&self) -> bool { self.value.is_reflexive() }

    /// Returns the canonical representative of this value, see
    /// [`Value::canonical`].
    #[must_use]
    pub fn canonical(&self) -> Option<Self> {
        Some(Self { domain: self.domain.clone(), value: self.value.canonical()? })
    }

    /// Consumes the value and returns the domain and the payload.
    #[must_use]
    pub fn into_parts(self) -> (Type, Value) { (self.domain, self.value) }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod test;
