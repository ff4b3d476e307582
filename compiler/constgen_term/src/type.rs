//! Contains the definition of the [`Type`] term.

use std::{collections::BTreeSet, fmt};

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::{
    expression::ConstExpr, generic_arguments::GenericArguments,
    lifetime::Lifetime, write_separated,
};

/// Contains all primitive types in the language.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumAsInner,
    Serialize,
    Deserialize,
    derive_more::Display,
    EnumIter,
)]
#[allow(missing_docs)]
pub enum Primitive {
    #[display(fmt = "i8")]
    Int8,
    #[display(fmt = "i16")]
    Int16,
    #[display(fmt = "i32")]
    Int32,
    #[display(fmt = "i64")]
    Int64,
    #[display(fmt = "u8")]
    Uint8,
    #[display(fmt = "u16")]
    Uint16,
    #[display(fmt = "u32")]
    Uint32,
    #[display(fmt = "u64")]
    Uint64,
    #[display(fmt = "isize")]
    Isize,
    #[display(fmt = "usize")]
    Usize,
    #[display(fmt = "bool")]
    Bool,
    #[display(fmt = "char")]
    Char,
    #[display(fmt = "f32")]
    Float32,
    #[display(fmt = "f64")]
    Float64,
}

impl Primitive {
    /// Looks up the primitive type spelled as a literal suffix, e.g. `u8` in
    /// `255u8`.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::iter().find(|primitive| primitive.to_string() == suffix)
    }

    /// Returns `true` if the primitive is a fixed-width integer type.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        self.integer_range().is_some()
    }

    /// Returns `true` if the primitive is a floating-point type.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Returns the inclusive range of values representable by the integer
    /// type, `None` if the primitive isn't an integer.
    ///
    /// The pointer-sized integers are treated as 64-bit wide.
    #[must_use]
    pub const fn integer_range(self) -> Option<(i128, i128)> {
        match self {
            Self::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::Int64 | Self::Isize => {
                Some((i64::MIN as i128, i64::MAX as i128))
            }
            Self::Uint8 => Some((0, u8::MAX as i128)),
            Self::Uint16 => Some((0, u16::MAX as i128)),
            Self::Uint32 => Some((0, u32::MAX as i128)),
            Self::Uint64 | Self::Usize => Some((0, u64::MAX as i128)),
            Self::Bool | Self::Char | Self::Float32 | Self::Float64 => None,
        }
    }
}

/// Represents a reference type, denoted by `&'LIFETIME TYPE` syntax.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Reference {
    /// The lifetime that the reference lives in.
    pub lifetime: Lifetime,

    /// The type that the reference points to.
    pub pointee: Box<Type>,
}

/// Represents an array type, denoted by `[ELEMENT; LENGTH]` syntax.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Array {
    /// The type of the elements in the array.
    pub r#type: Box<Type>,

    /// Constant representing the length of the array, of type `usize`.
    pub length: Box<ConstExpr>,
}

/// Represents a user-declared struct or enum instantiated with generic
/// arguments, e.g. `Bar<3>` or `T<n + 1>`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Symbol {
    /// The name of the declared symbol.
    pub name: String,

    /// The generic arguments supplied to the symbol.
    #[serde(default)]
    pub generic_arguments: GenericArguments,
}

/// Represents a type term.
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
pub enum Type {
    Primitive(Primitive),

    /// A reference to a type parameter, e.g. `T`.
    Parameter(String),

    Array(Array),

    /// A tuple type; the unit type is the empty tuple.
    Tuple(Vec<Type>),

    Reference(Reference),

    Symbol(Symbol),
}

impl Type {
    /// The unit type `()`.
    #[must_use]
    pub const fn unit() -> Self { Self::Tuple(Vec::new()) }

    /// Creates an array type `[element; length]`.
    #[must_use]
    pub fn array(element: Self, length: ConstExpr) -> Self {
        Self::Array(Array {
            r#type: Box::new(element),
            length: Box::new(length),
        })
    }

    /// Creates a reference type `&'_ pointee`.
    #[must_use]
    pub fn reference(pointee: Self) -> Self {
        Self::Reference(Reference {
            lifetime: Lifetime::Erased,
            pointee: Box::new(pointee),
        })
    }

    /// Creates a symbol type `name<constants...>` without lifetime or type
    /// arguments.
    #[must_use]
    pub fn symbol_with_constants(
        name: impl Into<String>,
        constants: impl IntoIterator<Item = ConstExpr>,
    ) -> Self {
        Self::Symbol(Symbol {
            name: name.into(),
            generic_arguments: GenericArguments {
                lifetimes: Vec::new(),
                types: Vec::new(),
                constants: constants.into_iter().collect(),
            },
        })
    }

    /// Invokes `f` on every constant expression appearing directly or nested
    /// in this type.
    pub fn for_each_constant(&self, f: &mut impl FnMut(&ConstExpr)) {
        match self {
            Self::Primitive(_) | Self::Parameter(_) => {}
            Self::Array(array) => {
                array.r#type.for_each_constant(f);
                f(&array.length);
            }
            Self::Tuple(elements) => {
                for element in elements {
                    element.for_each_constant(f);
                }
            }
            Self::Reference(reference) => reference.pointee.for_each_constant(f),
            Self::Symbol(symbol) => {
                for ty in &symbol.generic_arguments.types {
                    ty.for_each_constant(f);
                }
                for constant in &symbol.generic_arguments.constants {
                    f(constant);
                }
            }
        }
    }

    /// Invokes `f` on every constant expression appearing directly or nested
    /// in this type, allowing it to be replaced.
    pub fn for_each_constant_mut(&mut self, f: &mut impl FnMut(&mut ConstExpr)) {
        match self {
            Self::Primitive(_) | Self::Parameter(_) => {}
            Self::Array(array) => {
                array.r#type.for_each_constant_mut(f);
                f(&mut array.length);
            }
            Self::Tuple(elements) => {
                for element in elements {
                    element.for_each_constant_mut(f);
                }
            }
            Self::Reference(reference) => {
                reference.pointee.for_each_constant_mut(f);
            }
            Self::Symbol(symbol) => {
                for ty in &mut symbol.generic_arguments.types {
                    ty.for_each_constant_mut(f);
                }
                for constant in &mut symbol.generic_arguments.constants {
                    f(constant);
                }
            }
        }
    }

    /// Collects the names of every type parameter this type mentions.
    #[must_use]
    pub fn type_parameters(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_type_parameters(&mut names);
        names
    }

    fn collect_type_parameters(&self, names: &mut BTreeSet<String>) {
        match self {
            Self::Primitive(_) => {}
            Self::Parameter(name) => {
                names.insert(name.clone());
            }
            Self::Array(array) => array.r#type.collect_type_parameters(names),
            Self::Tuple(elements) => {
                for element in elements {
                    element.collect_type_parameters(names);
                }
            }
            Self::Reference(reference) => {
                reference.pointee.collect_type_parameters(names);
            }
            Self::Symbol(symbol) => {
                for ty in &symbol.generic_arguments.types {
                    ty.collect_type_parameters(names);
                }
            }
        }
    }

    /// Collects the names of every value parameter referenced by the constant
    /// expressions inside this type.
    #[must_use]
    pub fn value_parameters(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.for_each_constant(&mut |constant| {
            names.extend(constant.parameters());
        });
        names
    }

    /// Returns `true` if every constant expression inside this type has
    /// already been reduced to a value and no type parameter is mentioned.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        let mut reduced = true;
        self.for_each_constant(&mut |constant| {
            reduced &= constant.is_value();
        });

        reduced && self.type_parameters().is_empty()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(primitive) => write!(f, "{primitive}"),
            Self::Parameter(name) => write!(f, "{name}"),
            Self::Array(array) => {
                write!(f, "[{}; {}]", array.r#type, array.length)
            }
            Self::Tuple(elements) => {
                write!(f, "(")?;
                write_separated(f, elements)?;
                if elements.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Self::Reference(reference) => match &reference.lifetime {
                Lifetime::Erased => write!(f, "&{}", reference.pointee),
                lifetime => write!(f, "&{lifetime} {}", reference.pointee),
            },
            Self::Symbol(symbol) => {
                write!(f, "{}{}", symbol.name, symbol.generic_arguments)
            }
        }
    }
}

#[cfg(test)]
mod test;
