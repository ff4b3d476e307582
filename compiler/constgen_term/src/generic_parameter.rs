//! Contains the definition of [`GenericParameter`] and its kinds.

use std::{collections::BTreeSet, fmt};

use constgen_diagnostic::Span;
use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use crate::{expression::ConstExpr, r#type::Type};

/// The kind of a generic parameter.
///
/// The declaration order of the variants is the order parameters must be
/// declared in unless interleaving is enabled.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[allow(missing_docs)]
pub enum GenericKind {
    #[display(fmt = "lifetime")]
    Lifetime,
    #[display(fmt = "type")]
    Type,
    #[display(fmt = "value")]
    Value,
}

/// A reference to a trait used as a bound, e.g. `T: Dimension`.
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
    derive_more::Display,
)]
#[display(fmt = "{}", name)]
pub struct TraitRef {
    /// The name of the trait.
    pub name: String,
}

/// Represents a lifetime parameter, denoted by `'a` syntax.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LifetimeParameter {
    /// The name of the parameter, without the leading `'`.
    pub name: String,

    /// Where the parameter was declared.
    #[serde(default)]
    pub span: Span,
}

/// Represents a type parameter, denoted by `T: Bound = Default` syntax.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TypeParameter {
    /// The name of the parameter.
    pub name: String,

    /// The traits the argument must implement.
    #[serde(default)]
    pub bounds: BTreeSet<TraitRef>,

    /// The type used when the parameter is neither given nor inferred.
    #[serde(default)]
    pub default: Option<Type>,

    /// Where the parameter was declared.
    #[serde(default)]
    pub span: Span,
}

/// Represents a value parameter, denoted by `n: usize = 16` syntax.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ValueParameter {
    /// The name of the parameter.
    pub name: String,

    /// The type of the values the parameter can be bound to.
    pub domain: Type,

    /// The expression used when the parameter is neither given nor inferred,
    /// kept unevaluated until first needed.
    #[serde(default)]
    pub default: Option<ConstExpr>,

    /// Where the parameter was declared.
    #[serde(default)]
    pub span: Span,
}

/// A generic parameter of any kind.
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
pub enum GenericParameter {
    Lifetime(LifetimeParameter),
    Type(TypeParameter),
    Value(ValueParameter),
}

impl GenericParameter {
    /// Creates a lifetime parameter with an unknown span.
    #[must_use]
    pub fn lifetime(name: impl Into<String>) -> Self {
        Self::Lifetime(LifetimeParameter { name: name.into(), span: Span::default() })
    }

    /// Creates an unbounded type parameter without default.
    #[must_use]
    pub fn r#type(name: impl Into<String>) -> Self {
        Self::Type(TypeParameter {
            name: name.into(),
            bounds: BTreeSet::new(),
            default: None,
            span: Span::default(),
        })
    }

    /// Creates a value parameter without default.
    #[must_use]
    pub fn value(name: impl Into<String>, domain: Type) -> Self {
        Self::Value(ValueParameter {
            name: name.into(),
            domain,
            default: None,
            span: Span::default(),
        })
    }

    /// Returns the name of the parameter.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Lifetime(parameter) => &parameter.name,
            Self::Type(parameter) => &parameter.name,
            Self::Value(parameter) => &parameter.name,
        }
    }

    /// Returns the kind of the parameter.
    #[must_use]
    pub const fn kind(&self) -> GenericKind {
        match self {
            Self::Lifetime(_) => GenericKind::Lifetime,
            Self::Type(_) => GenericKind::Type,
            Self::Value(_) => GenericKind::Value,
        }
    }

    /// Returns where the parameter was declared.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Lifetime(parameter) => parameter.span,
            Self::Type(parameter) => parameter.span,
            Self::Value(parameter) => parameter.span,
        }
    }
}

impl fmt::Display for GenericParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lifetime(parameter) => write!(f, "'{}", parameter.name),
            Self::Type(parameter) => {
                write!(f, "{}", parameter.name)?;
                if !parameter.bounds.is_empty() {
                    write!(f, ": ")?;
                    for (index, bound) in parameter.bounds.iter().enumerate() {
                        if index != 0 {
                            write!(f, " + ")?;
                        }
                        write!(f, "{bound}")?;
                    }
                }
                if let Some(default) = &parameter.default {
                    write!(f, " = {default}")?;
                }
                Ok(())
            }
            Self::Value(parameter) => {
                write!(f, "{}: {}", parameter.name, parameter.domain)?;
                if let Some(default) = &parameter.default {
                    write!(f, " = {default}")?;
                }
                Ok(())
            }
        }
    }
}
