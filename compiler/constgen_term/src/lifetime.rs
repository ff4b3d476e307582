//! Contains the definition of the [`Lifetime`] term.

use std::fmt;

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

/// Represents a lifetime annotation term.
///
/// Lifetimes never influence which instantiation is produced: they are erased
/// before a set of generic arguments becomes an instantiation key.
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
pub enum Lifetime {
    /// The `'static` lifetime.
    Static,

    /// A reference to a lifetime parameter, e.g. `'a`.
    Parameter(String),

    /// A lifetime whose identity has been erased.
    Erased,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "'static"),
            Self::Parameter(name) => write!(f, "'{name}"),
            Self::Erased => write!(f, "'_"),
        }
    }
}
