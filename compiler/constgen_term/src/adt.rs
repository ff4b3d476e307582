//! Contains the definition of user-declared structs and enums as seen by the
//! value domain validator.

use constgen_diagnostic::Span;
use serde::{Deserialize, Serialize};

use crate::r#type::Type;

/// The equality capability a struct or enum declares for itself, e.g. by
/// deriving `PartialEq` or `Eq`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
pub enum EqualityCapability {
    /// The type can't be compared at all.
    #[default]
    None,

    /// The type implements an equality that may be non-reflexive.
    Partial,

    /// The type implements an equality that is reflexive for every value.
    Total,
}

/// Distinguishes structs from enums.
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
)]
#[allow(missing_docs)]
pub enum AdtKind {
    Struct,
    Enum,
}

/// A variant of an enum; a struct has exactly one variant named after it.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Variant {
    /// The name of the variant.
    pub name: String,

    /// The field types, which may mention the type parameters of the ADT.
    #[serde(default)]
    pub fields: Vec<Type>,
}

/// A struct or enum declaration.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AdtDefinition {
    /// The name of the ADT.
    pub name: String,

    /// Whether this is a struct or an enum.
    pub kind: AdtKind,

    /// The names of the type parameters of the ADT, in order.
    #[serde(default)]
    pub type_parameters: Vec<String>,

    /// The names and domains of the value parameters of the ADT, in order.
    #[serde(default)]
    pub value_parameters: Vec<(String, Type)>,

    /// The equality the ADT declares.
    #[serde(default)]
    pub equality: EqualityCapability,

    /// The variants of the ADT.
    #[serde(default)]
    pub variants: Vec<Variant>,

    /// Where the ADT was declared.
    #[serde(default)]
    pub span: Span,
}

impl AdtDefinition {
    /// Returns an iterator over the field types of every variant.
    pub fn fields(&self) -> impl Iterator<Item = &Type> {
        self.variants.iter().flat_map(|variant| variant.fields.iter())
    }
}
