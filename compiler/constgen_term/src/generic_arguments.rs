//! Contains the definition of [`GenericArguments`] and [`ResolvedArgs`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    constant::ConstValue, expression::ConstExpr, lifetime::Lifetime,
    r#type::Type,
};

/// Generic arguments as written at a use site or inside a type.
///
/// The arguments are positional within each kind; supplying fewer arguments
/// than the declaration has parameters of that kind leaves the rest to
/// inference.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
#[serde(default)]
#[allow(missing_docs)]
pub struct GenericArguments {
    pub lifetimes: Vec<Lifetime>,
    pub types: Vec<Type>,
    pub constants: Vec<ConstExpr>,
}

impl GenericArguments {
    /// Returns `true` if no argument of any kind is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lifetimes.is_empty()
            && self.types.is_empty()
            && self.constants.is_empty()
    }
}

impl fmt::Display for GenericArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }

        let lifetimes = self.lifetimes.iter().map(ToString::to_string);
        let types = self.types.iter().map(ToString::to_string);
        let constants = self.constants.iter().map(|constant| match constant {
            ConstExpr::Value(_) | ConstExpr::Literal(_) | ConstExpr::Parameter(_) => {
                constant.to_string()
            }
            constant => format!("{{{constant}}}"),
        });

        write!(f, "<")?;
        crate::write_separated(f, lifetimes.chain(types).chain(constants))?;
        write!(f, ">")
    }
}

/// The fully-resolved generic arguments of one instantiation, in declaration
/// order within each kind.
///
/// Lifetimes don't take part in monomorphization; only their count is kept.
/// Every constant has been reduced to a [`ConstValue`].
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
pub struct ResolvedArgs {
    /// The number of erased lifetime arguments.
    pub erased_lifetimes: usize,

    /// The concrete type arguments.
    pub types: Vec<Type>,

    /// The reduced value arguments.
    pub constants: Vec<ConstValue>,
}

impl ResolvedArgs {
    /// Converts the resolved arguments back into [`GenericArguments`] with
    /// erased lifetimes.
    #[must_use]
    pub fn to_generic_arguments(&self) -> GenericArguments {
        GenericArguments {
            lifetimes: vec![Lifetime::Erased; self.erased_lifetimes],
            types: self.types.clone(),
            constants: self
                .constants
                .iter()
                .cloned()
                .map(ConstExpr::Value)
                .collect(),
        }
    }
}

impl fmt::Display for ResolvedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types = self.types.iter().map(ToString::to_string);
        let constants = self.constants.iter().map(ToString::to_string);

        write!(f, "<")?;
        crate::write_separated(f, types.chain(constants))?;
        write!(f, ">")
    }
}
