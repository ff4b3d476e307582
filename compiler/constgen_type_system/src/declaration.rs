//! Contains the generic parameter declaration model: the validated parameter
//! list and the generic item declaration owning it.

use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
    sync::{Arc, OnceLock},
};

use constgen_diagnostic::{Abort, Span};
use constgen_handler::Handler;
use constgen_term::{
    constant::ConstValue,
    expression::ConstExpr,
    generic_parameter::{
        GenericKind, GenericParameter, LifetimeParameter, TypeParameter,
        ValueParameter,
    },
    r#type::Type,
};
use dashmap::DashMap;
use getset::{CopyGetters, Getters};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    diagnostic::{DuplicatedGenericParameter, Error, OrderingViolation},
    domain::Validator,
};

/// The rules the order of generic parameters must follow.
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
pub enum OrderingMode {
    /// Lifetimes, then types, then values.
    #[default]
    Strict,

    /// Lifetimes first; types and values may interleave afterwards.
    Mixed,
}

impl OrderingMode {
    const fn rank(self, kind: GenericKind) -> u8 {
        match (self, kind) {
            (_, GenericKind::Lifetime) => 0,
            (Self::Mixed, _) | (Self::Strict, GenericKind::Type) => 1,
            (Self::Strict, GenericKind::Value) => 2,
        }
    }
}

/// An ordered list of generic parameters that passed the ordering and
/// uniqueness checks. Immutable once declared.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Default, Getters, CopyGetters,
)]
pub struct GenericParameterList {
    /// The parameters in declaration order.
    #[get = "pub"]
    parameters: Vec<GenericParameter>,

    /// The ordering rules the list was declared under.
    #[get_copy = "pub"]
    mode: OrderingMode,
}

impl GenericParameterList {
    /// Validates the order and the names of the parameters.
    ///
    /// Every violation is reported to the handler, not just the first.
    ///
    /// # Errors
    ///
    /// Returns [`Abort`] after reporting [`OrderingViolation`]s and
    /// [`DuplicatedGenericParameter`]s.
    pub fn declare(
        parameters: Vec<GenericParameter>,
        mode: OrderingMode,
        handler: &dyn Handler<Error>,
    ) -> Result<Self, Abort> {
        let mut failed = false;
        let mut names = HashMap::<&str, Span>::new();

        for (index, parameter) in parameters.iter().enumerate() {
            match names.entry(parameter.name()) {
                Entry::Occupied(previous) => {
                    handler.receive(
                        DuplicatedGenericParameter::new(
                            parameter.name().to_string(),
                            parameter.span(),
                            *previous.get(),
                        )
                        .into(),
                    );
                    failed = true;
                }
                Entry::Vacant(entry) => {
                    entry.insert(parameter.span());
                }
            }

            let rank = mode.rank(parameter.kind());
            if let Some(preceded) = parameters[..index]
                .iter()
                .find(|earlier| mode.rank(earlier.kind()) > rank)
            {
                handler.receive(
                    OrderingViolation::new(
                        parameter.name().to_string(),
                        parameter.kind(),
                        parameter.span(),
                        preceded.name().to_string(),
                        preceded.kind(),
                        preceded.span(),
                        mode,
                    )
                    .into(),
                );
                failed = true;
            }
        }

        if failed {
            return Err(Abort);
        }

        Ok(Self { parameters, mode })
    }

    /// Returns the number of parameters of every kind.
    #[must_use]
    pub fn len(&self) -> usize { self.parameters.len() }

    /// Returns `true` if no parameter is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.parameters.is_empty() }

    /// Looks up a parameter of any kind by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GenericParameter> {
        self.parameters.iter().find(|parameter| parameter.name() == name)
    }

    /// Iterates over the lifetime parameters in order.
    pub fn lifetimes(&self) -> impl Iterator<Item = &LifetimeParameter> {
        self.parameters.iter().filter_map(GenericParameter::as_lifetime)
    }

    /// Iterates over the type parameters in order.
    pub fn types(&self) -> impl Iterator<Item = &TypeParameter> {
        self.parameters.iter().filter_map(GenericParameter::as_type)
    }

    /// Iterates over the value parameters in order.
    pub fn values(&self) -> impl Iterator<Item = &ValueParameter> {
        self.parameters.iter().filter_map(GenericParameter::as_value)
    }

    /// Looks up a type parameter by name.
    #[must_use]
    pub fn type_parameter(&self, name: &str) -> Option<&TypeParameter> {
        self.types().find(|parameter| parameter.name == name)
    }

    /// Looks up a value parameter by name.
    #[must_use]
    pub fn value_parameter(&self, name: &str) -> Option<&ValueParameter> {
        self.values().find(|parameter| parameter.name == name)
    }
}

/// The kind of a generic item.
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
    derive_more::Display,
)]
#[allow(missing_docs)]
pub enum ItemKind {
    #[default]
    #[display(fmt = "function")]
    Function,
    #[display(fmt = "struct")]
    Struct,
    #[display(fmt = "enum")]
    Enum,
}

/// A boolean constraint over the generic parameters, e.g. `n % 2 == 1` or
/// `T::p == p`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct WhereClause {
    /// The constraint.
    pub expression: ConstExpr,

    /// Where the clause is declared.
    #[serde(default)]
    pub span: Span,
}

/// The parameter and return types of a function. Structs and enums have
/// neither.
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
pub struct Signature {
    /// The types of the parameters.
    pub parameters: Vec<Type>,

    /// The return type; `None` for items without one.
    pub return_type: Option<Type>,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{parameter}")?;
        }
        write!(f, ")")?;

        match &self.return_type {
            Some(return_type) => write!(f, " -> {return_type}"),
            None => Ok(()),
        }
    }
}

/// A generic item as it arrives from the front end, before any checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// The name of the item.
    pub name: String,

    /// The kind of the item.
    #[serde(default)]
    pub kind: ItemKind,

    /// The generic parameters in declaration order.
    #[serde(default)]
    pub generic_parameters: Vec<GenericParameter>,

    /// The where clauses in declaration order.
    #[serde(default)]
    pub where_clauses: Vec<WhereClause>,

    /// The signature of the item.
    #[serde(default)]
    pub signature: Signature,

    /// Where the item is declared.
    #[serde(default)]
    pub span: Span,
}

type DefaultResult = Result<ConstValue, constgen_evaluator::Error>;

/// Values of defaults already evaluated, keyed by the index of the parameter
/// and the values of the parameters its default references.
#[derive(Debug, Default)]
struct DefaultCache {
    entries: DashMap<(usize, Vec<ConstValue>), Arc<OnceLock<DefaultResult>>>,
}

/// A declared generic item.
#[derive(Debug, Getters, CopyGetters)]
pub struct Declaration {
    /// The name of the item.
    #[get = "pub"]
    name: String,

    /// The kind of the item.
    #[get_copy = "pub"]
    kind: ItemKind,

    /// The validated generic parameters.
    #[get = "pub"]
    generic_parameters: GenericParameterList,

    /// The where clauses in declaration order.
    #[get = "pub"]
    where_clauses: Vec<WhereClause>,

    /// The declared signature, still generic.
    #[get = "pub"]
    signature: Signature,

    /// Where the item is declared.
    #[get_copy = "pub"]
    span: Span,

    defaults: DefaultCache,
}

impl Declaration {
    /// Checks the generic parameters of the item: their order, their names
    /// and the domains of the value parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Abort`] after reporting every problem found; the item is
    /// dropped.
    pub fn declare(
        item: Item,
        mode: OrderingMode,
        validator: &Validator,
        handler: &dyn Handler<Error>,
    ) -> Result<Self, Abort> {
        let Item {
            name,
            kind,
            generic_parameters,
            where_clauses,
            signature,
            span,
        } = item;

        let generic_parameters =
            GenericParameterList::declare(generic_parameters, mode, handler)?;

        let mut failed = false;
        for parameter in generic_parameters.values() {
            if let Err(error) = validator.check_domain(parameter) {
                handler.receive(error.into());
                failed = true;
            }
        }

        if failed {
            return Err(Abort);
        }

        debug!(
            "declared {kind} `{name}` with {} generic parameter(s)",
            generic_parameters.len()
        );

        Ok(Self {
            name,
            kind,
            generic_parameters,
            where_clauses,
            signature,
            span,
            defaults: DefaultCache::default(),
        })
    }

    /// Returns the value of the default of the `index`-th generic parameter
    /// for the given values of the parameters the default references.
    ///
    /// `evaluate` runs at most once per distinct `inputs`, even when called
    /// from several threads; later calls observe the cached result.
    pub(crate) fn default_value(
        &self,
        index: usize,
        inputs: Vec<ConstValue>,
        evaluate: impl FnOnce() -> DefaultResult,
    ) -> DefaultResult {
        let cell =
            Arc::clone(&*self.defaults.entries.entry((index, inputs)).or_default());

        cell.get_or_init(evaluate).clone()
    }
}

#[cfg(test)]
mod test;
