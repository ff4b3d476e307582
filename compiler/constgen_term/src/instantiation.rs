//! Contains the code related to applying substitutions to terms.

use std::collections::BTreeMap;

use crate::{
    constant::ConstValue, expression::ConstExpr,
    generic_arguments::GenericArguments, lifetime::Lifetime, r#type::Type,
};

/// Represents a substitution of generic parameters by name.
///
/// Lifetime parameters without a mapping are erased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[allow(missing_docs)]
pub struct Instantiation {
    pub lifetimes: BTreeMap<String, Lifetime>,
    pub types: BTreeMap<String, Type>,
    pub constants: BTreeMap<String, ConstValue>,
}

impl Instantiation {
    /// Returns `true` if the substitution doesn't map anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lifetimes.is_empty()
            && self.types.is_empty()
            && self.constants.is_empty()
    }
}

/// Applies the given substitution to the lifetime.
pub fn instantiate_lifetime(lifetime: &mut Lifetime, instantiation: &Instantiation) {
    if let Lifetime::Parameter(name) = lifetime {
        *lifetime = instantiation
            .lifetimes
            .get(name.as_str())
            .cloned()
            .unwrap_or(Lifetime::Erased);
    }
}

/// Applies the given substitution to the type, including every constant
/// expression nested in it.
pub fn instantiate_type(ty: &mut Type, instantiation: &Instantiation) {
    match ty {
        Type::Primitive(_) => {}
        Type::Parameter(name) => {
            if let Some(substitution) = instantiation.types.get(name.as_str()) {
                *ty = substitution.clone();
            }
        }
        Type::Array(array) => {
            instantiate_type(&mut array.r#type, instantiation);
            instantiate_expression(&mut array.length, instantiation);
        }
        Type::Tuple(elements) => {
            for element in elements {
                instantiate_type(element, instantiation);
            }
        }
        Type::Reference(reference) => {
            instantiate_lifetime(&mut reference.lifetime, instantiation);
            instantiate_type(&mut reference.pointee, instantiation);
        }
        Type::Symbol(symbol) => {
            instantiate_arguments(&mut symbol.generic_arguments, instantiation);
        }
    }
}

/// Applies the given substitution to every argument.
pub fn instantiate_arguments(
    arguments: &mut GenericArguments,
    instantiation: &Instantiation,
) {
    for lifetime in &mut arguments.lifetimes {
        instantiate_lifetime(lifetime, instantiation);
    }
    for ty in &mut arguments.types {
        instantiate_type(ty, instantiation);
    }
    for constant in &mut arguments.constants {
        instantiate_expression(constant, instantiation);
    }
}

/// Replaces every bound parameter reference in the expression by its value
/// and substitutes the types of associated constant references.
pub fn instantiate_expression(
    expression: &mut ConstExpr,
    instantiation: &Instantiation,
) {
    expression.rewrite(&mut |expression| match expression {
        ConstExpr::Parameter(name) => {
            if let Some(value) = instantiation.constants.get(name.as_str()) {
                *expression = ConstExpr::Value(value.clone());
            }
        }
        ConstExpr::Associated(associated) => {
            instantiate_type(&mut associated.ty, instantiation);
        }
        _ => {}
    });
}

#[cfg(test)]
mod test;
