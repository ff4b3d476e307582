//! Contains the structural matching of a type pattern against a concrete
//! type.
//!
//! Matching only decomposes the two types; deciding what a matched constant
//! pair means (bind a parameter, compare two values, defer a compound
//! expression) is left to the caller.

use crate::{expression::ConstExpr, r#type::Type};

/// A constant position where the pattern and the concrete type met.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstantMatch {
    /// The expression written in the pattern, e.g. `n` or `n + 1`.
    pub pattern: ConstExpr,

    /// The expression found in the concrete type.
    pub concrete: ConstExpr,
}

/// The innermost pair of types that failed to match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mismatch {
    /// The type required by the pattern.
    pub expected: Type,

    /// The type found instead.
    pub found: Type,
}

/// The result of matching a pattern against a concrete type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Matching {
    /// Type parameters of the pattern and the types they met, in the order
    /// they were encountered. A parameter may appear more than once.
    pub types: Vec<(String, Type)>,

    /// Every constant position of the pattern and what it met.
    pub constants: Vec<ConstantMatch>,
}

/// Matches `pattern` against `concrete`, appending what was found to
/// `matching`.
///
/// `is_variable` decides which type parameter names in the pattern may bind
/// to anything; every other type parameter only matches itself.
///
/// # Errors
///
/// Returns the innermost [`Mismatch`] if the shapes of the types differ.
pub fn match_type(
    pattern: &Type,
    concrete: &Type,
    is_variable: &dyn Fn(&str) -> bool,
    matching: &mut Matching,
) -> Result<(), Mismatch> {
    let mismatch = || Mismatch { expected: pattern.clone(), found: concrete.clone() };

    match (pattern, concrete) {
        (Type::Parameter(name), concrete) if is_variable(name) => {
            matching.types.push((name.clone(), concrete.clone()));
            Ok(())
        }

        (Type::Primitive(lhs), Type::Primitive(rhs)) if lhs == rhs => Ok(()),
        (Type::Parameter(lhs), Type::Parameter(rhs)) if lhs == rhs => Ok(()),

        (Type::Array(pattern), Type::Array(concrete)) => {
            match_type(&pattern.r#type, &concrete.r#type, is_variable, matching)?;
            matching.constants.push(ConstantMatch {
                pattern: (*pattern.length).clone(),
                concrete: (*concrete.length).clone(),
            });
            Ok(())
        }

        (Type::Tuple(lhs), Type::Tuple(rhs)) if lhs.len() == rhs.len() => {
            for (lhs, rhs) in lhs.iter().zip(rhs) {
                match_type(lhs, rhs, is_variable, matching)?;
            }
            Ok(())
        }

        (Type::Reference(lhs), Type::Reference(rhs)) => {
            match_type(&lhs.pointee, &rhs.pointee, is_variable, matching)
        }

        (Type::Symbol(lhs), Type::Symbol(rhs))
            if lhs.name == rhs.name
                && lhs.generic_arguments.types.len()
                    == rhs.generic_arguments.types.len()
                && lhs.generic_arguments.constants.len()
                    == rhs.generic_arguments.constants.len() =>
        {
            for (lhs, rhs) in lhs
                .generic_arguments
                .types
                .iter()
                .zip(&rhs.generic_arguments.types)
            {
                match_type(lhs, rhs, is_variable, matching)?;
            }

            matching.constants.extend(
                lhs.generic_arguments
                    .constants
                    .iter()
                    .zip(&rhs.generic_arguments.constants)
                    .map(|(pattern, concrete)| ConstantMatch {
                        pattern: pattern.clone(),
                        concrete: concrete.clone(),
                    }),
            );
            Ok(())
        }

        _ => Err(mismatch()),
    }
}
