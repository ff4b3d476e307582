//! Contains the value domain validator deciding which types may be the domain
//! of a value parameter.
//!
//! A domain is usable only if two arguments can be told equal or not. Types
//! with a total equality are always fine; floating-point numbers are accepted
//! with the restriction that every bound value must be equal to itself, which
//! rules out `NaN`.

use std::collections::HashMap;

use constgen_diagnostic::Span;
use constgen_term::{
    adt::{AdtDefinition, EqualityCapability},
    constant::ConstValue,
    generic_parameter::ValueParameter,
    instantiation::{instantiate_type, Instantiation},
    r#type::Type,
};
use dashmap::DashMap;

use crate::diagnostic::InvalidValueDomain;

/// The predicate a value of a restricted domain must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Restriction {
    /// The value must be equal to itself.
    Reflexive,
}

/// How usable the equality of a type is for generic arguments.
///
/// The variants are ordered from the weakest to the strongest; combining two
/// classifications yields the weaker one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Classification {
    /// The type has no equality usable for generic arguments.
    Ineligible,

    /// The type has an equality that only holds for some values.
    PartialEqRestricted(Restriction),

    /// The type has an equality that is reflexive for every value.
    TotalEq,
}

impl Classification {
    /// Returns the weaker of the two classifications.
    #[must_use]
    pub fn combine(self, other: Self) -> Self { self.min(other) }

    /// Returns `true` unless the classification is
    /// [`Classification::Ineligible`].
    #[must_use]
    pub const fn is_eligible(self) -> bool { !matches!(self, Self::Ineligible) }

    const fn from_capability(capability: EqualityCapability) -> Self {
        match capability {
            EqualityCapability::None => Self::Ineligible,
            EqualityCapability::Partial => {
                Self::PartialEqRestricted(Restriction::Reflexive)
            }
            EqualityCapability::Total => Self::TotalEq,
        }
    }
}

/// Returns the canonical structural form of the value, shared by every value
/// equal to it, or `None` if the value can't be bound under the
/// classification.
#[must_use]
pub fn canonicalize(
    value: &ConstValue,
    classification: Classification,
) -> Option<ConstValue> {
    match classification {
        Classification::Ineligible => None,
        Classification::PartialEqRestricted(Restriction::Reflexive)
        | Classification::TotalEq => value.canonical(),
    }
}

/// Classifies value domains, knowing every declared struct and enum.
#[derive(Debug, Default)]
pub struct Validator {
    adts: HashMap<String, AdtDefinition>,
    memo: DashMap<Type, Classification>,
}

impl Validator {
    /// Creates a validator that knows no struct or enum.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Makes the struct or enum known to the validator, returning the
    /// previous definition with the same name.
    pub fn declare_adt(&mut self, adt: AdtDefinition) -> Option<AdtDefinition> {
        // earlier classifications may have seen the name as unknown
        self.memo.clear();
        self.adts.insert(adt.name.clone(), adt)
    }

    /// Returns the struct or enum declared under `name`.
    #[must_use]
    pub fn adt(&self, name: &str) -> Option<&AdtDefinition> { self.adts.get(name) }

    /// Classifies the equality of `domain`.
    #[must_use]
    pub fn classify(&self, domain: &Type) -> Classification {
        if let Some(classification) = self.memo.get(domain) {
            return *classification;
        }

        let classification = self.classify_in(domain, &mut Vec::new());
        self.memo.insert(domain.clone(), classification);

        classification
    }

    fn classify_in(
        &self,
        domain: &Type,
        in_progress: &mut Vec<String>,
    ) -> Classification {
        match domain {
            Type::Primitive(primitive) if primitive.is_float() => {
                Classification::PartialEqRestricted(Restriction::Reflexive)
            }
            Type::Primitive(_) => Classification::TotalEq,

            Type::Parameter(_) | Type::Reference(_) => Classification::Ineligible,

            Type::Tuple(elements) => {
                elements.iter().fold(Classification::TotalEq, |acc, element| {
                    acc.combine(self.classify_in(element, in_progress))
                })
            }

            Type::Array(array) => self.classify_in(&array.r#type, in_progress),

            Type::Symbol(symbol) => {
                // a recursive occurrence adds nothing to what's being computed
                if in_progress.contains(&symbol.name) {
                    return Classification::TotalEq;
                }

                let Some(adt) = self.adts.get(&symbol.name) else {
                    return Classification::Ineligible;
                };

                if adt.type_parameters.len()
                    != symbol.generic_arguments.types.len()
                {
                    return Classification::Ineligible;
                }

                let instantiation = Instantiation {
                    types: adt
                        .type_parameters
                        .iter()
                        .cloned()
                        .zip(symbol.generic_arguments.types.iter().cloned())
                        .collect(),
                    ..Instantiation::default()
                };

                in_progress.push(symbol.name.clone());
                let classification = adt.fields().fold(
                    Classification::from_capability(adt.equality),
                    |acc, field| {
                        let mut field = field.clone();
                        instantiate_type(&mut field, &instantiation);

                        acc.combine(self.classify_in(&field, in_progress))
                    },
                );
                in_progress.pop();

                classification
            }
        }
    }

    /// Checks at declaration time that the domain of the value parameter is
    /// eligible.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidValueDomain`] without a value if the domain is
    /// [`Classification::Ineligible`].
    pub fn check_domain(
        &self,
        parameter: &ValueParameter,
    ) -> Result<Classification, InvalidValueDomain> {
        let classification = self.classify(&parameter.domain);

        if classification.is_eligible() {
            Ok(classification)
        } else {
            Err(InvalidValueDomain::new(
                parameter.name.clone(),
                parameter.domain.clone(),
                None,
                parameter.span,
            ))
        }
    }

    /// Checks a value about to be bound to the parameter and returns its
    /// canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidValueDomain`] with the value if it can't be bound
    /// under the classification of the parameter's domain.
    pub fn check_value(
        &self,
        parameter: &ValueParameter,
        value: &ConstValue,
        span: Span,
    ) -> Result<ConstValue, InvalidValueDomain> {
        canonicalize(value, self.classify(&parameter.domain)).ok_or_else(|| {
            InvalidValueDomain::new(
                parameter.name.clone(),
                parameter.domain.clone(),
                Some(value.clone()),
                span,
            )
        })
    }
}
