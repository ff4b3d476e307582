//! Contains the associated-constant resolver: traits declaring constants,
//! implementations binding them, and the lookup of the implementation that
//! provides a constant for a concrete type.
//!
//! When several implementations match a type, the most specific one wins: a
//! candidate whose pattern is an instance of every other candidate's pattern.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use constgen_diagnostic::{Abort, Span};
use constgen_evaluator::Bindings;
use constgen_handler::Handler;
use constgen_term::{
    constant::ConstValue,
    expression::{AssociatedConstant, ConstExpr},
    generic_parameter::{GenericParameter, TraitRef},
    instantiation::Instantiation,
    matching::{match_type, ConstantMatch, Matching},
    r#type::Type,
};
use getset::Getters;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    declaration::{GenericParameterList, OrderingMode, WhereClause},
    diagnostic::{
        AmbiguousImplementation, Candidate, ClauseFailure, Error,
        MismatchReason, NonTerminatingConstEval, TypeMismatch, UnknownSymbol,
    },
    domain::{canonicalize, Validator},
    Environment,
};

/// How deep the lookup of an associated constant may recurse through the
/// where clauses of implementations.
pub const MAX_RESOLUTION_DEPTH: usize = 16;

/// The values of the associated constants a set of expressions refers to,
/// keyed by the reference as written.
pub type AssociatedBindings = BTreeMap<AssociatedConstant, ConstValue>;

/// Replaces every associated constant reference that has a value in
/// `associated` by the value.
pub fn substitute_associated(
    expression: &mut ConstExpr,
    associated: &AssociatedBindings,
) {
    if associated.is_empty() {
        return;
    }

    expression.rewrite(&mut |expression| {
        if let ConstExpr::Associated(constant) = expression {
            if let Some(value) = associated.get(constant) {
                *expression = ConstExpr::Value(value.clone());
            }
        }
    });
}

/// A constant a trait requires its implementations to bind.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TraitAssociatedConst {
    /// The name of the constant.
    pub name: String,

    /// The domain every bound value must have.
    pub domain: Type,

    /// Where the constant is declared.
    #[serde(default)]
    pub span: Span,
}

/// A trait declaring associated constants.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TraitDefinition {
    /// The name of the trait.
    pub name: String,

    /// The declared constants.
    #[serde(default)]
    pub constants: Vec<TraitAssociatedConst>,

    /// Where the trait is declared.
    #[serde(default)]
    pub span: Span,
}

impl TraitDefinition {
    /// Looks up a declared constant by name.
    #[must_use]
    pub fn constant(&self, name: &str) -> Option<&TraitAssociatedConst> {
        self.constants.iter().find(|constant| constant.name == name)
    }
}

/// The value an implementation gives to an associated constant.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AssociatedConstantBinding {
    /// The name of the constant.
    pub name: String,

    /// The value, possibly referring to the generic parameters of the
    /// implementation.
    pub value: ConstExpr,

    /// Where the binding is written.
    #[serde(default)]
    pub span: Span,
}

/// An implementation of a trait as it arrives from the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// The generic parameters of the implementation.
    #[serde(default)]
    pub generic_parameters: Vec<GenericParameter>,

    /// The implemented trait.
    pub trait_name: String,

    /// The type pattern the implementation applies to, e.g. `V<n>`.
    pub implemented_for: Type,

    /// The conditions under which the implementation applies.
    #[serde(default)]
    pub where_clauses: Vec<WhereClause>,

    /// The bound constants.
    #[serde(default)]
    pub constants: Vec<AssociatedConstantBinding>,

    /// Where the implementation is declared.
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone)]
struct ImplementedConstant {
    value: ConstExpr,

    /// Present if `value` is closed and was evaluated at declaration.
    closed: Option<ConstValue>,

    span: Span,
}

/// A checked implementation.
#[derive(Debug, Getters)]
pub struct DeclaredImplementation {
    /// The validated generic parameters.
    #[get = "pub"]
    generic_parameters: GenericParameterList,

    /// The implemented trait.
    #[get = "pub"]
    trait_name: String,

    /// The type pattern with every closed constant reduced.
    #[get = "pub"]
    implemented_for: Type,

    /// The conditions under which the implementation applies.
    #[get = "pub"]
    where_clauses: Vec<WhereClause>,

    constants: HashMap<String, ImplementedConstant>,

    /// Where the implementation is declared.
    #[get = "pub"]
    span: Span,
}

impl DeclaredImplementation {
    fn subject(&self) -> String {
        format!("impl {} for {}", self.trait_name, self.implemented_for)
    }

    /// Returns `true` if every type `self` applies to is also covered by
    /// `general`.
    fn is_instance_of(&self, general: &Self) -> bool {
        let parameters = &general.generic_parameters;
        let mut matching = Matching::default();

        if match_type(
            &general.implemented_for,
            &self.implemented_for,
            &|name| parameters.type_parameter(name).is_some(),
            &mut matching,
        )
        .is_err()
        {
            return false;
        }

        let mut types = HashMap::new();
        for (name, ty) in matching.types {
            if *types.entry(name).or_insert_with(|| ty.clone()) != ty {
                return false;
            }
        }

        let mut constants = HashMap::new();
        matching.constants.into_iter().all(|ConstantMatch { pattern, concrete }| {
            match pattern
                .as_bare_parameter()
                .filter(|name| parameters.value_parameter(name).is_some())
            {
                Some(name) => {
                    *constants
                        .entry(name.to_string())
                        .or_insert_with(|| concrete.clone())
                        == concrete
                }
                None => pattern == concrete,
            }
        })
    }
}

/// Checks a value an implementation gives to an associated constant against
/// the trait's declaration, returning its canonical form.
///
/// # Errors
///
/// Returns [`TypeMismatch`] if the domain of the value differs from the
/// declared one or if the value isn't equal to itself.
pub fn bind(
    constant: &TraitAssociatedConst,
    value: &ConstValue,
    validator: &Validator,
    span: Span,
) -> Result<ConstValue, TypeMismatch> {
    if *value.domain() != constant.domain {
        return Err(TypeMismatch::new(
            constant.name.clone(),
            MismatchReason::UnexpectedDomain {
                expected: constant.domain.clone(),
                found: value.domain().clone(),
            },
            span,
        ));
    }

    canonicalize(value, validator.classify(&constant.domain)).ok_or_else(|| {
        TypeMismatch::new(
            constant.name.clone(),
            MismatchReason::NotEligible { value: value.clone() },
            span,
        )
    })
}

/// Every declared trait and implementation.
#[derive(Debug, Default)]
pub struct Implementations {
    traits: HashMap<String, TraitDefinition>,
    implementations: Vec<DeclaredImplementation>,
}

impl Implementations {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Declares a trait, returning the previous trait of the same name.
    pub fn declare_trait(
        &mut self,
        definition: TraitDefinition,
    ) -> Option<TraitDefinition> {
        debug!("declared trait `{}`", definition.name);
        self.traits.insert(definition.name.clone(), definition)
    }

    /// Returns the trait declared under `name`.
    #[must_use]
    pub fn get_trait(&self, name: &str) -> Option<&TraitDefinition> {
        self.traits.get(name)
    }

    /// Iterates over the declared implementations.
    pub fn implementations(
        &self,
    ) -> impl Iterator<Item = &DeclaredImplementation> {
        self.implementations.iter()
    }

    /// Checks and registers an implementation.
    ///
    /// Constants that refer to no generic parameter are evaluated and bound
    /// right away.
    ///
    /// # Errors
    ///
    /// Returns [`Abort`] after reporting every problem found; the
    /// implementation is dropped.
    pub fn declare_implementation(
        &mut self,
        implementation: Implementation,
        mode: OrderingMode,
        environment: &Environment,
        handler: &dyn Handler<Error>,
    ) -> Result<(), Abort> {
        let Implementation {
            generic_parameters,
            trait_name,
            mut implemented_for,
            where_clauses,
            constants,
            span,
        } = implementation;

        let Some(definition) = self.traits.get(&trait_name) else {
            handler.receive(UnknownSymbol::new(trait_name, span).into());
            return Err(Abort);
        };

        let generic_parameters =
            GenericParameterList::declare(generic_parameters, mode, handler)?;

        let mut failed = false;
        for parameter in generic_parameters.values() {
            if let Err(error) = environment.validator().check_domain(parameter)
            {
                handler.receive(error.into());
                failed = true;
            }
        }

        if let Err(error) = environment.reduce_closed(&mut implemented_for, span)
        {
            handler.receive(error);
            failed = true;
        }

        let subject = format!("impl {trait_name} for {implemented_for}");
        let mut bound = HashMap::<String, ImplementedConstant>::new();

        for binding in constants {
            let reason = if definition.constant(&binding.name).is_none() {
                Some(MismatchReason::UnknownAssociatedConstant(
                    binding.name.clone(),
                ))
            } else if bound.contains_key(&binding.name) {
                Some(MismatchReason::DuplicatedAssociatedConstant(
                    binding.name.clone(),
                ))
            } else {
                None
            };

            if let Some(reason) = reason {
                handler.receive(
                    TypeMismatch::new(subject.clone(), reason, binding.span)
                        .into(),
                );
                failed = true;
                continue;
            }

            bound.insert(binding.name, ImplementedConstant {
                value: binding.value,
                closed: None,
                span: binding.span,
            });
        }

        for constant in &definition.constants {
            let Some(implemented) = bound.get_mut(&constant.name) else {
                handler.receive(
                    TypeMismatch::new(
                        subject.clone(),
                        MismatchReason::MissingAssociatedConstant(
                            constant.name.clone(),
                        ),
                        span,
                    )
                    .into(),
                );
                failed = true;
                continue;
            };

            if !implemented.value.parameters().is_empty()
                || !implemented.value.associated_constants().is_empty()
            {
                continue;
            }

            let value = environment
                .evaluate(
                    &implemented.value,
                    &Bindings::new(),
                    Some(&constant.domain),
                    implemented.span,
                )
                .and_then(|value| {
                    bind(constant, &value, environment.validator(), implemented.span)
                        .map_err(Into::into)
                });

            match value {
                Ok(value) => implemented.closed = Some(value),
                Err(error) => {
                    handler.receive(error);
                    failed = true;
                }
            }
        }

        if failed {
            return Err(Abort);
        }

        debug!("declared `{subject}`");

        self.implementations.push(DeclaredImplementation {
            generic_parameters,
            trait_name,
            implemented_for,
            where_clauses,
            constants: bound,
            span,
        });

        Ok(())
    }

    /// Looks up the value of the associated constant `name` for the
    /// concrete type `ty`.
    ///
    /// Only implementations of the traits in `bounds` are considered; every
    /// trait is if `bounds` is empty. Returns `None` if no implementation
    /// applies.
    ///
    /// # Errors
    ///
    /// - [`AmbiguousImplementation`] if no applying implementation is more
    ///   specific than all others.
    /// - [`TypeMismatch`] if the value the implementation gives is invalid.
    /// - [`NonTerminatingConstEval`] if the lookup recursed too deeply.
    /// - any error of checking the where clauses of an implementation.
    pub fn resolve(
        &self,
        environment: &Environment,
        ty: &Type,
        name: &str,
        bounds: &BTreeSet<TraitRef>,
        span: Span,
    ) -> Result<Option<ConstValue>, Error> {
        self.resolve_in(environment, ty, name, bounds, span, 0)
    }

    fn resolve_in(
        &self,
        environment: &Environment,
        ty: &Type,
        name: &str,
        bounds: &BTreeSet<TraitRef>,
        span: Span,
        depth: usize,
    ) -> Result<Option<ConstValue>, Error> {
        if depth > MAX_RESOLUTION_DEPTH {
            return Err(NonTerminatingConstEval::new(
                ConstExpr::associated(ty.clone(), name),
                MAX_RESOLUTION_DEPTH,
                span,
            )
            .into());
        }

        let mut candidates = Vec::new();

        for implementation in &self.implementations {
            let Some(constant) = self
                .traits
                .get(&implementation.trait_name)
                .and_then(|definition| definition.constant(name))
            else {
                continue;
            };

            if !bounds.is_empty()
                && !bounds.iter().any(|bound| bound.name == implementation.trait_name)
            {
                continue;
            }

            if let Some(instantiation) = self.applies(
                environment,
                implementation,
                ty,
                span,
                depth,
            )? {
                candidates.push((implementation, constant, instantiation));
            }
        }

        let winners = candidates
            .iter()
            .filter(|(specific, ..)| {
                candidates
                    .iter()
                    .all(|(general, ..)| specific.is_instance_of(general))
            })
            .collect::<Vec<_>>();

        trace!(
            "`{ty}::{name}`: {} candidate(s), {} most specific",
            candidates.len(),
            winners.len()
        );

        let (implementation, constant, instantiation) = match winners.as_slice() {
            [] if candidates.is_empty() => return Ok(None),
            [winner] => *winner,
            _ => {
                let ambiguous = if winners.is_empty() {
                    candidates.iter().collect()
                } else {
                    winners.clone()
                };

                return Err(AmbiguousImplementation::new(
                    constant_trait(&candidates),
                    name.to_string(),
                    ty.clone(),
                    ambiguous
                        .into_iter()
                        .map(|(implementation, ..)| {
                            Candidate::new(
                                implementation.implemented_for.clone(),
                                implementation.span,
                            )
                        })
                        .collect(),
                    span,
                )
                .into());
            }
        };

        let Some(implemented) = implementation.constants.get(name) else {
            return Ok(None);
        };

        if let Some(value) = &implemented.closed {
            return Ok(Some(value.clone()));
        }

        let associated = self.collect_in(
            environment,
            std::iter::once(&implemented.value),
            &implementation.generic_parameters,
            instantiation,
            implemented.span,
            depth + 1,
        )?;

        let mut expression = implemented.value.clone();
        substitute_associated(&mut expression, &associated);

        let value = environment.evaluate(
            &expression,
            &instantiation.constants,
            Some(&constant.domain),
            implemented.span,
        )?;

        Ok(Some(bind(constant, &value, environment.validator(), implemented.span)?))
    }

    /// Matches the pattern of the implementation against `ty` and checks its
    /// where clauses, returning the substitution if it applies.
    fn applies(
        &self,
        environment: &Environment,
        implementation: &DeclaredImplementation,
        ty: &Type,
        span: Span,
        depth: usize,
    ) -> Result<Option<Instantiation>, Error> {
        let parameters = &implementation.generic_parameters;
        let mut matching = Matching::default();

        if match_type(
            &implementation.implemented_for,
            ty,
            &|name| parameters.type_parameter(name).is_some(),
            &mut matching,
        )
        .is_err()
        {
            return Ok(None);
        }

        let mut instantiation = Instantiation::default();
        for (name, ty) in matching.types {
            if *instantiation.types.entry(name).or_insert_with(|| ty.clone()) != ty
            {
                return Ok(None);
            }
        }

        let mut compound = Vec::new();
        for ConstantMatch { pattern, concrete } in matching.constants {
            let ConstExpr::Value(found) = concrete else {
                return Ok(None);
            };

            let Some(parameter) = pattern
                .as_bare_parameter()
                .and_then(|name| parameters.value_parameter(name))
            else {
                compound.push((pattern, found));
                continue;
            };

            let value = if *found.domain() == parameter.domain {
                Some(found)
            } else {
                match &parameter.domain {
                    Type::Primitive(target) if target.is_integer() => {
                        found.cast_integer(*target)
                    }
                    _ => None,
                }
            };

            let Some(value) = value.as_ref().and_then(ConstValue::canonical) else {
                return Ok(None);
            };

            if *instantiation
                .constants
                .entry(parameter.name.clone())
                .or_insert_with(|| value.clone())
                != value
            {
                return Ok(None);
            }
        }

        let unbound = parameters
            .types()
            .any(|parameter| !instantiation.types.contains_key(&parameter.name))
            || parameters.values().any(|parameter| {
                !instantiation.constants.contains_key(&parameter.name)
            });
        if unbound {
            return Ok(None);
        }

        for (pattern, found) in compound {
            let integer = found.as_integer();
            let expected =
                if integer.is_some() { None } else { Some(found.domain()) };

            let evaluated = environment.evaluate(
                &pattern,
                &instantiation.constants,
                expected,
                span,
            )?;

            let agrees = match integer {
                Some(integer) => evaluated.as_integer() == Some(integer),
                None => evaluated.canonical().as_ref() == Some(&found),
            };

            if !agrees {
                return Ok(None);
            }
        }

        let associated = self.collect_in(
            environment,
            implementation.where_clauses.iter().map(|clause| &clause.expression),
            parameters,
            &instantiation,
            span,
            depth + 1,
        )?;

        match environment.check(
            &implementation.where_clauses,
            &instantiation,
            &associated,
            span,
        ) {
            Ok(()) => Ok(Some(instantiation)),
            Err(error) if error.reason == ClauseFailure::Unsatisfied => {
                trace!(
                    "`{}` doesn't apply to `{ty}`: {error}",
                    implementation.subject()
                );
                Ok(None)
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Looks up every associated constant the expressions refer to, with the
    /// generic parameters substituted.
    ///
    /// A reference through a type parameter only considers the traits the
    /// parameter is bounded by. References no implementation provides are
    /// left out; evaluating them fails later.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve`].
    pub fn collect<'x>(
        &self,
        environment: &Environment,
        expressions: impl IntoIterator<Item = &'x ConstExpr>,
        parameters: &GenericParameterList,
        instantiation: &Instantiation,
        span: Span,
    ) -> Result<AssociatedBindings, Error> {
        self.collect_in(environment, expressions, parameters, instantiation, span, 0)
    }

    fn collect_in<'x>(
        &self,
        environment: &Environment,
        expressions: impl IntoIterator<Item = &'x ConstExpr>,
        parameters: &GenericParameterList,
        instantiation: &Instantiation,
        span: Span,
        depth: usize,
    ) -> Result<AssociatedBindings, Error> {
        let empty = BTreeSet::new();
        let mut associated = AssociatedBindings::new();

        for expression in expressions {
            for constant in expression.associated_constants() {
                if associated.contains_key(&constant) {
                    continue;
                }

                let bounds = match &constant.ty {
                    Type::Parameter(name) => parameters
                        .type_parameter(name)
                        .map_or(&empty, |parameter| &parameter.bounds),
                    _ => &empty,
                };

                let ty = environment.concrete_type(&constant.ty, instantiation, span)?;

                if let Some(value) = self.resolve_in(
                    environment,
                    &ty,
                    &constant.name,
                    bounds,
                    span,
                    depth,
                )? {
                    associated.insert(constant, value);
                }
            }
        }

        Ok(associated)
    }
}

fn constant_trait(
    candidates: &[(&DeclaredImplementation, &TraitAssociatedConst, Instantiation)],
) -> String {
    let names = candidates
        .iter()
        .map(|(implementation, ..)| implementation.trait_name.as_str())
        .collect::<BTreeSet<_>>();

    names.into_iter().collect::<Vec<_>>().join(" + ")
}
