//! Contains the inference engine resolving the generic arguments of a use
//! site.
//!
//! Arguments come from four places, in order of precedence: the explicit
//! generic arguments, the structure of the call argument types, the
//! structure of the expected return type, and the declared defaults.
//! Compound constant expressions in a declared type (`n + 1`) are evaluated
//! forward once their parameters are known; they never bind a parameter.

use std::collections::BTreeMap;

use constgen_diagnostic::Span;
use constgen_evaluator::{Bindings, EvaluationError};
use constgen_term::{
    constant::ConstValue,
    expression::ConstExpr,
    generic_arguments::{GenericArguments, ResolvedArgs},
    generic_parameter::{GenericKind, GenericParameter, ValueParameter},
    instantiation::Instantiation,
    matching::{match_type, Matching, Mismatch},
    r#type::Type,
};
use getset::Getters;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    associated::{substitute_associated, AssociatedBindings},
    declaration::{Declaration, Signature},
    diagnostic::{
        AmbiguousInference, BindingSource, Error,
        MismatchedGenericArgumentCount, MismatchReason, TypeMismatch,
        UnboundParameter,
    },
    Environment,
};

/// Everything a use site tells about the instantiation it requests.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(default)]
pub struct CallSite {
    /// The generic arguments written at the use site, possibly fewer than
    /// the declared parameters.
    pub generic_arguments: GenericArguments,

    /// The types of the call arguments, `None` if the item isn't called.
    pub arguments: Option<Vec<Type>>,

    /// The type the use site expects the result to have.
    pub expected: Option<Type>,

    /// Where the use site is.
    pub span: Span,
}

/// The outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Resolution {
    /// The resolved arguments in declaration order.
    #[get = "pub"]
    arguments: ResolvedArgs,

    /// The same arguments keyed by parameter name.
    #[get = "pub"]
    instantiation: Instantiation,
}

impl Resolution {
    /// Consumes the resolution, returning the resolved arguments and the
    /// substitution.
    #[must_use]
    pub fn into_parts(self) -> (ResolvedArgs, Instantiation) {
        (self.arguments, self.instantiation)
    }
}

#[derive(Debug, Clone)]
struct Deferred {
    pattern: ConstExpr,
    found: ConstValue,
    source: BindingSource,
}

struct Inference<'e, 'a> {
    environment: &'e Environment<'a>,
    declaration: &'e Declaration,
    span: Span,
    types: BTreeMap<String, (Type, BindingSource)>,
    constants: BTreeMap<String, (ConstValue, BindingSource)>,
    deferred: Vec<Deferred>,
}

impl<'e, 'a> Inference<'e, 'a> {
    fn new(
        environment: &'e Environment<'a>,
        declaration: &'e Declaration,
        span: Span,
    ) -> Self {
        Self {
            environment,
            declaration,
            span,
            types: BTreeMap::new(),
            constants: BTreeMap::new(),
            deferred: Vec::new(),
        }
    }

    fn bindings(&self) -> Bindings {
        self.constants
            .iter()
            .map(|(name, (value, _))| (name.clone(), value.clone()))
            .collect()
    }

    fn instantiation(&self) -> Instantiation {
        Instantiation {
            lifetimes: BTreeMap::new(),
            types: self
                .types
                .iter()
                .map(|(name, (ty, _))| (name.clone(), ty.clone()))
                .collect(),
            constants: self.bindings(),
        }
    }

    fn mismatch(&self, subject: &str, reason: MismatchReason) -> Error {
        TypeMismatch::new(subject.to_string(), reason, self.span).into()
    }

    fn bind_type(
        &mut self,
        name: &str,
        ty: Type,
        source: BindingSource,
    ) -> Result<(), Error> {
        match self.types.get(name) {
            Some((bound, _)) if *bound == ty => Ok(()),
            Some((bound, bound_source)) => Err(self.mismatch(
                name,
                MismatchReason::ConflictingBindings {
                    first: bound.to_string(),
                    first_source: *bound_source,
                    second: ty.to_string(),
                    second_source: source,
                },
            )),
            None => {
                debug!("`{name}` := `{ty}` from {source}");
                self.types.insert(name.to_string(), (ty, source));
                Ok(())
            }
        }
    }

    fn bind_constant(
        &mut self,
        parameter: &ValueParameter,
        value: ConstValue,
        source: BindingSource,
    ) -> Result<(), Error> {
        let value = if *value.domain() == parameter.domain {
            value
        } else {
            match &parameter.domain {
                Type::Primitive(target) if target.is_integer() => {
                    value.cast_integer(*target)
                }
                _ => None,
            }
            .ok_or_else(|| {
                self.mismatch(&parameter.name, MismatchReason::UnexpectedDomain {
                    expected: parameter.domain.clone(),
                    found: value.domain().clone(),
                })
            })?
        };

        let value =
            self.environment.validator().check_value(parameter, &value, self.span)?;

        match self.constants.get(&parameter.name) {
            Some((bound, _)) if *bound == value => Ok(()),
            Some((bound, bound_source)) => Err(self.mismatch(
                &parameter.name,
                MismatchReason::ConflictingBindings {
                    first: bound.to_string(),
                    first_source: *bound_source,
                    second: value.to_string(),
                    second_source: source,
                },
            )),
            None => {
                debug!("`{}` := `{value}` from {source}", parameter.name);
                self.constants.insert(parameter.name.clone(), (value, source));
                Ok(())
            }
        }
    }

    fn explicit(&mut self, arguments: &GenericArguments) -> Result<(), Error> {
        let declaration = self.declaration;
        let parameters = declaration.generic_parameters();

        for (kind, declared, supplied) in [
            (
                GenericKind::Lifetime,
                parameters.lifetimes().count(),
                arguments.lifetimes.len(),
            ),
            (GenericKind::Type, parameters.types().count(), arguments.types.len()),
            (
                GenericKind::Value,
                parameters.values().count(),
                arguments.constants.len(),
            ),
        ] {
            if supplied > declared {
                return Err(MismatchedGenericArgumentCount::new(
                    declaration.name().clone(),
                    kind,
                    declared,
                    supplied,
                    self.span,
                )
                .into());
            }
        }

        for (index, (parameter, ty)) in
            parameters.types().zip(&arguments.types).enumerate()
        {
            let mut ty = ty.clone();
            self.environment.reduce_type(&mut ty, &Bindings::new(), self.span)?;
            self.bind_type(&parameter.name, ty, BindingSource::Explicit { index })?;
        }

        for (index, (parameter, expression)) in
            parameters.values().zip(&arguments.constants).enumerate()
        {
            let value = self.explicit_value(expression, &parameter.domain)?;
            self.bind_constant(parameter, value, BindingSource::Explicit {
                index,
            })?;
        }

        Ok(())
    }

    /// Evaluates an explicit value argument. An argument that carries a
    /// domain of its own, like `16u8`, keeps it so that binding it casts or
    /// reports the mismatch the way inferred values do.
    fn explicit_value(
        &self,
        expression: &ConstExpr,
        domain: &Type,
    ) -> Result<ConstValue, Error> {
        let environment = self.environment;

        match environment.evaluator().evaluate(
            expression,
            &Bindings::new(),
            Some(domain),
            environment.budget(),
        ) {
            Err(constgen_evaluator::Error::Evaluation(
                EvaluationError::TypeMismatch { expected, .. },
            )) if expected == *domain => environment.evaluate(
                expression,
                &Bindings::new(),
                None,
                self.span,
            ),
            result => result.map_err(|error| {
                Environment::evaluation_error(expression, error, self.span)
            }),
        }
    }

    fn arguments(&mut self, arguments: &[Type]) -> Result<(), Error> {
        let declaration = self.declaration;
        let parameters = &declaration.signature().parameters;

        if parameters.len() != arguments.len() {
            return Err(self.mismatch(
                declaration.name(),
                MismatchReason::ArgumentCount {
                    expected: parameters.len(),
                    found: arguments.len(),
                },
            ));
        }

        for (index, (pattern, argument)) in
            parameters.iter().zip(arguments).enumerate()
        {
            self.unify(pattern, argument, BindingSource::Argument { index })?;
        }

        Ok(())
    }

    fn unify(
        &mut self,
        pattern: &Type,
        concrete: &Type,
        source: BindingSource,
    ) -> Result<(), Error> {
        let mut concrete = concrete.clone();
        self.environment.reduce_type(&mut concrete, &Bindings::new(), self.span)?;

        let declaration = self.declaration;
        let parameters = declaration.generic_parameters();
        let mut matching = Matching::default();

        match_type(
            pattern,
            &concrete,
            &|name| parameters.type_parameter(name).is_some(),
            &mut matching,
        )
        .map_err(|Mismatch { expected, found }| {
            self.mismatch(
                declaration.name(),
                MismatchReason::StructuralMismatch { expected, found, source },
            )
        })?;

        for (name, ty) in matching.types {
            self.bind_type(&name, ty, source)?;
        }

        for constant in matching.constants {
            // the concrete side has been reduced
            let ConstExpr::Value(found) = constant.concrete else {
                continue;
            };

            let bare = constant
                .pattern
                .as_bare_parameter()
                .and_then(|name| parameters.value_parameter(name));

            match bare {
                Some(parameter) => self.bind_constant(parameter, found, source)?,
                None => self.deferred.push(Deferred {
                    pattern: constant.pattern,
                    found,
                    source,
                }),
            }
        }

        Ok(())
    }

    /// Fails if a parameter is unbound but occurs in a compound expression
    /// that would have to be inverted to bind it.
    fn check_trapped(&self) -> Result<(), Error> {
        let unbound = self
            .declaration
            .generic_parameters()
            .values()
            .filter(|parameter| !self.constants.contains_key(&parameter.name))
            .filter_map(|parameter| {
                let expressions = self
                    .deferred
                    .iter()
                    .filter(|deferred| {
                        deferred.pattern.parameters().contains(&parameter.name)
                    })
                    .map(|deferred| deferred.pattern.clone())
                    .collect::<Vec<_>>();

                (!expressions.is_empty()).then(|| {
                    UnboundParameter::new(parameter.name.clone(), expressions)
                })
            })
            .collect::<Vec<_>>();

        if unbound.is_empty() {
            Ok(())
        } else {
            Err(AmbiguousInference::new(
                self.declaration.name().clone(),
                unbound,
                self.span,
            )
            .into())
        }
    }

    fn defaults(&mut self) -> Result<(), Error> {
        let declaration = self.declaration;

        for (index, parameter) in
            declaration.generic_parameters().parameters().iter().enumerate()
        {
            match parameter {
                GenericParameter::Lifetime(_) => {}

                GenericParameter::Type(parameter) => {
                    let Some(default) = &parameter.default else { continue };
                    if self.types.contains_key(&parameter.name) {
                        continue;
                    }

                    let ty = self.environment.concrete_type(
                        default,
                        &self.instantiation(),
                        self.span,
                    )?;
                    self.bind_type(&parameter.name, ty, BindingSource::Default)?;
                }

                GenericParameter::Value(parameter) => {
                    let Some(default) = &parameter.default else { continue };
                    if self.constants.contains_key(&parameter.name) {
                        continue;
                    }

                    let bindings = self.bindings();
                    let Some(inputs) = default
                        .parameters()
                        .iter()
                        .map(|name| bindings.get(name).cloned())
                        .collect::<Option<Vec<_>>>()
                    else {
                        // refers to a parameter no path could bind
                        continue;
                    };

                    let environment = self.environment;
                    let value = declaration
                        .default_value(index, inputs, || {
                            debug!(
                                "evaluating the default `{default}` of `{}`",
                                parameter.name
                            );
                            environment.evaluator().evaluate(
                                default,
                                &bindings,
                                Some(&parameter.domain),
                                environment.budget(),
                            )
                        })
                        .map_err(|error| {
                            Environment::evaluation_error(default, error, self.span)
                        })?;

                    self.bind_constant(parameter, value, BindingSource::Default)?;
                }
            }
        }

        Ok(())
    }

    fn check_unbound(&self) -> Result<(), Error> {
        let parameters = self.declaration.generic_parameters();

        let unbound = parameters
            .types()
            .map(|parameter| &parameter.name)
            .filter(|name| !self.types.contains_key(*name))
            .chain(
                parameters
                    .values()
                    .map(|parameter| &parameter.name)
                    .filter(|name| !self.constants.contains_key(*name)),
            )
            .map(|name| UnboundParameter::new(name.clone(), Vec::new()))
            .collect::<Vec<_>>();

        if unbound.is_empty() {
            Ok(())
        } else {
            Err(AmbiguousInference::new(
                self.declaration.name().clone(),
                unbound,
                self.span,
            )
            .into())
        }
    }

    fn check_deferred(&self) -> Result<(), Error> {
        let bindings = self.bindings();

        for Deferred { pattern, found, source } in &self.deferred {
            let integer = found.as_integer();

            // integers compare across domains so that `n - 1` over a `u32`
            // parameter can meet a `usize` length
            let expected = if integer.is_some() { None } else { Some(found.domain()) };
            let evaluated =
                self.environment.evaluate(pattern, &bindings, expected, self.span)?;

            let agrees = match integer {
                Some(integer) => evaluated.as_integer() == Some(integer),
                None => evaluated.canonical().as_ref() == Some(found),
            };

            if !agrees {
                return Err(self.mismatch(
                    self.declaration.name(),
                    MismatchReason::CompoundDisagreement {
                        expression: pattern.clone(),
                        evaluated,
                        found: found.clone(),
                        source: *source,
                    },
                ));
            }
        }

        Ok(())
    }

    fn finish(self) -> Resolution {
        let parameters = self.declaration.generic_parameters();
        let instantiation = self.instantiation();

        let arguments = ResolvedArgs {
            erased_lifetimes: parameters.lifetimes().count(),
            types: parameters
                .types()
                .filter_map(|parameter| instantiation.types.get(&parameter.name))
                .cloned()
                .collect(),
            constants: parameters
                .values()
                .filter_map(|parameter| {
                    instantiation.constants.get(&parameter.name)
                })
                .cloned()
                .collect(),
        };

        Resolution { arguments, instantiation }
    }
}

impl Environment<'_> {
    /// Resolves every generic argument of the declaration at the use site.
    ///
    /// # Errors
    ///
    /// - [`MismatchedGenericArgumentCount`] if too many explicit arguments
    ///   of one kind are given.
    /// - [`TypeMismatch`] if the argument types don't fit the signature, or
    ///   two sources bind one parameter differently, or a compound
    ///   expression disagrees with what it was matched against.
    /// - [`AmbiguousInference`] if some parameters stay unbound.
    /// - [`crate::diagnostic::InvalidValueDomain`] if a bound value isn't
    ///   equal to itself.
    /// - [`crate::diagnostic::NonTerminatingConstEval`] and
    ///   [`crate::diagnostic::ConstEvaluationFailed`] from the required
    ///   evaluations.
    pub fn resolve(
        &self,
        declaration: &Declaration,
        call_site: &CallSite,
    ) -> Result<Resolution, Error> {
        let mut inference = Inference::new(self, declaration, call_site.span);

        inference.explicit(&call_site.generic_arguments)?;

        if let Some(arguments) = &call_site.arguments {
            inference.arguments(arguments)?;
        }

        if let (Some(expected), Some(return_type)) =
            (&call_site.expected, &declaration.signature().return_type)
        {
            inference.unify(return_type, expected, BindingSource::ExpectedReturn)?;
        }

        inference.check_trapped()?;
        inference.defaults()?;
        inference.check_unbound()?;
        inference.check_deferred()?;

        let resolution = inference.finish();
        debug!(
            "resolved `{}{}`",
            declaration.name(),
            resolution.arguments
        );

        Ok(resolution)
    }

    /// Substitutes the resolved arguments and the associated constants into
    /// the declared signature and evaluates every constant expression in it.
    ///
    /// # Errors
    ///
    /// Returns the diagnostic of the first failed evaluation.
    pub fn instantiate_signature(
        &self,
        signature: &Signature,
        instantiation: &Instantiation,
        associated: &AssociatedBindings,
        span: Span,
    ) -> Result<Signature, Error> {
        let concrete = |ty: &Type| {
            let mut ty = ty.clone();
            ty.for_each_constant_mut(&mut |constant| {
                substitute_associated(constant, associated);
            });
            self.concrete_type(&ty, instantiation, span)
        };

        Ok(Signature {
            parameters: signature
                .parameters
                .iter()
                .map(concrete)
                .collect::<Result<_, _>>()?,
            return_type: signature.return_type.as_ref().map(concrete).transpose()?,
        })
    }
}
