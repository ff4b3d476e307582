//! Contains the type system of value-parameterized generics: the declaration
//! model, the value domain validator, inference, where-clause checking and
//! associated-constant resolution.

use std::fmt;

use constgen_diagnostic::Span;
use constgen_evaluator::{Bindings, Evaluator};
use constgen_term::{
    constant::ConstValue,
    expression::ConstExpr,
    instantiation::{instantiate_type, Instantiation},
    lifetime::Lifetime,
    r#type::{Primitive, Type},
};
use getset::CopyGetters;

use crate::{
    diagnostic::{
        ConstEvaluationFailed, Error, InvalidValueDomain,
        NonTerminatingConstEval,
    },
    domain::{canonicalize, Validator},
};

pub mod associated;
pub mod constraint;
pub mod declaration;
pub mod diagnostic;
pub mod domain;
pub mod inference;

/// The collaborators every type system query needs.
#[derive(Clone, Copy, CopyGetters)]
pub struct Environment<'a> {
    /// The evaluator reducing constant expressions.
    #[get_copy = "pub"]
    evaluator: &'a dyn Evaluator,

    /// The validator classifying value domains.
    #[get_copy = "pub"]
    validator: &'a Validator,

    /// The number of steps every evaluation may take.
    #[get_copy = "pub"]
    budget: usize,
}

impl fmt::Debug for Environment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("validator", &self.validator)
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

impl<'a> Environment<'a> {
    /// Creates a new [`Environment`].
    #[must_use]
    pub const fn new(
        evaluator: &'a dyn Evaluator,
        validator: &'a Validator,
        budget: usize,
    ) -> Self {
        Self { evaluator, validator, budget }
    }

    /// Evaluates a required expression.
    ///
    /// # Errors
    ///
    /// See [`Self::evaluation_error`] for how evaluator failures map to
    /// diagnostics.
    pub fn evaluate(
        &self,
        expression: &ConstExpr,
        bindings: &Bindings,
        expected: Option<&Type>,
        span: Span,
    ) -> Result<ConstValue, Error> {
        self.evaluator
            .evaluate(expression, bindings, expected, self.budget)
            .map_err(|error| Self::evaluation_error(expression, error, span))
    }

    /// Turns the failure of a required evaluation into a diagnostic:
    /// exhaustion becomes [`NonTerminatingConstEval`], anything else
    /// [`ConstEvaluationFailed`].
    #[must_use]
    pub fn evaluation_error(
        expression: &ConstExpr,
        error: constgen_evaluator::Error,
        span: Span,
    ) -> Error {
        match error {
            constgen_evaluator::Error::NonTerminating(non_terminating) => {
                NonTerminatingConstEval::new(
                    expression.clone(),
                    non_terminating.budget,
                    span,
                )
                .into()
            }
            constgen_evaluator::Error::Evaluation(error) => {
                ConstEvaluationFailed::new(expression.clone(), error, span)
                    .into()
            }
        }
    }

    /// Reduces every constant expression in the type to its canonical value
    /// and erases every lifetime.
    ///
    /// Array lengths are `usize`; the constants of a declared struct or enum
    /// take the domains of its value parameters.
    ///
    /// # Errors
    ///
    /// Returns the diagnostic of the first failed evaluation, or
    /// [`InvalidValueDomain`] for a value that isn't equal to itself.
    pub fn reduce_type(
        &self,
        ty: &mut Type,
        bindings: &Bindings,
        span: Span,
    ) -> Result<(), Error> {
        self.reduce(ty, bindings, span, false)
    }

    /// Like [`Self::reduce_type`] but leaves the constant expressions that
    /// refer to generic parameters or associated constants untouched.
    ///
    /// # Errors
    ///
    /// Returns the diagnostic of the first failed evaluation.
    pub fn reduce_closed(&self, ty: &mut Type, span: Span) -> Result<(), Error> {
        self.reduce(ty, &Bindings::new(), span, true)
    }

    fn reduce(
        &self,
        ty: &mut Type,
        bindings: &Bindings,
        span: Span,
        closed_only: bool,
    ) -> Result<(), Error> {
        match ty {
            Type::Primitive(_) | Type::Parameter(_) => Ok(()),

            Type::Array(array) => {
                self.reduce(&mut array.r#type, bindings, span, closed_only)?;
                self.reduce_constant(
                    &mut array.length,
                    Some(("length", &Type::Primitive(Primitive::Usize))),
                    bindings,
                    span,
                    closed_only,
                )
            }

            Type::Tuple(elements) => {
                for element in elements {
                    self.reduce(element, bindings, span, closed_only)?;
                }
                Ok(())
            }

            Type::Reference(reference) => {
                reference.lifetime = Lifetime::Erased;
                self.reduce(&mut reference.pointee, bindings, span, closed_only)
            }

            Type::Symbol(symbol) => {
                for lifetime in &mut symbol.generic_arguments.lifetimes {
                    *lifetime = Lifetime::Erased;
                }
                for ty in &mut symbol.generic_arguments.types {
                    self.reduce(ty, bindings, span, closed_only)?;
                }

                let domains = self
                    .validator
                    .adt(&symbol.name)
                    .map(|adt| adt.value_parameters.as_slice())
                    .unwrap_or_default();

                for (index, constant) in
                    symbol.generic_arguments.constants.iter_mut().enumerate()
                {
                    let expected = domains
                        .get(index)
                        .map(|(name, domain)| (name.as_str(), domain));
                    self.reduce_constant(
                        constant,
                        expected,
                        bindings,
                        span,
                        closed_only,
                    )?;
                }

                Ok(())
            }
        }
    }

    fn reduce_constant(
        &self,
        constant: &mut ConstExpr,
        expected: Option<(&str, &Type)>,
        bindings: &Bindings,
        span: Span,
        closed_only: bool,
    ) -> Result<(), Error> {
        if closed_only
            && (!constant.parameters().is_empty()
                || !constant.associated_constants().is_empty())
        {
            return Ok(());
        }

        let domain = expected.map(|(_, domain)| domain);
        let value = match (&*constant, domain) {
            (ConstExpr::Value(value), Some(Type::Primitive(target)))
                if target.is_integer() =>
            {
                value.cast_integer(*target).unwrap_or_else(|| value.clone())
            }
            (ConstExpr::Value(value), _) => value.clone(),
            (constant, expected) => {
                self.evaluate(constant, bindings, expected, span)?
            }
        };

        let Some(canonical) =
            canonicalize(&value, self.validator.classify(value.domain()))
        else {
            let parameter = expected
                .map_or_else(|| constant.to_string(), |(name, _)| name.to_string());

            return Err(InvalidValueDomain::new(
                parameter,
                value.domain().clone(),
                Some(value),
                span,
            )
            .into());
        };

        *constant = ConstExpr::Value(canonical);
        Ok(())
    }

    /// Applies the substitution to the type and reduces the result.
    ///
    /// # Errors
    ///
    /// See [`Self::reduce_type`].
    pub fn concrete_type(
        &self,
        ty: &Type,
        instantiation: &Instantiation,
        span: Span,
    ) -> Result<Type, Error> {
        let mut ty = ty.clone();
        instantiate_type(&mut ty, instantiation);
        self.reduce_type(&mut ty, &instantiation.constants, span)?;

        Ok(ty)
    }
}
