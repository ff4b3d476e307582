//! Contains the constraint solver checking where clauses against resolved
//! arguments.

use constgen_diagnostic::Span;
use constgen_term::{
    instantiation::Instantiation,
    r#type::{Primitive, Type},
};
use log::trace;

use crate::{
    associated::{substitute_associated, AssociatedBindings},
    declaration::WhereClause,
    diagnostic::{ClauseFailure, ConflictingWhereClause},
    Environment,
};

const BOOL: Type = Type::Primitive(Primitive::Bool);

impl Environment<'_> {
    /// Checks the where clauses in declaration order under the resolved
    /// arguments and the values of the associated constants they refer to.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictingWhereClause`] for the first clause that doesn't
    /// reduce to `true`.
    pub fn check(
        &self,
        where_clauses: &[WhereClause],
        instantiation: &Instantiation,
        associated: &AssociatedBindings,
        span: Span,
    ) -> Result<(), ConflictingWhereClause> {
        for clause in where_clauses {
            let mut expression = clause.expression.clone();
            substitute_associated(&mut expression, associated);

            let failure = match self.evaluator().evaluate(
                &expression,
                &instantiation.constants,
                Some(&BOOL),
                self.budget(),
            ) {
                Ok(value) if value.as_bool() == Some(true) => None,
                Ok(_) => Some(ClauseFailure::Unsatisfied),
                Err(constgen_evaluator::Error::NonTerminating(error)) => {
                    Some(ClauseFailure::Exhausted { budget: error.budget })
                }
                Err(constgen_evaluator::Error::Evaluation(error)) => {
                    Some(ClauseFailure::Failed(error))
                }
            };

            trace!("`{}`: {failure:?}", clause.expression);

            if let Some(reason) = failure {
                return Err(ConflictingWhereClause::new(
                    clause.expression.clone(),
                    reason,
                    clause.span,
                    span,
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test;
