//! Contains the constant expression evaluator consumed by the type system.
//!
//! The type system only ever talks to an [`Evaluator`]; the bundled
//! [`Interpreter`] is a bounded reference implementation used by the driver
//! and the tests.

use std::collections::BTreeMap;

use constgen_term::{
    constant::ConstValue,
    expression::{AssociatedConstant, ConstExpr},
    r#type::{Primitive, Type},
};
use enum_as_inner::EnumAsInner;

pub mod interpreter;
pub mod literal;

pub use interpreter::{Function, Interpreter};

/// Maps the names of the value parameters in scope to their values.
pub type Bindings = BTreeMap<String, ConstValue>;

/// The evaluation didn't finish within the given number of steps.
///
/// Whether the expression would have finished with a larger budget is
/// undecidable; the error is reported as non-termination.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error,
)]
#[error("the evaluation exceeded the budget of {budget} steps")]
pub struct NonTerminating {
    /// The budget that ran out.
    pub budget: usize,
}

/// The expression can't be reduced to a value no matter the budget.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
#[allow(missing_docs)]
pub enum EvaluationError {
    #[error("the value parameter `{0}` is not bound")]
    UnboundParameter(String),

    #[error("expected a value of type `{expected}`, found `{found}`")]
    TypeMismatch { expected: Type, found: Type },

    #[error("the operation overflows the range of `{0}`")]
    Overflow(Primitive),

    #[error("attempted to divide by zero")]
    DivisionByZero,

    #[error("`{text}` is not a valid literal of type `{domain}`")]
    InvalidLiteral { text: String, domain: Type },

    #[error("the type of `{0}` can't be determined without context")]
    CannotInferType(String),

    #[error("the operator `{operator}` isn't defined for `{domain}`")]
    UnsupportedOperation { operator: String, domain: Type },

    #[error("no function named `{0}` is known")]
    UnknownFunction(String),

    #[error("`{function}` takes {expected} argument(s) but {found} were given")]
    ArityMismatch { function: String, expected: usize, found: usize },

    #[error("the associated constant `{0}` has not been resolved")]
    UnresolvedAssociatedConstant(AssociatedConstant),
}

/// The reason an evaluation didn't produce a value.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    thiserror::Error,
    EnumAsInner,
)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    NonTerminating(#[from] NonTerminating),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// A pure, deterministic reducer of constant expressions.
///
/// Implementations must return the same result for the same inputs and may
/// be called from several threads at once.
pub trait Evaluator: Send + Sync {
    /// Reduces `expression` to a value.
    ///
    /// `bindings` supplies the values of the parameters the expression may
    /// reference. `expected` is the domain the result must inhabit, if known;
    /// it gives unsuffixed literals their type. At most `budget` reduction
    /// steps are spent.
    ///
    /// # Errors
    ///
    /// - [`Error::NonTerminating`] if the budget ran out.
    /// - [`Error::Evaluation`] if the expression can't be reduced at all.
    fn evaluate(
        &self,
        expression: &ConstExpr,
        bindings: &Bindings,
        expected: Option<&Type>,
        budget: usize,
    ) -> Result<ConstValue, Error>;
}
