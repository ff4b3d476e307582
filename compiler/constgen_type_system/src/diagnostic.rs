//! Contains all the diagnostics the type system reports.

use std::fmt;

use constgen_diagnostic::{Diagnostic, Related, Report, Severity, Span};
use constgen_evaluator::EvaluationError;
use constgen_term::{
    constant::ConstValue, expression::ConstExpr,
    generic_parameter::GenericKind, r#type::Type,
};
use derive_new::new;
use enum_as_inner::EnumAsInner;

use crate::declaration::OrderingMode;

/// A generic parameter is declared after a parameter of a kind that must
/// come later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error(
    "the {kind} parameter `{parameter}` is declared after the \
     {preceded_kind} parameter `{preceded}`"
)]
pub struct OrderingViolation {
    /// The misplaced parameter.
    pub parameter: String,

    /// The kind of the misplaced parameter.
    pub kind: GenericKind,

    /// Where the misplaced parameter is declared.
    pub span: Span,

    /// The earlier parameter the misplaced one should have preceded.
    pub preceded: String,

    /// The kind of the earlier parameter.
    pub preceded_kind: GenericKind,

    /// Where the earlier parameter is declared.
    pub preceded_span: Span,

    /// The ordering rules in effect.
    pub mode: OrderingMode,
}

impl Report for OrderingViolation {
    fn report(&self) -> Diagnostic {
        let help = match self.mode {
            OrderingMode::Strict => {
                "declare lifetime parameters first, then type parameters, \
                 then value parameters"
            }
            OrderingMode::Mixed => {
                "lifetime parameters must precede every type and value \
                 parameter"
            }
        };

        Diagnostic {
            span: self.span,
            message: self.to_string(),
            severity: Severity::Error,
            help_message: Some(help.to_string()),
            related: vec![Related::new(
                self.preceded_span,
                format!("`{}` is declared here", self.preceded),
            )],
        }
    }
}

/// Two generic parameters of one declaration share a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error("the generic parameter `{name}` is declared more than once")]
pub struct DuplicatedGenericParameter {
    /// The shared name.
    pub name: String,

    /// Where the duplicate is declared.
    pub span: Span,

    /// Where the name was first declared.
    pub previous_span: Span,
}

impl Report for DuplicatedGenericParameter {
    fn report(&self) -> Diagnostic {
        Diagnostic {
            span: self.span,
            message: self.to_string(),
            severity: Severity::Error,
            help_message: None,
            related: vec![Related::new(
                self.previous_span,
                "first declared here".to_string(),
            )],
        }
    }
}

/// A value parameter's domain has no usable equality, or a value bound to a
/// parameter isn't equal to itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error("invalid value for the domain `{domain}` of `{parameter}`")]
pub struct InvalidValueDomain {
    /// The value parameter.
    pub parameter: String,

    /// The domain of the parameter.
    pub domain: Type,

    /// The offending value, `None` if the domain itself is rejected at the
    /// declaration.
    pub value: Option<ConstValue>,

    /// Where the error occurred.
    pub span: Span,
}

impl Report for InvalidValueDomain {
    fn report(&self) -> Diagnostic {
        let (message, help) = match &self.value {
            Some(value) => (
                format!(
                    "the value `{value}` can't be bound to `{}`: it isn't \
                     equal to itself under the equality of `{}`",
                    self.parameter, self.domain
                ),
                "such a value has no canonical form to identify an \
                 instantiation by",
            ),
            None => (
                format!(
                    "`{}` can't be the domain of the value parameter `{}`",
                    self.domain, self.parameter
                ),
                "a value parameter's domain must have an equality; integers, \
                 `bool`, `char`, floats and types declaring `PartialEq` \
                 qualify",
            ),
        };

        Diagnostic {
            span: self.span,
            message,
            severity: Severity::Error,
            help_message: Some(help.to_string()),
            related: Vec::new(),
        }
    }
}

/// A parameter that no explicit argument, inference path or default could
/// bind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct UnboundParameter {
    /// The name of the parameter.
    pub name: String,

    /// The compound expressions the parameter occurs in, which would have to
    /// be inverted to derive it.
    pub expressions: Vec<ConstExpr>,
}

/// Some generic parameters of a use site can't be inferred.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error("can't infer the generic arguments of `{item}`")]
pub struct AmbiguousInference {
    /// The item being instantiated.
    pub item: String,

    /// Every parameter left unbound.
    pub unbound: Vec<UnboundParameter>,

    /// The use site.
    pub span: Span,
}

impl Report for AmbiguousInference {
    fn report(&self) -> Diagnostic {
        let names = self
            .unbound
            .iter()
            .map(|parameter| format!("`{}`", parameter.name))
            .collect::<Vec<_>>()
            .join(", ");

        let trapped = self
            .unbound
            .iter()
            .filter(|parameter| !parameter.expressions.is_empty())
            .map(|parameter| {
                let expressions = parameter
                    .expressions
                    .iter()
                    .map(|expression| format!("`{expression}`"))
                    .collect::<Vec<_>>()
                    .join(", ");

                format!("`{}` only occurs in {expressions}", parameter.name)
            })
            .collect::<Vec<_>>();

        let help = if trapped.is_empty() {
            "supply the arguments explicitly or declare a default".to_string()
        } else {
            format!(
                "{}; such expressions are never inverted, supply the \
                 arguments explicitly",
                trapped.join("; ")
            )
        };

        Diagnostic {
            span: self.span,
            message: format!(
                "can't infer {names} when instantiating `{}`",
                self.item
            ),
            severity: Severity::Error,
            help_message: Some(help),
            related: Vec::new(),
        }
    }
}

/// Where a binding of a generic parameter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BindingSource {
    /// The n-th explicit generic argument of its kind.
    Explicit {
        /// Zero-based position among the arguments of the kind.
        index: usize,
    },

    /// The type of the n-th call argument.
    Argument {
        /// Zero-based position of the argument.
        index: usize,
    },

    /// The type the use site expects the result to have.
    ExpectedReturn,

    /// The declared default.
    Default,
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit { index } => {
                write!(f, "explicit argument #{}", index + 1)
            }
            Self::Argument { index } => write!(f, "argument #{}", index + 1),
            Self::ExpectedReturn => write!(f, "the expected return type"),
            Self::Default => write!(f, "the default"),
        }
    }
}

/// Why two types or values didn't agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumAsInner)]
pub enum MismatchReason {
    /// One parameter was bound to two different things.
    ConflictingBindings {
        /// The first binding, displayed.
        first: String,

        /// Where the first binding came from.
        first_source: BindingSource,

        /// The second binding, displayed.
        second: String,

        /// Where the second binding came from.
        second_source: BindingSource,
    },

    /// A parameter type doesn't have the shape of the argument type.
    StructuralMismatch {
        /// The innermost type required by the declaration.
        expected: Type,

        /// The innermost type found at the use site.
        found: Type,

        /// The argument the types came from.
        source: BindingSource,
    },

    /// The number of call arguments differs from the declaration.
    ArgumentCount {
        /// The number of declared parameters.
        expected: usize,

        /// The number of supplied arguments.
        found: usize,
    },

    /// A compound expression evaluated to something other than the value it
    /// was matched against.
    CompoundDisagreement {
        /// The expression written in the declaration.
        expression: ConstExpr,

        /// The value the expression evaluated to.
        evaluated: ConstValue,

        /// The value found at the use site.
        found: ConstValue,

        /// The argument the value came from.
        source: BindingSource,
    },

    /// A value has a different domain than required.
    UnexpectedDomain {
        /// The required domain.
        expected: Type,

        /// The domain of the supplied value.
        found: Type,
    },

    /// A value isn't equal to itself and can't be bound.
    NotEligible {
        /// The rejected value.
        value: ConstValue,
    },

    /// An implementation doesn't bind a constant its trait declares.
    MissingAssociatedConstant(String),

    /// An implementation binds one constant more than once.
    DuplicatedAssociatedConstant(String),

    /// An implementation binds a constant its trait doesn't declare.
    UnknownAssociatedConstant(String),
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConflictingBindings {
                first,
                first_source,
                second,
                second_source,
            } => write!(
                f,
                "`{first}` from {first_source} conflicts with `{second}` from \
                 {second_source}"
            ),
            Self::StructuralMismatch { expected, found, source } => write!(
                f,
                "expected `{expected}`, found `{found}` in {source}"
            ),
            Self::ArgumentCount { expected, found } => {
                write!(f, "expected {expected} argument(s), found {found}")
            }
            Self::CompoundDisagreement { expression, evaluated, found, source } => {
                write!(
                    f,
                    "`{expression}` evaluates to `{evaluated}` but {source} \
                     has `{found}`"
                )
            }
            Self::UnexpectedDomain { expected, found } => {
                write!(f, "expected a value of `{expected}`, found `{found}`")
            }
            Self::NotEligible { value } => {
                write!(f, "the value `{value}` isn't equal to itself")
            }
            Self::MissingAssociatedConstant(name) => {
                write!(f, "the associated constant `{name}` is not bound")
            }
            Self::DuplicatedAssociatedConstant(name) => {
                write!(f, "the associated constant `{name}` is bound twice")
            }
            Self::UnknownAssociatedConstant(name) => {
                write!(f, "the trait declares no associated constant `{name}`")
            }
        }
    }
}

/// Two things that had to agree didn't.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error("mismatched types for `{subject}`: {reason}")]
pub struct TypeMismatch {
    /// The parameter, item or implementation the mismatch is about.
    pub subject: String,

    /// What disagreed.
    pub reason: MismatchReason,

    /// Where the mismatch was found.
    pub span: Span,
}

impl Report for TypeMismatch {
    fn report(&self) -> Diagnostic {
        Diagnostic {
            span: self.span,
            message: self.to_string(),
            severity: Severity::Error,
            help_message: None,
            related: Vec::new(),
        }
    }
}

/// Why a where clause doesn't hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumAsInner, derive_more::Display)]
pub enum ClauseFailure {
    /// The clause evaluated to `false`.
    #[display(fmt = "it evaluates to `false`")]
    Unsatisfied,

    /// The evaluation ran out of steps.
    #[display(fmt = "its evaluation exceeded the budget of {} steps", budget)]
    Exhausted {
        /// The exhausted budget.
        budget: usize,
    },

    /// The evaluation failed.
    #[display(fmt = "its evaluation failed: {}", _0)]
    Failed(EvaluationError),
}

/// A where clause doesn't hold for the resolved arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error("the where clause `{clause}` is not satisfied: {reason}")]
pub struct ConflictingWhereClause {
    /// The clause as declared.
    pub clause: ConstExpr,

    /// Why the clause doesn't hold.
    pub reason: ClauseFailure,

    /// Where the clause is declared.
    pub clause_span: Span,

    /// The use site the clause was checked for.
    pub span: Span,
}

impl Report for ConflictingWhereClause {
    fn report(&self) -> Diagnostic {
        Diagnostic {
            span: self.span,
            message: self.to_string(),
            severity: Severity::Error,
            help_message: None,
            related: vec![Related::new(
                self.clause_span,
                "the clause is declared here".to_string(),
            )],
        }
    }
}

/// A required constant expression didn't finish within the step budget.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error("evaluating `{expression}` exceeded the budget of {budget} steps")]
pub struct NonTerminatingConstEval {
    /// The expression being evaluated.
    pub expression: ConstExpr,

    /// The budget in effect.
    pub budget: usize,

    /// Where the evaluation was required.
    pub span: Span,
}

impl Report for NonTerminatingConstEval {
    fn report(&self) -> Diagnostic {
        Diagnostic {
            span: self.span,
            message: self.to_string(),
            severity: Severity::Error,
            help_message: Some(
                "the expression may not terminate; simplify it or raise the \
                 evaluation budget"
                    .to_string(),
            ),
            related: Vec::new(),
        }
    }
}

/// A required constant expression couldn't be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error("failed to evaluate `{expression}`: {error}")]
pub struct ConstEvaluationFailed {
    /// The expression being evaluated.
    pub expression: ConstExpr,

    /// The evaluation error.
    pub error: EvaluationError,

    /// Where the evaluation was required.
    pub span: Span,
}

impl Report for ConstEvaluationFailed {
    fn report(&self) -> Diagnostic {
        Diagnostic {
            span: self.span,
            message: self.to_string(),
            severity: Severity::Error,
            help_message: None,
            related: Vec::new(),
        }
    }
}

/// More explicit generic arguments of one kind than the item declares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error(
    "`{item}` takes {expected} {kind} argument(s) but {found} were supplied"
)]
pub struct MismatchedGenericArgumentCount {
    /// The item being instantiated.
    pub item: String,

    /// The kind of the arguments.
    pub kind: GenericKind,

    /// The number of declared parameters of the kind.
    pub expected: usize,

    /// The number of supplied arguments of the kind.
    pub found: usize,

    /// The use site.
    pub span: Span,
}

impl Report for MismatchedGenericArgumentCount {
    fn report(&self) -> Diagnostic {
        Diagnostic {
            span: self.span,
            message: self.to_string(),
            severity: Severity::Error,
            help_message: None,
            related: Vec::new(),
        }
    }
}

/// An implementation matching a type, displayed by its pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct Candidate {
    /// The type the implementation is for.
    pub implemented_for: Type,

    /// Where the implementation is declared.
    pub span: Span,
}

/// Several implementations match a type and none is more specific than all
/// the others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error(
    "the implementation of `{trait_name}` providing `{name}` for `{ty}` is \
     ambiguous"
)]
pub struct AmbiguousImplementation {
    /// The trait the implementations are of.
    pub trait_name: String,

    /// The associated constant requested.
    pub name: String,

    /// The type the implementation was looked up for.
    pub ty: Type,

    /// The most specific candidates.
    pub candidates: Vec<Candidate>,

    /// Where the constant was required.
    pub span: Span,
}

impl Report for AmbiguousImplementation {
    fn report(&self) -> Diagnostic {
        Diagnostic {
            span: self.span,
            message: self.to_string(),
            severity: Severity::Error,
            help_message: Some(
                "add an implementation more specific than every candidate"
                    .to_string(),
            ),
            related: self
                .candidates
                .iter()
                .map(|candidate| {
                    Related::new(
                        candidate.span,
                        format!(
                            "candidate for `{}`",
                            candidate.implemented_for
                        ),
                    )
                })
                .collect(),
        }
    }
}

/// A name that refers to no declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, new)]
#[error("`{name}` is not declared")]
pub struct UnknownSymbol {
    /// The unknown name.
    pub name: String,

    /// Where the name was used.
    pub span: Span,
}

impl Report for UnknownSymbol {
    fn report(&self) -> Diagnostic {
        Diagnostic {
            span: self.span,
            message: self.to_string(),
            severity: Severity::Error,
            help_message: None,
            related: Vec::new(),
        }
    }
}

/// Every diagnostic the type system can report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, EnumAsInner)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    OrderingViolation(#[from] OrderingViolation),

    #[error(transparent)]
    DuplicatedGenericParameter(#[from] DuplicatedGenericParameter),

    #[error(transparent)]
    InvalidValueDomain(#[from] InvalidValueDomain),

    #[error(transparent)]
    AmbiguousInference(#[from] AmbiguousInference),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),

    #[error(transparent)]
    ConflictingWhereClause(#[from] ConflictingWhereClause),

    #[error(transparent)]
    NonTerminatingConstEval(#[from] NonTerminatingConstEval),

    #[error(transparent)]
    ConstEvaluationFailed(#[from] ConstEvaluationFailed),

    #[error(transparent)]
    MismatchedGenericArgumentCount(#[from] MismatchedGenericArgumentCount),

    #[error(transparent)]
    AmbiguousImplementation(#[from] AmbiguousImplementation),

    #[error(transparent)]
    UnknownSymbol(#[from] UnknownSymbol),
}

impl Report for Error {
    fn report(&self) -> Diagnostic {
        match self {
            Self::OrderingViolation(error) => error.report(),
            Self::DuplicatedGenericParameter(error) => error.report(),
            Self::InvalidValueDomain(error) => error.report(),
            Self::AmbiguousInference(error) => error.report(),
            Self::TypeMismatch(error) => error.report(),
            Self::ConflictingWhereClause(error) => error.report(),
            Self::NonTerminatingConstEval(error) => error.report(),
            Self::ConstEvaluationFailed(error) => error.report(),
            Self::MismatchedGenericArgumentCount(error) => error.report(),
            Self::AmbiguousImplementation(error) => error.report(),
            Self::UnknownSymbol(error) => error.report(),
        }
    }
}
