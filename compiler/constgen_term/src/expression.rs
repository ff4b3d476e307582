//! Contains the definition of [`ConstExpr`], the unreduced constant expression
//! written in generic-argument or where-clause position.

use std::{collections::BTreeSet, fmt};

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use crate::{
    constant::ConstValue,
    r#type::{Primitive, Type},
    write_separated,
};

/// A literal as it was written in the source, e.g. `0x10`, `1_000u32`, `2.5`,
/// `true` or `'a'`.
///
/// The literal is parsed by the evaluator once its expected domain is known,
/// so alternate spellings of one number reduce to the same value.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_new::new,
)]
pub struct Literal {
    /// The literal text without the suffix.
    pub text: String,

    /// The explicit type suffix, if any.
    #[serde(default)]
    pub suffix: Option<Primitive>,
}

/// Refers to a constant declared on a trait through a type, e.g. `T::p`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AssociatedConstant {
    /// The type whose implementation provides the constant.
    pub ty: Type,

    /// The name of the associated constant.
    pub name: String,
}

impl fmt::Display for AssociatedConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ty {
            Type::Parameter(_) | Type::Primitive(_) | Type::Symbol(_) => {
                write!(f, "{}::{}", self.ty, self.name)
            }
            ty => write!(f, "<{ty}>::{}", self.name),
        }
    }
}

/// Operators taking one operand.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[allow(missing_docs)]
pub enum UnaryOperator {
    #[display(fmt = "-")]
    Negate,
    #[display(fmt = "!")]
    Not,
}

/// Operators taking two operands.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[allow(missing_docs)]
pub enum BinaryOperator {
    #[display(fmt = "+")]
    Add,
    #[display(fmt = "-")]
    Subtract,
    #[display(fmt = "*")]
    Multiply,
    #[display(fmt = "/")]
    Divide,
    #[display(fmt = "%")]
    Remainder,
    #[display(fmt = "==")]
    Equal,
    #[display(fmt = "!=")]
    NotEqual,
    #[display(fmt = "<")]
    Less,
    #[display(fmt = "<=")]
    LessEqual,
    #[display(fmt = ">")]
    Greater,
    #[display(fmt = ">=")]
    GreaterEqual,
    #[display(fmt = "&&")]
    And,
    #[display(fmt = "||")]
    Or,
}

impl BinaryOperator {
    /// Returns `true` for operators producing a `bool` out of two operands of
    /// the same arbitrary domain.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::Less
                | Self::LessEqual
                | Self::Greater
                | Self::GreaterEqual
        )
    }

    /// Returns `true` for the short-circuiting boolean operators.
    #[must_use]
    pub const fn is_logical(self) -> bool { matches!(self, Self::And | Self::Or) }
}

/// A unary operation, e.g. `-n`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[allow(missing_docs)]
pub struct Unary {
    pub operator: UnaryOperator,
    pub operand: Box<ConstExpr>,
}

/// A binary operation, e.g. `n + 1`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[allow(missing_docs)]
pub struct Binary {
    pub operator: BinaryOperator,
    pub lhs: Box<ConstExpr>,
    pub rhs: Box<ConstExpr>,
}

/// An application of a pure function registered with the evaluator.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Call {
    /// The name of the function.
    pub function: String,

    /// The arguments of the call.
    #[serde(default)]
    pub arguments: Vec<ConstExpr>,
}

/// `if condition { then } else { otherwise }`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[allow(missing_docs)]
pub struct Conditional {
    pub condition: Box<ConstExpr>,
    pub then: Box<ConstExpr>,
    pub otherwise: Box<ConstExpr>,
}

/// An unreduced constant expression.
///
/// The expression is owned by the declaration or use site it was written in.
/// Only [`ConstExpr::Value`] is considered reduced.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumAsInner,
    Serialize,
    Deserialize,
)]
#[allow(missing_docs)]
pub enum ConstExpr {
    Value(ConstValue),
    Literal(Literal),

    /// A reference to a value parameter.
    Parameter(String),

    Associated(AssociatedConstant),
    Unary(Unary),
    Binary(Binary),
    Call(Call),
    If(Conditional),
    Tuple(Vec<ConstExpr>),
    Array(Vec<ConstExpr>),
}

impl ConstExpr {
    /// Creates an unsuffixed literal expression.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(Literal { text: text.into(), suffix: None })
    }

    /// Creates a reference to the value parameter `name`.
    #[must_use]
    pub fn parameter(name: impl Into<String>) -> Self {
        Self::Parameter(name.into())
    }

    /// Creates a binary operation.
    #[must_use]
    pub fn binary(operator: BinaryOperator, lhs: Self, rhs: Self) -> Self {
        Self::Binary(Binary {
            operator,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// Creates a reference to an associated constant `ty::name`.
    #[must_use]
    pub fn associated(ty: Type, name: impl Into<String>) -> Self {
        Self::Associated(AssociatedConstant { ty, name: name.into() })
    }

    /// Returns `true` if the expression is a single parameter reference and
    /// nothing else.
    #[must_use]
    pub fn as_bare_parameter(&self) -> Option<&str> {
        self.as_parameter().map(String::as_str)
    }

    /// Collects the names of the value parameters referenced anywhere in the
    /// expression.
    #[must_use]
    pub fn parameters(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.visit(&mut |expression| {
            if let Self::Parameter(name) = expression {
                names.insert(name.clone());
            }
        });
        names
    }

    /// Collects every associated constant referenced in the expression.
    #[must_use]
    pub fn associated_constants(&self) -> Vec<AssociatedConstant> {
        let mut constants = Vec::new();
        self.visit(&mut |expression| {
            if let Self::Associated(associated) = expression {
                if !constants.contains(associated) {
                    constants.push(associated.clone());
                }
            }
        });
        constants
    }

    /// Visits the expression and all its sub-expressions in pre-order.
    pub fn visit(&self, f: &mut impl FnMut(&Self)) {
        f(self);

        match self {
            Self::Value(_)
            | Self::Literal(_)
            | Self::Parameter(_)
            | Self::Associated(_) => {}
            Self::Unary(unary) => unary.operand.visit(f),
            Self::Binary(binary) => {
                binary.lhs.visit(f);
                binary.rhs.visit(f);
            }
            Self::Call(call) => {
                for argument in &call.arguments {
                    argument.visit(f);
                }
            }
            Self::If(conditional) => {
                conditional.condition.visit(f);
                conditional.then.visit(f);
                conditional.otherwise.visit(f);
            }
            Self::Tuple(elements) | Self::Array(elements) => {
                for element in elements {
                    element.visit(f);
                }
            }
        }
    }

    /// Rewrites the expression bottom-up: `f` is applied to every
    /// sub-expression after its children have been rewritten.
    pub fn rewrite(&mut self, f: &mut impl FnMut(&mut Self)) {
        match self {
            Self::Value(_)
            | Self::Literal(_)
            | Self::Parameter(_)
            | Self::Associated(_) => {}
            Self::Unary(unary) => unary.operand.rewrite(f),
            Self::Binary(binary) => {
                binary.lhs.rewrite(f);
                binary.rhs.rewrite(f);
            }
            Self::Call(call) => {
                for argument in &mut call.arguments {
                    argument.rewrite(f);
                }
            }
            Self::If(conditional) => {
                conditional.condition.rewrite(f);
                conditional.then.rewrite(f);
                conditional.otherwise.rewrite(f);
            }
            Self::Tuple(elements) | Self::Array(elements) => {
                for element in elements {
                    element.rewrite(f);
                }
            }
        }

        f(self);
    }
}

impl From<ConstValue> for ConstExpr {
    fn from(value: ConstValue) -> Self { Self::Value(value) }
}

struct Operand<'a>(&'a ConstExpr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ConstExpr::Binary(_) | ConstExpr::If(_) => write!(f, "({})", self.0),
            expression => write!(f, "{expression}"),
        }
    }
}

impl fmt::Display for ConstExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Literal(literal) => match literal.suffix {
                Some(suffix) => write!(f, "{}{suffix}", literal.text),
                None => write!(f, "{}", literal.text),
            },
            Self::Parameter(name) => write!(f, "{name}"),
            Self::Associated(associated) => write!(f, "{associated}"),
            Self::Unary(unary) => {
                write!(f, "{}{}", unary.operator, Operand(&unary.operand))
            }
            Self::Binary(binary) => write!(
                f,
                "{} {} {}",
                Operand(&binary.lhs),
                binary.operator,
                Operand(&binary.rhs)
            ),
            Self::Call(call) => {
                write!(f, "{}(", call.function)?;
                write_separated(f, &call.arguments)?;
                write!(f, ")")
            }
            Self::If(conditional) => write!(
                f,
                "if {} {{ {} }} else {{ {} }}",
                conditional.condition, conditional.then, conditional.otherwise
            ),
            Self::Tuple(elements) => {
                write!(f, "(")?;
                write_separated(f, elements)?;
                if elements.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Self::Array(elements) => {
                write!(f, "[")?;
                write_separated(f, elements)?;
                write!(f, "]")
            }
        }
    }
}
