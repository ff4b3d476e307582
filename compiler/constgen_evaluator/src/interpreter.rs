//! Contains the [`Interpreter`], the bounded reference [`Evaluator`].

use std::collections::HashMap;

use constgen_term::{
    constant::{ConstValue, Value},
    expression::{Binary, BinaryOperator, Call, ConstExpr, Unary, UnaryOperator},
    r#type::{Primitive, Type},
};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::{literal, Bindings, Error, EvaluationError, Evaluator, NonTerminating};

/// The deepest nesting of function calls an evaluation may reach before it's
/// considered non-terminating, regardless of the remaining budget.
pub const MAX_CALL_DEPTH: usize = 128;

const BOOL: Type = Type::Primitive(Primitive::Bool);

/// A pure function constant expressions may call, e.g.
/// `fn square(x: usize) -> usize { x * x }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Function {
    /// The names and domains of the parameters.
    pub parameters: Vec<(String, Type)>,

    /// The domain of the result.
    pub return_type: Type,

    /// The body, which may only reference the parameters.
    pub body: ConstExpr,
}

/// Evaluates constant expressions by walking the expression tree, charging
/// one step for every node it reduces.
///
/// Function bodies are re-entered on every call so recursive functions work
/// and a function that never returns exhausts the budget.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    functions: HashMap<String, Function>,
}

impl Interpreter {
    /// Creates an interpreter without any function.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Makes `function` callable under `name`, returning the function
    /// previously registered under that name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        function: Function,
    ) -> Option<Function> {
        self.functions.insert(name.into(), function)
    }

    /// Returns the function registered under `name`.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }
}

impl Evaluator for Interpreter {
    fn evaluate(
        &self,
        expression: &ConstExpr,
        bindings: &Bindings,
        expected: Option<&Type>,
        budget: usize,
    ) -> Result<ConstValue, Error> {
        trace!("evaluating `{expression}` within {budget} steps");

        let mut session =
            Session { interpreter: self, budget, remaining: budget, depth: 0 };

        session.evaluate(expression, bindings, expected)
    }
}

struct Session<'a> {
    interpreter: &'a Interpreter,
    budget: usize,
    remaining: usize,
    depth: usize,
}

impl Session<'_> {
    fn charge(&mut self) -> Result<(), Error> {
        if self.remaining == 0 {
            return Err(NonTerminating { budget: self.budget }.into());
        }

        self.remaining -= 1;
        Ok(())
    }

    fn evaluate(
        &mut self,
        expression: &ConstExpr,
        bindings: &Bindings,
        expected: Option<&Type>,
    ) -> Result<ConstValue, Error> {
        self.charge()?;

        let value = match expression {
            ConstExpr::Value(value) => value.clone(),
            ConstExpr::Literal(literal) => literal::parse(literal, expected)?,
            ConstExpr::Parameter(name) => {
                bindings.get(name).cloned().ok_or_else(|| {
                    EvaluationError::UnboundParameter(name.clone())
                })?
            }
            ConstExpr::Associated(associated) => {
                return Err(EvaluationError::UnresolvedAssociatedConstant(
                    associated.clone(),
                )
                .into())
            }
            ConstExpr::Unary(unary) => self.unary(unary, bindings, expected)?,
            ConstExpr::Binary(binary) => {
                self.binary(binary, bindings, expected)?
            }
            ConstExpr::Call(call) => self.call(call, bindings)?,
            ConstExpr::If(conditional) => {
                let condition =
                    self.evaluate(&conditional.condition, bindings, Some(&BOOL))?;

                let branch = if as_bool(&condition)? {
                    &conditional.then
                } else {
                    &conditional.otherwise
                };

                self.evaluate(branch, bindings, expected)?
            }
            ConstExpr::Tuple(elements) => {
                self.tuple(elements, bindings, expected)?
            }
            ConstExpr::Array(elements) => {
                self.array(elements, bindings, expected)?
            }
        };

        match expected {
            Some(expected) if value.domain() != expected => {
                Err(EvaluationError::TypeMismatch {
                    expected: expected.clone(),
                    found: value.domain().clone(),
                }
                .into())
            }
            _ => Ok(value),
        }
    }

    fn unary(
        &mut self,
        unary: &Unary,
        bindings: &Bindings,
        expected: Option<&Type>,
    ) -> Result<ConstValue, Error> {
        let operand = self.evaluate(&unary.operand, bindings, expected)?;

        match (unary.operator, operand.value()) {
            (UnaryOperator::Negate, Value::Integer(integer)) => {
                integer_result(primitive(&operand)?, integer.checked_neg())
            }
            (UnaryOperator::Negate, Value::Float(float)) => {
                float_result(primitive(&operand)?, -float.get())
            }
            (UnaryOperator::Not, Value::Bool(boolean)) => {
                Ok(ConstValue::bool(!boolean))
            }
            (operator, _) => Err(unsupported(operator, operand.domain())),
        }
    }

    fn binary(
        &mut self,
        binary: &Binary,
        bindings: &Bindings,
        expected: Option<&Type>,
    ) -> Result<ConstValue, Error> {
        let operator = binary.operator;

        if operator.is_logical() {
            let lhs = as_bool(&self.evaluate(&binary.lhs, bindings, Some(&BOOL))?)?;

            let short_circuit = match operator {
                BinaryOperator::And => !lhs,
                _ => lhs,
            };
            if short_circuit {
                return Ok(ConstValue::bool(lhs));
            }

            let rhs = as_bool(&self.evaluate(&binary.rhs, bindings, Some(&BOOL))?)?;
            return Ok(ConstValue::bool(rhs));
        }

        if operator.is_comparison() {
            let (lhs, rhs) =
                self.operands(&binary.lhs, &binary.rhs, bindings, None)?;

            return compare(operator, &lhs, &rhs).map(ConstValue::bool);
        }

        let (lhs, rhs) =
            self.operands(&binary.lhs, &binary.rhs, bindings, expected)?;

        arithmetic(operator, &lhs, &rhs)
    }

    /// Evaluates both operands of a binary operator into the same domain.
    fn operands(
        &mut self,
        lhs: &ConstExpr,
        rhs: &ConstExpr,
        bindings: &Bindings,
        expected: Option<&Type>,
    ) -> Result<(ConstValue, ConstValue), Error> {
        // an untyped literal takes the domain of the other operand
        if expected.is_none() && is_untyped(lhs) && !is_untyped(rhs) {
            let rhs = self.evaluate(rhs, bindings, None)?;
            let lhs = self.evaluate(lhs, bindings, Some(rhs.domain()))?;

            Ok((lhs, rhs))
        } else {
            let lhs = self.evaluate(lhs, bindings, expected)?;
            let rhs = self.evaluate(rhs, bindings, Some(lhs.domain()))?;

            Ok((lhs, rhs))
        }
    }

    fn call(
        &mut self,
        call: &Call,
        bindings: &Bindings,
    ) -> Result<ConstValue, Error> {
        let interpreter = self.interpreter;
        let function = interpreter.function(&call.function).ok_or_else(|| {
            EvaluationError::UnknownFunction(call.function.clone())
        })?;

        if function.parameters.len() != call.arguments.len() {
            return Err(EvaluationError::ArityMismatch {
                function: call.function.clone(),
                expected: function.parameters.len(),
                found: call.arguments.len(),
            }
            .into());
        }

        let mut locals = Bindings::new();
        for ((name, domain), argument) in
            function.parameters.iter().zip(&call.arguments)
        {
            let value = self.evaluate(argument, bindings, Some(domain))?;
            locals.insert(name.clone(), value);
        }

        if self.depth == MAX_CALL_DEPTH {
            return Err(NonTerminating { budget: self.budget }.into());
        }

        self.depth += 1;
        let result =
            self.evaluate(&function.body, &locals, Some(&function.return_type));
        self.depth -= 1;

        result
    }

    fn tuple(
        &mut self,
        elements: &[ConstExpr],
        bindings: &Bindings,
        expected: Option<&Type>,
    ) -> Result<ConstValue, Error> {
        let expected_elements = match expected {
            Some(Type::Tuple(types)) if types.len() == elements.len() => {
                Some(types)
            }
            _ => None,
        };

        let mut domains = Vec::with_capacity(elements.len());
        let mut values = Vec::with_capacity(elements.len());

        for (index, element) in elements.iter().enumerate() {
            let expected = expected_elements.and_then(|types| types.get(index));
            let (domain, value) =
                self.evaluate(element, bindings, expected)?.into_parts();

            domains.push(domain);
            values.push(value);
        }

        Ok(ConstValue::new(Type::Tuple(domains), Value::Tuple(values)))
    }

    fn array(
        &mut self,
        elements: &[ConstExpr],
        bindings: &Bindings,
        expected: Option<&Type>,
    ) -> Result<ConstValue, Error> {
        let mut element_domain = match expected {
            Some(Type::Array(array)) => Some((*array.r#type).clone()),
            _ => None,
        };

        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            let (domain, value) = self
                .evaluate(element, bindings, element_domain.as_ref())?
                .into_parts();

            element_domain.get_or_insert(domain);
            values.push(value);
        }

        let element_domain = element_domain
            .ok_or_else(|| EvaluationError::CannotInferType("[]".to_string()))?;
        let length = ConstValue::usize(values.len() as u64);

        Ok(ConstValue::new(
            Type::array(element_domain, length.into()),
            Value::Array(values),
        ))
    }
}

fn is_untyped(expression: &ConstExpr) -> bool {
    match expression {
        ConstExpr::Literal(literal) => literal.suffix.is_none(),
        ConstExpr::Unary(unary) => is_untyped(&unary.operand),
        ConstExpr::Binary(binary) => {
            !binary.operator.is_comparison()
                && !binary.operator.is_logical()
                && is_untyped(&binary.lhs)
                && is_untyped(&binary.rhs)
        }
        _ => false,
    }
}

fn as_bool(value: &ConstValue) -> Result<bool, Error> {
    value.as_bool().ok_or_else(|| {
        EvaluationError::TypeMismatch {
            expected: BOOL,
            found: value.domain().clone(),
        }
        .into()
    })
}

fn unsupported(operator: impl ToString, domain: &Type) -> Error {
    EvaluationError::UnsupportedOperation {
        operator: operator.to_string(),
        domain: domain.clone(),
    }
    .into()
}

fn primitive(value: &ConstValue) -> Result<Primitive, Error> {
    value.domain().as_primitive().copied().ok_or_else(|| {
        EvaluationError::CannotInferType(value.to_string()).into()
    })
}

fn integer_result(
    primitive: Primitive,
    value: Option<i128>,
) -> Result<ConstValue, Error> {
    value
        .and_then(|value| ConstValue::integer(primitive, value))
        .ok_or_else(|| EvaluationError::Overflow(primitive).into())
}

fn float_result(primitive: Primitive, value: f64) -> Result<ConstValue, Error> {
    ConstValue::float(primitive, value).ok_or_else(|| {
        EvaluationError::TypeMismatch {
            expected: Type::Primitive(Primitive::Float64),
            found: Type::Primitive(primitive),
        }
        .into()
    })
}

fn arithmetic(
    operator: BinaryOperator,
    lhs: &ConstValue,
    rhs: &ConstValue,
) -> Result<ConstValue, Error> {
    match (lhs.value(), rhs.value()) {
        (Value::Integer(lhs_value), Value::Integer(rhs_value)) => {
            let result = match operator {
                BinaryOperator::Add => lhs_value.checked_add(*rhs_value),
                BinaryOperator::Subtract => lhs_value.checked_sub(*rhs_value),
                BinaryOperator::Multiply => lhs_value.checked_mul(*rhs_value),
                BinaryOperator::Divide | BinaryOperator::Remainder
                    if *rhs_value == 0 =>
                {
                    return Err(EvaluationError::DivisionByZero.into());
                }
                BinaryOperator::Divide => lhs_value.checked_div(*rhs_value),
                BinaryOperator::Remainder => lhs_value.checked_rem(*rhs_value),
                operator => return Err(unsupported(operator, lhs.domain())),
            };

            integer_result(primitive(lhs)?, result)
        }

        (Value::Float(lhs_value), Value::Float(rhs_value)) => {
            let (lhs_value, rhs_value) = (lhs_value.get(), rhs_value.get());
            let result = match operator {
                BinaryOperator::Add => lhs_value + rhs_value,
                BinaryOperator::Subtract => lhs_value - rhs_value,
                BinaryOperator::Multiply => lhs_value * rhs_value,
                BinaryOperator::Divide => lhs_value / rhs_value,
                BinaryOperator::Remainder => lhs_value % rhs_value,
                operator => return Err(unsupported(operator, lhs.domain())),
            };

            float_result(primitive(lhs)?, result)
        }

        _ => Err(unsupported(operator, lhs.domain())),
    }
}

fn compare(
    operator: BinaryOperator,
    lhs: &ConstValue,
    rhs: &ConstValue,
) -> Result<bool, Error> {
    match operator {
        BinaryOperator::Equal => return Ok(lhs.semantic_eq(rhs)),
        BinaryOperator::NotEqual => return Ok(!lhs.semantic_eq(rhs)),
        _ => {}
    }

    let ordering = match (lhs.value(), rhs.value()) {
        (Value::Integer(lhs), Value::Integer(rhs)) => Some(lhs.cmp(rhs)),
        (Value::Float(lhs), Value::Float(rhs)) => lhs.get().partial_cmp(&rhs.get()),
        (Value::Bool(lhs), Value::Bool(rhs)) => Some(lhs.cmp(rhs)),
        (Value::Char(lhs), Value::Char(rhs)) => Some(lhs.cmp(rhs)),
        _ => return Err(unsupported(operator, lhs.domain())),
    };

    // unordered floats compare false under every ordering operator
    Ok(ordering.is_some_and(|ordering| match operator {
        BinaryOperator::Less => ordering.is_lt(),
        BinaryOperator::LessEqual => ordering.is_le(),
        BinaryOperator::Greater => ordering.is_gt(),
        BinaryOperator::GreaterEqual => ordering.is_ge(),
        _ => false,
    }))
}

#[cfg(test)]
mod test;
