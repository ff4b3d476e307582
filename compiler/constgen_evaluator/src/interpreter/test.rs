use constgen_term::{
    constant::ConstValue,
    expression::{
        BinaryOperator, Call, Conditional, ConstExpr, Literal, Unary,
        UnaryOperator,
    },
    r#type::{Primitive, Type},
};
use proptest::{prop_assert_eq, proptest};

use crate::{
    interpreter::{Function, Interpreter},
    Bindings, Error, EvaluationError, Evaluator, NonTerminating,
};

const BUDGET: usize = 10_000;

fn usize_type() -> Type { Type::Primitive(Primitive::Usize) }

fn bind(name: &str, value: ConstValue) -> Bindings {
    std::iter::once((name.to_string(), value)).collect()
}

fn binary(operator: BinaryOperator, lhs: ConstExpr, rhs: ConstExpr) -> ConstExpr {
    ConstExpr::binary(operator, lhs, rhs)
}

fn call(function: &str, arguments: Vec<ConstExpr>) -> ConstExpr {
    ConstExpr::Call(Call { function: function.to_string(), arguments })
}

fn n() -> ConstExpr { ConstExpr::parameter("n") }

fn lit(text: &str) -> ConstExpr { ConstExpr::literal(text) }

#[test]
fn forward_arithmetic() {
    let expression = binary(BinaryOperator::Add, n(), lit("1"));

    let value = Interpreter::new()
        .evaluate(&expression, &bind("n", ConstValue::usize(3)), Some(&usize_type()), BUDGET)
        .unwrap();

    assert_eq!(value, ConstValue::usize(4));
}

#[test]
fn parity_clause() {
    let clause = binary(
        BinaryOperator::Equal,
        binary(BinaryOperator::Remainder, n(), lit("2")),
        lit("1"),
    );
    let domain = Type::Primitive(Primitive::Bool);
    let interpreter = Interpreter::new();

    for (n, odd) in [(4, false), (5, true)] {
        let value = interpreter
            .evaluate(&clause, &bind("n", ConstValue::usize(n)), Some(&domain), BUDGET)
            .unwrap();

        assert_eq!(value, ConstValue::bool(odd));
    }
}

#[test]
fn literal_on_the_left_takes_the_other_side() {
    let n = ConstValue::integer(Primitive::Uint8, 7).unwrap();
    let expression = binary(BinaryOperator::Less, lit("3"), ConstExpr::parameter("n"));

    let value =
        Interpreter::new().evaluate(&expression, &bind("n", n), None, BUDGET).unwrap();

    assert_eq!(value, ConstValue::bool(true));
}

#[test]
fn overflow_and_division_by_zero() {
    let interpreter = Interpreter::new();
    let max = ConstValue::integer(Primitive::Uint8, 255).unwrap();

    assert_eq!(
        interpreter.evaluate(
            &binary(BinaryOperator::Add, n(), lit("1")),
            &bind("n", max),
            None,
            BUDGET
        ),
        Err(Error::Evaluation(EvaluationError::Overflow(Primitive::Uint8)))
    );
    assert_eq!(
        interpreter.evaluate(
            &binary(BinaryOperator::Divide, n(), lit("0")),
            &bind("n", ConstValue::usize(1)),
            None,
            BUDGET
        ),
        Err(Error::Evaluation(EvaluationError::DivisionByZero))
    );
}

#[test]
fn unbound_parameter_and_unresolved_associated_constant() {
    let interpreter = Interpreter::new();

    assert_eq!(
        interpreter.evaluate(&n(), &Bindings::new(), None, BUDGET),
        Err(Error::Evaluation(EvaluationError::UnboundParameter("n".to_string())))
    );

    let associated = ConstExpr::associated(Type::Parameter("T".to_string()), "p");
    assert!(matches!(
        interpreter.evaluate(&associated, &Bindings::new(), None, BUDGET),
        Err(Error::Evaluation(EvaluationError::UnresolvedAssociatedConstant(_)))
    ));
}

#[test]
fn domain_mismatch() {
    let result = Interpreter::new().evaluate(
        &ConstExpr::Literal(Literal::new("1".to_string(), Some(Primitive::Uint8))),
        &Bindings::new(),
        Some(&usize_type()),
        BUDGET,
    );

    assert!(matches!(
        result,
        Err(Error::Evaluation(EvaluationError::TypeMismatch { .. }))
    ));
}

#[test]
fn short_circuit_skips_the_failing_operand() {
    let expression = binary(
        BinaryOperator::And,
        lit("false"),
        binary(
            BinaryOperator::Equal,
            binary(BinaryOperator::Divide, lit("1"), lit("0")),
            lit("1"),
        ),
    );

    assert_eq!(
        Interpreter::new().evaluate(&expression, &Bindings::new(), None, BUDGET),
        Ok(ConstValue::bool(false))
    );
}

#[test]
fn conditional_and_negation() {
    let expression = ConstExpr::If(Conditional {
        condition: Box::new(binary(BinaryOperator::Greater, n(), lit("2"))),
        then: Box::new(ConstExpr::Unary(Unary {
            operator: UnaryOperator::Negate,
            operand: Box::new(lit("1")),
        })),
        otherwise: Box::new(lit("1")),
    });
    let domain = Type::Primitive(Primitive::Int64);

    let value = Interpreter::new()
        .evaluate(&expression, &bind("n", ConstValue::usize(3)), Some(&domain), BUDGET)
        .unwrap();

    assert_eq!(value, ConstValue::integer(Primitive::Int64, -1).unwrap());
}

#[test]
fn array_of_floats() {
    let expression =
        ConstExpr::Array(vec![lit("1.0"), lit("2.4"), lit("-5.3")]);

    let value = Interpreter::new()
        .evaluate(&expression, &Bindings::new(), None, BUDGET)
        .unwrap();

    assert_eq!(value.domain().to_string(), "[f64; 3]");
    assert_eq!(value.to_string(), "[1.0, 2.4, -5.3]");
}

#[test]
fn tuple_takes_element_domains() {
    let expected = Type::Tuple(vec![usize_type(), Type::Primitive(Primitive::Bool)]);
    let expression = ConstExpr::Tuple(vec![lit("3"), lit("true")]);

    let value = Interpreter::new()
        .evaluate(&expression, &Bindings::new(), Some(&expected), BUDGET)
        .unwrap();

    assert_eq!(value.domain(), &expected);
}

fn factorial() -> Function {
    Function {
        parameters: vec![("n".to_string(), usize_type())],
        return_type: usize_type(),
        body: ConstExpr::If(Conditional {
            condition: Box::new(binary(BinaryOperator::Equal, n(), lit("0"))),
            then: Box::new(lit("1")),
            otherwise: Box::new(binary(
                BinaryOperator::Multiply,
                n(),
                call("factorial", vec![binary(BinaryOperator::Subtract, n(), lit("1"))]),
            )),
        }),
    }
}

#[test]
fn recursive_function() {
    let mut interpreter = Interpreter::new();
    assert!(interpreter.register("factorial", factorial()).is_none());

    let value = interpreter
        .evaluate(
            &call("factorial", vec![lit("5")]),
            &Bindings::new(),
            Some(&usize_type()),
            BUDGET,
        )
        .unwrap();

    assert_eq!(value, ConstValue::usize(120));
}

#[test]
fn non_terminating_function() {
    let mut interpreter = Interpreter::new();
    interpreter.register("spin", Function {
        parameters: vec![("n".to_string(), usize_type())],
        return_type: usize_type(),
        body: call("spin", vec![binary(BinaryOperator::Add, n(), lit("1"))]),
    });

    assert_eq!(
        interpreter.evaluate(
            &call("spin", vec![lit("0")]),
            &Bindings::new(),
            None,
            BUDGET
        ),
        Err(Error::NonTerminating(NonTerminating { budget: BUDGET }))
    );
}

#[test]
fn budget_is_charged_per_node() {
    let expression = binary(BinaryOperator::Add, n(), lit("1"));
    let bindings = bind("n", ConstValue::usize(1));
    let interpreter = Interpreter::new();

    assert!(interpreter.evaluate(&expression, &bindings, None, 3).is_ok());
    assert_eq!(
        interpreter.evaluate(&expression, &bindings, None, 2),
        Err(Error::NonTerminating(NonTerminating { budget: 2 }))
    );
}

#[test]
fn unknown_function_and_arity() {
    let mut interpreter = Interpreter::new();
    interpreter.register("factorial", factorial());

    assert_eq!(
        interpreter.evaluate(&call("missing", Vec::new()), &Bindings::new(), None, BUDGET),
        Err(Error::Evaluation(EvaluationError::UnknownFunction(
            "missing".to_string()
        )))
    );
    assert_eq!(
        interpreter.evaluate(&call("factorial", Vec::new()), &Bindings::new(), None, BUDGET),
        Err(Error::Evaluation(EvaluationError::ArityMismatch {
            function: "factorial".to_string(),
            expected: 1,
            found: 0,
        }))
    );
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(lhs: u32, rhs: u32) {
        let expression = binary(
            BinaryOperator::Add,
            binary(BinaryOperator::Multiply, ConstExpr::parameter("a"), ConstExpr::parameter("b")),
            lit("7"),
        );
        let domain = Primitive::Uint64;
        let bindings: Bindings = [
            ("a".to_string(), ConstValue::integer(domain, i128::from(lhs)).unwrap()),
            ("b".to_string(), ConstValue::integer(domain, i128::from(rhs)).unwrap()),
        ]
        .into_iter()
        .collect();
        let interpreter = Interpreter::new();

        let first = interpreter.evaluate(&expression, &bindings, None, BUDGET);
        let second = interpreter.evaluate(&expression, &bindings, None, BUDGET);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            first.unwrap().as_integer(),
            Some(i128::from(u64::from(lhs) * u64::from(rhs) + 7))
        );
    }
}
