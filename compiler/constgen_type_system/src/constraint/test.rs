use constgen_diagnostic::Span;
use constgen_evaluator::{EvaluationError, Function, Interpreter};
use constgen_term::{
    constant::ConstValue,
    expression::{AssociatedConstant, BinaryOperator, Call, ConstExpr},
    instantiation::Instantiation,
    r#type::{Primitive, Type},
};

use crate::{
    associated::AssociatedBindings,
    declaration::WhereClause,
    diagnostic::ClauseFailure,
    domain::Validator,
    Environment,
};

const BUDGET: usize = 1_000;

fn n() -> ConstExpr { ConstExpr::parameter("n") }

fn lit(text: &str) -> ConstExpr { ConstExpr::literal(text) }

fn clause(expression: ConstExpr, line: u32) -> WhereClause {
    WhereClause { expression, span: Span::at(line, 1) }
}

fn odd() -> ConstExpr {
    ConstExpr::binary(
        BinaryOperator::Equal,
        ConstExpr::binary(BinaryOperator::Remainder, n(), lit("2")),
        lit("1"),
    )
}

fn with_n(value: u64) -> Instantiation {
    Instantiation {
        constants: std::iter::once(("n".to_string(), ConstValue::usize(value))).collect(),
        ..Instantiation::default()
    }
}

#[test]
fn parity() {
    let validator = Validator::new();
    let interpreter = Interpreter::new();
    let environment = Environment::new(&interpreter, &validator, BUDGET);

    // center<T, n: usize>(a: &[T; n]) where n % 2 == 1
    let clauses = [clause(odd(), 2)];

    let error = environment
        .check(&clauses, &with_n(4), &AssociatedBindings::new(), Span::at(10, 5))
        .unwrap_err();
    assert_eq!(error.reason, ClauseFailure::Unsatisfied);
    assert_eq!(error.clause, odd());
    assert_eq!(error.clause_span, Span::at(2, 1));
    assert_eq!(error.span, Span::at(10, 5));

    assert!(environment
        .check(&clauses, &with_n(5), &AssociatedBindings::new(), Span::default())
        .is_ok());
}

#[test]
fn first_failing_clause_is_reported() {
    let validator = Validator::new();
    let interpreter = Interpreter::new();
    let environment = Environment::new(&interpreter, &validator, BUDGET);

    let positive = ConstExpr::binary(BinaryOperator::Greater, n(), lit("0"));
    let small = ConstExpr::binary(BinaryOperator::Less, n(), lit("3"));
    let clauses = [clause(positive, 1), clause(small.clone(), 2), clause(odd(), 3)];

    let error = environment
        .check(&clauses, &with_n(4), &AssociatedBindings::new(), Span::default())
        .unwrap_err();
    assert_eq!(error.clause, small);
}

#[test]
fn exhausted_budget() {
    let validator = Validator::new();
    let mut interpreter = Interpreter::new();
    interpreter.register("spin", Function {
        parameters: vec![("x".to_string(), Type::Primitive(Primitive::Usize))],
        return_type: Type::Primitive(Primitive::Bool),
        body: ConstExpr::Call(Call {
            function: "spin".to_string(),
            arguments: vec![ConstExpr::parameter("x")],
        }),
    });
    let environment = Environment::new(&interpreter, &validator, BUDGET);

    let clauses = [clause(
        ConstExpr::Call(Call { function: "spin".to_string(), arguments: vec![n()] }),
        1,
    )];

    let error = environment
        .check(&clauses, &with_n(1), &AssociatedBindings::new(), Span::default())
        .unwrap_err();
    assert!(matches!(error.reason, ClauseFailure::Exhausted { .. }));
}

#[test]
fn failed_evaluation() {
    let validator = Validator::new();
    let interpreter = Interpreter::new();
    let environment = Environment::new(&interpreter, &validator, BUDGET);

    let division = ConstExpr::binary(
        BinaryOperator::Equal,
        ConstExpr::binary(BinaryOperator::Divide, n(), lit("0")),
        lit("1"),
    );

    let error = environment
        .check(&[clause(division, 1)], &with_n(3), &AssociatedBindings::new(), Span::default())
        .unwrap_err();
    assert_eq!(error.reason, ClauseFailure::Failed(EvaluationError::DivisionByZero));
}

#[test]
fn associated_constants_are_substituted() {
    let validator = Validator::new();
    let interpreter = Interpreter::new();
    let environment = Environment::new(&interpreter, &validator, BUDGET);

    let p = AssociatedConstant { ty: Type::Parameter("U".to_string()), name: "p".to_string() };
    let clauses = [clause(
        ConstExpr::binary(
            BinaryOperator::Equal,
            ConstExpr::Associated(p.clone()),
            n(),
        ),
        1,
    )];

    let associated: AssociatedBindings =
        std::iter::once((p.clone(), ConstValue::usize(3))).collect();

    assert!(environment.check(&clauses, &with_n(3), &associated, Span::default()).is_ok());
    assert_eq!(
        environment
            .check(&clauses, &with_n(4), &associated, Span::default())
            .unwrap_err()
            .reason,
        ClauseFailure::Unsatisfied
    );

    // without a value the reference can't be evaluated
    let error = environment
        .check(&clauses, &with_n(3), &AssociatedBindings::new(), Span::default())
        .unwrap_err();
    assert_eq!(
        error.reason,
        ClauseFailure::Failed(EvaluationError::UnresolvedAssociatedConstant(p))
    );
}
