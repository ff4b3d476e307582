use std::{io::Write, path::PathBuf, sync::Arc};

use constgen_diagnostic::Abort;
use constgen_handler::{Counter, Storage};
use constgen_monomorphize::Config;
use constgen_type_system::{
    declaration::OrderingMode,
    diagnostic::{ClauseFailure, Error},
};

use crate::{execute, Arguments, LoadError, Program};

const PROGRAM: &str = r#"(
    adts: [
        (
            name: "T",
            kind: Struct,
            value_parameters: [("n", Primitive(Usize))],
            equality: Total,
            variants: [(name: "T")],
        ),
    ],
    functions: {
        "spin": (
            parameters: [("n", Primitive(Usize))],
            return_type: Primitive(Bool),
            body: Call((function: "spin", arguments: [Parameter("n")])),
        ),
    },
    items: [
        (
            name: "inc_explicit",
            generic_parameters: [Value((name: "n", domain: Primitive(Usize)))],
            signature: (
                parameters: [Symbol((name: "T", generic_arguments: (constants: [Parameter("n")])))],
                return_type: Some(Symbol((
                    name: "T",
                    generic_arguments: (constants: [
                        Binary((operator: Add, lhs: Parameter("n"), rhs: Literal((text: "1")))),
                    ]),
                ))),
            ),
        ),
        (
            name: "center",
            generic_parameters: [Value((name: "n", domain: Primitive(Usize)))],
            where_clauses: [
                (
                    expression: Binary((
                        operator: Equal,
                        lhs: Binary((operator: Remainder, lhs: Parameter("n"), rhs: Literal((text: "2")))),
                        rhs: Literal((text: "1")),
                    )),
                    span: (start: (line: 40, column: 13), end: (line: 40, column: 23)),
                ),
            ],
        ),
        (
            name: "stuck",
            generic_parameters: [Value((name: "n", domain: Primitive(Usize)))],
            where_clauses: [
                (expression: Call((function: "spin", arguments: [Parameter("n")]))),
            ],
        ),
    ],
    uses: [
        (
            item: "inc_explicit",
            call_site: (
                arguments: Some([Symbol((name: "T", generic_arguments: (constants: [Literal((text: "3"))])))]),
            ),
        ),
        (item: "center", call_site: (generic_arguments: (constants: [Literal((text: "4"))]))),
        (item: "center", call_site: (generic_arguments: (constants: [Literal((text: "5"))]))),
        (item: "missing"),
        (item: "stuck", call_site: (generic_arguments: (constants: [Literal((text: "1"))]))),
    ],
)"#;

fn program() -> Program { ron::from_str(PROGRAM).unwrap() }

#[test]
fn use_sites_are_rendered_in_order() {
    let storage = Arc::new(Storage::<Error>::new());
    let results = execute(program(), Config::default(), storage.clone());

    assert_eq!(results, vec![
        Ok("fn inc_explicit<3>(T<3>) -> T<4>".to_string()),
        Err(Abort),
        Ok("fn center<5>()".to_string()),
        Err(Abort),
        Err(Abort),
    ]);

    let errors = storage.as_vec();
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().any(|error| error
        .as_unknown_symbol()
        .is_some_and(|unknown| unknown.name == "missing")));
    assert!(errors.iter().any(|error| error
        .as_conflicting_where_clause()
        .is_some_and(|conflict| matches!(conflict.reason, ClauseFailure::Exhausted { .. }))));
}

#[test]
fn budget_bounds_the_where_clauses() {
    let storage = Arc::new(Storage::<Error>::new());
    let config = Config { budget: 50, ..Config::default() };
    let results = execute(program(), config, storage.clone());

    assert_eq!(results[4], Err(Abort));
    assert!(storage.as_vec().iter().any(|error| error
        .as_conflicting_where_clause()
        .is_some_and(|conflict| conflict.reason == ClauseFailure::Exhausted { budget: 50 })));
}

#[test]
fn every_failure_reaches_the_handler() {
    let counter = Arc::new(Counter::default());
    let results = execute(program(), Config::default(), counter.clone());

    assert_eq!(counter.count(), results.iter().filter(|result| result.is_err()).count());
}

fn arguments(config: Option<PathBuf>) -> Arguments {
    Arguments {
        file: PathBuf::from("program.ron"),
        config,
        budget: None,
        mixed_order: false,
    }
}

#[test]
fn config_file_and_flags() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "budget = 64").unwrap();

    let config = arguments(Some(file.path().to_path_buf())).config().unwrap();
    assert_eq!(config.budget, 64);
    assert_eq!(config.ordering, OrderingMode::Strict);

    let overridden = Arguments {
        budget: Some(8),
        mixed_order: true,
        ..arguments(Some(file.path().to_path_buf()))
    }
    .config()
    .unwrap();
    assert_eq!(overridden, Config { budget: 8, ordering: OrderingMode::Mixed });

    assert_eq!(arguments(None).config().unwrap(), Config::default());
}

#[test]
fn invalid_inputs() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "budget = \"many\"").unwrap();
    assert!(matches!(
        arguments(Some(config.path().to_path_buf())).config(),
        Err(LoadError::Config { .. })
    ));

    let mut declarations = tempfile::NamedTempFile::new().unwrap();
    writeln!(declarations, "(items: [(kind: Function)])").unwrap();
    assert!(matches!(Program::load(declarations.path()), Err(LoadError::Program { .. })));

    let directory = tempfile::tempdir().unwrap();
    assert!(matches!(
        Program::load(&directory.path().join("absent.ron")),
        Err(LoadError::Io { .. })
    ));
}
