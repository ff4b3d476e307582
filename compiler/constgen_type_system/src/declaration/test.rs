use constgen_diagnostic::Span;
use constgen_handler::Storage;
use constgen_term::{
    generic_parameter::{GenericKind, GenericParameter},
    r#type::{Primitive, Type},
};
use proptest::{prop_assert_eq, proptest, sample::select};

use crate::{
    declaration::{Declaration, GenericParameterList, Item, OrderingMode},
    diagnostic::Error,
    domain::Validator,
};

fn parameter(kind: GenericKind, name: &str) -> GenericParameter {
    match kind {
        GenericKind::Lifetime => GenericParameter::lifetime(name),
        GenericKind::Type => GenericParameter::r#type(name),
        GenericKind::Value => {
            GenericParameter::value(name, Type::Primitive(Primitive::Usize))
        }
    }
}

fn declare(
    kinds: &[GenericKind],
    mode: OrderingMode,
) -> (Option<GenericParameterList>, Vec<Error>) {
    let parameters = kinds
        .iter()
        .enumerate()
        .map(|(index, kind)| parameter(*kind, &format!("p{index}")))
        .collect();

    let storage = Storage::<Error>::new();
    let list = GenericParameterList::declare(parameters, mode, &storage).ok();

    (list, storage.into_vec())
}

#[test]
fn strict_order() {
    use GenericKind::{Lifetime, Type, Value};

    let (list, errors) = declare(&[Lifetime, Type, Value], OrderingMode::Strict);
    assert!(errors.is_empty());
    let list = list.unwrap();
    assert_eq!(list.lifetimes().count(), 1);
    assert_eq!(list.types().count(), 1);
    assert_eq!(list.values().count(), 1);

    let (list, errors) = declare(&[Type, Lifetime], OrderingMode::Strict);
    assert!(list.is_none());
    let [Error::OrderingViolation(violation)] = errors.as_slice() else {
        panic!("expected one ordering violation, got {errors:?}");
    };
    assert_eq!(violation.parameter, "p1");
    assert_eq!(violation.kind, Lifetime);
    assert_eq!(violation.preceded, "p0");
    assert_eq!(violation.preceded_kind, Type);

    let (list, _) = declare(&[Lifetime, Value, Type], OrderingMode::Strict);
    assert!(list.is_none());
}

#[test]
fn mixed_order() {
    use GenericKind::{Lifetime, Type, Value};

    let (list, errors) = declare(&[Lifetime, Value, Type], OrderingMode::Mixed);
    assert!(list.is_some());
    assert!(errors.is_empty());

    let (list, errors) = declare(&[Type, Lifetime], OrderingMode::Mixed);
    assert!(list.is_none());
    assert!(errors[0].as_ordering_violation().is_some());
}

#[test]
fn duplicated_names() {
    let storage = Storage::<Error>::new();
    let parameters = vec![
        GenericParameter::r#type("T"),
        GenericParameter::value("T", Type::Primitive(Primitive::Usize)),
    ];

    assert!(
        GenericParameterList::declare(parameters, OrderingMode::Strict, &storage)
            .is_err()
    );

    let errors = storage.into_vec();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].as_duplicated_generic_parameter().unwrap().name, "T");
}

#[test]
fn lookups() {
    let storage = Storage::<Error>::new();
    let list = GenericParameterList::declare(
        vec![
            GenericParameter::lifetime("a"),
            GenericParameter::r#type("T"),
            GenericParameter::value("n", Type::Primitive(Primitive::Usize)),
        ],
        OrderingMode::Strict,
        &storage,
    )
    .unwrap();

    assert_eq!(list.len(), 3);
    assert_eq!(list.get("n").map(GenericParameter::kind), Some(GenericKind::Value));
    assert!(list.type_parameter("T").is_some());
    assert!(list.type_parameter("n").is_none());
    assert_eq!(
        list.value_parameter("n").map(|parameter| &parameter.domain),
        Some(&Type::Primitive(Primitive::Usize))
    );
}

fn item(parameters: Vec<GenericParameter>) -> Item {
    Item {
        name: "item".to_string(),
        kind: crate::declaration::ItemKind::Function,
        generic_parameters: parameters,
        where_clauses: Vec::new(),
        signature: crate::declaration::Signature::default(),
        span: Span::default(),
    }
}

#[test]
fn float_domain_is_accepted_at_declaration() {
    let storage = Storage::<Error>::new();
    let declaration = Declaration::declare(
        item(vec![GenericParameter::value("x", Type::Primitive(Primitive::Float64))]),
        OrderingMode::Strict,
        &Validator::new(),
        &storage,
    );

    assert!(declaration.is_ok());
    assert!(storage.is_empty());
}

#[test]
fn ineligible_domain_drops_the_declaration() {
    let storage = Storage::<Error>::new();
    let declaration = Declaration::declare(
        item(vec![
            GenericParameter::r#type("T"),
            GenericParameter::value("x", Type::Parameter("T".to_string())),
        ]),
        OrderingMode::Strict,
        &Validator::new(),
        &storage,
    );

    assert!(declaration.is_err());
    let errors = storage.into_vec();
    let invalid = errors[0].as_invalid_value_domain().unwrap();
    assert_eq!(invalid.parameter, "x");
    assert!(invalid.value.is_none());
}

proptest! {
    #[test]
    fn strict_mode_accepts_exactly_sorted_kinds(
        kinds in proptest::collection::vec(
            select(vec![GenericKind::Lifetime, GenericKind::Type, GenericKind::Value]),
            0..8
        )
    ) {
        let (list, _) = declare(&kinds, OrderingMode::Strict);
        let sorted = kinds.windows(2).all(|pair| pair[0] <= pair[1]);

        prop_assert_eq!(list.is_some(), sorted);
    }

    #[test]
    fn mixed_mode_only_constrains_lifetimes(
        kinds in proptest::collection::vec(
            select(vec![GenericKind::Lifetime, GenericKind::Type, GenericKind::Value]),
            0..8
        )
    ) {
        let (list, _) = declare(&kinds, OrderingMode::Mixed);
        let lifetimes_first = kinds
            .iter()
            .skip_while(|kind| **kind == GenericKind::Lifetime)
            .all(|kind| *kind != GenericKind::Lifetime);

        prop_assert_eq!(list.is_some(), lifetimes_first);
    }
}
