use constgen_term::{
    constant::{ConstValue, Value},
    expression::Literal,
    r#type::{Primitive, Type},
};

use crate::{literal::parse, EvaluationError};

fn unsuffixed(text: &str) -> Literal { Literal::new(text.to_string(), None) }

#[test]
fn spellings_of_one_number_agree() {
    let usize = Type::Primitive(Primitive::Usize);

    for text in ["16", "0x10", "0o20", "0b1_0000", "1_6"] {
        assert_eq!(
            parse(&unsuffixed(text), Some(&usize)),
            Ok(ConstValue::usize(16)),
            "{text}"
        );
    }
}

#[test]
fn suffix_decides_domain() {
    let literal = Literal::new("255".to_string(), Some(Primitive::Uint8));
    assert_eq!(
        parse(&literal, None).ok(),
        ConstValue::integer(Primitive::Uint8, 255)
    );

    let overflowing = Literal::new("256".to_string(), Some(Primitive::Uint8));
    assert_eq!(
        parse(&overflowing, None),
        Err(EvaluationError::Overflow(Primitive::Uint8))
    );
}

#[test]
fn suffix_conflicting_with_expected_domain() {
    let literal = Literal::new("3".to_string(), Some(Primitive::Uint8));

    assert_eq!(
        parse(&literal, Some(&Type::Primitive(Primitive::Usize))),
        Err(EvaluationError::TypeMismatch {
            expected: Type::Primitive(Primitive::Usize),
            found: Type::Primitive(Primitive::Uint8),
        })
    );
}

#[test]
fn context_free_defaults() {
    assert_eq!(
        parse(&unsuffixed("7"), None).unwrap().domain(),
        &Type::Primitive(Primitive::Int32)
    );
    assert_eq!(
        parse(&unsuffixed("2.5"), None).unwrap().domain(),
        &Type::Primitive(Primitive::Float64)
    );
    assert_eq!(parse(&unsuffixed("true"), None), Ok(ConstValue::bool(true)));
    assert_eq!(
        parse(&unsuffixed("'\\n'"), None).unwrap().value(),
        &Value::Char('\n')
    );
}

#[test]
fn negative_and_special_floats() {
    let f64 = Type::Primitive(Primitive::Float64);

    let negative = parse(&unsuffixed("-5.3"), Some(&f64)).unwrap();
    assert_eq!(negative, ConstValue::float(Primitive::Float64, -5.3).unwrap());

    let nan = parse(&unsuffixed("NaN"), Some(&f64)).unwrap();
    assert!(!nan.is_reflexive());

    // integer text is accepted where a float is expected
    assert_eq!(
        parse(&unsuffixed("3"), Some(&f64)),
        Ok(ConstValue::float(Primitive::Float64, 3.0).unwrap())
    );
}

#[test]
fn invalid_literals() {
    let usize = Type::Primitive(Primitive::Usize);

    assert!(matches!(
        parse(&unsuffixed("1.5"), Some(&usize)),
        Err(EvaluationError::InvalidLiteral { .. })
    ));
    assert!(matches!(
        parse(&unsuffixed("0x"), Some(&usize)),
        Err(EvaluationError::InvalidLiteral { .. })
    ));
    assert!(matches!(
        parse(&unsuffixed("-1"), Some(&usize)),
        Err(EvaluationError::Overflow(Primitive::Usize))
    ));
    assert!(matches!(
        parse(&unsuffixed("1"), Some(&Type::unit())),
        Err(EvaluationError::InvalidLiteral { .. })
    ));
}
