use crate::{
    constant::ConstValue,
    expression::{BinaryOperator, ConstExpr},
    r#type::{Primitive, Type},
};

#[test]
fn primitive_suffix_lookup() {
    assert_eq!(Primitive::from_suffix("u8"), Some(Primitive::Uint8));
    assert_eq!(Primitive::from_suffix("f64"), Some(Primitive::Float64));
    assert_eq!(Primitive::from_suffix("u128"), None);
}

#[test]
fn integer_ranges() {
    assert_eq!(Primitive::Uint8.integer_range(), Some((0, 255)));
    assert_eq!(Primitive::Int8.integer_range(), Some((-128, 127)));
    assert_eq!(Primitive::Float32.integer_range(), None);
    assert!(Primitive::Usize.is_integer());
    assert!(!Primitive::Bool.is_integer());
}

#[test]
fn display() {
    let ty = Type::symbol_with_constants(
        "T",
        [ConstExpr::binary(
            BinaryOperator::Add,
            ConstExpr::parameter("n"),
            ConstExpr::literal("1"),
        )],
    );
    assert_eq!(ty.to_string(), "T<{n + 1}>");

    let array = Type::array(
        Type::Primitive(Primitive::Float64),
        ConstExpr::Value(ConstValue::usize(3)),
    );
    assert_eq!(array.to_string(), "[f64; 3]");
    assert_eq!(Type::reference(array).to_string(), "&[f64; 3]");
    assert_eq!(Type::unit().to_string(), "()");
}

#[test]
fn concreteness() {
    let generic = Type::array(Type::Parameter("T".to_string()), ConstExpr::parameter("n"));
    assert!(!generic.is_concrete());
    assert_eq!(generic.value_parameters().into_iter().collect::<Vec<_>>(), ["n"]);
    assert_eq!(generic.type_parameters().into_iter().collect::<Vec<_>>(), ["T"]);

    let concrete = Type::symbol_with_constants("Bar", [ConstValue::usize(3).into()]);
    assert!(concrete.is_concrete());
}
