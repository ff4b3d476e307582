use crate::{
    constant::ConstValue,
    expression::{BinaryOperator, ConstExpr},
    instantiation::{instantiate_expression, instantiate_type, Instantiation},
    lifetime::Lifetime,
    r#type::{Primitive, Reference, Type},
};

#[test]
fn substitutes_types_and_constants() {
    let mut instantiation = Instantiation::default();
    instantiation
        .types
        .insert("T".to_string(), Type::Primitive(Primitive::Float64));
    instantiation.constants.insert("n".to_string(), ConstValue::usize(3));

    let mut ty = Type::Reference(Reference {
        lifetime: Lifetime::Parameter("a".to_string()),
        pointee: Box::new(Type::array(
            Type::Parameter("T".to_string()),
            ConstExpr::parameter("n"),
        )),
    });

    instantiate_type(&mut ty, &instantiation);

    assert_eq!(
        ty,
        Type::reference(Type::array(
            Type::Primitive(Primitive::Float64),
            ConstExpr::Value(ConstValue::usize(3)),
        ))
    );
}

#[test]
fn substitutes_inside_compound_expressions() {
    let mut instantiation = Instantiation::default();
    instantiation.constants.insert("n".to_string(), ConstValue::usize(4));
    instantiation
        .types
        .insert("T".to_string(), Type::symbol_with_constants("V", Vec::<ConstExpr>::new()));

    let mut expression = ConstExpr::binary(
        BinaryOperator::Equal,
        ConstExpr::associated(Type::Parameter("T".to_string()), "p"),
        ConstExpr::binary(
            BinaryOperator::Add,
            ConstExpr::parameter("n"),
            ConstExpr::parameter("m"),
        ),
    );

    instantiate_expression(&mut expression, &instantiation);

    assert_eq!(expression.to_string(), "V::p == (4 + m)");
    assert_eq!(expression.parameters().into_iter().collect::<Vec<_>>(), ["m"]);
}
