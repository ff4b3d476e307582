use proptest::{prop_assert, prop_assert_eq, proptest};

use crate::{
    constant::{ConstValue, Float, Value},
    r#type::Primitive,
};

#[test]
fn nan_is_not_reflexive() {
    let nan = ConstValue::float(Primitive::Float64, f64::NAN).unwrap();
    let zero = ConstValue::float(Primitive::Float64, 0.0).unwrap();

    assert!(!nan.is_reflexive());
    assert!(nan.canonical().is_none());
    assert!(zero.is_reflexive());
}

#[test]
fn negative_zero_canonicalizes_to_zero() {
    let zero = ConstValue::float(Primitive::Float64, 0.0).unwrap();
    let negative_zero = ConstValue::float(Primitive::Float64, -0.0).unwrap();

    // structurally distinct, semantically equal
    assert_ne!(zero, negative_zero);
    assert!(zero.semantic_eq(&negative_zero));
    assert_eq!(zero.canonical(), negative_zero.canonical());
}

#[test]
fn nested_nan_is_detected() {
    let value = Value::Tuple(vec![
        Value::Integer(1),
        Value::Array(vec![Value::Float(Float::new(f64::NAN))]),
    ]);

    assert!(!value.is_reflexive());
    assert!(value.canonical().is_none());
}

#[test]
fn integer_range_is_checked() {
    assert!(ConstValue::integer(Primitive::Uint8, 255).is_some());
    assert!(ConstValue::integer(Primitive::Uint8, 256).is_none());
    assert!(ConstValue::integer(Primitive::Bool, 0).is_none());
    assert_eq!(
        ConstValue::usize(3).cast_integer(Primitive::Uint32),
        ConstValue::integer(Primitive::Uint32, 3)
    );
}

#[test]
fn float32_rounds() {
    let value = ConstValue::float(Primitive::Float32, 0.1).unwrap();
    assert_eq!(*value.value(), Value::Float(Float::new(f64::from(0.1_f32))));
}

proptest! {
    #[test]
    fn canonical_form_agrees_with_semantic_equality(lhs: f64, rhs: f64) {
        let lhs = Value::Float(Float::new(lhs));
        let rhs = Value::Float(Float::new(rhs));

        match (lhs.canonical(), rhs.canonical()) {
            (Some(lhs_canonical), Some(rhs_canonical)) => {
                prop_assert_eq!(lhs.semantic_eq(&rhs), lhs_canonical == rhs_canonical);
            }
            _ => prop_assert!(!lhs.is_reflexive() || !rhs.is_reflexive()),
        }
    }

    #[test]
    fn canonical_is_idempotent(value: f64) {
        let value = Value::Float(Float::new(value));

        if let Some(canonical) = value.canonical() {
            prop_assert_eq!(canonical.canonical(), Some(canonical));
        }
    }
}
