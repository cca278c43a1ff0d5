use super::*;

#[test]
fn string_literal_strips_one_pair_of_quotes() {
    assert_eq!(Literal::string("\"abc\""), Literal::String("abc".to_owned()));
    assert_eq!(
        Literal::string("\"\"abc\"\""),
        Literal::String("\"abc\"".to_owned())
    );
    assert_eq!(Literal::string("abc"), Literal::String("abc".to_owned()));
    assert_eq!(Literal::string("\"abc"), Literal::String("\"abc".to_owned()));
    assert_eq!(Literal::string("\""), Literal::String("\"".to_owned()));
}

#[test]
fn numbers_are_normalized_to_f32() {
    assert_eq!(Literal::from(1), Literal::Number(1.0));
    assert_eq!(Literal::from(0.1f64), Literal::Number(0.1f32));
    assert_eq!(Literal::from(7u32).as_number(), Some(7.0));
}

#[test]
fn operands_lift_primitives_into_literal_nodes() {
    let e = Operand::from("name").into_expression();
    assert_eq!(e.as_literal(), Some(&Literal::String("name".to_owned())));
    let n = Operand::from(2).into_expression();
    assert_eq!(n, Expression::Literal(Literal::Number(2.0)));
}

#[test]
fn expression_operand_cannot_become_a_literal() {
    let op = Operand::from(Expression::new("zoom", vec![]));
    let err = Literal::try_from(op).unwrap_err();
    assert!(matches!(err, MapGlueError::Construction(_)));

    let ok = Literal::try_from(Operand::from(true)).unwrap();
    assert_eq!(ok, Literal::Bool(true));
}

#[test]
fn accessors_match_node_kind() {
    let e = Expression::new("get", vec![Literal::string("k").into()]);
    assert_eq!(e.operator(), Some("get"));
    assert_eq!(e.args().len(), 1);
    assert!(e.as_map().is_none());

    let lit = Expression::Literal(Literal::Bool(false));
    assert!(lit.operator().is_none());
    assert!(lit.args().is_empty());
    assert!(Literal::Bool(false).is_scalar());
    assert!(!Literal::Array(vec![]).is_scalar());
}
