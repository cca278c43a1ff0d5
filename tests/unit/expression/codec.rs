use super::*;
use crate::expression::ast::Operand;
use crate::expression::dsl::*;
use crate::expression::options::{
    FormatOption, Interpolator, NumberFormatOption, format_entry, stop,
};
use serde_json::json;

fn round_trip(e: &Expression) -> Expression {
    from_wire(&to_wire(e)).unwrap()
}

#[test]
fn builder_trees_survive_round_trip() {
    let trees = vec![
        get("name"),
        sum([1, 2, 3]).unwrap(),
        all([eq(get("class"), "road"), gt(zoom(), 10)]).unwrap(),
        match_stops(get("k"), "none", [stop(1, "a"), stop(2, "b")]),
        step(zoom(), 0.5, [stop(5, 1), stop(10, 2)]).unwrap(),
        interpolate(
            Interpolator::cubic_bezier(0, 0.5, 1, 1),
            zoom(),
            [stop(0, color(0xFF00_00FFu32)), stop(20, color(0xFFFF_0000u32))],
        )
        .unwrap(),
        literal_array(["a", "b"]).unwrap(),
        literal_object([("k", Literal::Number(0.1)), ("b", Literal::Bool(true))]).unwrap(),
        number_format(get("p"), [NumberFormatOption::locale("de-DE")]),
        format([format_entry(
            get("title"),
            [FormatOption::text_font_stack(&["Noto Sans"])],
        )])
        .unwrap(),
        collator_for_locale(true, true, "en", "US"),
        let_([
            Operand::from("v"),
            Operand::from(get("x")),
            Operand::from(var("v")),
        ])
        .unwrap(),
        literal(true).unwrap(),
        literal(-3.25).unwrap(),
        literal("plain").unwrap(),
    ];
    for t in trees {
        assert_eq!(round_trip(&t), t, "round trip failed for {t}");
    }
}

#[test]
fn within_and_distance_round_trip_through_keyword_map() {
    let polygon = json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]});
    let w = within(&polygon).unwrap();
    assert_eq!(round_trip(&w), w);

    let line = json!({"type": "LineString", "coordinates": [[0, 0], [2, 2]]});
    let d = distance(&line).unwrap();
    assert_eq!(round_trip(&d), d);
}

#[test]
fn within_accepts_raw_geojson_payload() {
    let polygon = json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]});
    let decoded = from_wire(&json!(["within", polygon.clone()])).unwrap();
    assert_eq!(decoded, within(&polygon).unwrap());

    let err = from_wire(&json!(["within", {"type": "Point", "coordinates": [0, 0]}])).unwrap_err();
    assert!(matches!(err, MapGlueError::Parse(_)));
    assert!(from_wire(&json!(["distance"])).is_err());
}

#[test]
fn literal_arrays_reject_nested_values() {
    let err = from_wire(&json!(["literal", [1, ["get", "x"]]])).unwrap_err();
    assert!(matches!(err, MapGlueError::Parse(_)));
    assert!(err.to_string().contains("nested literal arrays"));
    assert!(from_wire(&json!(["literal", [1, {"a": 1}]])).is_err());
    assert!(from_wire(&json!(["literal", [1, 2], [3]])).is_err());
}

#[test]
fn literal_array_decodes_elementwise() {
    let decoded = from_wire(&json!(["literal", [1, "two", false]])).unwrap();
    assert_eq!(
        decoded,
        Expression::Literal(Literal::Array(vec![
            Literal::Number(1.0),
            Literal::String("two".to_owned()),
            Literal::Bool(false),
        ]))
    );
}

#[test]
fn malformed_arrays_are_rejected() {
    assert!(from_wire(&json!([])).is_err());
    let err = from_wire(&json!([1, 2, 3])).unwrap_err();
    assert!(err.to_string().contains("operator name"));
    assert!(from_wire(&json!(["get", []])).is_err());
}

#[test]
fn null_becomes_empty_string_and_objects_become_maps() {
    assert_eq!(
        from_wire(&Value::Null).unwrap(),
        Expression::Literal(Literal::String(String::new()))
    );
    let decoded = from_wire(&json!({"font-scale": 1.2, "text-color": ["get", "c"]})).unwrap();
    let map = decoded.as_map().unwrap();
    assert_eq!(map["font-scale"], literal(1.2).unwrap());
    assert_eq!(map["text-color"], get("c"));
}

#[test]
fn numbers_decode_to_f32() {
    let decoded = from_wire(&json!(["+", 1, 0.1])).unwrap();
    assert_eq!(decoded.args()[0], Expression::Literal(Literal::Number(1.0)));
    assert_eq!(decoded.args()[1], Expression::Literal(Literal::Number(0.1f32)));
}

#[test]
fn floats_use_shortest_decimal_on_the_wire() {
    assert_eq!(literal(0.1).unwrap().to_json_string(), "0.1");
    assert_eq!(literal(5).unwrap().to_json_string(), "5.0");
    assert_eq!(literal(f32::NAN).unwrap().to_wire(), Value::Null);
    assert_eq!(literal(f32::INFINITY).unwrap().to_wire(), Value::Null);
}

#[test]
fn scalar_literal_operator_is_kept() {
    let decoded = from_wire(&json!(["literal", "x"])).unwrap();
    assert_eq!(decoded.operator(), Some("literal"));
    assert_eq!(to_wire(&decoded), json!(["literal", "x"]));
}

#[test]
fn unknown_operators_pass_through() {
    let decoded = from_json_str(r#"["feature-state", "hover"]"#).unwrap();
    assert_eq!(decoded.operator(), Some("feature-state"));
    assert_eq!(decoded.to_json_string(), r#"["feature-state","hover"]"#);
}

#[test]
fn serde_goes_through_the_wire_form() {
    let e = interpolate(Interpolator::linear(), zoom(), [stop(1, 2)]).unwrap();
    let text = serde_json::to_string(&e).unwrap();
    assert_eq!(text, r#"["interpolate",["linear"],["zoom"],1.0,2.0]"#);
    let back: Expression = serde_json::from_str(&text).unwrap();
    assert_eq!(back, e);
    assert!(serde_json::from_str::<Expression>("[]").is_err());
}

#[test]
fn invalid_json_text_is_a_parse_error() {
    let err = Expression::from_json_str("[\"get\",").unwrap_err();
    assert!(matches!(err, MapGlueError::Parse(_)));
}
