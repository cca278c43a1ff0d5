//! Builder combinators, one per style operator.
//!
//! Every combinator accepts `impl Into<Operand>` so expressions and plain values can be mixed,
//! and returns a new [`Expression`]. Variadic combinators check their minimum arity eagerly and
//! return [`MapGlueResult`].

use std::collections::BTreeMap;

use serde_json::Value;

use crate::expression::ast::{Expression, Literal, Operand};
use crate::expression::options::{
    FormatEntry, Interpolator, NumberFormatOption, Stop, locale_tag, validate_ascending,
};
use crate::foundation::core::ArgbColor;
use crate::foundation::error::{MapGlueError, MapGlueResult};

const GEOJSON_GEOMETRY_TYPES: &[&str] = &[
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
    "Feature",
    "FeatureCollection",
];

fn lift(value: impl Into<Operand>) -> Expression {
    value.into().into_expression()
}

fn call<const N: usize>(op: &str, args: [Operand; N]) -> Expression {
    Expression::new(op, args.into_iter().map(Operand::into_expression).collect())
}

fn variadic<I, T>(op: &str, min: usize, inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    let args: Vec<Expression> = inputs.into_iter().map(lift).collect();
    if args.len() < min {
        return Err(MapGlueError::construction(format!(
            "{op} requires at least {min} operand(s), got {}",
            args.len()
        )));
    }
    Ok(Expression::new(op, args))
}

// Literals & color

/// A literal node. Numbers become `f32`; quoted strings lose one pair of quotes.
///
/// Arrays must hold scalars only; object values follow the same rule, recursively.
pub fn literal(value: impl Into<Literal>) -> MapGlueResult<Expression> {
    let value = value.into();
    check_literal(&value)?;
    Ok(Expression::Literal(value))
}

fn check_literal(lit: &Literal) -> MapGlueResult<()> {
    match lit {
        Literal::Array(items) if !items.iter().all(Literal::is_scalar) => Err(
            MapGlueError::construction("nested literal arrays are not supported"),
        ),
        Literal::Object(map) => map.values().try_for_each(check_literal),
        _ => Ok(()),
    }
}

/// A literal array, `["literal", [...]]` on the wire. Elements must be scalars.
pub fn literal_array<I, T>(items: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    let mut out = Vec::new();
    for item in items {
        let lit = Literal::try_from(item.into())?;
        if !lit.is_scalar() {
            return Err(MapGlueError::construction(
                "nested literal arrays are not supported",
            ));
        }
        out.push(lit);
    }
    Ok(Expression::Literal(Literal::Array(out)))
}

/// A literal object, `["literal", {...}]` on the wire. Array values must hold scalars only.
pub fn literal_object<I, K, V>(entries: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Literal>,
{
    literal(Literal::Object(
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    ))
}

/// `rgba` built from a packed ARGB color; alpha is scaled to `0..=1`.
pub fn color(color: impl Into<ArgbColor>) -> Expression {
    let [r, g, b, a] = color.into().to_rgba_array();
    rgba(r, g, b, a)
}

/// `["rgb", r, g, b]`.
pub fn rgb(r: impl Into<Operand>, g: impl Into<Operand>, b: impl Into<Operand>) -> Expression {
    call("rgb", [r.into(), g.into(), b.into()])
}

/// `["rgba", r, g, b, a]`.
pub fn rgba(
    r: impl Into<Operand>,
    g: impl Into<Operand>,
    b: impl Into<Operand>,
    a: impl Into<Operand>,
) -> Expression {
    call("rgba", [r.into(), g.into(), b.into(), a.into()])
}

/// `["to-rgba", color]`.
pub fn to_rgba(input: impl Into<Operand>) -> Expression {
    call("to-rgba", [input.into()])
}

// Comparison

/// `["==", a, b]`.
pub fn eq(a: impl Into<Operand>, b: impl Into<Operand>) -> Expression {
    call("==", [a.into(), b.into()])
}

/// `["==", a, b, collator]`.
pub fn eq_collated(
    a: impl Into<Operand>,
    b: impl Into<Operand>,
    collator: impl Into<Operand>,
) -> Expression {
    call("==", [a.into(), b.into(), collator.into()])
}

/// `["!=", a, b]`.
pub fn neq(a: impl Into<Operand>, b: impl Into<Operand>) -> Expression {
    call("!=", [a.into(), b.into()])
}

/// `["!=", a, b, collator]`.
pub fn neq_collated(
    a: impl Into<Operand>,
    b: impl Into<Operand>,
    collator: impl Into<Operand>,
) -> Expression {
    call("!=", [a.into(), b.into(), collator.into()])
}

/// `[">", a, b]`.
pub fn gt(a: impl Into<Operand>, b: impl Into<Operand>) -> Expression {
    call(">", [a.into(), b.into()])
}

/// `[">", a, b, collator]`.
pub fn gt_collated(
    a: impl Into<Operand>,
    b: impl Into<Operand>,
    collator: impl Into<Operand>,
) -> Expression {
    call(">", [a.into(), b.into(), collator.into()])
}

/// `["<", a, b]`.
pub fn lt(a: impl Into<Operand>, b: impl Into<Operand>) -> Expression {
    call("<", [a.into(), b.into()])
}

/// `["<", a, b, collator]`.
pub fn lt_collated(
    a: impl Into<Operand>,
    b: impl Into<Operand>,
    collator: impl Into<Operand>,
) -> Expression {
    call("<", [a.into(), b.into(), collator.into()])
}

/// `[">=", a, b]`.
pub fn gte(a: impl Into<Operand>, b: impl Into<Operand>) -> Expression {
    call(">=", [a.into(), b.into()])
}

/// `[">=", a, b, collator]`.
pub fn gte_collated(
    a: impl Into<Operand>,
    b: impl Into<Operand>,
    collator: impl Into<Operand>,
) -> Expression {
    call(">=", [a.into(), b.into(), collator.into()])
}

/// `["<=", a, b]`.
pub fn lte(a: impl Into<Operand>, b: impl Into<Operand>) -> Expression {
    call("<=", [a.into(), b.into()])
}

/// `["<=", a, b, collator]`.
pub fn lte_collated(
    a: impl Into<Operand>,
    b: impl Into<Operand>,
    collator: impl Into<Operand>,
) -> Expression {
    call("<=", [a.into(), b.into(), collator.into()])
}

// Logical & decision

/// `["all", ...]`, at least one operand.
pub fn all<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("all", 1, inputs)
}

/// `["any", ...]`, at least one operand.
pub fn any<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("any", 1, inputs)
}

/// `["!", input]`.
pub fn not(input: impl Into<Operand>) -> Expression {
    call("!", [input.into()])
}

/// `["case", cond1, out1, ..., fallback]`, at least one operand.
pub fn switch_case<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("case", 1, inputs)
}

/// `["match", input, label1, out1, ..., fallback]` from positional operands, at least two.
pub fn match_<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("match", 2, inputs)
}

/// `["match", input, l1, o1, l2, o2, ..., default]` from stop pairs.
pub fn match_stops(
    input: impl Into<Operand>,
    default_output: impl Into<Operand>,
    stops: impl IntoIterator<Item = Stop>,
) -> Expression {
    let mut args = vec![lift(input)];
    args.extend(Stop::flatten(stops.into_iter().collect()));
    args.push(lift(default_output));
    Expression::new("match", args)
}

/// `["coalesce", ...]`, at least one operand.
pub fn coalesce<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("coalesce", 1, inputs)
}

// Feature data

/// `["properties"]`.
pub fn properties() -> Expression {
    call("properties", [])
}

/// `["geometry-type"]`.
pub fn geometry_type() -> Expression {
    call("geometry-type", [])
}

/// `["id"]`.
pub fn id() -> Expression {
    call("id", [])
}

/// `["accumulated"]`.
pub fn accumulated() -> Expression {
    call("accumulated", [])
}

/// `["heatmap-density"]`.
pub fn heatmap_density() -> Expression {
    call("heatmap-density", [])
}

/// `["line-progress"]`.
pub fn line_progress() -> Expression {
    call("line-progress", [])
}

/// `["zoom"]`.
pub fn zoom() -> Expression {
    call("zoom", [])
}

// Lookup

/// `["at", index, array]`.
pub fn at(index: impl Into<Operand>, array: impl Into<Operand>) -> Expression {
    call("at", [index.into(), array.into()])
}

/// `["in", needle, haystack]`.
pub fn in_(needle: impl Into<Operand>, haystack: impl Into<Operand>) -> Expression {
    call("in", [needle.into(), haystack.into()])
}

/// `["index-of", keyword, input]`.
pub fn index_of(keyword: impl Into<Operand>, input: impl Into<Operand>) -> Expression {
    call("index-of", [keyword.into(), input.into()])
}

/// `["index-of", keyword, input, from]`.
pub fn index_of_from(
    keyword: impl Into<Operand>,
    input: impl Into<Operand>,
    from_index: impl Into<Operand>,
) -> Expression {
    call("index-of", [keyword.into(), input.into(), from_index.into()])
}

/// `["slice", input, from]`.
pub fn slice(input: impl Into<Operand>, from_index: impl Into<Operand>) -> Expression {
    call("slice", [input.into(), from_index.into()])
}

/// `["slice", input, from, to]`.
pub fn slice_to(
    input: impl Into<Operand>,
    from_index: impl Into<Operand>,
    to_index: impl Into<Operand>,
) -> Expression {
    call("slice", [input.into(), from_index.into(), to_index.into()])
}

/// `["get", key]`.
pub fn get(key: impl Into<Operand>) -> Expression {
    call("get", [key.into()])
}

/// `["get", key, object]`.
pub fn get_in(key: impl Into<Operand>, object: impl Into<Operand>) -> Expression {
    call("get", [key.into(), object.into()])
}

/// `["has", key]`.
pub fn has(key: impl Into<Operand>) -> Expression {
    call("has", [key.into()])
}

/// `["has", key, object]`.
pub fn has_in(key: impl Into<Operand>, object: impl Into<Operand>) -> Expression {
    call("has", [key.into(), object.into()])
}

/// `["length", input]`.
pub fn length(input: impl Into<Operand>) -> Expression {
    call("length", [input.into()])
}

/// `["distance", {"json": geojson-text}]` for any GeoJSON geometry, feature or collection.
pub fn distance(geojson: &Value) -> MapGlueResult<Expression> {
    let kind = geojson_type(geojson)?;
    if !GEOJSON_GEOMETRY_TYPES.contains(&kind) {
        return Err(MapGlueError::construction(format!(
            "distance: unsupported GeoJSON type {kind:?}"
        )));
    }
    let json = Expression::Literal(Literal::from(geojson.to_string()));
    let map = BTreeMap::from([("json".to_owned(), json)]);
    Ok(Expression::new("distance", vec![Expression::Map(map)]))
}

/// `["within", {"type": "Polygon", "json": geojson-text}]`.
pub fn within(polygon: &Value) -> MapGlueResult<Expression> {
    let kind = geojson_type(polygon)?;
    if kind != "Polygon" {
        return Err(MapGlueError::construction(format!(
            "within: expected a Polygon, got {kind:?}"
        )));
    }
    let map = BTreeMap::from([
        ("type".to_owned(), Expression::Literal(Literal::from(kind))),
        ("json".to_owned(), Expression::Literal(Literal::from(polygon.to_string()))),
    ]);
    Ok(Expression::new("within", vec![Expression::Map(map)]))
}

fn geojson_type(value: &Value) -> MapGlueResult<&str> {
    value
        .as_object()
        .and_then(|o| o.get("type"))
        .and_then(Value::as_str)
        .ok_or_else(|| MapGlueError::construction("GeoJSON payload must be an object with a type"))
}

// Math

/// `["ln2"]`.
pub fn ln2() -> Expression {
    call("ln2", [])
}

/// `["pi"]`.
pub fn pi() -> Expression {
    call("pi", [])
}

/// `["e"]`.
pub fn e() -> Expression {
    call("e", [])
}

/// `["+", ...]`, at least two operands.
pub fn sum<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("+", 2, inputs)
}

/// `["*", ...]`, at least two operands.
pub fn product<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("*", 2, inputs)
}

/// `["-", input]`.
pub fn negate(input: impl Into<Operand>) -> Expression {
    call("-", [input.into()])
}

/// `["-", a, b]`.
pub fn subtract(a: impl Into<Operand>, b: impl Into<Operand>) -> Expression {
    call("-", [a.into(), b.into()])
}

/// `["/", a, b]`.
pub fn division(a: impl Into<Operand>, b: impl Into<Operand>) -> Expression {
    call("/", [a.into(), b.into()])
}

/// `["%", a, b]`.
pub fn mod_(a: impl Into<Operand>, b: impl Into<Operand>) -> Expression {
    call("%", [a.into(), b.into()])
}

/// `["^", base, exponent]`.
pub fn pow(base: impl Into<Operand>, exponent: impl Into<Operand>) -> Expression {
    call("^", [base.into(), exponent.into()])
}

/// `["sqrt", x]`.
pub fn sqrt(x: impl Into<Operand>) -> Expression {
    call("sqrt", [x.into()])
}

/// `["log10", x]`.
pub fn log10(x: impl Into<Operand>) -> Expression {
    call("log10", [x.into()])
}

/// `["ln", x]`.
pub fn ln(x: impl Into<Operand>) -> Expression {
    call("ln", [x.into()])
}

/// `["log2", x]`.
pub fn log2(x: impl Into<Operand>) -> Expression {
    call("log2", [x.into()])
}

/// `["sin", x]`.
pub fn sin(x: impl Into<Operand>) -> Expression {
    call("sin", [x.into()])
}

/// `["cos", x]`.
pub fn cos(x: impl Into<Operand>) -> Expression {
    call("cos", [x.into()])
}

/// `["tan", x]`.
pub fn tan(x: impl Into<Operand>) -> Expression {
    call("tan", [x.into()])
}

/// `["asin", x]`.
pub fn asin(x: impl Into<Operand>) -> Expression {
    call("asin", [x.into()])
}

/// `["acos", x]`.
pub fn acos(x: impl Into<Operand>) -> Expression {
    call("acos", [x.into()])
}

/// `["atan", x]`.
pub fn atan(x: impl Into<Operand>) -> Expression {
    call("atan", [x.into()])
}

/// `["min", ...]`, at least one operand.
pub fn min<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("min", 1, inputs)
}

/// `["max", ...]`, at least one operand.
pub fn max<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("max", 1, inputs)
}

/// `["round", x]`.
pub fn round(x: impl Into<Operand>) -> Expression {
    call("round", [x.into()])
}

/// `["abs", x]`.
pub fn abs(x: impl Into<Operand>) -> Expression {
    call("abs", [x.into()])
}

/// `["ceil", x]`.
pub fn ceil(x: impl Into<Operand>) -> Expression {
    call("ceil", [x.into()])
}

/// `["floor", x]`.
pub fn floor(x: impl Into<Operand>) -> Expression {
    call("floor", [x.into()])
}

// String

/// `["resolved-locale", collator]`.
pub fn resolved_locale(collator: impl Into<Operand>) -> Expression {
    call("resolved-locale", [collator.into()])
}

/// `["is-supported-script", input]`.
pub fn is_supported_script(input: impl Into<Operand>) -> Expression {
    call("is-supported-script", [input.into()])
}

/// `["upcase", input]`.
pub fn upcase(input: impl Into<Operand>) -> Expression {
    call("upcase", [input.into()])
}

/// `["downcase", input]`.
pub fn downcase(input: impl Into<Operand>) -> Expression {
    call("downcase", [input.into()])
}

/// `["concat", ...]`, at least one operand.
pub fn concat<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("concat", 1, inputs)
}

/// `["number-format", number, {options}]`. The option map is always emitted.
pub fn number_format(
    number: impl Into<Operand>,
    options: impl IntoIterator<Item = NumberFormatOption>,
) -> Expression {
    let map = options
        .into_iter()
        .map(|o| {
            let (k, v) = o.into_entry();
            (k.to_owned(), v)
        })
        .collect();
    Expression::new("number-format", vec![lift(number), Expression::Map(map)])
}

/// `["collator", {"case-sensitive", "diacritic-sensitive"}]`.
pub fn collator(
    case_sensitive: impl Into<Operand>,
    diacritic_sensitive: impl Into<Operand>,
) -> Expression {
    let map = BTreeMap::from([
        ("case-sensitive".to_owned(), lift(case_sensitive)),
        ("diacritic-sensitive".to_owned(), lift(diacritic_sensitive)),
    ]);
    Expression::new("collator", vec![Expression::Map(map)])
}

/// `["collator", {"case-sensitive", "diacritic-sensitive", "locale"}]`.
pub fn collator_with_locale(
    case_sensitive: impl Into<Operand>,
    diacritic_sensitive: impl Into<Operand>,
    locale: impl Into<Operand>,
) -> Expression {
    let map = BTreeMap::from([
        ("case-sensitive".to_owned(), lift(case_sensitive)),
        ("diacritic-sensitive".to_owned(), lift(diacritic_sensitive)),
        ("locale".to_owned(), lift(locale)),
    ]);
    Expression::new("collator", vec![Expression::Map(map)])
}

/// Collator for a `language`/`country` pair; the locale literal is `language-COUNTRY`.
pub fn collator_for_locale(
    case_sensitive: bool,
    diacritic_sensitive: bool,
    language: &str,
    country: &str,
) -> Expression {
    collator_with_locale(
        case_sensitive,
        diacritic_sensitive,
        locale_tag(language, country),
    )
}

/// `["format", text1, {options1}, text2, {options2}, ...]`, at least one entry.
pub fn format(entries: impl IntoIterator<Item = FormatEntry>) -> MapGlueResult<Expression> {
    let mut args = Vec::new();
    for entry in entries {
        let options = entry.options_map();
        args.push(entry.text);
        args.push(Expression::Map(options));
    }
    if args.is_empty() {
        return Err(MapGlueError::construction(
            "format requires at least one entry",
        ));
    }
    Ok(Expression::new("format", args))
}

// Types

/// `["array", input]`.
pub fn array(input: impl Into<Operand>) -> Expression {
    call("array", [input.into()])
}

/// `["typeof", input]`.
pub fn type_of(input: impl Into<Operand>) -> Expression {
    call("typeof", [input.into()])
}

/// `["string", ...]`, at least one operand.
pub fn string<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("string", 1, inputs)
}

/// `["number", ...]`, at least one operand.
pub fn number<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("number", 1, inputs)
}

/// `["boolean", ...]`, at least one operand.
pub fn bool<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("boolean", 1, inputs)
}

/// `["image", input]`.
pub fn image(input: impl Into<Operand>) -> Expression {
    call("image", [input.into()])
}

/// `["object", input]`.
pub fn object(input: impl Into<Operand>) -> Expression {
    call("object", [input.into()])
}

/// `["to-string", input]`.
pub fn to_string(input: impl Into<Operand>) -> Expression {
    call("to-string", [input.into()])
}

/// `["to-number", input]`.
pub fn to_number(input: impl Into<Operand>) -> Expression {
    call("to-number", [input.into()])
}

/// `["to-boolean", input]`.
pub fn to_bool(input: impl Into<Operand>) -> Expression {
    call("to-boolean", [input.into()])
}

/// `["to-color", input]`.
pub fn to_color(input: impl Into<Operand>) -> Expression {
    call("to-color", [input.into()])
}

/// `["to-padding", input]`.
pub fn to_padding(input: impl Into<Operand>) -> Expression {
    call("to-padding", [input.into()])
}

// Variable binding

/// `["let", name1, value1, ..., body]`, at least one operand.
pub fn let_<I, T>(inputs: I) -> MapGlueResult<Expression>
where
    I: IntoIterator<Item = T>,
    T: Into<Operand>,
{
    variadic("let", 1, inputs)
}

/// `["var", name]`.
pub fn var(name: impl Into<Operand>) -> Expression {
    call("var", [name.into()])
}

// Ramps

/// `["step", input, default, i1, o1, ...]`.
///
/// Numeric literal stop inputs must be strictly ascending.
pub fn step(
    input: impl Into<Operand>,
    default_output: impl Into<Operand>,
    stops: impl IntoIterator<Item = Stop>,
) -> MapGlueResult<Expression> {
    let stops: Vec<Stop> = stops.into_iter().collect();
    validate_ascending("step", &stops)?;
    let mut args = vec![lift(input), lift(default_output)];
    args.extend(Stop::flatten(stops));
    Ok(Expression::new("step", args))
}

/// `["interpolate", interpolator, input, i1, o1, ...]`, at least one stop.
///
/// Numeric literal stop inputs must be strictly ascending.
pub fn interpolate(
    interpolator: Interpolator,
    input: impl Into<Operand>,
    stops: impl IntoIterator<Item = Stop>,
) -> MapGlueResult<Expression> {
    let stops: Vec<Stop> = stops.into_iter().collect();
    if stops.is_empty() {
        return Err(MapGlueError::construction(
            "interpolate requires at least one stop",
        ));
    }
    validate_ascending("interpolate", &stops)?;
    let mut args = vec![interpolator.into_expression(), lift(input)];
    args.extend(Stop::flatten(stops));
    Ok(Expression::new("interpolate", args))
}

/// Parse a wire document into an expression.
pub fn raw(json: &str) -> MapGlueResult<Expression> {
    crate::expression::codec::from_json_str(json)
}

#[cfg(test)]
#[path = "../../tests/unit/expression/dsl.rs"]
mod tests;
