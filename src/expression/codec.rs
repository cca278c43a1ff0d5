use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::expression::ast::{Expression, Literal};
use crate::expression::dsl;
use crate::foundation::error::{MapGlueError, MapGlueResult};

/// Encode an expression into its wire value.
///
/// Array and object literals are wrapped in `["literal", ...]` so the native parser never
/// mistakes them for operator applications.
pub fn to_wire(expr: &Expression) -> Value {
    match expr {
        Expression::Operator { op, args } => {
            let mut out = Vec::with_capacity(args.len() + 1);
            out.push(Value::String(op.clone()));
            out.extend(args.iter().map(to_wire));
            Value::Array(out)
        }
        Expression::Literal(lit @ (Literal::Array(_) | Literal::Object(_))) => {
            Value::Array(vec![Value::String("literal".to_owned()), literal_to_value(lit)])
        }
        Expression::Literal(lit) => literal_to_value(lit),
        Expression::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_wire(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}

fn literal_to_value(lit: &Literal) -> Value {
    match lit {
        Literal::Number(n) => number_to_value(*n),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Array(items) => Value::Array(items.iter().map(literal_to_value).collect()),
        Literal::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), literal_to_value(v)))
                .collect(),
        ),
    }
}

// Widen through the shortest decimal form so `0.1f32` goes out as `0.1`, not
// `0.10000000149011612`.
fn number_to_value(n: f32) -> Value {
    let widened = n.to_string().parse::<f64>().unwrap_or(f64::from(n));
    Number::from_f64(widened).map_or(Value::Null, Value::Number)
}

/// Decode a wire value into an expression.
pub fn from_wire(value: &Value) -> MapGlueResult<Expression> {
    match value {
        Value::Array(items) => decode_array(items),
        Value::Object(map) => Ok(Expression::Map(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), from_wire(v)?)))
                .collect::<MapGlueResult<BTreeMap<_, _>>>()?,
        )),
        Value::Null => Ok(Expression::Literal(Literal::String(String::new()))),
        scalar => Ok(Expression::Literal(scalar_literal(scalar)?)),
    }
}

fn decode_array(items: &[Value]) -> MapGlueResult<Expression> {
    let Some((head, rest)) = items.split_first() else {
        return Err(MapGlueError::parse(
            "can't convert an empty array to an expression",
        ));
    };
    let Value::String(op) = head else {
        return Err(MapGlueError::parse(format!(
            "expected an operator name at the head of an array, found {head}"
        )));
    };

    match op.as_str() {
        "within" => {
            return geojson_operand(op, rest)
                .and_then(|g| dsl::within(&g))
                .map_err(as_parse);
        }
        "distance" => {
            return geojson_operand(op, rest)
                .and_then(|g| dsl::distance(&g))
                .map_err(as_parse);
        }
        "literal" => return decode_literal(rest),
        _ => {}
    }

    let args = rest.iter().map(from_wire).collect::<MapGlueResult<Vec<_>>>()?;
    Ok(Expression::new(op.as_str(), args))
}

fn as_parse(err: MapGlueError) -> MapGlueError {
    match err {
        MapGlueError::Construction(msg) => MapGlueError::Parse(msg),
        other => other,
    }
}

// Accepts a raw GeoJSON object, GeoJSON text, or the `{"json": "<text>"}` keyword map the
// builders emit.
fn geojson_operand(op: &str, rest: &[Value]) -> MapGlueResult<Value> {
    let payload = rest
        .first()
        .ok_or_else(|| MapGlueError::parse(format!("{op} requires a GeoJSON argument")))?;
    match payload {
        Value::String(text) => Ok(serde_json::from_str(text)?),
        Value::Object(map) => match map.get("json") {
            Some(Value::String(text)) => Ok(serde_json::from_str(text)?),
            _ => Ok(payload.clone()),
        },
        other => Err(MapGlueError::parse(format!(
            "{op} expects a GeoJSON object, found {other}"
        ))),
    }
}

fn decode_literal(rest: &[Value]) -> MapGlueResult<Expression> {
    let [payload] = rest else {
        return Err(MapGlueError::parse(format!(
            "literal expects exactly one argument, got {}",
            rest.len()
        )));
    };
    match payload {
        Value::Array(items) => {
            let elements = items
                .iter()
                .map(|item| match item {
                    Value::Array(_) | Value::Object(_) | Value::Null => Err(MapGlueError::parse(
                        "nested literal arrays are not supported",
                    )),
                    scalar => scalar_literal(scalar),
                })
                .collect::<MapGlueResult<Vec<_>>>()?;
            Ok(Expression::Literal(Literal::Array(elements)))
        }
        Value::Object(map) => Ok(Expression::Literal(object_literal(map)?)),
        scalar => Ok(Expression::new("literal", vec![from_wire(scalar)?])),
    }
}

fn object_literal(map: &Map<String, Value>) -> MapGlueResult<Literal> {
    let mut out = BTreeMap::new();
    for (k, v) in map {
        let lit = match v {
            Value::Object(inner) => object_literal(inner)?,
            Value::Array(items) => Literal::Array(
                items
                    .iter()
                    .map(scalar_literal)
                    .collect::<MapGlueResult<Vec<_>>>()?,
            ),
            other => scalar_literal(other)?,
        };
        out.insert(k.clone(), lit);
    }
    Ok(Literal::Object(out))
}

fn scalar_literal(value: &Value) -> MapGlueResult<Literal> {
    match value {
        Value::Bool(b) => Ok(Literal::Bool(*b)),
        Value::Number(n) => n
            .as_f64()
            .map(Literal::from)
            .ok_or_else(|| MapGlueError::parse(format!("unrepresentable number {n}"))),
        Value::String(s) => Ok(Literal::String(s.clone())),
        other => Err(MapGlueError::parse(format!(
            "expected a scalar literal, found {other}"
        ))),
    }
}

/// Parse wire JSON text into an expression.
#[tracing::instrument(skip_all, fields(len = json.len()))]
pub fn from_json_str(json: &str) -> MapGlueResult<Expression> {
    let value: Value = serde_json::from_str(json)?;
    let expr = from_wire(&value);
    if let Err(err) = &expr {
        tracing::debug!(%err, "expression decode failed");
    }
    expr
}

impl Expression {
    /// Parse wire JSON text.
    pub fn from_json_str(json: &str) -> MapGlueResult<Self> {
        from_json_str(json)
    }

    /// Compact wire JSON text.
    pub fn to_json_string(&self) -> String {
        to_wire(self).to_string()
    }

    /// Wire value.
    pub fn to_wire(&self) -> Value {
        to_wire(self)
    }
}

impl serde::Serialize for Expression {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&to_wire(self), serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Expression {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Value as serde::Deserialize>::deserialize(deserializer)?;
        from_wire(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/codec.rs"]
mod tests;
