use std::collections::BTreeMap;

use crate::foundation::error::{MapGlueError, MapGlueResult};

/// An immutable style expression node.
///
/// Trees are built bottom-up through the combinators in [`crate::expression::dsl`] and are
/// plain values afterwards: cloning is a deep copy and nothing can introduce a cycle.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// Operator application: `[op, args...]` on the wire.
    Operator {
        /// Wire-format operator name, e.g. `"get"` or `"interpolate"`.
        op: String,
        /// Ordered operands.
        args: Vec<Expression>,
    },
    /// A literal value.
    Literal(Literal),
    /// Keyword-argument operand used by `collator`, `number-format`, `format`, `within` and
    /// `distance`.
    Map(BTreeMap<String, Expression>),
}

/// Literal payload of an [`Expression::Literal`] node.
///
/// Numbers are always stored as `f32`, matching the precision the native style parser was
/// historically fed with.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    /// Numeric literal, normalized to `f32`.
    Number(f32),
    /// String literal.
    String(String),
    /// Boolean literal.
    Bool(bool),
    /// Object literal with heterogeneous values.
    Object(BTreeMap<String, Literal>),
    /// Array literal. Elements are scalars.
    Array(Vec<Literal>),
}

impl Literal {
    /// Build a string literal, stripping one pair of surrounding double quotes if present.
    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        let unwrapped = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .map(str::to_owned);
        Self::String(unwrapped.unwrap_or(value))
    }

    /// Return `true` for numbers, strings and booleans.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Number(_) | Self::String(_) | Self::Bool(_))
    }

    /// Numeric value, if this is a number literal.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f32> for Literal {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Number(value as f32)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Number(value as f32)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Number(value as f32)
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Self::Number(value as f32)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

/// A combinator argument: either a nested expression or a convenience literal.
///
/// Every combinator takes `impl Into<Operand>`, so numbers, strings and booleans can be passed
/// directly and are lifted into literal nodes at the call boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A nested expression, used as-is.
    Expr(Expression),
    /// A literal, wrapped into [`Expression::Literal`].
    Lit(Literal),
}

impl Operand {
    /// Lift into an expression node.
    pub fn into_expression(self) -> Expression {
        match self {
            Self::Expr(e) => e,
            Self::Lit(l) => Expression::Literal(l),
        }
    }
}

impl From<Expression> for Operand {
    fn from(value: Expression) -> Self {
        Self::Expr(value)
    }
}

impl From<&Expression> for Operand {
    fn from(value: &Expression) -> Self {
        Self::Expr(value.clone())
    }
}

macro_rules! operand_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Self::Lit(Literal::from(value))
                }
            }
        )*
    };
}

operand_from_literal!(f32, f64, i32, i64, u32, bool, &str, String);

impl From<Literal> for Operand {
    fn from(value: Literal) -> Self {
        Self::Lit(value)
    }
}

impl TryFrom<Operand> for Literal {
    type Error = MapGlueError;

    /// A literal must wrap a primitive or object value, never an expression node.
    fn try_from(value: Operand) -> MapGlueResult<Self> {
        match value {
            Operand::Lit(l) => Ok(l),
            Operand::Expr(e) => Err(MapGlueError::construction(format!(
                "can't convert an expression to a literal: {e}"
            ))),
        }
    }
}

impl Expression {
    /// Build an operator node from already-lifted operands.
    ///
    /// No arity checks are applied; prefer the named combinators.
    pub fn new(op: impl Into<String>, args: Vec<Expression>) -> Self {
        Self::Operator {
            op: op.into(),
            args,
        }
    }

    /// Operator name, if this is an operator node.
    pub fn operator(&self) -> Option<&str> {
        match self {
            Self::Operator { op, .. } => Some(op),
            _ => None,
        }
    }

    /// Operands of an operator node; empty for literals and maps.
    pub fn args(&self) -> &[Expression] {
        match self {
            Self::Operator { args, .. } => args,
            _ => &[],
        }
    }

    /// Literal payload, if this is a literal node.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Keyword map, if this is a map node.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Expression>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<Literal> for Expression {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/ast.rs"]
mod tests;
