use std::fmt;

use crate::expression::ast::{Expression, Literal};

// Debug/interop rendering. Strings are quoted but not escaped, so only simple trees read back
// as valid JSON.

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator { op, args } => {
                write!(f, "[\"{op}\"")?;
                for arg in args {
                    write!(f, ", {arg}")?;
                }
                f.write_str("]")
            }
            Self::Literal(lit @ (Literal::Array(_) | Literal::Object(_))) => {
                write!(f, "[\"literal\", {lit}]")
            }
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Map(map) => write_map(f, map.iter()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n:?}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(map) => write_map(f, map.iter()),
        }
    }
}

fn write_map<'a, V: fmt::Display + 'a>(
    f: &mut fmt::Formatter<'_>,
    entries: impl Iterator<Item = (&'a String, &'a V)>,
) -> fmt::Result {
    f.write_str("{")?;
    for (idx, (k, v)) in entries.enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "\"{k}\": {v}")?;
    }
    f.write_str("}")
}

impl Expression {
    /// Human-readable rendering, e.g. `["get", "name"]`.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/display.rs"]
mod tests;
