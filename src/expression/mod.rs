//! Style expression tree, builder combinators and the JSON wire codec.

/// Expression tree and literal types.
pub mod ast;
/// JSON wire codec.
pub mod codec;
mod display;
pub mod dsl;
/// Stops, interpolators and keyword options for the combinators.
pub mod options;

pub use ast::{Expression, Literal, Operand};
pub use codec::{from_json_str, from_wire, to_wire};
pub use options::{
    FormatEntry, FormatOption, Interpolator, NumberFormatOption, Stop, format_entry, stop,
};
