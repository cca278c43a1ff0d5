use std::collections::BTreeMap;

use crate::expression::ast::{Expression, Literal, Operand};
use crate::foundation::core::ArgbColor;
use crate::foundation::error::{MapGlueError, MapGlueResult};

/// One `(input, output)` pair of a `step`, `interpolate` or `match` ramp.
#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    /// Stop input (a zoom level, a property value, a match label).
    pub input: Expression,
    /// Output produced at or after `input`.
    pub output: Expression,
}

/// Build a [`Stop`], lifting primitive values into literals.
pub fn stop(input: impl Into<Operand>, output: impl Into<Operand>) -> Stop {
    Stop {
        input: input.into().into_expression(),
        output: output.into().into_expression(),
    }
}

impl Stop {
    /// Flatten stops into `[i1, o1, i2, o2, ...]`, preserving order.
    pub fn flatten(stops: Vec<Stop>) -> Vec<Expression> {
        stops
            .into_iter()
            .flat_map(|s| [s.input, s.output])
            .collect()
    }
}

/// Reject ramps whose numeric literal inputs are not strictly ascending.
///
/// Inputs that are nested expressions are not comparable at build time and are skipped.
pub(crate) fn validate_ascending(op: &str, stops: &[Stop]) -> MapGlueResult<()> {
    let mut previous: Option<f32> = None;
    for (idx, s) in stops.iter().enumerate() {
        let Some(current) = s.input.as_literal().and_then(Literal::as_number) else {
            continue;
        };
        if let Some(prev) = previous
            && current <= prev
        {
            return Err(MapGlueError::construction(format!(
                "{op}: stop {idx} input {current:?} is not greater than previous input {prev:?}"
            )));
        }
        previous = Some(current);
    }
    Ok(())
}

/// Interpolation curve selector for `interpolate`.
#[derive(Clone, Debug, PartialEq)]
pub struct Interpolator(Expression);

impl Interpolator {
    /// `["linear"]`.
    pub fn linear() -> Self {
        Self(Expression::new("linear", Vec::new()))
    }

    /// `["exponential", base]`.
    pub fn exponential(base: impl Into<Operand>) -> Self {
        Self(Expression::new(
            "exponential",
            vec![base.into().into_expression()],
        ))
    }

    /// `["cubic-bezier", x1, y1, x2, y2]`.
    pub fn cubic_bezier(
        x1: impl Into<Operand>,
        y1: impl Into<Operand>,
        x2: impl Into<Operand>,
        y2: impl Into<Operand>,
    ) -> Self {
        Self(Expression::new(
            "cubic-bezier",
            [x1.into(), y1.into(), x2.into(), y2.into()]
                .into_iter()
                .map(Operand::into_expression)
                .collect(),
        ))
    }

    /// Underlying expression node.
    pub fn into_expression(self) -> Expression {
        self.0
    }
}

impl From<Interpolator> for Operand {
    fn from(value: Interpolator) -> Self {
        Operand::Expr(value.0)
    }
}

/// Keyword option of `number-format`.
#[derive(Clone, Debug, PartialEq)]
pub enum NumberFormatOption {
    /// BCP 47 locale tag.
    Locale(Expression),
    /// ISO 4217 currency code.
    Currency(Expression),
    /// Minimum number of fraction digits.
    MinFractionDigits(Expression),
    /// Maximum number of fraction digits.
    MaxFractionDigits(Expression),
}

impl NumberFormatOption {
    /// `locale` option.
    pub fn locale(value: impl Into<Operand>) -> Self {
        Self::Locale(value.into().into_expression())
    }

    /// `currency` option.
    pub fn currency(value: impl Into<Operand>) -> Self {
        Self::Currency(value.into().into_expression())
    }

    /// `min-fraction-digits` option.
    pub fn min_fraction_digits(value: impl Into<Operand>) -> Self {
        Self::MinFractionDigits(value.into().into_expression())
    }

    /// `max-fraction-digits` option.
    pub fn max_fraction_digits(value: impl Into<Operand>) -> Self {
        Self::MaxFractionDigits(value.into().into_expression())
    }

    /// Wire key and value.
    pub fn into_entry(self) -> (&'static str, Expression) {
        match self {
            Self::Locale(v) => ("locale", v),
            Self::Currency(v) => ("currency", v),
            Self::MinFractionDigits(v) => ("min-fraction-digits", v),
            Self::MaxFractionDigits(v) => ("max-fraction-digits", v),
        }
    }
}

/// Per-section option of `format`.
#[derive(Clone, Debug, PartialEq)]
pub enum FormatOption {
    /// Scale factor applied to the section's font size.
    FontScale(Expression),
    /// Font stack override.
    TextFont(Expression),
    /// Text color override.
    TextColor(Expression),
}

impl FormatOption {
    /// `font-scale` option.
    pub fn font_scale(value: impl Into<Operand>) -> Self {
        Self::FontScale(value.into().into_expression())
    }

    /// `text-font` option from a nested expression.
    pub fn text_font(value: impl Into<Operand>) -> Self {
        Self::TextFont(value.into().into_expression())
    }

    /// `text-font` option from a font stack, encoded as a literal string array.
    pub fn text_font_stack<S: AsRef<str>>(stack: &[S]) -> Self {
        Self::TextFont(Expression::Literal(Literal::Array(
            stack.iter().map(|s| Literal::string(s.as_ref())).collect(),
        )))
    }

    /// `text-color` option from a nested expression.
    pub fn text_color(value: impl Into<Operand>) -> Self {
        Self::TextColor(value.into().into_expression())
    }

    /// `text-color` option from a packed ARGB color.
    pub fn text_color_argb(color: ArgbColor) -> Self {
        Self::TextColor(crate::expression::dsl::color(color))
    }

    /// Wire key and value.
    pub fn into_entry(self) -> (&'static str, Expression) {
        match self {
            Self::FontScale(v) => ("font-scale", v),
            Self::TextFont(v) => ("text-font", v),
            Self::TextColor(v) => ("text-color", v),
        }
    }
}

/// One section of a `format` expression.
#[derive(Clone, Debug, PartialEq)]
pub struct FormatEntry {
    /// Section text.
    pub text: Expression,
    /// Section options; later duplicates of a key win.
    pub options: Vec<FormatOption>,
}

/// Build a [`FormatEntry`].
pub fn format_entry(
    text: impl Into<Operand>,
    options: impl IntoIterator<Item = FormatOption>,
) -> FormatEntry {
    FormatEntry {
        text: text.into().into_expression(),
        options: options.into_iter().collect(),
    }
}

impl FormatEntry {
    /// Options as the keyword map emitted after the section text.
    pub(crate) fn options_map(&self) -> BTreeMap<String, Expression> {
        self.options
            .iter()
            .cloned()
            .map(|o| {
                let (k, v) = o.into_entry();
                (k.to_owned(), v)
            })
            .collect()
    }
}

/// Locale tag as `language[-COUNTRY]`; empty parts are skipped.
pub fn locale_tag(language: &str, country: &str) -> String {
    match (language.is_empty(), country.is_empty()) {
        (_, true) => language.to_owned(),
        (true, false) => format!("-{country}"),
        (false, false) => format!("{language}-{country}"),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/options.rs"]
mod tests;
