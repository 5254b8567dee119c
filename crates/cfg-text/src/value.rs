//! Scalar value extraction with explicit type coercion
#![allow(clippy::must_use_candidate)]

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar field value coerced to its most specific type.
///
/// Absence is expressed by the surrounding `Option`, so a present zero is
/// never confused with a missing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Whole number, e.g. `7`
    Integer(i64),
    /// Decimal number, unit suffix stripped, e.g. `12.5f` -> 12.5
    Float(f64),
    /// Percentage as a fraction, e.g. `5%` -> 0.05
    Fraction(f64),
    /// Anything else, kept verbatim
    Text(String),
}

impl Value {
    /// Coerce raw field text.
    ///
    /// Percentages become fractions, a trailing `f`/`F` unit suffix or a
    /// decimal point makes a float, plain digits make an integer, and
    /// everything else stays text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if let Some(number) = raw.strip_suffix('%') {
            if is_decimal(number) {
                if let Ok(v) = number.parse::<f64>() {
                    return Value::Fraction(v / 100.0);
                }
            }
            return Value::Text(raw.to_string());
        }

        if let Some(number) = raw.strip_suffix(|c: char| c == 'f' || c == 'F') {
            if is_decimal(number) {
                if let Ok(v) = number.parse::<f64>() {
                    return Value::Float(v);
                }
            }
        }

        if is_decimal(raw) {
            if !raw.contains('.') {
                if let Ok(v) = raw.parse::<i64>() {
                    return Value::Integer(v);
                }
            }
            if let Ok(v) = raw.parse::<f64>() {
                return Value::Float(v);
            }
        }

        Value::Text(raw.to_string())
    }

    /// Numeric view of integers, floats and fractions.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) | Value::Fraction(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    /// Integer payload, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Equality that treats `5`, `5.0` and `5.0f` as the same number and
    /// compares text case-insensitively.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.eq_ignore_ascii_case(b),
            (Value::Fraction(a), Value::Fraction(b)) => (a - b).abs() < 1e-9,
            (Value::Fraction(_), _) | (_, Value::Fraction(_)) => false,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => (a - b).abs() < 1e-9,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => f.write_str(&plain_decimal(*v)),
            Value::Fraction(v) => write!(f, "{}%", (v * 100.0 * 1e9).round() / 1e9),
            Value::Text(s) => f.write_str(s),
        }
    }
}

fn is_decimal(s: &str) -> bool {
    let digits = s.strip_prefix(|c: char| c == '-' || c == '+').unwrap_or(s);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

/// Raw text of the first `key = value` occurrence in `text`.
///
/// The search is not scoped to the top level of a block: a nested section
/// declaring the same key earlier in the text wins. Narrow `text` to the
/// right block first.
pub fn extract_raw<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!(r"(?i)(?:^|\W){}[ \t]*=[ \t]*([^\s{{}}]+)", regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// First `key = value` occurrence in `text`, coerced with [`Value::parse`].
pub fn extract_value(text: &str, key: &str) -> Option<Value> {
    extract_raw(text, key).map(Value::parse)
}

/// Positional notation with at least one decimal place, never an exponent.
fn plain_decimal(v: f64) -> String {
    let text = v.to_string();
    if v.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

/// Render a float the way the config format writes them: always with a
/// decimal point, followed by the `f` suffix (`3.0f`, `12.5f`).
pub fn float_literal(v: f64) -> String {
    format!("{}f", plain_decimal(v))
}

/// Round `value` to the nearest multiple of `step`. A non-positive step
/// leaves the value unchanged.
pub fn round_to_nearest(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}
