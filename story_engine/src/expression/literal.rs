//! Literal values on the right-hand side of an expression line.

use regex::Regex;
use std::sync::LazyLock;
use story_model::Value;

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid decimal pattern")
});

static HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[xX][0-9a-fA-F]+$").expect("valid hex pattern"));

/// Parse a literal: `true`/`false`, a double-quoted string, a number, or
/// failing all of those the raw trimmed text.
pub fn parse_literal(raw: &str) -> Value {
    let raw = raw.trim();
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return Value::String(raw[1..raw.len() - 1].to_string());
    }

    parse_number(raw)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Numbers in the shapes a script author would write them.
fn parse_number(raw: &str) -> Option<f64> {
    if DECIMAL.is_match(raw) {
        return raw.parse().ok();
    }
    if HEX.is_match(raw) {
        return i64::from_str_radix(&raw[2..], 16).ok().map(|n| n as f64);
    }
    match raw {
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}
