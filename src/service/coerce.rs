//! Type coercion for raw option values
//!
//! Options frequently come from environment variables, CLI flags or YAML
//! files where everything is a string. Coercion turns the literal strings
//! `"true"`/`"false"` into booleans and integer strings into integers.
//! Everything else is returned unchanged.

use serde_json::Value;

/// Coerce a single option value
///
/// Integer coercion is lossy for digit strings with leading zeros:
/// `"000123"` becomes `123`. Identifiers that must stay verbatim, such as
/// account numbers, have to be supplied through a config object, which
/// bypasses coercion.
pub fn coerce(value: Value) -> Value {
    match value {
        Value::String(s) => coerce_str(s),
        other => other,
    }
}

fn coerce_str(s: String) -> Value {
    match s.as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        // i64 parsing accepts exactly an optional sign followed by digits;
        // anything out of range stays a string
        _ => match s.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(s),
        },
    }
}
