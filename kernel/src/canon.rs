//! Canonical JSON bytes: the single serialization-for-hashing implementation.
//!
//! **Exactly one place** produces canonical JSON bytes in this workspace.
//! All artifact-digest flows that involve JSON must route through this module.
//!
//! # Canonicalization rules
//!
//! 1. Object keys are sorted lexicographically (byte order).
//! 2. No extraneous whitespace (compact form: `{"a":1,"b":2}`).
//! 3. Strings are JSON-escaped per RFC 8259 §7.
//! 4. Numbers must be integers (`i64` or `u64`). Floats, NaN, and Infinity
//!    are rejected to prevent cross-platform formatting drift.
//! 5. `null`, `true`, `false` are written literally.
//! 6. Output is always valid UTF-8.

/// Error type for canonical JSON serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonError {
    /// A JSON number was not an integer (float, NaN, Infinity).
    NonIntegerNumber { raw: String },
}

impl std::fmt::Display for CanonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonIntegerNumber { raw } => {
                write!(f, "non-integer number in canonical JSON: {raw}")
            }
        }
    }
}

impl std::error::Error for CanonError {}

/// Produce canonical JSON bytes from a `serde_json::Value`.
///
/// # Errors
///
/// Returns [`CanonError::NonIntegerNumber`] if any JSON number is not
/// representable as `i64` or `u64`.
pub fn canonical_json_bytes(value: &serde_json::Value) -> Result<Vec<u8>, CanonError> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out.into_bytes())
}

fn write_value(out: &mut String, value: &serde_json::Value) -> Result<(), CanonError> {
    match value {
        serde_json::Value::Null => out.push_str("null"),
        serde_json::Value::Bool(true) => out.push_str("true"),
        serde_json::Value::Bool(false) => out.push_str("false"),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.push_str(&i.to_string());
            } else if let Some(u) = n.as_u64() {
                out.push_str(&u.to_string());
            } else {
                return Err(CanonError::NonIntegerNumber { raw: n.to_string() });
            }
        }
        serde_json::Value::String(s) => write_escaped(out, s),
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        serde_json::Value::Object(map) => {
            // serde_json's default map preserves insertion order; sort
            // explicitly so canonical bytes never depend on build order.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped(out, key);
                out.push(':');
                // Key came from the map's own key set.
                if let Some(v) = map.get(*key) {
                    write_value(out, v)?;
                }
            }
            out.push('}');
        }
    }
    Ok(())
}

/// JSON-escape a string per RFC 8259 §7 and append it, quoted.
fn write_escaped(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
