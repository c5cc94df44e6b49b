//! Deterministic pretty JSON encoder
//!
//! The canonical persisted sheet form: object keys sorted, short
//! scalars and containers inlined, longer structures indented with one
//! tab per nesting level. Determinism matters more than beauty here:
//! saving the same logical sheet twice must produce identical bytes so
//! downstream tooling can diff sheet files.

use serde_json::Value;

/// Containers whose compact encoding is shorter than this are inlined
const INLINE_LIMIT: usize = 10;

/// Render a JSON value in the canonical pretty form.
pub fn pretty_json(value: &Value) -> String {
    let mut out = String::new();
    encode(value, 0, &mut out);
    out
}

fn encode(value: &Value, level: usize, out: &mut String) {
    match value {
        Value::Array(items) => encode_array(items, level, out),
        Value::Object(map) => encode_object(map, level, out),
        _ => out.push_str(&compact(value)),
    }
}

fn encode_array(items: &[Value], level: usize, out: &mut String) {
    let inline = items
        .iter()
        .all(|item| !is_container(item) || compact(item).len() < INLINE_LIMIT);

    if inline {
        out.push('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&compact(item));
        }
        out.push(']');
        return;
    }

    out.push_str("[\n");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        indent(level + 1, out);
        encode(item, level + 1, out);
    }
    out.push('\n');
    indent(level, out);
    out.push(']');
}

fn encode_object(map: &serde_json::Map<String, Value>, level: usize, out: &mut String) {
    // short all-string objects collapse to one line
    let limit = INLINE_LIMIT.max(map.len());
    let inline = map.iter().all(|(k, v)| {
        k.len() <= limit && matches!(v, Value::String(s) if s.len() <= limit)
    });

    if inline {
        out.push('{');
        for (i, (k, v)) in map.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&compact(&Value::String(k.clone())));
            out.push_str(": ");
            out.push_str(&compact(v));
        }
        out.push('}');
        return;
    }

    out.push_str("{\n");
    for (i, (k, v)) in map.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        indent(level + 1, out);
        out.push_str(&compact(&Value::String(k.clone())));
        out.push_str(": ");
        encode(v, level + 1, out);
    }
    out.push('\n');
    indent(level, out);
    out.push('}');
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

fn compact(value: &Value) -> String {
    // serialization of an in-memory Value cannot fail
    serde_json::to_string(value).unwrap_or_default()
}

fn indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push('\t');
    }
}
