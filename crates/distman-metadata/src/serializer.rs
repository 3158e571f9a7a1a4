use indexmap::IndexMap;

use crate::value::{Table, Value};

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn write_key(out: &mut String, key: &str) {
    if is_identifier(key) {
        out.push_str(key);
    } else {
        out.push_str("_G['");
        out.push_str(key);
        out.push_str("']");
    }
}

fn write_value(out: &mut String, value: &Value, indent: usize) {
    match value {
        Value::Str(s) => {
            out.push('"');
            out.push_str(&escape_string(s));
            out.push('"');
        }
        Value::Num(n) => {
            out.push_str(&n.to_string());
        }
        Value::Table(t) => write_table(out, t, indent),
    }
}

fn write_table(out: &mut String, table: &Table, indent: usize) {
    if table.list.is_empty() && table.map.is_empty() {
        out.push_str("{}");
        return;
    }

    out.push_str("{\n");
    let pad = "  ".repeat(indent + 1);

    for item in &table.list {
        out.push_str(&pad);
        write_value(out, item, indent + 1);
        out.push_str(",\n");
    }
    for (key, value) in &table.map {
        out.push_str(&pad);
        write_key(out, key);
        out.push_str(" = ");
        write_value(out, value, indent + 1);
        out.push_str(",\n");
    }

    out.push_str(&"  ".repeat(indent));
    out.push('}');
}

/// Serialize a dist.info field map as a sequence of top-level assignments.
pub fn serialize_dist_info(fields: &IndexMap<String, Value>) -> String {
    let mut out = String::new();
    for (key, value) in fields {
        write_key(&mut out, key);
        out.push_str(" = ");
        write_value(&mut out, value, 0);
        out.push('\n');
    }
    out
}

/// Serialize a manifest as `return { <tables> }true`. The trailing `true` is
/// a historical sentinel forcing the loader to yield the table; it is
/// preserved exactly for compatibility with existing manifests.
pub fn serialize_manifest(entries: &[IndexMap<String, Value>]) -> String {
    let table = Table::from_list(
        entries
            .iter()
            .map(|fields| Value::Table(Table::from_map(fields.clone())))
            .collect(),
    );
    let mut out = String::from("return ");
    write_table(&mut out, &table, 0);
    out.push_str("true");
    out
}
