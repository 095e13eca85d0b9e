//! Plain-data snapshots of round-trip documents.
//!
//! The tree keeps presentation detail that comparisons do not want; these
//! conversions project a document onto `serde_yaml::Value`, resolving
//! plain-scalar types the way a YAML loader would.

use super::node::{Node, ScalarStyle};
use super::Document;

impl Document {
    /// Semantic snapshot of the document, `Value::Null` when empty.
    pub fn to_value(&self) -> serde_yaml::Value {
        match &self.root {
            Some(root) => node_to_value(root),
            None => serde_yaml::Value::Null,
        }
    }
}

impl Node {
    /// Semantic snapshot of this subtree.
    pub fn to_value(&self) -> serde_yaml::Value {
        node_to_value(self)
    }
}

fn node_to_value(node: &Node) -> serde_yaml::Value {
    match node {
        Node::Scalar(s) => match s.style() {
            ScalarStyle::Plain => plain_to_value(s.value()),
            _ => serde_yaml::Value::String(s.value().to_string()),
        },
        Node::Mapping(m) => {
            let mut out = serde_yaml::Mapping::new();
            for (key, value) in m.iter() {
                out.insert(
                    serde_yaml::Value::String(key.to_string()),
                    node_to_value(value),
                );
            }
            serde_yaml::Value::Mapping(out)
        }
        Node::Sequence(s) => {
            serde_yaml::Value::Sequence(s.iter().map(node_to_value).collect())
        }
    }
}

fn plain_to_value(s: &str) -> serde_yaml::Value {
    match s {
        "" | "~" | "null" | "Null" | "NULL" => return serde_yaml::Value::Null,
        "true" | "True" | "TRUE" => return serde_yaml::Value::Bool(true),
        "false" | "False" | "FALSE" => return serde_yaml::Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return serde_yaml::Value::Number(i.into());
    }
    if let Some(i) = radix_int(s) {
        return serde_yaml::Value::Number(i.into());
    }
    if let Some(f) = special_float(s) {
        return serde_yaml::Value::Number(serde_yaml::Number::from(f));
    }
    if looks_numeric(s) {
        if let Ok(f) = s.parse::<f64>() {
            return serde_yaml::Value::Number(serde_yaml::Number::from(f));
        }
    }
    serde_yaml::Value::String(s.to_string())
}

/// True when plain `text` reads back as something other than a string.
/// Writers quote such text so a written value stays a string.
pub(crate) fn resolves_non_string(text: &str) -> bool {
    !matches!(plain_to_value(text), serde_yaml::Value::String(_))
}

/// `0x` hex and `0o` octal integer forms.
fn radix_int(s: &str) -> Option<i64> {
    if let Some(hex) = s.strip_prefix("0x") {
        if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return i64::from_str_radix(hex, 16).ok();
        }
    }
    if let Some(oct) = s.strip_prefix("0o") {
        if !oct.is_empty() && oct.bytes().all(|b| matches!(b, b'0'..=b'7')) {
            return i64::from_str_radix(oct, 8).ok();
        }
    }
    None
}

/// `.inf` and `.nan` float forms; only infinity takes a sign.
fn special_float(s: &str) -> Option<f64> {
    if matches!(s, ".nan" | ".NaN" | ".NAN") {
        return Some(f64::NAN);
    }
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };
    match rest {
        ".inf" | ".Inf" | ".INF" => Some(sign * f64::INFINITY),
        _ => None,
    }
}

/// Restricts float parsing to digit-shaped text so words like `inf` stay
/// strings.
fn looks_numeric(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
        && s.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}
