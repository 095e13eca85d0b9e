//! Emission of the round-trip tree back to text.
//!
//! Untouched nodes contribute their verbatim source bytes; mutated scalars
//! contribute re-encoded text, and flow collections marked dirty are
//! re-rendered in canonical single-line form.

use super::node::{
    encode_double_quoted, encode_key, encode_single_quoted, has_flow_indicator, Form, Node, Scalar,
    ScalarStyle,
};
use super::Document;

/// Accumulates output lines. A line is "open" while a value may still
/// append to it; closing pushes it and starts fresh.
pub(crate) struct Emitter {
    lines: Vec<String>,
    cur: String,
    open: bool,
}

impl Emitter {
    pub(crate) fn new() -> Emitter {
        Emitter {
            lines: Vec::new(),
            cur: String::new(),
            open: false,
        }
    }

    pub(crate) fn finish(mut self) -> Vec<String> {
        if self.open {
            self.close();
        }
        self.lines
    }

    fn append(&mut self, text: &str) {
        self.cur.push_str(text);
        self.open = true;
    }

    /// Appends text that may span lines; embedded newlines close the
    /// current line and continue on the next.
    fn append_multi(&mut self, text: &str) {
        for (i, seg) in text.split('\n').enumerate() {
            if i > 0 {
                self.close();
            }
            self.cur.push_str(seg);
            self.open = true;
        }
    }

    fn close(&mut self) {
        self.lines.push(std::mem::take(&mut self.cur));
        self.open = false;
    }

    fn push_line(&mut self, line: &str) {
        if self.open {
            self.close();
        }
        self.lines.push(line.to_string());
    }
}

pub(crate) fn emit_document(doc: &Document, em: &mut Emitter) {
    for line in &doc.prefix {
        em.push_line(line);
    }
    if let Some(root) = &doc.root {
        emit_node(root, em);
    }
}

fn emit_node(node: &Node, em: &mut Emitter) {
    match node {
        Node::Scalar(s) => match &s.standalone {
            Some(st) => {
                if em.open {
                    em.append_multi(&st.key_rest);
                    em.close();
                }
                em.append_multi(&s.raw);
                em.append(&s.trailing);
                em.close();
            }
            None => {
                em.append(&s.sep);
                em.append_multi(&s.raw);
                em.append(&s.trailing);
                em.close();
            }
        },
        Node::Mapping(m) => match &m.form {
            Form::Flow {
                sep,
                raw,
                trailing,
                dirty,
                key_rest,
            } => {
                emit_flow(node, sep, raw, trailing, *dirty, key_rest, m.indent, em);
            }
            Form::Block { header_rest } => {
                if em.open && !m.inline_first {
                    em.append_multi(header_rest);
                    em.close();
                }
                for entry in &m.entries {
                    for line in &entry.before {
                        em.push_line(line);
                    }
                    em.append(&entry.head);
                    emit_node(&entry.value, em);
                }
                for line in &m.tail {
                    em.push_line(line);
                }
            }
        },
        Node::Sequence(s) => match &s.form {
            Form::Flow {
                sep,
                raw,
                trailing,
                dirty,
                key_rest,
            } => {
                emit_flow(node, sep, raw, trailing, *dirty, key_rest, s.indent, em);
            }
            Form::Block { header_rest } => {
                if em.open {
                    em.append_multi(header_rest);
                    em.close();
                }
                for item in &s.items {
                    for line in &item.before {
                        em.push_line(line);
                    }
                    em.append(&item.head);
                    emit_node(&item.value, em);
                }
                for line in &s.tail {
                    em.push_line(line);
                }
            }
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_flow(
    node: &Node,
    sep: &str,
    raw: &str,
    trailing: &str,
    dirty: bool,
    key_rest: &Option<String>,
    indent: usize,
    em: &mut Emitter,
) {
    match key_rest {
        None => {
            em.append(sep);
            if dirty {
                em.append(&render_flow(node));
            } else {
                em.append_multi(raw);
            }
            em.append(trailing);
            em.close();
        }
        Some(rest) => {
            if em.open {
                em.append_multi(rest);
                em.close();
            }
            if dirty {
                em.append(&" ".repeat(indent));
                em.append(&render_flow(node));
            } else {
                em.append_multi(raw);
            }
            em.append(trailing);
            em.close();
        }
    }
}

/// Canonical single-line rendering of a flow collection whose raw text no
/// longer matches its contents.
fn render_flow(node: &Node) -> String {
    match node {
        Node::Scalar(s) => flow_scalar(s),
        Node::Mapping(m) => {
            if let Form::Flow {
                raw, dirty: false, ..
            } = &m.form
            {
                if !raw.contains('\n') {
                    return raw.clone();
                }
            }
            let inner: Vec<String> = m
                .entries
                .iter()
                .map(|e| format!("{}: {}", flow_key(&e.key), render_flow(&e.value)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
        Node::Sequence(s) => {
            if let Form::Flow {
                raw, dirty: false, ..
            } = &s.form
            {
                if !raw.contains('\n') {
                    return raw.clone();
                }
            }
            let inner: Vec<String> = s.items.iter().map(|i| render_flow(&i.value)).collect();
            format!("[{}]", inner.join(", "))
        }
    }
}

/// Commas and brackets end a plain scalar in flow context; a written plain
/// value carrying one is re-quoted instead of reused raw.
fn flow_scalar(s: &Scalar) -> String {
    if s.style() == ScalarStyle::Plain && has_flow_indicator(s.value()) {
        encode_single_quoted(s.value())
    } else {
        s.raw.clone()
    }
}

fn flow_key(key: &str) -> String {
    if key.chars().any(|c| c.is_control()) {
        encode_double_quoted(key)
    } else if has_flow_indicator(key) {
        encode_single_quoted(key)
    } else {
        encode_key(key)
    }
}
