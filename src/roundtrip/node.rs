//! Lossless document tree.
//!
//! Every byte of the parsed source is owned by exactly one field of the
//! tree, in source order; emission concatenates the fields back together,
//! so anything the caller does not touch re-serializes byte-for-byte.
//! Mutations rewrite only the bytes of the value they target.

use thiserror::Error;

use super::semantic::resolves_non_string;

/// One step of navigation into a document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Mapping entry selected by key.
    Key(String),
    /// Sequence item selected by position.
    Index(usize),
}

impl Step {
    /// Creates a key step.
    pub fn key(name: impl Into<String>) -> Self {
        Step::Key(name.into())
    }

    /// Creates an index step.
    pub fn index(i: usize) -> Self {
        Step::Index(i)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Key(k) => write!(f, "{}", k),
            Step::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Error raised by tree mutations when the addressed node is absent or has
/// the wrong shape.
#[derive(Debug, Clone, Error)]
pub enum MutateError {
    #[error("no entry named {key:?}")]
    MissingKey { key: String },

    #[error("no item at index {index}")]
    MissingIndex { index: usize },

    #[error("expected a mapping")]
    NotAMapping,

    #[error("expected a scalar value")]
    NotAScalar,
}

/// A node of the document tree.
#[derive(Debug, Clone)]
pub enum Node {
    Scalar(Scalar),
    Mapping(Mapping),
    Sequence(Sequence),
}

/// Scalar presentation style, as found in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// A scalar leaf.
///
/// `raw` is the verbatim source text of the scalar itself (multi-line for
/// block scalars, embedded newlines included); `sep` is the spacing between
/// the owning `:` or `-` and the value; `trailing` is whatever follows the
/// value on its last line (spaces, an end-of-line comment).
#[derive(Debug, Clone)]
pub struct Scalar {
    pub(crate) value: String,
    pub(crate) raw: String,
    pub(crate) sep: String,
    pub(crate) trailing: String,
    pub(crate) style: ScalarStyle,
    pub(crate) standalone: Option<Standalone>,
}

/// Present when a scalar starts on its own line below its key; `key_rest`
/// is the verbatim remainder of the key line.
#[derive(Debug, Clone)]
pub(crate) struct Standalone {
    pub(crate) key_rest: String,
    pub(crate) indent: usize,
}

/// How a collection was written, and the bytes needed to reproduce it.
#[derive(Debug, Clone)]
pub(crate) enum Form {
    /// Block (indented) style; `header_rest` is the verbatim remainder of
    /// the parent key line (spaces and comment).
    Block { header_rest: String },
    /// Flow (`{...}` / `[...]`) style. `raw` is the verbatim source of the
    /// whole collection and wins on emission until a mutation inside the
    /// collection marks it dirty; `key_rest` is set when the collection
    /// starts on its own line below its key, like [`Standalone`].
    Flow {
        sep: String,
        raw: String,
        trailing: String,
        dirty: bool,
        key_rest: Option<String>,
    },
}

/// An ordered mapping.
///
/// `inline_first` records that the first entry shares a line with the `- `
/// marker of the owning sequence item.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub(crate) entries: Vec<Entry>,
    pub(crate) indent: usize,
    pub(crate) form: Form,
    pub(crate) inline_first: bool,
    pub(crate) tail: Vec<String>,
}

/// One `key: value` pair. `head` is the verbatim text from the start of the
/// key line (or from the end of a `- ` marker) through the `:`.
#[derive(Debug, Clone)]
pub struct Entry {
    pub(crate) before: Vec<String>,
    pub(crate) head: String,
    pub(crate) key: String,
    pub(crate) value: Node,
}

/// An ordered sequence.
#[derive(Debug, Clone)]
pub struct Sequence {
    pub(crate) items: Vec<Item>,
    pub(crate) indent: usize,
    pub(crate) form: Form,
    pub(crate) tail: Vec<String>,
}

/// One sequence item. `head` is the verbatim text from the start of the
/// line through the `-` marker and following spaces.
#[derive(Debug, Clone)]
pub struct Item {
    pub(crate) before: Vec<String>,
    pub(crate) head: String,
    pub(crate) value: Node,
}

impl Node {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Node::Scalar(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Node::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Node::Sequence(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Node::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the decoded string value if this node is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(&s.value),
            _ => None,
        }
    }

    /// Looks up a mapping entry by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Looks up a sequence item by index.
    pub fn get_index(&self, index: usize) -> Option<&Node> {
        self.as_sequence().and_then(|s| s.get(index))
    }

    /// Walks a path of steps from this node.
    pub fn at(&self, path: &[Step]) -> Option<&Node> {
        let mut cur = self;
        for step in path {
            cur = match step {
                Step::Key(k) => cur.get(k)?,
                Step::Index(i) => cur.get_index(*i)?,
            };
        }
        Some(cur)
    }

    /// Rewrites the scalar at `path` to hold `value`, keeping the scalar's
    /// quoting style where it can represent the new value.
    pub fn set_string(&mut self, path: &[Step], value: &str) -> Result<(), MutateError> {
        match descend(self, path)? {
            Node::Scalar(s) => {
                s.set_value(value);
                Ok(())
            }
            _ => Err(MutateError::NotAScalar),
        }
    }

    /// Upserts the entry `key` of the mapping at `path` with a scalar
    /// `value`. New entries are appended at the end of the mapping.
    pub fn set_entry_string(
        &mut self,
        path: &[Step],
        key: &str,
        value: &str,
    ) -> Result<(), MutateError> {
        let map = match descend(self, path)? {
            Node::Mapping(m) => m,
            _ => return Err(MutateError::NotAMapping),
        };
        if let Some(entry) = map.entries.iter_mut().find(|e| e.key == key) {
            match &mut entry.value {
                Node::Scalar(s) => s.set_value(value),
                // Replacing a collection value with a scalar drops the old
                // subtree wholesale.
                other => *other = Node::Scalar(Scalar::synthesized(value)),
            }
        } else {
            map.push_scalar_entry(key, value);
        }
        Ok(())
    }

    /// Removes the entry `key` from the mapping at `path`, along with the
    /// comment lines attached to it. Returns whether an entry was removed.
    pub fn remove_entry(&mut self, path: &[Step], key: &str) -> Result<bool, MutateError> {
        let map = match descend(self, path)? {
            Node::Mapping(m) => m,
            _ => return Err(MutateError::NotAMapping),
        };
        let before = map.entries.len();
        map.entries.retain(|e| e.key != key);
        Ok(map.entries.len() != before)
    }

    /// Makes sure the mapping at `path` has an entry `key` holding a
    /// mapping, creating an empty block mapping when absent and replacing a
    /// non-mapping value outright.
    pub fn ensure_mapping(&mut self, path: &[Step], key: &str) -> Result<(), MutateError> {
        let map = match descend(self, path)? {
            Node::Mapping(m) => m,
            _ => return Err(MutateError::NotAMapping),
        };
        let child_indent = map.indent + 2;
        if let Some(entry) = map.entries.iter_mut().find(|e| e.key == key) {
            if !entry.value.is_mapping() {
                entry.value = Node::Mapping(Mapping::empty_block(child_indent));
            }
            return Ok(());
        }
        let head = match map.form {
            Form::Block { .. } => format!("{}{}:", " ".repeat(map.indent), encode_key(key)),
            Form::Flow { .. } => format!("{}:", encode_key(key)),
        };
        map.entries.push(Entry {
            before: Vec::new(),
            head,
            key: key.to_string(),
            value: Node::Mapping(Mapping::empty_block(child_indent)),
        });
        Ok(())
    }
}

/// Walks `path` mutably, marking every flow collection along the way dirty
/// so it is re-rendered on emission.
fn descend<'a>(node: &'a mut Node, path: &[Step]) -> Result<&'a mut Node, MutateError> {
    let mut cur = node;
    for step in path {
        cur.mark_flow_dirty();
        cur = match step {
            Step::Key(k) => match cur {
                Node::Mapping(m) => m
                    .entries
                    .iter_mut()
                    .find(|e| &e.key == k)
                    .map(|e| &mut e.value)
                    .ok_or_else(|| MutateError::MissingKey { key: k.clone() })?,
                _ => return Err(MutateError::NotAMapping),
            },
            Step::Index(i) => match cur {
                Node::Sequence(s) => s
                    .items
                    .get_mut(*i)
                    .map(|item| &mut item.value)
                    .ok_or(MutateError::MissingIndex { index: *i })?,
                _ => return Err(MutateError::MissingIndex { index: *i }),
            },
        };
    }
    cur.mark_flow_dirty();
    Ok(cur)
}

impl Node {
    fn mark_flow_dirty(&mut self) {
        let form = match self {
            Node::Mapping(m) => &mut m.form,
            Node::Sequence(s) => &mut s.form,
            Node::Scalar(_) => return,
        };
        if let Form::Flow { dirty, .. } = form {
            *dirty = true;
        }
    }
}

impl Scalar {
    /// Decoded value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Presentation style as read from the source.
    pub fn style(&self) -> ScalarStyle {
        self.style
    }

    /// A scalar that never existed in the source, for inserted entries.
    pub(crate) fn synthesized(value: &str) -> Scalar {
        let (raw, style) = encode_scalar(value);
        Scalar {
            value: value.to_string(),
            raw,
            sep: " ".to_string(),
            trailing: String::new(),
            style,
            standalone: None,
        }
    }

    /// Rewrites the value in place, keeping the existing style whenever it
    /// can still represent the new value.
    pub(crate) fn set_value(&mut self, new: &str) {
        self.value = new.to_string();
        let (raw, style) = match self.style {
            ScalarStyle::Plain if is_plain_safe(new) => (new.to_string(), ScalarStyle::Plain),
            ScalarStyle::Plain | ScalarStyle::SingleQuoted
                if !new.chars().any(|c| c.is_control()) =>
            {
                (encode_single_quoted(new), ScalarStyle::SingleQuoted)
            }
            // Block scalars collapse to one line; anything else that the
            // original style cannot hold gets double quotes.
            _ => (encode_double_quoted(new), ScalarStyle::DoubleQuoted),
        };
        self.style = style;
        match &self.standalone {
            Some(st) => {
                self.raw = format!("{}{}", " ".repeat(st.indent), raw);
            }
            None => {
                self.raw = raw;
                if self.sep.is_empty() && !self.raw.is_empty() {
                    self.sep = " ".to_string();
                }
            }
        }
    }
}

impl Mapping {
    pub(crate) fn empty_block(indent: usize) -> Mapping {
        Mapping {
            entries: Vec::new(),
            indent,
            form: Form::Block {
                header_rest: String::new(),
            },
            inline_first: false,
            tail: Vec::new(),
        }
    }

    /// Looks up an entry value by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|e| (e.key.as_str(), &e.value))
    }

    fn push_scalar_entry(&mut self, key: &str, value: &str) {
        let head = match self.form {
            Form::Block { .. } => format!("{}{}:", " ".repeat(self.indent), encode_key(key)),
            Form::Flow { .. } => format!("{}:", encode_key(key)),
        };
        self.entries.push(Entry {
            before: Vec::new(),
            head,
            key: key.to_string(),
            value: Node::Scalar(Scalar::synthesized(value)),
        });
    }
}

impl Sequence {
    /// Item at `index`.
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.items.get(index).map(|i| &i.value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over item values in source order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.items.iter().map(|i| &i.value)
    }
}

/// True when `s` can be written as a plain scalar without changing meaning
/// or swallowing a comment. Text that a loader would read back as null,
/// bool, or a number is excluded so written values stay strings.
pub(crate) fn is_plain_safe(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
        return false;
    }
    let first = s.chars().next().unwrap_or(' ');
    if "!&*?{}[],#|>@`\"'%".contains(first) {
        return false;
    }
    if s.starts_with("- ") || s == "-" || s.starts_with(": ") {
        return false;
    }
    if s.contains(": ") || s.ends_with(':') || s.contains(" #") {
        return false;
    }
    if resolves_non_string(s) {
        return false;
    }
    !s.chars().any(|c| c == '\n' || c == '\t' || c.is_control())
}

/// True when `s` contains a character that ends a plain scalar in flow
/// context.
pub(crate) fn has_flow_indicator(s: &str) -> bool {
    s.chars().any(|c| matches!(c, '{' | '}' | '[' | ']' | ','))
}

/// Encodes a scalar for insertion, plain when safe, quoted otherwise.
pub(crate) fn encode_scalar(value: &str) -> (String, ScalarStyle) {
    if is_plain_safe(value) {
        (value.to_string(), ScalarStyle::Plain)
    } else if value.chars().any(|c| c.is_control()) {
        (encode_double_quoted(value), ScalarStyle::DoubleQuoted)
    } else {
        (encode_single_quoted(value), ScalarStyle::SingleQuoted)
    }
}

pub(crate) fn encode_key(key: &str) -> String {
    if is_plain_safe(key) {
        key.to_string()
    } else if key.chars().any(|c| c.is_control()) {
        encode_double_quoted(key)
    } else {
        encode_single_quoted(key)
    }
}

pub(crate) fn encode_single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub(crate) fn encode_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_safe() {
        assert!(is_plain_safe("repo/app:v1"));
        assert!(is_plain_safe("nginx"));
        assert!(is_plain_safe("v1.2.3"));
        assert!(!is_plain_safe(""));
        assert!(!is_plain_safe("a: b"));
        assert!(!is_plain_safe("# comment"));
        assert!(!is_plain_safe(" padded"));
        assert!(!is_plain_safe("trailing:"));
        assert!(!is_plain_safe("{flow}"));
    }

    #[test]
    fn test_plain_unsafe_when_text_reads_as_typed() {
        assert!(!is_plain_safe("true"));
        assert!(!is_plain_safe("False"));
        assert!(!is_plain_safe("null"));
        assert!(!is_plain_safe("~"));
        assert!(!is_plain_safe("8080"));
        assert!(!is_plain_safe("1.10"));
        assert!(!is_plain_safe("0x1A"));
        assert!(!is_plain_safe(".inf"));
    }

    #[test]
    fn test_encode_double_quoted() {
        assert_eq!(encode_double_quoted("a\"b"), "\"a\\\"b\"");
        assert_eq!(encode_double_quoted("line\nbreak"), "\"line\\nbreak\"");
    }

    #[test]
    fn test_scalar_set_value_keeps_plain() {
        let mut s = Scalar::synthesized("old");
        s.set_value("new-value");
        assert_eq!(s.value(), "new-value");
        assert_eq!(s.raw, "new-value");
        assert_eq!(s.style(), ScalarStyle::Plain);
    }

    #[test]
    fn test_scalar_set_value_quotes_unsafe() {
        let mut s = Scalar::synthesized("old");
        s.set_value("a: b");
        assert_eq!(s.raw, "'a: b'");
        assert_eq!(s.style(), ScalarStyle::SingleQuoted);
    }

    #[test]
    fn test_scalar_set_value_quotes_typed_text() {
        let mut s = Scalar::synthesized("v1");
        s.set_value("false");
        assert_eq!(s.raw, "'false'");
        assert_eq!(s.style(), ScalarStyle::SingleQuoted);

        let mut t = Scalar::synthesized("v1");
        t.set_value("1.10");
        assert_eq!(t.raw, "'1.10'");

        assert_eq!(Scalar::synthesized("true").raw, "'true'");
        assert_eq!(Scalar::synthesized("").raw, "''");
    }

    #[test]
    fn test_step_display() {
        assert_eq!(Step::key("spec").to_string(), "spec");
        assert_eq!(Step::index(3).to_string(), "3");
    }
}
