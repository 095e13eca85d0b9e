//! Line-oriented parser for the round-trip tree.
//!
//! The parser covers the YAML subset that Kubernetes manifests are written
//! in: block mappings and sequences, flow collections, plain, quoted and
//! block scalars, comments everywhere, and multi-document streams. Anchors,
//! aliases and tags are carried as opaque scalars. Structures outside the
//! subset (tab indentation, `? ` complex keys, a nested sequence opening on
//! its parent's `- ` line) are reported as errors rather than guessed at.

use thiserror::Error;

use super::node::{Entry, Form, Item, Mapping, Node, Scalar, ScalarStyle, Sequence, Standalone};
use super::{Document, Stream};

/// Error raised when the input cannot be mapped onto the round-trip tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: tab character in indentation")]
    TabIndent { line: usize },

    #[error("line {line}: unexpected indentation")]
    UnexpectedIndent { line: usize },

    #[error("line {line}: sequence item where a mapping key was expected")]
    UnexpectedItem { line: usize },

    #[error("line {line}: expected a mapping key")]
    ExpectedKey { line: usize },

    #[error("line {line}: unterminated quoted scalar")]
    UnterminatedQuote { line: usize },

    #[error("line {line}: unterminated flow collection")]
    UnterminatedFlow { line: usize },

    #[error("line {line}: malformed flow collection")]
    FlowSyntax { line: usize },

    #[error("line {line}: unexpected content after value")]
    TrailingContent { line: usize },

    #[error("line {line}: content on document marker line")]
    MarkerContent { line: usize },

    #[error("line {line}: {what} is not supported")]
    Unsupported { line: usize, what: String },
}

impl ParseError {
    pub(crate) fn tab_indent(line: usize) -> Self {
        ParseError::TabIndent { line }
    }

    pub(crate) fn unexpected_indent(line: usize) -> Self {
        ParseError::UnexpectedIndent { line }
    }

    pub(crate) fn unexpected_item(line: usize) -> Self {
        ParseError::UnexpectedItem { line }
    }

    pub(crate) fn expected_key(line: usize) -> Self {
        ParseError::ExpectedKey { line }
    }

    pub(crate) fn unterminated_quote(line: usize) -> Self {
        ParseError::UnterminatedQuote { line }
    }

    pub(crate) fn unterminated_flow(line: usize) -> Self {
        ParseError::UnterminatedFlow { line }
    }

    pub(crate) fn flow_syntax(line: usize) -> Self {
        ParseError::FlowSyntax { line }
    }

    pub(crate) fn trailing_content(line: usize) -> Self {
        ParseError::TrailingContent { line }
    }

    pub(crate) fn marker_content(line: usize) -> Self {
        ParseError::MarkerContent { line }
    }

    pub(crate) fn unsupported(line: usize, what: impl Into<String>) -> Self {
        ParseError::Unsupported {
            line,
            what: what.into(),
        }
    }
}

/// Parses a YAML stream into documents that re-serialize byte-for-byte
/// until mutated.
pub fn parse_stream(input: &str) -> Result<Stream, ParseError> {
    let mut lines: Vec<&str> = if input.is_empty() {
        Vec::new()
    } else {
        input.split('\n').collect()
    };
    let ends_with_newline = input.ends_with('\n') || input.is_empty();
    if input.ends_with('\n') {
        lines.pop();
    }
    let mut parser = Parser { lines, pos: 0 };
    let mut docs = Vec::new();
    while !parser.at_end() {
        docs.push(parser.parse_document()?);
    }
    Ok(Stream {
        docs,
        ends_with_newline,
    })
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.lines.len()
    }

    fn lineno(&self) -> usize {
        self.pos + 1
    }

    fn parse_document(&mut self) -> Result<Document, ParseError> {
        let mut prefix: Vec<String> = Vec::new();
        let mut seen_marker = false;
        loop {
            if self.at_end() {
                return Ok(Document { prefix, root: None });
            }
            let line = self.lines[self.pos];
            if is_blank(line) || is_comment(line) || (!seen_marker && line.starts_with('%')) {
                prefix.push(line.to_string());
                self.pos += 1;
                continue;
            }
            if is_doc_end(line) {
                // `...` terminates the document and is dropped on emission.
                self.pos += 1;
                return Ok(Document { prefix, root: None });
            }
            if is_marker(line) {
                check_marker_clean(line, self.lineno())?;
                if seen_marker {
                    // An empty document; this marker opens the next one.
                    return Ok(Document { prefix, root: None });
                }
                seen_marker = true;
                prefix.push(line.to_string());
                self.pos += 1;
                continue;
            }
            break;
        }
        let root = self.parse_node()?;
        Ok(Document {
            prefix,
            root: Some(root),
        })
    }

    fn parse_node(&mut self) -> Result<Node, ParseError> {
        let line = self.lines[self.pos];
        let (indent, content) = split_indent(line);
        if content.starts_with('\t') {
            return Err(ParseError::tab_indent(self.lineno()));
        }
        let trimmed = core(content);
        if dash_split(trimmed).is_some() {
            return self.parse_sequence(indent);
        }
        if content.starts_with('{') || content.starts_with('[') {
            // Root-level flow; the raw text starts at column zero so that
            // any indentation is reproduced verbatim.
            return self.parse_flow_inline(0, String::new());
        }
        if key_line(trimmed).is_some() {
            return self.parse_mapping(indent, None);
        }
        self.parse_standalone_scalar(indent, String::new())
    }

    fn parse_mapping(
        &mut self,
        indent: usize,
        first_inline_col: Option<usize>,
    ) -> Result<Node, ParseError> {
        let mut map = Mapping {
            entries: Vec::new(),
            indent,
            form: Form::Block {
                header_rest: String::new(),
            },
            inline_first: first_inline_col.is_some(),
            tail: Vec::new(),
        };
        if let Some(col) = first_inline_col {
            let entry = self.parse_entry(col, col, Vec::new())?;
            map.entries.push(entry);
        }
        let mut pending: Vec<String> = Vec::new();
        loop {
            if self.at_end() {
                break;
            }
            let line = self.lines[self.pos];
            if is_blank(line) || is_comment(line) {
                pending.push(line.to_string());
                self.pos += 1;
                continue;
            }
            if is_marker(line) || is_doc_end(line) {
                break;
            }
            let (ind, content) = split_indent(line);
            if content.starts_with('\t') {
                return Err(ParseError::tab_indent(self.lineno()));
            }
            if ind < indent {
                break;
            }
            if ind > indent {
                return Err(ParseError::unexpected_indent(self.lineno()));
            }
            if dash_split(core(content)).is_some() {
                return Err(ParseError::unexpected_item(self.lineno()));
            }
            let before = std::mem::take(&mut pending);
            let entry = self.parse_entry(0, ind, before)?;
            map.entries.push(entry);
        }
        map.tail = pending;
        Ok(Node::Mapping(map))
    }

    /// Parses one `key: ...` entry starting at the current line. `head_start`
    /// is where the verbatim head begins (zero for ordinary entries, the key
    /// column for an entry sharing its line with a `- ` marker).
    fn parse_entry(
        &mut self,
        head_start: usize,
        key_col: usize,
        before: Vec<String>,
    ) -> Result<Entry, ParseError> {
        let line = self.lines[self.pos];
        let content = &line[key_col..];
        let Some((colon_rel, key)) = key_line(core(content)) else {
            return Err(ParseError::expected_key(self.lineno()));
        };
        let colon_abs = key_col + colon_rel;
        let head = line[head_start..=colon_abs].to_string();
        let value = self.parse_value_after_colon(colon_abs, key_col)?;
        Ok(Entry {
            before,
            head,
            key,
            value,
        })
    }

    fn parse_value_after_colon(
        &mut self,
        colon_abs: usize,
        key_col: usize,
    ) -> Result<Node, ParseError> {
        let line = self.lines[self.pos];
        let after = &line[colon_abs + 1..];
        let inner = after.trim_start_matches(|c| c == ' ' || c == '\t');
        if core(inner).is_empty() || inner.starts_with('#') {
            // Nothing on the key line: the value is empty or starts below.
            let key_rest = after.to_string();
            self.pos += 1;
            return self.parse_child_or_empty(key_col, key_rest, true);
        }
        let sep = after[..after.len() - inner.len()].to_string();
        self.parse_inline_value(colon_abs + 1 + sep.len(), key_col, sep)
    }

    /// Parses an inline value beginning at byte `voff` of the current line.
    /// `key_col` anchors block scalar content indentation.
    fn parse_inline_value(
        &mut self,
        voff: usize,
        key_col: usize,
        sep: String,
    ) -> Result<Node, ParseError> {
        let line = self.lines[self.pos];
        let rest = &line[voff..];
        match rest.chars().next() {
            Some('"') => self.parse_quoted_value(voff, '"', sep),
            Some('\'') => self.parse_quoted_value(voff, '\'', sep),
            Some('|') | Some('>') => self.parse_block_scalar(voff, key_col, sep),
            Some('{') | Some('[') => self.parse_flow_inline(voff, sep),
            _ => {
                // Plain scalars, and anchors/aliases/tags carried opaquely.
                let (raw, trailing) = split_plain(rest);
                self.pos += 1;
                Ok(Node::Scalar(Scalar {
                    value: raw.clone(),
                    raw,
                    sep,
                    trailing,
                    style: ScalarStyle::Plain,
                    standalone: None,
                }))
            }
        }
    }

    fn parse_quoted_value(
        &mut self,
        voff: usize,
        quote: char,
        sep: String,
    ) -> Result<Node, ParseError> {
        let (value, raw, end_line, end_off) = self.parse_quoted(voff, quote)?;
        let rest = &self.lines[end_line][end_off..];
        let t = rest.trim_start();
        if !(t.is_empty() || t.starts_with('#')) {
            return Err(ParseError::trailing_content(end_line + 1));
        }
        self.pos = end_line + 1;
        Ok(Node::Scalar(Scalar {
            value,
            raw,
            sep,
            trailing: rest.to_string(),
            style: if quote == '"' {
                ScalarStyle::DoubleQuoted
            } else {
                ScalarStyle::SingleQuoted
            },
            standalone: None,
        }))
    }

    /// Scans a quoted scalar beginning at `voff` on the current line,
    /// following it across lines if needed. Returns the decoded value, the
    /// verbatim raw text, and the position just past the closing quote.
    fn parse_quoted(
        &mut self,
        voff: usize,
        quote: char,
    ) -> Result<(String, String, usize, usize), ParseError> {
        let start = self.pos;
        let mut raw = String::new();
        let mut value = String::new();
        let mut li = start;
        let mut ci = voff + 1;
        raw.push(quote);
        loop {
            if li >= self.lines.len() {
                return Err(ParseError::unterminated_quote(start + 1));
            }
            let line = self.lines[li];
            if li > start {
                raw.push('\n');
                // Continuation lines fold into a single space; their
                // leading indentation is not part of the value.
                let stripped = line.trim_start();
                ci = line.len() - stripped.len();
                raw.push_str(&line[..ci]);
                if !value.ends_with(' ') && !value.is_empty() {
                    value.push(' ');
                }
            }
            let seg = &line[ci..];
            let mut iter = seg.char_indices();
            let mut closed: Option<usize> = None;
            while let Some((off, c)) = iter.next() {
                if quote == '"' {
                    match c {
                        '\\' => match iter.next() {
                            Some((_, esc)) => value.push_str(&decode_escape(esc)),
                            None => break,
                        },
                        '"' => {
                            closed = Some(ci + off + 1);
                            break;
                        }
                        c => value.push(c),
                    }
                } else if c == '\'' {
                    let mut look = iter.clone();
                    if let Some((_, '\'')) = look.next() {
                        value.push('\'');
                        iter.next();
                    } else {
                        closed = Some(ci + off + 1);
                        break;
                    }
                } else {
                    value.push(c);
                }
            }
            match closed {
                Some(end) => {
                    raw.push_str(&line[ci..end]);
                    return Ok((value, raw, li, end));
                }
                None => {
                    raw.push_str(seg);
                    value.truncate(value.trim_end().len());
                    li += 1;
                }
            }
        }
    }

    fn parse_block_scalar(
        &mut self,
        voff: usize,
        key_col: usize,
        sep: String,
    ) -> Result<Node, ParseError> {
        let line = self.lines[self.pos];
        let header = line[voff..].to_string();
        let hcore = core(&header);
        let style = if hcore.starts_with('|') {
            ScalarStyle::Literal
        } else {
            ScalarStyle::Folded
        };
        let mut chomp: Option<char> = None;
        let mut explicit: Option<usize> = None;
        for c in hcore[1..].chars() {
            match c {
                '+' | '-' if chomp.is_none() => chomp = Some(c),
                '0'..='9' if explicit.is_none() => explicit = Some(c as usize - '0' as usize),
                _ => break,
            }
        }
        self.pos += 1;
        let content_indent = match explicit {
            Some(d) => key_col + d,
            None => {
                let mut found = None;
                let mut i = self.pos;
                while i < self.lines.len() {
                    let l = self.lines[i];
                    if is_blank(l) {
                        i += 1;
                        continue;
                    }
                    let (ind, _) = split_indent(l);
                    if ind > key_col {
                        found = Some(ind);
                    }
                    break;
                }
                match found {
                    Some(ind) => ind,
                    None => {
                        return Ok(Node::Scalar(Scalar {
                            value: String::new(),
                            raw: header,
                            sep,
                            trailing: String::new(),
                            style,
                            standalone: None,
                        }));
                    }
                }
            }
        };
        let mut last_content = None;
        let mut i = self.pos;
        while i < self.lines.len() {
            let l = self.lines[i];
            if is_blank(l) {
                i += 1;
                continue;
            }
            let (ind, _) = split_indent(l);
            if ind >= content_indent {
                last_content = Some(i);
                i += 1;
            } else {
                break;
            }
        }
        let end = match last_content {
            Some(lc) => lc + 1,
            None => self.pos,
        };
        let mut raw = header;
        let mut body: Vec<&str> = Vec::new();
        for j in self.pos..end {
            raw.push('\n');
            raw.push_str(self.lines[j]);
            body.push(self.lines[j]);
        }
        self.pos = end;
        let value = decode_block(&body, content_indent, style, chomp);
        Ok(Node::Scalar(Scalar {
            value,
            raw,
            sep,
            trailing: String::new(),
            style,
            standalone: None,
        }))
    }

    fn parse_flow_inline(&mut self, voff: usize, sep: String) -> Result<Node, ParseError> {
        let start = self.pos;
        let (raw, end_line, end_off) = self.collect_flow_raw(voff)?;
        let rest = &self.lines[end_line][end_off..];
        let t = rest.trim_start();
        if !(t.is_empty() || t.starts_with('#')) {
            return Err(ParseError::trailing_content(end_line + 1));
        }
        let trailing = rest.to_string();
        self.pos = end_line + 1;
        let mut node = parse_flow_text(&raw, start + 1)?;
        set_flow_form(
            &mut node,
            Form::Flow {
                sep,
                raw,
                trailing,
                dirty: false,
                key_rest: None,
            },
            voff,
        );
        Ok(node)
    }

    fn parse_flow_standalone(&mut self, indent: usize, key_rest: String) -> Result<Node, ParseError> {
        let start = self.pos;
        let (raw, end_line, end_off) = self.collect_flow_raw(0)?;
        let rest = &self.lines[end_line][end_off..];
        let t = rest.trim_start();
        if !(t.is_empty() || t.starts_with('#')) {
            return Err(ParseError::trailing_content(end_line + 1));
        }
        let trailing = rest.to_string();
        self.pos = end_line + 1;
        let mut node = parse_flow_text(&raw, start + 1)?;
        set_flow_form(
            &mut node,
            Form::Flow {
                sep: String::new(),
                raw,
                trailing,
                dirty: false,
                key_rest: Some(key_rest),
            },
            indent,
        );
        Ok(node)
    }

    /// Collects the verbatim text of a flow collection starting at `voff`
    /// on the current line, tracking bracket depth through quotes and
    /// comments. Returns the raw text and the position just past the
    /// closing bracket.
    fn collect_flow_raw(&mut self, voff: usize) -> Result<(String, usize, usize), ParseError> {
        let start = self.pos;
        let mut raw = String::new();
        let mut li = start;
        let mut ci = voff;
        let mut depth: i32 = 0;
        let mut in_double = false;
        let mut in_single = false;
        loop {
            if li >= self.lines.len() {
                return Err(ParseError::unterminated_flow(start + 1));
            }
            let line = self.lines[li];
            if li > start {
                raw.push('\n');
            }
            let seg = &line[ci..];
            let mut iter = seg.char_indices();
            let mut prev: Option<char> = None;
            let mut done: Option<usize> = None;
            while let Some((off, c)) = iter.next() {
                if in_double {
                    match c {
                        '\\' => {
                            iter.next();
                        }
                        '"' => in_double = false,
                        _ => {}
                    }
                } else if in_single {
                    if c == '\'' {
                        let mut look = iter.clone();
                        if let Some((_, '\'')) = look.next() {
                            iter.next();
                        } else {
                            in_single = false;
                        }
                    }
                } else {
                    match c {
                        '"' => in_double = true,
                        '\'' => in_single = true,
                        '#' if prev.map_or(true, |p| p == ' ' || p == '\t') => {
                            // Rest of the line is a comment; keep it verbatim.
                            break;
                        }
                        '{' | '[' => depth += 1,
                        '}' | ']' => {
                            if depth <= 1 {
                                done = Some(ci + off + c.len_utf8());
                                break;
                            }
                            depth -= 1;
                        }
                        _ => {}
                    }
                }
                prev = Some(c);
            }
            match done {
                Some(end) => {
                    raw.push_str(&line[ci..end]);
                    return Ok((raw, li, end));
                }
                None => {
                    raw.push_str(seg);
                    li += 1;
                    ci = 0;
                }
            }
        }
    }

    /// After a key (or `- `) with nothing on its line, parses the child
    /// node below it, or records an empty value. `owner_col` is the column
    /// of the key or dash; comment lines between the key and a standalone
    /// value are absorbed into `key_rest`.
    fn parse_child_or_empty(
        &mut self,
        owner_col: usize,
        key_rest: String,
        allow_same_col_seq: bool,
    ) -> Result<Node, ParseError> {
        let Some((idx, ind, content)) = self.peek_content() else {
            return Ok(empty_scalar(key_rest));
        };
        let trimmed = core(content);
        let dash = dash_split(trimmed).is_some();
        if dash && (ind > owner_col || (allow_same_col_seq && ind == owner_col)) {
            let mut node = self.parse_sequence(ind)?;
            if let Node::Sequence(s) = &mut node {
                s.form = Form::Block {
                    header_rest: key_rest,
                };
            }
            return Ok(node);
        }
        if !dash && ind > owner_col {
            if content.starts_with('\t') {
                return Err(ParseError::tab_indent(idx + 1));
            }
            if content.starts_with('{') || content.starts_with('[') {
                let rest = self.absorb_gap(idx, key_rest);
                return self.parse_flow_standalone(ind, rest);
            }
            if key_line(trimmed).is_some() {
                let mut node = self.parse_mapping(ind, None)?;
                if let Node::Mapping(m) = &mut node {
                    m.form = Form::Block {
                        header_rest: key_rest,
                    };
                }
                return Ok(node);
            }
            let rest = self.absorb_gap(idx, key_rest);
            return self.parse_standalone_scalar(ind, rest);
        }
        Ok(empty_scalar(key_rest))
    }

    /// Joins the blank and comment lines between the current position and
    /// `idx` onto `key_rest`, advancing past them.
    fn absorb_gap(&mut self, idx: usize, key_rest: String) -> String {
        let mut out = key_rest;
        for i in self.pos..idx {
            out.push('\n');
            out.push_str(self.lines[i]);
        }
        self.pos = idx;
        out
    }

    fn parse_standalone_scalar(&mut self, indent: usize, key_rest: String) -> Result<Node, ParseError> {
        let line = self.lines[self.pos];
        let content = &line[indent..];
        match content.chars().next() {
            Some('"') | Some('\'') => {
                let quote = if content.starts_with('"') { '"' } else { '\'' };
                let (value, raw, end_line, end_off) = self.parse_quoted(indent, quote)?;
                let rest = &self.lines[end_line][end_off..];
                let t = rest.trim_start();
                if !(t.is_empty() || t.starts_with('#')) {
                    return Err(ParseError::trailing_content(end_line + 1));
                }
                self.pos = end_line + 1;
                Ok(Node::Scalar(Scalar {
                    value,
                    raw: format!("{}{}", " ".repeat(indent), raw),
                    sep: String::new(),
                    trailing: rest.to_string(),
                    style: if quote == '"' {
                        ScalarStyle::DoubleQuoted
                    } else {
                        ScalarStyle::SingleQuoted
                    },
                    standalone: Some(Standalone {
                        key_rest,
                        indent,
                    }),
                }))
            }
            _ => {
                let (raw, trailing) = split_plain(content);
                self.pos += 1;
                Ok(Node::Scalar(Scalar {
                    value: raw.clone(),
                    raw: format!("{}{}", " ".repeat(indent), raw),
                    sep: String::new(),
                    trailing,
                    style: ScalarStyle::Plain,
                    standalone: Some(Standalone {
                        key_rest,
                        indent,
                    }),
                }))
            }
        }
    }

    fn parse_sequence(&mut self, indent: usize) -> Result<Node, ParseError> {
        let mut seq = Sequence {
            items: Vec::new(),
            indent,
            form: Form::Block {
                header_rest: String::new(),
            },
            tail: Vec::new(),
        };
        let mut pending: Vec<String> = Vec::new();
        loop {
            if self.at_end() {
                break;
            }
            let line = self.lines[self.pos];
            if is_blank(line) || is_comment(line) {
                pending.push(line.to_string());
                self.pos += 1;
                continue;
            }
            if is_marker(line) || is_doc_end(line) {
                break;
            }
            let (ind, content) = split_indent(line);
            if content.starts_with('\t') {
                return Err(ParseError::tab_indent(self.lineno()));
            }
            if ind < indent {
                break;
            }
            if ind > indent {
                return Err(ParseError::unexpected_indent(self.lineno()));
            }
            let Some(_) = dash_split(core(content)) else {
                // A key at the item column ends the sequence; it belongs to
                // the mapping this sequence is nested under.
                break;
            };
            let before = std::mem::take(&mut pending);
            let after = &content[1..];
            let inner = after.trim_start_matches(' ');
            let spaces = after.len() - inner.len();
            let inner_col = indent + 1 + spaces;
            let head = line[..inner_col].to_string();
            let value = if core(inner).is_empty() || inner.starts_with('#') {
                let key_rest = line[inner_col..].to_string();
                self.pos += 1;
                self.parse_child_or_empty(indent, key_rest, false)?
            } else if inner.starts_with('{') || inner.starts_with('[') {
                self.parse_flow_inline(inner_col, String::new())?
            } else if dash_split(core(inner)).is_some() {
                return Err(ParseError::unsupported(
                    self.lineno(),
                    "nested sequence on one line",
                ));
            } else if key_line(core(inner)).is_some() {
                self.parse_mapping(inner_col, Some(inner_col))?
            } else {
                self.parse_inline_value(inner_col, indent, String::new())?
            };
            seq.items.push(Item {
                before,
                head,
                value,
            });
        }
        seq.tail = pending;
        Ok(Node::Sequence(seq))
    }

    /// Peeks past blank and comment lines to the next content line, without
    /// consuming anything. Document markers terminate the scan.
    fn peek_content(&self) -> Option<(usize, usize, &'a str)> {
        let mut i = self.pos;
        while i < self.lines.len() {
            let line = self.lines[i];
            if is_blank(line) || is_comment(line) {
                i += 1;
                continue;
            }
            if is_marker(line) || is_doc_end(line) {
                return None;
            }
            let (ind, content) = split_indent(line);
            return Some((i, ind, content));
        }
        None
    }
}

fn empty_scalar(trailing: String) -> Node {
    Node::Scalar(Scalar {
        value: String::new(),
        raw: String::new(),
        sep: String::new(),
        trailing,
        style: ScalarStyle::Plain,
        standalone: None,
    })
}

fn set_flow_form(node: &mut Node, form: Form, indent: usize) {
    match node {
        Node::Mapping(m) => {
            m.form = form;
            m.indent = indent;
        }
        Node::Sequence(s) => {
            s.form = form;
            s.indent = indent;
        }
        Node::Scalar(_) => {}
    }
}

/// Strips a trailing carriage return so CRLF input classifies like LF.
fn core(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

fn is_marker(line: &str) -> bool {
    let c = core(line);
    c == "---" || c.starts_with("--- ")
}

fn is_doc_end(line: &str) -> bool {
    let c = core(line);
    c == "..." || c.starts_with("... ")
}

fn check_marker_clean(line: &str, lineno: usize) -> Result<(), ParseError> {
    let rest = core(line)[3..].trim_start();
    if rest.is_empty() || rest.starts_with('#') {
        Ok(())
    } else {
        Err(ParseError::marker_content(lineno))
    }
}

fn split_indent(line: &str) -> (usize, &str) {
    let trimmed = line.trim_start_matches(' ');
    (line.len() - trimmed.len(), trimmed)
}

/// Splits `- item` content into the part after the dash, or `None` when the
/// content is not a sequence item (`-x` is a plain scalar).
fn dash_split(content: &str) -> Option<&str> {
    if content == "-" {
        return Some("");
    }
    let rest = content.strip_prefix('-')?;
    if rest.starts_with(' ') {
        Some(rest)
    } else {
        None
    }
}

/// Recognizes a `key:` line, returning the byte index of the colon and the
/// decoded key. The colon must be followed by a space or end the line.
fn key_line(content: &str) -> Option<(usize, String)> {
    let bytes = content.as_bytes();
    match bytes.first()? {
        b'"' | b'\'' => {
            let quote = bytes[0] as char;
            let (key, after) = scan_quoted(content, quote)?;
            let mut i = after;
            while i < bytes.len() && bytes[i] == b' ' {
                i += 1;
            }
            if i < bytes.len() && bytes[i] == b':' && (i + 1 == bytes.len() || bytes[i + 1] == b' ')
            {
                Some((i, key))
            } else {
                None
            }
        }
        _ => {
            for i in 0..bytes.len() {
                let b = bytes[i];
                if b == b'#' && i > 0 && (bytes[i - 1] == b' ' || bytes[i - 1] == b'\t') {
                    return None;
                }
                if b == b':' && (i + 1 == bytes.len() || bytes[i + 1] == b' ') {
                    if i == 0 {
                        return None;
                    }
                    return Some((i, content[..i].trim_end().to_string()));
                }
            }
            None
        }
    }
}

/// Scans a single-line quoted token starting at byte 0 of `s`, returning
/// the decoded content and the index just past the closing quote.
fn scan_quoted(s: &str, quote: char) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut iter = s.char_indices();
    iter.next();
    while let Some((off, c)) = iter.next() {
        if quote == '"' {
            match c {
                '\\' => {
                    let (_, esc) = iter.next()?;
                    value.push_str(&decode_escape(esc));
                }
                '"' => return Some((value, off + 1)),
                c => value.push(c),
            }
        } else if c == '\'' {
            let mut look = iter.clone();
            if let Some((_, '\'')) = look.next() {
                value.push('\'');
                iter.next();
            } else {
                return Some((value, off + 1));
            }
        } else {
            value.push(c);
        }
    }
    None
}

fn decode_escape(c: char) -> String {
    match c {
        'n' => "\n".to_string(),
        't' => "\t".to_string(),
        'r' => "\r".to_string(),
        '0' => "\0".to_string(),
        '\\' => "\\".to_string(),
        '"' => "\"".to_string(),
        '/' => "/".to_string(),
        ' ' => " ".to_string(),
        c => format!("\\{}", c),
    }
}

/// Splits a plain scalar from its trailing spaces and comment. The comment
/// starts at the first `#` preceded by whitespace.
fn split_plain(rest: &str) -> (String, String) {
    let bytes = rest.as_bytes();
    let mut comment_at = rest.len();
    for i in 0..bytes.len() {
        if bytes[i] == b'#' && i > 0 && (bytes[i - 1] == b' ' || bytes[i - 1] == b'\t') {
            comment_at = i;
            break;
        }
    }
    let raw_end = rest[..comment_at].trim_end().len();
    (rest[..raw_end].to_string(), rest[raw_end..].to_string())
}

fn decode_block(
    body: &[&str],
    content_indent: usize,
    style: ScalarStyle,
    chomp: Option<char>,
) -> String {
    let parts: Vec<String> = body
        .iter()
        .map(|l| {
            let c = core(l);
            if c.trim().is_empty() {
                String::new()
            } else if c.len() >= content_indent {
                c[content_indent..].to_string()
            } else {
                String::new()
            }
        })
        .collect();
    let joined = match style {
        ScalarStyle::Folded => {
            let mut out = String::new();
            for (i, p) in parts.iter().enumerate() {
                if i == 0 {
                    out.push_str(p);
                } else if p.is_empty() {
                    out.push('\n');
                } else if parts[i - 1].is_empty() {
                    out.push_str(p);
                } else {
                    out.push(' ');
                    out.push_str(p);
                }
            }
            out
        }
        _ => parts.join("\n"),
    };
    let trimmed = joined.trim_end_matches('\n');
    match chomp {
        Some('-') => trimmed.to_string(),
        Some('+') => format!("{}\n", joined.trim_end_matches('\n')),
        _ => {
            if trimmed.is_empty() {
                String::new()
            } else {
                format!("{}\n", trimmed)
            }
        }
    }
}

/// Structural parse of collected flow text. The returned nodes do not own
/// source bytes; the collection's raw text wins on emission until a
/// mutation marks it dirty.
fn parse_flow_text(raw: &str, lineno: usize) -> Result<Node, ParseError> {
    let mut reader = FlowReader {
        raw,
        chars: raw.char_indices().collect(),
        i: 0,
        lineno,
    };
    reader.value()
}

struct FlowReader<'a> {
    raw: &'a str,
    chars: Vec<(usize, char)>,
    i: usize,
    lineno: usize,
}

impl<'a> FlowReader<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.i).map(|&(_, c)| c)
    }

    fn byte_at(&self, i: usize) -> usize {
        self.chars.get(i).map_or(self.raw.len(), |&(b, _)| b)
    }

    fn skip_ws(&mut self) {
        while let Some(&(_, c)) = self.chars.get(self.i) {
            if c == ' ' || c == '\t' || c == '\n' || c == '\r' {
                self.i += 1;
            } else if c == '#'
                && (self.i == 0
                    || matches!(self.chars[self.i - 1].1, ' ' | '\t' | '\n' | '\r'))
            {
                while let Some(&(_, c)) = self.chars.get(self.i) {
                    self.i += 1;
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn value(&mut self) -> Result<Node, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some('{') => self.mapping(),
            Some('[') => self.sequence(),
            Some('"') => self.quoted('"'),
            Some('\'') => self.quoted('\''),
            Some(_) => Ok(self.plain(&[',', '}', ']'])),
            None => Err(ParseError::unterminated_flow(self.lineno)),
        }
    }

    fn mapping(&mut self) -> Result<Node, ParseError> {
        let start = self.byte_at(self.i);
        self.i += 1;
        let mut entries = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('}') => {
                    self.i += 1;
                    break;
                }
                None => return Err(ParseError::unterminated_flow(self.lineno)),
                _ => {}
            }
            let key_node = match self.peek() {
                Some('"') => self.quoted('"')?,
                Some('\'') => self.quoted('\'')?,
                _ => self.plain(&[':', ',', '}', ']']),
            };
            let key = match &key_node {
                Node::Scalar(s) => s.value().to_string(),
                _ => return Err(ParseError::flow_syntax(self.lineno)),
            };
            self.skip_ws();
            let value = match self.peek() {
                Some(':') => {
                    self.i += 1;
                    self.skip_ws();
                    match self.peek() {
                        Some(',') | Some('}') => empty_scalar(String::new()),
                        _ => self.value()?,
                    }
                }
                Some(',') | Some('}') => empty_scalar(String::new()),
                _ => return Err(ParseError::flow_syntax(self.lineno)),
            };
            entries.push(Entry {
                before: Vec::new(),
                head: format!("{}:", key),
                key,
                value,
            });
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.i += 1;
                }
                Some('}') => {}
                _ => return Err(ParseError::flow_syntax(self.lineno)),
            }
        }
        let end = self.byte_at(self.i);
        Ok(Node::Mapping(Mapping {
            entries,
            indent: 0,
            form: Form::Flow {
                sep: String::new(),
                raw: self.raw[start..end].to_string(),
                trailing: String::new(),
                dirty: false,
                key_rest: None,
            },
            inline_first: false,
            tail: Vec::new(),
        }))
    }

    fn sequence(&mut self) -> Result<Node, ParseError> {
        let start = self.byte_at(self.i);
        self.i += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(']') => {
                    self.i += 1;
                    break;
                }
                None => return Err(ParseError::unterminated_flow(self.lineno)),
                _ => {}
            }
            let value = self.value()?;
            items.push(Item {
                before: Vec::new(),
                head: String::new(),
                value,
            });
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.i += 1;
                }
                Some(']') => {}
                _ => return Err(ParseError::flow_syntax(self.lineno)),
            }
        }
        let end = self.byte_at(self.i);
        Ok(Node::Sequence(Sequence {
            items,
            indent: 0,
            form: Form::Flow {
                sep: String::new(),
                raw: self.raw[start..end].to_string(),
                trailing: String::new(),
                dirty: false,
                key_rest: None,
            },
            tail: Vec::new(),
        }))
    }

    fn quoted(&mut self, quote: char) -> Result<Node, ParseError> {
        let start = self.byte_at(self.i);
        self.i += 1;
        let mut value = String::new();
        while let Some(&(_, c)) = self.chars.get(self.i) {
            if quote == '"' {
                match c {
                    '\\' => {
                        self.i += 1;
                        if let Some(&(_, esc)) = self.chars.get(self.i) {
                            value.push_str(&decode_escape(esc));
                            self.i += 1;
                        }
                    }
                    '"' => {
                        self.i += 1;
                        let end = self.byte_at(self.i);
                        return Ok(flow_scalar(
                            value,
                            &self.raw[start..end],
                            ScalarStyle::DoubleQuoted,
                        ));
                    }
                    '\n' => {
                        value.push(' ');
                        self.i += 1;
                    }
                    c => {
                        value.push(c);
                        self.i += 1;
                    }
                }
            } else if c == '\'' {
                if let Some(&(_, '\'')) = self.chars.get(self.i + 1) {
                    value.push('\'');
                    self.i += 2;
                } else {
                    self.i += 1;
                    let end = self.byte_at(self.i);
                    return Ok(flow_scalar(
                        value,
                        &self.raw[start..end],
                        ScalarStyle::SingleQuoted,
                    ));
                }
            } else if c == '\n' {
                value.push(' ');
                self.i += 1;
            } else {
                value.push(c);
                self.i += 1;
            }
        }
        Err(ParseError::unterminated_quote(self.lineno))
    }

    fn plain(&mut self, stops: &[char]) -> Node {
        let start = self.byte_at(self.i);
        while let Some(&(_, c)) = self.chars.get(self.i) {
            if stops.contains(&c) || c == '\n' {
                break;
            }
            self.i += 1;
        }
        let end = self.byte_at(self.i);
        let chunk = self.raw[start..end].trim().to_string();
        flow_scalar(chunk.clone(), &chunk, ScalarStyle::Plain)
    }
}

fn flow_scalar(value: String, raw: &str, style: ScalarStyle) -> Node {
    Node::Scalar(Scalar {
        value,
        raw: raw.to_string(),
        sep: String::new(),
        trailing: String::new(),
        style,
        standalone: None,
    })
}
