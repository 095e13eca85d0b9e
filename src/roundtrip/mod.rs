//! Round-trip YAML parsing and emission.
//!
//! Kubernetes manifests are edited in place by tooling and read by people,
//! so a load/dump cycle has to give back exactly the bytes it was handed:
//! comments, key order, indentation, quoting and blank lines included.
//! This module parses a manifest stream into a tree that owns every source
//! byte, lets callers rewrite individual scalar values or mapping entries,
//! and emits the stream back with only those rewrites changed.
//!
//! The parser covers the YAML subset manifests are written in; anchors,
//! aliases and tags pass through opaquely, and a trailing `...` document
//! end marker is dropped on emission. Flow collections (`{...}`, `[...]`)
//! keep their verbatim text until something inside them is mutated, at
//! which point they re-render in canonical single-line form.

mod emit;
mod node;
mod parser;
mod semantic;

pub use node::{Mapping, MutateError, Node, Scalar, ScalarStyle, Sequence, Step};
pub use parser::{parse_stream, ParseError};

use std::fmt;

/// A parsed multi-document stream.
#[derive(Debug, Clone)]
pub struct Stream {
    pub(crate) docs: Vec<Document>,
    pub(crate) ends_with_newline: bool,
}

impl Stream {
    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn documents_mut(&mut self) -> &mut [Document] {
        &mut self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut em = emit::Emitter::new();
        for doc in &self.docs {
            emit::emit_document(doc, &mut em);
        }
        let lines = em.finish();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        if self.ends_with_newline && !lines.is_empty() {
            f.write_str("\n")?;
        }
        Ok(())
    }
}

/// One document of a stream: the comment, blank and marker lines that
/// precede its content, and the content itself (absent for an empty
/// document).
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) prefix: Vec<String>,
    pub(crate) root: Option<Node>,
}

impl Document {
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut Node> {
        self.root.as_mut()
    }
}
