//! Resource discovery and identity matching.
//!
//! A document usually holds one resource, but `v1/List` and the generated
//! `<Kind>List` wrappers hold several under `items`; discovery walks those
//! recursively so that edits address the resources inside. Matching
//! compares kind (case-insensitively), name, and namespace, with an absent
//! namespace read as `default`.

use serde::{Deserialize, Serialize};

use crate::roundtrip::{Document, Node, Step};

/// Fallback namespace for resources that do not set one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// The identity of the resource an edit is aimed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl Target {
    pub fn new(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Target {
        Target {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Whether `manifest` is the resource this target names. Resources
    /// missing kind or metadata.name, or holding a non-scalar where a
    /// scalar is compared, never match.
    pub fn matches(&self, manifest: &Manifest<'_>) -> bool {
        let Some(kind) = manifest.kind() else {
            return false;
        };
        if !kind.eq_ignore_ascii_case(&self.kind) {
            return false;
        }
        let Some(name) = manifest.name() else {
            return false;
        };
        let Some(namespace) = manifest.namespace() else {
            return false;
        };
        name == self.name && namespace == self.namespace
    }

    /// Reads a resource's own identity, for round-trip matching.
    pub fn from_manifest(manifest: &Manifest<'_>) -> Option<Target> {
        Some(Target {
            kind: manifest.kind()?.to_string(),
            namespace: manifest.namespace()?.to_string(),
            name: manifest.name()?.to_string(),
        })
    }
}

/// A read view of one resource inside a document, remembering the path
/// from the document root so edits can address into it.
pub struct Manifest<'a> {
    node: &'a Node,
    path: Vec<Step>,
}

impl<'a> Manifest<'a> {
    pub fn node(&self) -> &'a Node {
        self.node
    }

    /// Steps from the document root to this resource.
    pub fn path(&self) -> &[Step] {
        &self.path
    }

    /// Absolute path of a location `rel` inside this resource.
    pub fn abs(&self, rel: &[Step]) -> Vec<Step> {
        let mut out = self.path.clone();
        out.extend(rel.iter().cloned());
        out
    }

    pub fn kind(&self) -> Option<&'a str> {
        self.node.get("kind").and_then(Node::as_str)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.node
            .at(&[Step::key("metadata"), Step::key("name")])
            .and_then(Node::as_str)
    }

    /// Namespace the resource belongs to, `default` when the field is
    /// absent. A present but non-scalar entry reads as `None`.
    pub fn namespace(&self) -> Option<&'a str> {
        match self
            .node
            .at(&[Step::key("metadata"), Step::key("namespace")])
        {
            Some(node) => node.as_str(),
            None => Some(DEFAULT_NAMESPACE),
        }
    }
}

/// Paths of every resource in the document: the root itself, or for List
/// wrappers the items inside, expanded recursively.
pub fn manifest_roots(doc: &Document) -> Vec<Vec<Step>> {
    let mut out = Vec::new();
    if let Some(root) = doc.root() {
        collect(root, Vec::new(), &mut out);
    }
    out
}

/// Resolves a path produced by [`manifest_roots`] back into a view.
pub fn manifest_at<'a>(doc: &'a Document, path: &[Step]) -> Option<Manifest<'a>> {
    let node = doc.root()?.at(path)?;
    Some(Manifest {
        node,
        path: path.to_vec(),
    })
}

fn collect(node: &Node, path: Vec<Step>, out: &mut Vec<Vec<Step>>) {
    let kind = node.get("kind").and_then(Node::as_str);
    let items = node.get("items").and_then(Node::as_sequence);
    if let (Some(kind), Some(items)) = (kind, items) {
        if is_list_kind(kind) {
            for (i, item) in items.iter().enumerate() {
                let mut item_path = path.clone();
                item_path.push(Step::key("items"));
                item_path.push(Step::index(i));
                collect(item, item_path, out);
            }
            return;
        }
    }
    out.push(path);
}

/// `List` and the generated `<Kind>List` wrappers.
fn is_list_kind(kind: &str) -> bool {
    kind.to_ascii_lowercase().ends_with("list")
}

#[cfg(test)]
mod manifest_test;
