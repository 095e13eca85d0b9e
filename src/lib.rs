//! # kubeedit
//!
//! Format-preserving edits to Kubernetes YAML manifest streams.
//!
//! This library locates one target field in one target resource of a
//! multi-document manifest stream (a container image reference, the
//! annotation map, or a scalar named by a dotted path) and rewrites it
//! while leaving every other byte untouched: comments, key order,
//! indentation, quoting and blank lines all survive the round trip.
//!
//! ## Modules
//!
//! - [`roundtrip`] - Lossless YAML parsing and emission for the manifest subset
//! - [`manifest`] - Resource discovery (including List expansion) and identity matching
//! - [`workload`] - Container discovery and image write-back across workload shapes
//! - [`edit`] - Edit requests, the mutators that apply them, and the error taxonomy
//! - [`stream`] - Single-pass stream updates driving one edit over a document stream

pub mod edit;
pub mod manifest;
pub mod roundtrip;
pub mod stream;
pub mod workload;

pub use edit::{AnnotationEdit, Edit, EditError, ImageEdit, PathEdit};
pub use manifest::{manifest_roots, Manifest, Target};
pub use roundtrip::{parse_stream, Document, Node, ParseError, Stream};
pub use stream::{apply_to_yaml, run, set_paths, update_annotations, update_image};
pub use workload::{containers, find_container, split_image_ref, Container, WorkloadShape};
