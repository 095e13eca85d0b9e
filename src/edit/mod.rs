//! Edit requests and the mutators that apply them.
//!
//! A request names the resource it is aimed at (a [`Target`]) and one of
//! three changes: rewrite a container's image, edit the annotation map,
//! or rewrite scalar leaves addressed by dotted paths. The stream layer
//! drives a request over a document stream; the mutators here apply it
//! to one already-located resource.

mod annotate;
mod error;
mod setpath;

pub use error::EditError;

pub(crate) use annotate::apply_annotations;
pub(crate) use setpath::apply_paths;

use serde::{Deserialize, Serialize};

use crate::manifest::Target;

/// Rewrites the image of one named container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEdit {
    pub target: Target,
    pub container: String,
    pub image: String,
}

/// Upserts annotation entries; a note with an empty value deletes its
/// key instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationEdit {
    pub target: Target,
    pub notes: Vec<(String, String)>,
}

/// Rewrites existing scalar leaves addressed by dotted paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEdit {
    pub target: Target,
    pub paths: Vec<(String, String)>,
}

/// One requested change, as handed over by the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edit {
    Image(ImageEdit),
    Annotate(AnnotationEdit),
    SetPath(PathEdit),
}
