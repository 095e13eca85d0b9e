//! Single-pass stream updates.
//!
//! A pass parses the whole stream, walks its documents in order
//! (expanding List wrappers into their member resources), applies the
//! requested edit to the first resource the target matches, and emits
//! every document back in original order. Output is assembled in memory
//! and returned only when the pass succeeds, so a late failure never
//! leaves a half-written stream behind; with no match at all the pass
//! fails with [`EditError::NotFound`] and nothing is emitted.

use crate::edit::{
    apply_annotations, apply_paths, AnnotationEdit, Edit, EditError, ImageEdit, PathEdit,
};
use crate::manifest::{manifest_at, manifest_roots, Target};
use crate::roundtrip::{parse_stream, Document, Step};
use crate::workload::{locate_container, write_image};

/// Parses `input`, hands the documents to `f` for mutation, and emits
/// the stream back. With a no-op `f` the output is byte-identical to
/// the input.
pub fn apply_to_yaml<F>(f: F, input: &str) -> Result<String, EditError>
where
    F: FnOnce(&mut [Document]) -> Result<(), EditError>,
{
    let mut stream = parse_stream(input)?;
    f(stream.documents_mut())?;
    Ok(stream.to_string())
}

/// Runs one edit over `input` and returns the rewritten stream.
pub fn run(edit: &Edit, input: &str) -> Result<String, EditError> {
    match edit {
        Edit::Image(e) => update_image(e, input),
        Edit::Annotate(e) => update_annotations(e, input),
        Edit::SetPath(e) => set_paths(e, input),
    }
}

/// Rewrites the image of the named container in the first matching
/// resource that has it. A resource matching the target but lacking the
/// container is passed over and scanning continues.
pub fn update_image(edit: &ImageEdit, input: &str) -> Result<String, EditError> {
    apply_to_yaml(
        |docs| {
            for doc in docs.iter_mut() {
                for path in manifest_roots(doc) {
                    let site = match manifest_at(doc, &path) {
                        Some(m) if edit.target.matches(&m) => {
                            match locate_container(&m, &edit.container) {
                                Some(site) => site,
                                None => continue,
                            }
                        }
                        _ => continue,
                    };
                    let Some(root) = doc.root_mut() else {
                        continue;
                    };
                    write_image(root, &site, &edit.image)?;
                    return Ok(());
                }
            }
            Err(EditError::not_found("container"))
        },
        input,
    )
}

/// Applies annotation notes to the first matching resource.
pub fn update_annotations(edit: &AnnotationEdit, input: &str) -> Result<String, EditError> {
    apply_to_yaml(
        |docs| {
            let (index, path) = find_target(docs, &edit.target)?;
            match docs[index].root_mut() {
                Some(root) => apply_annotations(root, &path, &edit.notes),
                None => Err(EditError::not_found("resource")),
            }
        },
        input,
    )
}

/// Rewrites the scalar leaves named by dotted paths in the first
/// matching resource. A path that does not resolve is terminal; the
/// resource is left untouched.
pub fn set_paths(edit: &PathEdit, input: &str) -> Result<String, EditError> {
    apply_to_yaml(
        |docs| {
            let (index, path) = find_target(docs, &edit.target)?;
            match docs[index].root_mut() {
                Some(root) => apply_paths(root, &path, &edit.paths),
                None => Err(EditError::not_found("resource")),
            }
        },
        input,
    )
}

/// First resource in document order that the target matches.
fn find_target(docs: &[Document], target: &Target) -> Result<(usize, Vec<Step>), EditError> {
    for (index, doc) in docs.iter().enumerate() {
        for path in manifest_roots(doc) {
            let matched = manifest_at(doc, &path).map_or(false, |m| target.matches(&m));
            if matched {
                return Ok((index, path));
            }
        }
    }
    Err(EditError::not_found("resource"))
}

#[cfg(test)]
mod stream_test;
