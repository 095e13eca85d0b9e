//! Annotation upserts and deletions.
//!
//! Annotations are treated as always conceptually present: `metadata`
//! and `metadata.annotations` are created on demand when absent. A note
//! whose value is the empty string deletes its key instead of writing
//! it, and when the last key goes the `annotations` entry itself is
//! removed rather than left as an empty mapping.

use crate::roundtrip::{Node, Step};

use super::EditError;

/// Applies `notes` to the resource rooted at `resource` inside `root`.
pub(crate) fn apply_annotations(
    root: &mut Node,
    resource: &[Step],
    notes: &[(String, String)],
) -> Result<(), EditError> {
    root.ensure_mapping(resource, "metadata")?;
    let mut metadata = resource.to_vec();
    metadata.push(Step::key("metadata"));

    root.ensure_mapping(&metadata, "annotations")?;
    let mut annotations = metadata.clone();
    annotations.push(Step::key("annotations"));

    for (key, value) in notes {
        if value.is_empty() {
            root.remove_entry(&annotations, key)?;
        } else {
            root.set_entry_string(&annotations, key, value)?;
        }
    }

    let emptied = root
        .at(&annotations)
        .and_then(Node::as_mapping)
        .map_or(false, |m| m.is_empty());
    if emptied {
        root.remove_entry(&metadata, "annotations")?;
    }
    Ok(())
}
