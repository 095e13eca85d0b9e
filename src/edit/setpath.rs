//! Dotted-path scalar rewrites.
//!
//! Paths walk mapping keys only and must land on an existing scalar;
//! nothing is auto-created (the opposite policy from annotations). All
//! requested paths are resolved before the first write, so a bad path
//! leaves the resource completely untouched.

use crate::roundtrip::{Node, Step};

use super::EditError;

/// Applies `paths` to the resource rooted at `resource` inside `root`.
pub(crate) fn apply_paths(
    root: &mut Node,
    resource: &[Step],
    paths: &[(String, String)],
) -> Result<(), EditError> {
    let mut writes = Vec::with_capacity(paths.len());
    for (dotted, value) in paths {
        let mut abs = resource.to_vec();
        abs.extend(split_dotted(dotted));
        match root.at(&abs) {
            Some(node) if node.is_scalar() => writes.push((abs, value.as_str())),
            _ => return Err(EditError::unresolvable_path(dotted)),
        }
    }
    for (abs, value) in writes {
        root.set_string(&abs, value)?;
    }
    Ok(())
}

fn split_dotted(path: &str) -> Vec<Step> {
    path.split('.').map(Step::key).collect()
}
