//! Image references inside chart values.
//!
//! Chart resources have no pod template; images hide in the free-form
//! `spec.values` tree by convention. A top-level `image` entry stands for
//! the chart's main image and surfaces as a synthetic container named
//! [`CHART_IMAGE_CONTAINER`]; sub-mappings carrying their own `image`
//! surface as containers named after their key. The conventions covered:
//!
//! * `image: {repository: r, tag: t}` reads as `r:t`
//! * `image: r` next to `tag: t` reads as `r:t`
//! * `image: r:t` is taken verbatim
//!
//! Other shapes produce no container. Writes reverse the same convention
//! the reference was read from.

use crate::manifest::Manifest;
use crate::roundtrip::{Mapping, MutateError, Node, Step};

use super::{split_image_ref, Container, ContainerSite};

/// Name given to the synthetic container for a chart's top-level image.
pub const CHART_IMAGE_CONTAINER: &str = "chart-image";

/// Which values convention an image reference was assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChartForm {
    /// `image` is a mapping with `repository` and `tag` entries.
    RepoTag,
    /// `image` is a scalar with a sibling `tag` entry.
    TagSibling,
    /// `image` is a scalar carrying the whole reference.
    Plain,
}

pub(crate) fn chart_containers(manifest: &Manifest<'_>) -> Vec<(Container, ContainerSite)> {
    let mut out = Vec::new();
    let values_rel = [Step::key("spec"), Step::key("values")];
    let Some(values) = manifest.node().at(&values_rel).and_then(Node::as_mapping) else {
        return out;
    };
    if let Some((image, form)) = derive_image(values) {
        out.push((
            Container {
                name: CHART_IMAGE_CONTAINER.to_string(),
                image,
            },
            ContainerSite::Chart {
                base: manifest.abs(&values_rel),
                form,
            },
        ));
    }
    for (key, child) in values.iter() {
        let Some(sub) = child.as_mapping() else {
            continue;
        };
        let Some((image, form)) = derive_image(sub) else {
            continue;
        };
        let mut base = values_rel.to_vec();
        base.push(Step::key(key));
        out.push((
            Container {
                name: key.to_string(),
                image,
            },
            ContainerSite::Chart {
                base: manifest.abs(&base),
                form,
            },
        ));
    }
    out
}

/// Assembles the image reference held by a values mapping, when it
/// follows one of the covered conventions.
fn derive_image(values: &Mapping) -> Option<(String, ChartForm)> {
    let image = values.get("image")?;
    match image {
        Node::Mapping(m) => {
            let repository = m.get("repository").and_then(Node::as_str)?;
            let tag = m.get("tag").and_then(Node::as_str)?;
            Some((join_reference(repository, tag), ChartForm::RepoTag))
        }
        Node::Scalar(s) => match values.get("tag").and_then(Node::as_str) {
            Some(tag) => Some((join_reference(s.value(), tag), ChartForm::TagSibling)),
            None => Some((s.value().to_string(), ChartForm::Plain)),
        },
        Node::Sequence(_) => None,
    }
}

fn join_reference(name: &str, tag: &str) -> String {
    if tag.is_empty() {
        name.to_string()
    } else {
        format!("{}:{}", name, tag)
    }
}

/// Writes `image` back through the convention it was read from.
pub(crate) fn write_chart_image(
    root: &mut Node,
    base: &[Step],
    form: &ChartForm,
    image: &str,
) -> Result<(), MutateError> {
    match form {
        ChartForm::RepoTag => {
            let (name, tag) = split_image_ref(image);
            root.set_string(&join_path(base, &["image", "repository"]), name)?;
            root.set_string(&join_path(base, &["image", "tag"]), tag.unwrap_or(""))
        }
        ChartForm::TagSibling => {
            let (name, tag) = split_image_ref(image);
            root.set_string(&join_path(base, &["image"]), name)?;
            root.set_string(&join_path(base, &["tag"]), tag.unwrap_or(""))
        }
        ChartForm::Plain => root.set_string(&join_path(base, &["image"]), image),
    }
}

fn join_path(base: &[Step], rel: &[&str]) -> Vec<Step> {
    let mut out = base.to_vec();
    out.extend(rel.iter().map(|k| Step::key(*k)));
    out
}
