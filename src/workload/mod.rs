//! Container discovery inside workload resources.
//!
//! Each workload kind keeps its pod template somewhere else: the standard
//! controllers under `spec.template.spec`, CronJob one level further down
//! under `spec.jobTemplate`, and chart resources not at all; their
//! `spec.values` tree is sniffed for image-shaped entries instead (see
//! [`chart`]). Kinds outside the known set expose no containers.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::manifest::Manifest;
use crate::roundtrip::{MutateError, Node, Step};

pub mod chart;

pub use chart::CHART_IMAGE_CONTAINER;

/// Controllers whose pod template lives at `spec.template.spec`.
static STANDARD_CONTROLLER_KINDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "deployment",
        "daemonset",
        "statefulset",
        "replicaset",
        "replicationcontroller",
        "job",
    ]
    .into_iter()
    .collect()
});

/// Chart resources carrying image references in `spec.values`.
static CHART_KINDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["helmrelease", "fluxhelmrelease"].into_iter().collect());

const CONTAINER_LIST_KEYS: [&str; 2] = ["containers", "initContainers"];

/// Where a resource keeps its containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadShape {
    StandardController,
    CronJob,
    Chart,
    Other,
}

/// Classifies a kind, case-insensitively.
pub fn shape_of(kind: &str) -> WorkloadShape {
    let k = kind.to_ascii_lowercase();
    if k == "cronjob" {
        WorkloadShape::CronJob
    } else if STANDARD_CONTROLLER_KINDS.contains(k.as_str()) {
        WorkloadShape::StandardController
    } else if CHART_KINDS.contains(k.as_str()) {
        WorkloadShape::Chart
    } else {
        WorkloadShape::Other
    }
}

/// A container as seen by callers: its name and current image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub image: String,
}

/// Where to write an image back, resolved during discovery.
#[derive(Debug, Clone)]
pub(crate) enum ContainerSite {
    /// Path from the document root to the container mapping itself.
    Pod { container: Vec<Step> },
    /// Path to the chart values mapping holding `image`, plus the shape
    /// the reference was assembled from.
    Chart {
        base: Vec<Step>,
        form: chart::ChartForm,
    },
}

/// The containers of a workload resource, in template order (regular
/// containers before init containers). Chart resources yield synthetic
/// containers named after their values entries.
pub fn containers(manifest: &Manifest<'_>) -> Vec<Container> {
    enumerate(manifest).into_iter().map(|(c, _)| c).collect()
}

/// Finds a container by name.
pub fn find_container(manifest: &Manifest<'_>, name: &str) -> Option<Container> {
    enumerate(manifest)
        .into_iter()
        .find(|(c, _)| c.name == name)
        .map(|(c, _)| c)
}

pub(crate) fn locate_container(manifest: &Manifest<'_>, name: &str) -> Option<ContainerSite> {
    enumerate(manifest)
        .into_iter()
        .find(|(c, _)| c.name == name)
        .map(|(_, site)| site)
}

/// Writes `image` into a previously located container.
pub(crate) fn write_image(
    root: &mut Node,
    site: &ContainerSite,
    image: &str,
) -> Result<(), MutateError> {
    match site {
        ContainerSite::Pod { container } => root.set_entry_string(container, "image", image),
        ContainerSite::Chart { base, form } => chart::write_chart_image(root, base, form, image),
    }
}

fn enumerate(manifest: &Manifest<'_>) -> Vec<(Container, ContainerSite)> {
    match shape_of(manifest.kind().unwrap_or("")) {
        WorkloadShape::StandardController => {
            pod_containers(manifest, &["spec", "template", "spec"])
        }
        WorkloadShape::CronJob => pod_containers(
            manifest,
            &["spec", "jobTemplate", "spec", "template", "spec"],
        ),
        WorkloadShape::Chart => chart::chart_containers(manifest),
        WorkloadShape::Other => Vec::new(),
    }
}

fn pod_containers(
    manifest: &Manifest<'_>,
    spec_path: &[&str],
) -> Vec<(Container, ContainerSite)> {
    let mut out = Vec::new();
    let rel: Vec<Step> = spec_path.iter().map(|k| Step::key(*k)).collect();
    let Some(pod_spec) = manifest.node().at(&rel) else {
        return out;
    };
    for list_key in CONTAINER_LIST_KEYS {
        let Some(seq) = pod_spec.get(list_key).and_then(Node::as_sequence) else {
            continue;
        };
        for (i, container) in seq.iter().enumerate() {
            // Containers are addressed by name; entries without one
            // cannot be targeted and are skipped.
            let Some(name) = container.get("name").and_then(Node::as_str) else {
                continue;
            };
            let image = container
                .get("image")
                .and_then(Node::as_str)
                .unwrap_or("")
                .to_string();
            let mut path = rel.clone();
            path.push(Step::key(list_key));
            path.push(Step::index(i));
            out.push((
                Container {
                    name: name.to_string(),
                    image,
                },
                ContainerSite::Pod {
                    container: manifest.abs(&path),
                },
            ));
        }
    }
    out
}

/// Splits an image reference into name and tag. The tag starts at the
/// last colon, but only when it falls after the last `/`; a colon inside
/// a registry host (`localhost:5000/app`) is not a tag separator.
pub fn split_image_ref(image: &str) -> (&str, Option<&str>) {
    let slash = image.rfind('/');
    match image.rfind(':') {
        Some(colon) if slash.map_or(true, |s| colon > s) => {
            (&image[..colon], Some(&image[colon + 1..]))
        }
        _ => (image, None),
    }
}
