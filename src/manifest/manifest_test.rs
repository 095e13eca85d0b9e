use pretty_assertions::assert_eq;

use crate::manifest::{manifest_at, manifest_roots, Target};
use crate::roundtrip::parse_stream;

const DEPLOYMENT: &str = "apiVersion: apps/v1\n\
                          kind: Deployment\n\
                          metadata:\n\
                          \x20 name: app\n\
                          \x20 namespace: prod\n";

#[test]
fn test_identity_fields() {
    let stream = parse_stream(DEPLOYMENT).expect("parse");
    let doc = &stream.documents()[0];
    let m = manifest_at(doc, &[]).expect("manifest");
    assert_eq!(m.kind(), Some("Deployment"));
    assert_eq!(m.name(), Some("app"));
    assert_eq!(m.namespace(), Some("prod"));
}

#[test]
fn test_namespace_defaults() {
    let stream = parse_stream("kind: Service\nmetadata:\n  name: svc\n").expect("parse");
    let m = manifest_at(&stream.documents()[0], &[]).expect("manifest");
    assert_eq!(m.namespace(), Some("default"));
}

#[test]
fn test_non_scalar_namespace_never_matches() {
    let stream = parse_stream(
        "kind: Deployment\n\
         metadata:\n\
         \x20 name: web\n\
         \x20 namespace:\n\
         \x20   oops: broken\n",
    )
    .expect("parse");
    let m = manifest_at(&stream.documents()[0], &[]).expect("manifest");
    assert_eq!(m.namespace(), None);
    assert!(!Target::new("Deployment", "default", "web").matches(&m));
    assert!(Target::from_manifest(&m).is_none());
}

#[test]
fn test_match_self() {
    let stream = parse_stream(DEPLOYMENT).expect("parse");
    let m = manifest_at(&stream.documents()[0], &[]).expect("manifest");
    let target = Target::from_manifest(&m).expect("identity");
    assert!(target.matches(&m));
}

#[test]
fn test_match_kind_case_insensitive() {
    let stream = parse_stream(DEPLOYMENT).expect("parse");
    let m = manifest_at(&stream.documents()[0], &[]).expect("manifest");
    assert!(Target::new("deployment", "prod", "app").matches(&m));
    assert!(Target::new("DEPLOYMENT", "prod", "app").matches(&m));
}

#[test]
fn test_match_requires_name_and_namespace() {
    let stream = parse_stream(DEPLOYMENT).expect("parse");
    let m = manifest_at(&stream.documents()[0], &[]).expect("manifest");
    assert!(!Target::new("Deployment", "prod", "other").matches(&m));
    assert!(!Target::new("Deployment", "default", "app").matches(&m));
    assert!(!Target::new("Service", "prod", "app").matches(&m));
}

#[test]
fn test_malformed_resources_never_match() {
    let stream = parse_stream("kind: Deployment\nmetadata: broken\n").expect("parse");
    let m = manifest_at(&stream.documents()[0], &[]).expect("manifest");
    assert!(!Target::new("Deployment", "default", "app").matches(&m));

    let stream = parse_stream("metadata:\n  name: app\n").expect("parse");
    let m = manifest_at(&stream.documents()[0], &[]).expect("manifest");
    assert!(!Target::new("Deployment", "default", "app").matches(&m));
}

#[test]
fn test_plain_document_has_one_root() {
    let stream = parse_stream(DEPLOYMENT).expect("parse");
    let roots = manifest_roots(&stream.documents()[0]);
    assert_eq!(roots.len(), 1);
    assert!(roots[0].is_empty());
}

#[test]
fn test_list_expansion() {
    let input = "apiVersion: v1\n\
                 kind: List\n\
                 items:\n\
                 - kind: Deployment\n\
                 \x20 metadata:\n\
                 \x20   name: one\n\
                 - kind: Service\n\
                 \x20 metadata:\n\
                 \x20   name: two\n";
    let stream = parse_stream(input).expect("parse");
    let doc = &stream.documents()[0];
    let roots = manifest_roots(doc);
    assert_eq!(roots.len(), 2);
    let kinds: Vec<_> = roots
        .iter()
        .map(|p| manifest_at(doc, p).and_then(|m| m.kind()))
        .collect();
    assert_eq!(kinds, vec![Some("Deployment"), Some("Service")]);
}

#[test]
fn test_kind_suffixed_list_expansion() {
    let input = "kind: DeploymentList\n\
                 items:\n\
                 - kind: Deployment\n\
                 \x20 metadata:\n\
                 \x20   name: inner\n";
    let stream = parse_stream(input).expect("parse");
    let doc = &stream.documents()[0];
    let roots = manifest_roots(doc);
    assert_eq!(roots.len(), 1);
    let m = manifest_at(doc, &roots[0]).expect("manifest");
    assert_eq!(m.name(), Some("inner"));
}

#[test]
fn test_nested_list_expansion() {
    let input = "kind: List\n\
                 items:\n\
                 - kind: List\n\
                 \x20 items:\n\
                 \x20 - kind: ConfigMap\n\
                 \x20   metadata:\n\
                 \x20     name: deep\n";
    let stream = parse_stream(input).expect("parse");
    let doc = &stream.documents()[0];
    let roots = manifest_roots(doc);
    assert_eq!(roots.len(), 1);
    let m = manifest_at(doc, &roots[0]).expect("manifest");
    assert_eq!(m.kind(), Some("ConfigMap"));
    assert_eq!(m.name(), Some("deep"));
}

#[test]
fn test_list_without_items_is_a_plain_resource() {
    let stream = parse_stream("kind: List\nmetadata:\n  name: x\n").expect("parse");
    let doc = &stream.documents()[0];
    let roots = manifest_roots(doc);
    assert_eq!(roots.len(), 1);
    assert!(roots[0].is_empty());
}

#[test]
fn test_items_alone_do_not_make_a_list() {
    let stream = parse_stream("kind: Inventory\nitems:\n- a\n- b\n").expect("parse");
    let doc = &stream.documents()[0];
    let roots = manifest_roots(doc);
    assert_eq!(roots.len(), 1);
    assert!(roots[0].is_empty());
}
