use pretty_assertions::assert_eq;

use crate::edit::{AnnotationEdit, Edit, EditError, ImageEdit, PathEdit};
use crate::manifest::Target;
use crate::roundtrip::parse_stream;
use crate::stream::{apply_to_yaml, run, set_paths, update_annotations, update_image};
use crate::workload::CHART_IMAGE_CONTAINER;

const DEPLOYMENT: &str = "# Frontend deployment\n\
                          apiVersion: apps/v1\n\
                          kind: Deployment\n\
                          metadata:\n\
                          \x20 name: web\n\
                          \x20 labels:\n\
                          \x20   app: web # selector\n\
                          spec:\n\
                          \x20 replicas: 2\n\
                          \x20 template:\n\
                          \x20   metadata:\n\
                          \x20     labels:\n\
                          \x20       app: web\n\
                          \x20   spec:\n\
                          \x20     containers:\n\
                          \x20     - name: app\n\
                          \x20       image: repo/app:v1 # pinned\n\
                          \x20       ports:\n\
                          \x20       - containerPort: 80\n";

fn web_image(image: &str) -> ImageEdit {
    ImageEdit {
        target: Target::new("Deployment", "default", "web"),
        container: "app".to_string(),
        image: image.to_string(),
    }
}

fn changed_lines(before: &str, after: &str) -> usize {
    let left: Vec<&str> = before.lines().collect();
    let right: Vec<&str> = after.lines().collect();
    assert_eq!(left.len(), right.len(), "line count must not change");
    left.iter().zip(right.iter()).filter(|(l, r)| l != r).count()
}

#[test]
fn test_noop_reproduces_input() {
    let input = "# deploy both services\n\
                 ---\n\
                 apiVersion: v1\n\
                 kind: Service\n\
                 metadata:\n\
                 \x20 name: svc\n\
                 \x20 labels: {app: svc, tier: backend}\n\
                 spec:\n\
                 \x20 ports:\n\
                 \x20 - port: 80 # http\n\
                 \x20   targetPort: 8080\n\
                 \x20 selector:\n\
                 \x20   app: svc\n\
                 \n\
                 ---\n\
                 # second document\n\
                 kind: ConfigMap\n\
                 metadata:\n\
                 \x20 name: conf\n\
                 data:\n\
                 \x20 config.yaml: |\n\
                 \x20   nested: yaml\n\
                 \x20   not: parsed\n\
                 \x20 flag: \"on\"\n";
    let output = apply_to_yaml(|_| Ok(()), input).unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_noop_without_trailing_newline() {
    let input = "kind: ConfigMap\nmetadata:\n  name: conf";
    let output = apply_to_yaml(|_| Ok(()), input).unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_image_update_changes_exactly_one_line() {
    let output = update_image(&web_image("repo/app:v2"), DEPLOYMENT).unwrap();
    assert_eq!(changed_lines(DEPLOYMENT, &output), 1);
    assert!(output.contains("       image: repo/app:v2 # pinned\n"));
    assert!(!output.contains("repo/app:v1"));
}

#[test]
fn test_image_update_inside_list() {
    let input = "apiVersion: v1\n\
                 kind: List\n\
                 items:\n\
                 - apiVersion: apps/v1\n\
                 \x20 kind: Deployment\n\
                 \x20 metadata:\n\
                 \x20   name: web\n\
                 \x20 spec:\n\
                 \x20   template:\n\
                 \x20     spec:\n\
                 \x20       containers:\n\
                 \x20       - name: app\n\
                 \x20         image: repo/app:v1\n\
                 - apiVersion: v1\n\
                 \x20 kind: Service\n\
                 \x20 metadata:\n\
                 \x20   name: web\n";
    let output = update_image(&web_image("repo/app:v2"), input).unwrap();
    assert_eq!(changed_lines(input, &output), 1);
    assert!(output.contains("          image: repo/app:v2\n"));
    // The Service item shares the name but not the kind.
    assert!(output.contains("  kind: Service\n"));
}

#[test]
fn test_matching_resource_without_container_is_skipped() {
    let input = "kind: Deployment\n\
                 metadata:\n\
                 \x20 name: web\n\
                 spec:\n\
                 \x20 template:\n\
                 \x20   spec:\n\
                 \x20     containers:\n\
                 \x20     - name: helper\n\
                 \x20       image: repo/helper:v1\n\
                 ---\n\
                 kind: Deployment\n\
                 metadata:\n\
                 \x20 name: web\n\
                 spec:\n\
                 \x20 template:\n\
                 \x20   spec:\n\
                 \x20     containers:\n\
                 \x20     - name: app\n\
                 \x20       image: repo/app:v1\n";
    let output = update_image(&web_image("repo/app:v2"), input).unwrap();
    assert!(output.contains("image: repo/helper:v1"));
    assert!(output.contains("image: repo/app:v2"));
    assert_eq!(changed_lines(input, &output), 1);
}

#[test]
fn test_image_update_not_found() {
    let err = update_image(&web_image("repo/app:v2"), "kind: Service\nmetadata:\n  name: web\n")
        .unwrap_err();
    assert!(matches!(err, EditError::NotFound { .. }));
    assert_eq!(err.to_string(), "no matching container found");
}

#[test]
fn test_chart_image_update_preserves_repository_form() {
    let input = "apiVersion: flux.weave.works/v1beta1\n\
                 kind: HelmRelease\n\
                 metadata:\n\
                 \x20 name: app\n\
                 \x20 namespace: prod\n\
                 spec:\n\
                 \x20 releaseName: app\n\
                 \x20 values:\n\
                 \x20   image:\n\
                 \x20     repository: repo/app\n\
                 \x20     tag: v1\n\
                 \x20   replicas: 2\n";
    let edit = ImageEdit {
        target: Target::new("HelmRelease", "prod", "app"),
        container: CHART_IMAGE_CONTAINER.to_string(),
        image: "repo/app:v2".to_string(),
    };
    let output = update_image(&edit, input).unwrap();
    assert_eq!(changed_lines(input, &output), 1);
    assert!(output.contains("    repository: repo/app\n"));
    assert!(output.contains("    tag: v2\n"));
}

#[test]
fn test_chart_numeric_looking_tag_stays_a_string() {
    let input = "kind: HelmRelease\n\
                 metadata:\n\
                 \x20 name: app\n\
                 spec:\n\
                 \x20 values:\n\
                 \x20   image:\n\
                 \x20     repository: repo/app\n\
                 \x20     tag: v1\n";
    let edit = ImageEdit {
        target: Target::new("HelmRelease", "default", "app"),
        container: CHART_IMAGE_CONTAINER.to_string(),
        image: "repo/app:1.10".to_string(),
    };
    let output = update_image(&edit, input).unwrap();
    assert_eq!(changed_lines(input, &output), 1);
    assert!(output.contains("     tag: '1.10'\n"));
    let reread = parse_stream(&output).unwrap();
    assert_eq!(
        reread.documents()[0].to_value()["spec"]["values"]["image"]["tag"],
        serde_yaml::Value::String("1.10".to_string())
    );
}

#[test]
fn test_chart_tag_sibling_update() {
    let input = "apiVersion: helm.fluxcd.io/v1\n\
                 kind: HelmRelease\n\
                 metadata:\n\
                 \x20 name: app\n\
                 spec:\n\
                 \x20 values:\n\
                 \x20   image: repo/app\n\
                 \x20   tag: v1\n\
                 \x20   replicas: 2\n";
    let edit = ImageEdit {
        target: Target::new("HelmRelease", "default", "app"),
        container: CHART_IMAGE_CONTAINER.to_string(),
        image: "repo/app:v2".to_string(),
    };
    let output = update_image(&edit, input).unwrap();
    assert_eq!(changed_lines(input, &output), 1);
    assert!(output.contains("   image: repo/app\n"));
    assert!(output.contains("   tag: v2\n"));
}

#[test]
fn test_chart_plain_image_update() {
    let input = "kind: HelmRelease\n\
                 metadata:\n\
                 \x20 name: app\n\
                 spec:\n\
                 \x20 values:\n\
                 \x20   image: repo/app:v1 # pinned\n";
    let edit = ImageEdit {
        target: Target::new("HelmRelease", "default", "app"),
        container: CHART_IMAGE_CONTAINER.to_string(),
        image: "repo/app:v2".to_string(),
    };
    let output = update_image(&edit, input).unwrap();
    assert_eq!(changed_lines(input, &output), 1);
    assert!(output.contains("   image: repo/app:v2 # pinned\n"));
}

#[test]
fn test_chart_untagged_image_clears_tag() {
    let input = "kind: HelmRelease\n\
                 metadata:\n\
                 \x20 name: app\n\
                 spec:\n\
                 \x20 values:\n\
                 \x20   image:\n\
                 \x20     repository: repo/app\n\
                 \x20     tag: v1\n";
    let edit = ImageEdit {
        target: Target::new("HelmRelease", "default", "app"),
        container: CHART_IMAGE_CONTAINER.to_string(),
        image: "repo/app".to_string(),
    };
    let output = update_image(&edit, input).unwrap();
    assert_eq!(changed_lines(input, &output), 1);
    assert!(output.contains("     repository: repo/app\n"));
    assert!(output.contains("     tag: ''\n"));
}

#[test]
fn test_annotate_second_document() {
    let input = "kind: Service\n\
                 metadata:\n\
                 \x20 name: web\n\
                 ---\n\
                 kind: Deployment\n\
                 metadata:\n\
                 \x20 name: web\n";
    let edit = AnnotationEdit {
        target: Target::new("Deployment", "default", "web"),
        notes: vec![("fluxcd.io/tag.app".to_string(), "semver:~1".to_string())],
    };
    let output = update_annotations(&edit, input).unwrap();
    assert_eq!(
        output,
        "kind: Service\n\
         metadata:\n\
         \x20 name: web\n\
         ---\n\
         kind: Deployment\n\
         metadata:\n\
         \x20 name: web\n\
         \x20 annotations:\n\
         \x20   fluxcd.io/tag.app: semver:~1\n"
    );
}

#[test]
fn test_annotation_round_trip_restores_input() {
    let input = "kind: Deployment\n\
                 metadata:\n\
                 \x20 name: web # production\n\
                 spec:\n\
                 \x20 replicas: 2\n";
    let target = Target::new("Deployment", "default", "web");
    let added = update_annotations(
        &AnnotationEdit {
            target: target.clone(),
            notes: vec![("team".to_string(), "core".to_string())],
        },
        input,
    )
    .unwrap();
    assert!(added.contains("annotations:"));
    let removed = update_annotations(
        &AnnotationEdit {
            target,
            notes: vec![("team".to_string(), String::new())],
        },
        &added,
    )
    .unwrap();
    assert_eq!(removed, input);
    let original = parse_stream(input).unwrap();
    let restored = parse_stream(&removed).unwrap();
    assert_eq!(
        original.documents()[0].to_value(),
        restored.documents()[0].to_value()
    );
}

#[test]
fn test_annotation_value_that_reads_as_bool_stays_a_string() {
    let input = "kind: Deployment\n\
                 metadata:\n\
                 \x20 name: web\n";
    let edit = AnnotationEdit {
        target: Target::new("Deployment", "default", "web"),
        notes: vec![("fluxcd.io/automated".to_string(), "false".to_string())],
    };
    let output = update_annotations(&edit, input).unwrap();
    assert_eq!(
        output,
        "kind: Deployment\n\
         metadata:\n\
         \x20 name: web\n\
         \x20 annotations:\n\
         \x20   fluxcd.io/automated: 'false'\n"
    );
    let reread = parse_stream(&output).unwrap();
    assert_eq!(
        reread.documents()[0].to_value()["metadata"]["annotations"]["fluxcd.io/automated"],
        serde_yaml::Value::String("false".to_string())
    );
}

#[test]
fn test_set_path_driver() {
    let input = "kind: HelmRelease\n\
                 metadata:\n\
                 \x20 name: app\n\
                 spec:\n\
                 \x20 values:\n\
                 \x20   replicas: 2\n\
                 \x20   debug: \"false\"\n";
    let edit = PathEdit {
        target: Target::new("HelmRelease", "default", "app"),
        paths: vec![
            ("spec.values.replicas".to_string(), "4".to_string()),
            ("spec.values.debug".to_string(), "true".to_string()),
        ],
    };
    let output = set_paths(&edit, input).unwrap();
    assert_eq!(changed_lines(input, &output), 2);
    assert!(output.contains("   replicas: '4'\n"));
    assert!(output.contains("   debug: \"true\"\n"));
}

#[test]
fn test_set_path_unresolvable_is_terminal() {
    let edit = PathEdit {
        target: Target::new("Deployment", "default", "web"),
        paths: vec![("spec.template".to_string(), "x".to_string())],
    };
    let err = set_paths(&edit, DEPLOYMENT).unwrap_err();
    assert!(matches!(err, EditError::UnresolvablePath { .. }));
}

#[test]
fn test_no_matching_resource() {
    let edit = AnnotationEdit {
        target: Target::new("Deployment", "prod", "web"),
        notes: vec![("team".to_string(), "core".to_string())],
    };
    let err = update_annotations(&edit, DEPLOYMENT).unwrap_err();
    assert!(matches!(err, EditError::NotFound { .. }));
    assert_eq!(err.to_string(), "no matching resource found");
}

#[test]
fn test_run_dispatches_by_edit() {
    let via_run = run(&Edit::Image(web_image("repo/app:v9")), DEPLOYMENT).unwrap();
    let direct = update_image(&web_image("repo/app:v9"), DEPLOYMENT).unwrap();
    assert_eq!(via_run, direct);
}
