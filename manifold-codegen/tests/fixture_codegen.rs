//! Client generation for the `auth-service` fixture schema.

use camino::{Utf8Path, Utf8PathBuf};
use manifold_codegen::{CodegenError, GENERATED_MARKER, check_output, generate};
use manifold_descriptor::{CodegenTask, load_from_root};
use pretty_assertions::assert_eq;

fn fixture_root() -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/fixtures/auth-service")
}

fn fixture_task() -> CodegenTask {
    load_from_root(&fixture_root())
        .expect("load fixture descriptor")
        .codegen
        .expect("fixture declares a codegen task")
}

#[test]
fn one_client_class_per_operation() {
    let output = generate(&fixture_root(), &fixture_task()).unwrap();
    let names: Vec<&str> = output.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "AssetGraphQLQuery.java",
            "AssetsGraphQLQuery.java",
            "DeleteAssetGraphQLMutation.java",
            "OfficesGraphQLQuery.java",
        ]
    );
    assert!(
        output
            .package_dir
            .ends_with("build/generated/sources/graphql/com/spindox/ciams/codegen")
    );
    assert_eq!(output.schema_files.len(), 1);
}

#[test]
fn generated_sources_carry_marker_package_and_document() {
    let output = generate(&fixture_root(), &fixture_task()).unwrap();
    let assets = output
        .files
        .iter()
        .find(|f| f.file_name == "AssetsGraphQLQuery.java")
        .unwrap();
    let mut lines = assets.contents.lines();
    assert_eq!(lines.next(), Some(GENERATED_MARKER));
    assert_eq!(lines.next(), Some("package com.spindox.ciams.codegen;"));
    assert!(assets.contents.contains(
        "query assets($filter: AssetFilter, $limit: Int = 50) { assets(filter: $filter, limit: $limit) { id serialNumber acquisitionDate } }"
    ));
    assert!(assets.contents.contains("public final class AssetsGraphQLQuery {"));
}

#[test]
fn package_change_only_touches_the_package_line() {
    let before = generate(&fixture_root(), &fixture_task()).unwrap();
    let mut task = fixture_task();
    task.package_name = "org.example.client".to_string();
    let after = generate(&fixture_root(), &task).unwrap();

    assert_eq!(before.files.len(), after.files.len());
    for (old, new) in before.files.iter().zip(&after.files) {
        assert_eq!(old.file_name, new.file_name);
        let changed: Vec<(&str, &str)> = old
            .contents
            .lines()
            .zip(new.contents.lines())
            .filter(|(a, b)| a != b)
            .collect();
        assert_eq!(
            changed,
            vec![("package com.spindox.ciams.codegen;", "package org.example.client;")]
        );
    }
}

#[test]
fn fixture_has_not_been_generated_yet() {
    let output = generate(&fixture_root(), &fixture_task()).unwrap();
    let drift = check_output(&output).unwrap();
    assert_eq!(drift.len(), 4);
}

#[test]
fn missing_schema_directory_is_reported() {
    let mut task = fixture_task();
    task.schema_paths = vec![Utf8PathBuf::from("src/main/resources/nope")];
    let err = generate(&fixture_root(), &task).unwrap_err();
    assert!(matches!(err, CodegenError::SchemaNotFound { .. }), "{err}");
}
