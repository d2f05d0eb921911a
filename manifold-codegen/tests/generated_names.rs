//! Schemas whose names or descriptions stress the Java emitter.

use camino::Utf8PathBuf;
use manifold_codegen::{CodegenError, GeneratedOutput, generate};
use manifold_descriptor::CodegenTask;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn task() -> CodegenTask {
    CodegenTask {
        schema_paths: vec![Utf8PathBuf::from("graphql")],
        package_name: "com.example.client".to_string(),
        generate_client: true,
        generate_data_types: false,
        output_dir: Utf8PathBuf::from("generated"),
        type_mapping: BTreeMap::new(),
    }
}

fn generate_from(sdl: &str) -> Result<GeneratedOutput, CodegenError> {
    let temp = TempDir::new().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    std::fs::create_dir_all(root.join("graphql")).unwrap();
    std::fs::write(root.join("graphql/api.graphqls"), sdl).unwrap();
    generate(&root, &task())
}

fn contents<'a>(output: &'a GeneratedOutput, file_name: &str) -> &'a str {
    &output
        .files
        .iter()
        .find(|f| f.file_name == file_name)
        .unwrap_or_else(|| panic!("{file_name} not generated"))
        .contents
}

#[test]
fn block_description_with_non_breaking_space_is_kept() {
    let sdl = "type Query {\n  \"\"\"\n  a\n \u{a0}\n  \"\"\"\n  asset: Int\n}\n";
    let output = generate_from(sdl).unwrap();
    let asset = contents(&output, "AssetGraphQLQuery.java");
    assert!(asset.contains(" *  a\n"), "{asset}");
    assert!(asset.contains(" * \u{a0}\n"), "{asset}");
}

#[test]
fn operations_mapping_to_one_file_are_rejected() {
    let err = generate_from("type Query { asset: Int Asset: Int }").unwrap_err();
    match err {
        CodegenError::InvalidSchema { message } => {
            assert!(message.contains("query `asset`"), "{message}");
            assert!(message.contains("query `Asset`"), "{message}");
            assert!(message.contains("AssetGraphQLQuery.java"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn query_and_mutation_of_the_same_name_do_not_collide() {
    let output =
        generate_from("type Query { asset: Int } type Mutation { asset(id: ID!): Int }").unwrap();
    let names: Vec<&str> = output.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["AssetGraphQLMutation.java", "AssetGraphQLQuery.java"]);
}

#[test]
fn argument_named_like_the_variables_field() {
    let output = generate_from("type Query { find(variables: String): Int }").unwrap();
    let find = contents(&output, "FindGraphQLQuery.java");
    assert!(find.contains("public FindGraphQLQuery variables(String variables) {"), "{find}");
    assert!(find.contains("this.variables.put(\"variables\", variables);"), "{find}");
    assert!(!find.contains("        variables.put("), "{find}");
}
