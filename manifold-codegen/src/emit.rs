//! Java source emission.
//!
//! Generated classes are self-contained: they use fully qualified JDK names
//! and only refer to other generated types of the same package, so the
//! package declaration is the only package-dependent line.

use crate::ast::{FieldDef, TypeDef, TypeKind, TypeRef};
use crate::error::CodegenError;
use crate::schema::{Operation, Schema};
use manifold_descriptor::is_java_keyword;
use std::collections::BTreeMap;

/// First line of every generated file; stale-file cleanup only touches files
/// that start with it.
pub const GENERATED_MARKER: &str = "// Generated by manifold. Do not edit.";

const MAP_TYPE: &str = "java.util.Map<String, Object>";

/// Methods every Java class inherits from `java.lang.Object`.
const OBJECT_METHODS: &[&str] = &[
    "clone", "equals", "finalize", "getClass", "hashCode", "notify", "notifyAll", "toString",
    "wait",
];

#[derive(Debug, Clone, Copy)]
pub struct EmitOptions<'a> {
    pub package_name: &'a str,
    pub generate_client: bool,
    pub generate_data_types: bool,
    /// GraphQL scalar name -> Java type.
    pub type_mapping: &'a BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name inside the package directory, e.g. `AssetGraphQLQuery.java`.
    pub file_name: String,
    pub contents: String,
}

/// Emit every file for `schema`, sorted by file name.
///
/// Fails when two schema elements map to the same file name. Names are
/// compared case-insensitively so the output also fits case-folding file
/// systems.
pub fn emit(schema: &Schema, options: &EmitOptions<'_>) -> Result<Vec<GeneratedFile>, CodegenError> {
    let types = JavaTypes { schema, options };
    // (origin, file); origin names the schema element in errors.
    let mut files: Vec<(String, GeneratedFile)> = Vec::new();

    if options.generate_client {
        for op in schema.operations() {
            let origin = format!("{} `{}`", op.kind.keyword(), op.field.name);
            files.push((origin, client_class(&types, op)));
        }
    }
    if options.generate_data_types {
        for t in schema.types().filter(|t| !schema.is_root(&t.name)) {
            let file = match t.kind {
                TypeKind::Object | TypeKind::Input => data_class(&types, t),
                TypeKind::Enum => enum_class(&types, t),
                TypeKind::Interface | TypeKind::Union | TypeKind::Scalar => continue,
            };
            files.push((format!("type `{}`", t.name), file));
        }
    }

    files.sort_by(|a, b| a.1.file_name.cmp(&b.1.file_name));
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for (origin, file) in &files {
        if let Some(first) = seen.insert(file.file_name.to_lowercase(), origin) {
            return Err(CodegenError::invalid(format!(
                "{first} and {origin} both generate {}",
                file.file_name
            )));
        }
    }
    Ok(files.into_iter().map(|(_, file)| file).collect())
}

/// `offices` + query -> `OfficesGraphQLQuery`.
pub fn client_class_name(op: &Operation<'_>) -> String {
    format!("{}GraphQL{}", pascal(&op.field.name), op.kind.type_name())
}

fn pascal(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn java_ident(name: &str) -> String {
    if is_java_keyword(name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Method name that neither is a keyword nor clashes with an `Object` method.
fn java_method(name: &str) -> String {
    if OBJECT_METHODS.contains(&name) {
        format!("{name}_")
    } else {
        java_ident(name)
    }
}

fn java_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

struct JavaTypes<'a> {
    schema: &'a Schema,
    options: &'a EmitOptions<'a>,
}

impl JavaTypes<'_> {
    fn of(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::NonNull(inner) => self.of(inner),
            TypeRef::List(inner) => format!("java.util.List<{}>", self.of(inner)),
            TypeRef::Named(name) => self.named(name),
        }
    }

    fn named(&self, name: &str) -> String {
        if let Some(mapped) = self.options.type_mapping.get(name) {
            return mapped.clone();
        }
        match name {
            "ID" | "String" => return "String".to_string(),
            "Int" => return "Integer".to_string(),
            "Float" => return "Double".to_string(),
            "Boolean" => return "Boolean".to_string(),
            _ => {}
        }
        let data_types = self.options.generate_data_types;
        match self.schema.kind_of(name) {
            Some(TypeKind::Object | TypeKind::Input | TypeKind::Enum) if data_types => {
                name.to_string()
            }
            Some(TypeKind::Enum) => "String".to_string(),
            Some(TypeKind::Input) => MAP_TYPE.to_string(),
            _ => "Object".to_string(),
        }
    }
}

#[derive(Default)]
struct JavaWriter {
    out: String,
}

impl JavaWriter {
    fn header(package: &str) -> Self {
        let mut w = JavaWriter::default();
        w.line(0, GENERATED_MARKER);
        w.line(0, &format!("package {package};"));
        w.blank();
        w
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn javadoc(&mut self, depth: usize, lines: &[String]) {
        if lines.is_empty() {
            return;
        }
        self.line(depth, "/**");
        for l in lines {
            let l = l.replace("*/", "*&#47;");
            if l.is_empty() {
                self.line(depth, " *");
            } else {
                self.line(depth, &format!(" * {l}"));
            }
        }
        self.line(depth, " */");
    }

    fn finish(self, file_name: String) -> GeneratedFile {
        GeneratedFile {
            file_name,
            contents: self.out,
        }
    }
}

fn description_lines(description: Option<&str>) -> Vec<String> {
    description
        .map(|d| d.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Leaf fields without arguments; `__typename` when there are none.
fn selection_set(schema: &Schema, type_name: &str) -> Option<String> {
    if schema.is_leaf(type_name) {
        return None;
    }
    let fields: Vec<&str> = match schema.get(type_name) {
        Some(t) if matches!(t.kind, TypeKind::Object | TypeKind::Interface) => t
            .fields
            .iter()
            .filter(|f| f.arguments.is_empty() && schema.is_leaf(f.ty.base()))
            .map(|f| f.name.as_str())
            .collect(),
        _ => Vec::new(),
    };
    if fields.is_empty() {
        Some("__typename".to_string())
    } else {
        Some(fields.join(" "))
    }
}

/// The operation document sent by the generated client.
pub fn operation_document(schema: &Schema, op: &Operation<'_>) -> String {
    let field = op.field;
    let mut doc = format!("{} {}", op.kind.keyword(), field.name);
    if !field.arguments.is_empty() {
        let vars: Vec<String> = field
            .arguments
            .iter()
            .map(|a| match &a.default {
                Some(d) => format!("${}: {} = {d}", a.name, a.ty),
                None => format!("${}: {}", a.name, a.ty),
            })
            .collect();
        doc.push_str(&format!("({})", vars.join(", ")));
    }
    doc.push_str(" { ");
    doc.push_str(&field.name);
    if !field.arguments.is_empty() {
        let args: Vec<String> = field
            .arguments
            .iter()
            .map(|a| format!("{0}: ${0}", a.name))
            .collect();
        doc.push_str(&format!("({})", args.join(", ")));
    }
    if let Some(selection) = selection_set(schema, field.ty.base()) {
        doc.push_str(&format!(" {{ {selection} }}"));
    }
    doc.push_str(" }");
    doc
}

fn client_class(types: &JavaTypes<'_>, op: Operation<'_>) -> GeneratedFile {
    let class = client_class_name(&op);
    let field = op.field;
    let mut w = JavaWriter::header(types.options.package_name);

    let mut doc = description_lines(field.description.as_deref());
    if !doc.is_empty() {
        doc.push(String::new());
    }
    doc.push(format!(
        "<p>Client request for the {{@code {}}} {}. Returns {{@code {}}}.",
        field.name,
        op.kind.keyword(),
        field.ty
    ));
    w.javadoc(0, &doc);
    w.line(0, &format!("public final class {class} {{"));
    w.line(1, &format!("public static final String OPERATION_NAME = {};", java_string(&field.name)));
    w.blank();
    w.line(1, &format!("public static final String OPERATION_TYPE = {};", java_string(op.kind.keyword())));
    w.blank();
    w.line(
        1,
        &format!(
            "public static final String DOCUMENT = {};",
            java_string(&operation_document(types.schema, &op))
        ),
    );
    w.blank();
    w.line(1, &format!("private final {MAP_TYPE} variables = new java.util.LinkedHashMap<>();"));
    w.blank();
    w.line(1, &format!("public {class}() {{"));
    w.line(1, "}");

    for arg in &field.arguments {
        w.blank();
        let mut doc = description_lines(arg.description.as_deref());
        if let Some(default) = &arg.default {
            doc.push(format!("Defaults to {{@code {default}}} when unset."));
        }
        w.javadoc(1, &doc);
        let ident = java_ident(&arg.name);
        let method = java_method(&arg.name);
        w.line(1, &format!("public {class} {method}({} {ident}) {{", types.of(&arg.ty)));
        w.line(2, &format!("this.variables.put({}, {ident});", java_string(&arg.name)));
        w.line(2, "return this;");
        w.line(1, "}");
    }

    for (getter, constant) in [
        ("getOperationName", "OPERATION_NAME"),
        ("getOperationType", "OPERATION_TYPE"),
        ("getQuery", "DOCUMENT"),
    ] {
        w.blank();
        w.line(1, &format!("public String {getter}() {{"));
        w.line(2, &format!("return {constant};"));
        w.line(1, "}");
    }

    w.blank();
    w.line(1, &format!("public {MAP_TYPE} getVariables() {{"));
    w.line(2, "return java.util.Collections.unmodifiableMap(variables);");
    w.line(1, "}");
    w.line(0, "}");
    w.finish(format!("{class}.java"))
}

fn data_class(types: &JavaTypes<'_>, t: &TypeDef) -> GeneratedFile {
    let mut w = JavaWriter::header(types.options.package_name);
    w.javadoc(0, &description_lines(t.description.as_deref()));
    w.line(0, &format!("public class {} {{", t.name));

    let fields: Vec<(&FieldDef, String, String)> = t
        .fields
        .iter()
        .map(|f| (f, java_ident(&f.name), types.of(&f.ty)))
        .collect();
    for (f, ident, ty) in &fields {
        w.javadoc(1, &description_lines(f.description.as_deref()));
        w.line(1, &format!("private {ty} {ident};"));
        w.blank();
    }
    w.line(1, &format!("public {}() {{", t.name));
    w.line(1, "}");

    for (f, ident, ty) in &fields {
        let suffix = pascal(&f.name);
        let getter = java_method(&format!("get{suffix}"));
        w.blank();
        w.line(1, &format!("public {ty} {getter}() {{"));
        w.line(2, &format!("return {ident};"));
        w.line(1, "}");
        w.blank();
        w.line(1, &format!("public void set{suffix}({ty} {ident}) {{"));
        w.line(2, &format!("this.{ident} = {ident};"));
        w.line(1, "}");
    }
    w.line(0, "}");
    w.finish(format!("{}.java", t.name))
}

fn enum_class(types: &JavaTypes<'_>, t: &TypeDef) -> GeneratedFile {
    let mut w = JavaWriter::header(types.options.package_name);
    w.javadoc(0, &description_lines(t.description.as_deref()));
    w.line(0, &format!("public enum {} {{", t.name));
    let last = t.values.len().saturating_sub(1);
    for (i, v) in t.values.iter().enumerate() {
        w.javadoc(1, &description_lines(v.description.as_deref()));
        let sep = if i == last { "" } else { "," };
        w.line(1, &format!("{}{sep}", java_ident(&v.name)));
    }
    w.line(0, "}");
    w.finish(format!("{}.java", t.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_source;
    use camino::Utf8Path;
    use pretty_assertions::assert_eq;

    const SDL: &str = r#"
        type Office { id: ID! name: String! assets: [Asset!]! }
        type Asset { id: ID! serialNumber: String office: Office }
        input AssetFilter { officeId: ID }
        enum Role { ADMIN USER }
        type Query {
          "All offices."
          offices: [Office!]!
          assets(filter: AssetFilter, limit: Int = 50): [Asset!]!
          role: Role
        }
        type Mutation { deleteAsset(id: ID!): Boolean! }
    "#;

    fn schema() -> Schema {
        let doc = parse_source(Utf8Path::new("s.graphqls"), SDL).unwrap();
        Schema::build(&[doc]).unwrap()
    }

    fn options(mapping: &BTreeMap<String, String>, data_types: bool) -> EmitOptions<'_> {
        EmitOptions {
            package_name: "com.example.codegen",
            generate_client: true,
            generate_data_types: data_types,
            type_mapping: mapping,
        }
    }

    fn names(files: &[GeneratedFile]) -> Vec<&str> {
        files.iter().map(|f| f.file_name.as_str()).collect()
    }

    #[test]
    fn one_client_file_per_operation() {
        let mapping = BTreeMap::new();
        let files = emit(&schema(), &options(&mapping, false)).unwrap();
        assert_eq!(
            names(&files),
            vec![
                "AssetsGraphQLQuery.java",
                "DeleteAssetGraphQLMutation.java",
                "OfficesGraphQLQuery.java",
                "RoleGraphQLQuery.java",
            ]
        );
    }

    #[test]
    fn documents_select_leaf_fields_and_declare_variables() {
        let schema = schema();
        let ops = schema.operations();
        let docs: Vec<String> = ops.iter().map(|op| operation_document(&schema, op)).collect();
        assert_eq!(
            docs,
            vec![
                "query offices { offices { id name } }",
                "query assets($filter: AssetFilter, $limit: Int = 50) { assets(filter: $filter, limit: $limit) { id serialNumber } }",
                "query role { role }",
                "mutation deleteAsset($id: ID!) { deleteAsset(id: $id) }",
            ]
        );
    }

    #[test]
    fn client_class_shape() {
        let mapping = BTreeMap::new();
        let files = emit(&schema(), &options(&mapping, false)).unwrap();
        let assets = &files[0].contents;
        assert!(assets.starts_with(&format!("{GENERATED_MARKER}\npackage com.example.codegen;\n")));
        assert!(assets.contains("public final class AssetsGraphQLQuery {"));
        assert!(assets.contains(
            "public AssetsGraphQLQuery filter(java.util.Map<String, Object> filter) {"
        ));
        assert!(assets.contains("public AssetsGraphQLQuery limit(Integer limit) {"));
        assert!(assets.contains("Defaults to {@code 50} when unset."));
        assert!(assets.contains("public static final String OPERATION_TYPE = \"query\";"));
        let offices = &files[2].contents;
        assert!(offices.contains(" * All offices.\n"));
    }

    #[test]
    fn data_types_add_classes_and_typed_setters() {
        let mapping = BTreeMap::new();
        let files = emit(&schema(), &options(&mapping, true)).unwrap();
        for expected in ["Asset.java", "AssetFilter.java", "Office.java", "Role.java"] {
            assert!(names(&files).contains(&expected), "{expected}");
        }
        assert!(!names(&files).contains(&"Query.java"));
        let assets = files
            .iter()
            .find(|f| f.file_name == "AssetsGraphQLQuery.java")
            .unwrap();
        assert!(assets.contents.contains("filter(AssetFilter filter)"));
        let role = files.iter().find(|f| f.file_name == "Role.java").unwrap();
        assert!(role.contents.contains("public enum Role {\n    ADMIN,\n    USER\n}\n"));
        let office = files.iter().find(|f| f.file_name == "Office.java").unwrap();
        assert!(office.contents.contains("private java.util.List<Asset> assets;"));
        assert!(office.contents.contains("public void setName(String name) {"));
    }

    #[test]
    fn type_mapping_overrides_scalars() {
        let doc = parse_source(
            Utf8Path::new("s.graphqls"),
            "scalar DateTime type Query { now: DateTime since(at: DateTime): Int }",
        )
        .unwrap();
        let schema = Schema::build(&[doc]).unwrap();
        let mut mapping = BTreeMap::new();
        mapping.insert("DateTime".to_string(), "java.time.OffsetDateTime".to_string());
        let files = emit(&schema, &options(&mapping, false)).unwrap();
        let since = files
            .iter()
            .find(|f| f.file_name == "SinceGraphQLQuery.java")
            .unwrap();
        assert!(since.contents.contains("at(java.time.OffsetDateTime at)"));
    }

    #[test]
    fn client_generation_can_be_disabled() {
        let mapping = BTreeMap::new();
        let mut opts = options(&mapping, false);
        opts.generate_client = false;
        assert!(emit(&schema(), &opts).unwrap().is_empty());
    }

    #[test]
    fn keywords_are_escaped() {
        let doc = parse_source(
            Utf8Path::new("s.graphqls"),
            "type Query { find(class: String): Int }",
        )
        .unwrap();
        let schema = Schema::build(&[doc]).unwrap();
        let mapping = BTreeMap::new();
        let files = emit(&schema, &options(&mapping, false)).unwrap();
        assert!(files[0].contents.contains("public FindGraphQLQuery class_(String class_) {"));
        assert!(files[0].contents.contains("this.variables.put(\"class\", class_);"));
    }

    fn schema_of(sdl: &str) -> Schema {
        let doc = parse_source(Utf8Path::new("s.graphqls"), sdl).unwrap();
        Schema::build(&[doc]).unwrap()
    }

    #[test]
    fn operations_differing_in_case_are_rejected() {
        let mapping = BTreeMap::new();
        let err = emit(&schema_of("type Query { asset: Int Asset: Int }"), &options(&mapping, false))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid schema: query `asset` and query `Asset` both generate AssetGraphQLQuery.java"
        );
    }

    #[test]
    fn data_type_clashing_with_a_client_class_is_rejected() {
        let mapping = BTreeMap::new();
        let err = emit(
            &schema_of("type OfficesGraphQLQuery { id: ID } type Query { offices: Int }"),
            &options(&mapping, true),
        )
        .unwrap_err();
        assert!(matches!(err, CodegenError::InvalidSchema { .. }), "{err}");
    }

    #[test]
    fn object_methods_are_not_shadowed() {
        let mapping = BTreeMap::new();
        let schema = schema_of(
            "union Any = Thing type Thing { class: String } type Query { find(equals: Any): Int }",
        );
        let files = emit(&schema, &options(&mapping, true)).unwrap();
        let thing = files.iter().find(|f| f.file_name == "Thing.java").unwrap();
        assert!(thing.contents.contains("public String getClass_() {"), "{}", thing.contents);
        assert!(thing.contents.contains("public void setClass(String class_) {"));
        let find = files
            .iter()
            .find(|f| f.file_name == "FindGraphQLQuery.java")
            .unwrap();
        assert!(find.contents.contains("public FindGraphQLQuery equals_(Object equals) {"));
    }
}
