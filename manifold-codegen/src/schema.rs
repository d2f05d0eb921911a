//! Merged, validated view over all schema documents.

use crate::ast::{Definition, Document, FieldDef, OperationKind, TypeDef, TypeKind, TypeRef};
use crate::error::CodegenError;
use crate::parser::parse_document;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub const BUILTIN_SCALARS: [&str; 5] = ["ID", "String", "Int", "Float", "Boolean"];

/// A parsed schema file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: Utf8PathBuf,
    pub document: Document,
}

/// Parse `text`, attributing errors to `path`.
pub fn parse_source(path: &Utf8Path, text: &str) -> Result<SourceDocument, CodegenError> {
    let document = parse_document(text).map_err(|e| CodegenError::SchemaParse {
        path: path.to_path_buf(),
        line: e.line,
        column: e.column,
        message: e.message,
    })?;
    Ok(SourceDocument {
        path: path.to_path_buf(),
        document,
    })
}

/// A top-level operation: one field of a root type.
#[derive(Debug, Clone, Copy)]
pub struct Operation<'a> {
    pub kind: OperationKind,
    pub field: &'a FieldDef,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: BTreeMap<String, TypeDef>,
    roots: BTreeMap<OperationKind, String>,
}

impl Schema {
    /// Merge documents, apply extensions, and check that every reference resolves.
    pub fn build(sources: &[SourceDocument]) -> Result<Self, CodegenError> {
        let mut types: BTreeMap<String, TypeDef> = BTreeMap::new();
        let mut origins: BTreeMap<String, String> = BTreeMap::new();
        let mut extensions: Vec<(&Utf8Path, &TypeDef)> = Vec::new();
        let mut roots: BTreeMap<OperationKind, String> = BTreeMap::new();
        let mut schema_seen: Option<&Utf8Path> = None;

        for source in sources {
            for def in &source.document.definitions {
                match def {
                    Definition::Schema {
                        operations,
                        extension,
                    } => {
                        if !extension {
                            if let Some(first) = schema_seen {
                                return Err(CodegenError::invalid(format!(
                                    "schema definition appears in both {first} and {}",
                                    source.path
                                )));
                            }
                            schema_seen = Some(source.path.as_path());
                        }
                        for (kind, name) in operations {
                            if roots.insert(*kind, name.clone()).is_some() {
                                return Err(CodegenError::invalid(format!(
                                    "{} root type is declared more than once",
                                    kind.keyword()
                                )));
                            }
                        }
                    }
                    Definition::Type(t) if t.extension => {
                        extensions.push((source.path.as_path(), t));
                    }
                    Definition::Type(t) => {
                        let here = format!("{}:{}", source.path, t.line);
                        if BUILTIN_SCALARS.contains(&t.name.as_str()) {
                            return Err(CodegenError::invalid(format!(
                                "{here}: built-in scalar '{}' cannot be redefined",
                                t.name
                            )));
                        }
                        if let Some(first) = origins.get(&t.name) {
                            return Err(CodegenError::invalid(format!(
                                "type '{}' is defined at {first} and {here}",
                                t.name
                            )));
                        }
                        origins.insert(t.name.clone(), here);
                        types.insert(t.name.clone(), t.clone());
                    }
                }
            }
        }

        for (path, ext) in extensions {
            let Some(base) = types.get_mut(&ext.name) else {
                return Err(CodegenError::invalid(format!(
                    "{path}:{}: cannot extend unknown type '{}'",
                    ext.line, ext.name
                )));
            };
            if base.kind != ext.kind {
                return Err(CodegenError::invalid(format!(
                    "{path}:{}: '{}' is a {}, not a {}",
                    ext.line,
                    ext.name,
                    base.kind.keyword(),
                    ext.kind.keyword()
                )));
            }
            base.implements.extend(ext.implements.iter().cloned());
            base.fields.extend(ext.fields.iter().cloned());
            base.values.extend(ext.values.iter().cloned());
            base.members.extend(ext.members.iter().cloned());
        }

        if schema_seen.is_none() && roots.is_empty() {
            for kind in OperationKind::ALL {
                if types.contains_key(kind.type_name()) {
                    roots.insert(kind, kind.type_name().to_string());
                }
            }
        }

        let schema = Schema { types, roots };
        schema.validate()?;
        debug!(
            types = schema.types.len(),
            operations = schema.operations().len(),
            "schema built"
        );
        Ok(schema)
    }

    fn validate(&self) -> Result<(), CodegenError> {
        for (kind, name) in &self.roots {
            match self.types.get(name) {
                Some(t) if t.kind == TypeKind::Object => {}
                Some(t) => {
                    return Err(CodegenError::invalid(format!(
                        "{} root type '{name}' must be an object type, found {}",
                        kind.keyword(),
                        t.kind.keyword()
                    )));
                }
                None => {
                    return Err(CodegenError::invalid(format!(
                        "{} root type '{name}' is not defined",
                        kind.keyword()
                    )));
                }
            }
        }

        for t in self.types.values() {
            let mut names = BTreeSet::new();
            for f in &t.fields {
                if !names.insert(f.name.as_str()) {
                    return Err(CodegenError::invalid(format!(
                        "field '{}.{}' is defined more than once",
                        t.name, f.name
                    )));
                }
                self.check_ref(&t.name, &f.name, &f.ty)?;
                for arg in &f.arguments {
                    self.check_ref(&t.name, &format!("{}({})", f.name, arg.name), &arg.ty)?;
                    self.check_input(&t.name, &arg.name, &arg.ty)?;
                }
                if t.kind == TypeKind::Input {
                    self.check_input(&t.name, &f.name, &f.ty)?;
                }
            }

            let mut values = BTreeSet::new();
            for v in &t.values {
                if !values.insert(v.name.as_str()) {
                    return Err(CodegenError::invalid(format!(
                        "enum value '{}.{}' is defined more than once",
                        t.name, v.name
                    )));
                }
            }

            for iface in &t.implements {
                if self.kind_of(iface) != Some(TypeKind::Interface) {
                    return Err(CodegenError::invalid(format!(
                        "'{}' implements '{iface}', which is not an interface",
                        t.name
                    )));
                }
            }
            for member in &t.members {
                if self.kind_of(member) != Some(TypeKind::Object) {
                    return Err(CodegenError::invalid(format!(
                        "union '{}' member '{member}' is not an object type",
                        t.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_ref(&self, owner: &str, field: &str, ty: &TypeRef) -> Result<(), CodegenError> {
        let base = ty.base();
        if BUILTIN_SCALARS.contains(&base) || self.types.contains_key(base) {
            Ok(())
        } else {
            Err(CodegenError::invalid(format!(
                "'{owner}.{field}' refers to unknown type '{base}'"
            )))
        }
    }

    fn check_input(&self, owner: &str, field: &str, ty: &TypeRef) -> Result<(), CodegenError> {
        match self.kind_of(ty.base()) {
            Some(TypeKind::Object | TypeKind::Interface | TypeKind::Union) => {
                Err(CodegenError::invalid(format!(
                    "'{owner}.{field}' must have an input type, found '{}'",
                    ty.base()
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Kind of a named type; built-in scalars report [`TypeKind::Scalar`].
    pub fn kind_of(&self, name: &str) -> Option<TypeKind> {
        if BUILTIN_SCALARS.contains(&name) {
            return Some(TypeKind::Scalar);
        }
        self.types.get(name).map(|t| t.kind)
    }

    /// Whether values of `name` are leaves (scalars and enums).
    pub fn is_leaf(&self, name: &str) -> bool {
        matches!(self.kind_of(name), Some(TypeKind::Scalar | TypeKind::Enum))
    }

    pub fn root_name(&self, kind: OperationKind) -> Option<&str> {
        self.roots.get(&kind).map(String::as_str)
    }

    pub fn is_root(&self, name: &str) -> bool {
        self.roots.values().any(|r| r == name)
    }

    /// Every top-level operation, by kind and then in declaration order.
    pub fn operations(&self) -> Vec<Operation<'_>> {
        let mut out = Vec::new();
        for (kind, name) in &self.roots {
            if let Some(root) = self.types.get(name) {
                out.extend(root.fields.iter().map(|field| Operation { kind: *kind, field }));
            }
        }
        out
    }

    /// Named types, sorted by name.
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(files: &[(&str, &str)]) -> Result<Schema, CodegenError> {
        let sources: Vec<SourceDocument> = files
            .iter()
            .map(|(path, text)| parse_source(Utf8Path::new(path), text).unwrap())
            .collect();
        Schema::build(&sources)
    }

    fn op_names(schema: &Schema) -> Vec<String> {
        schema
            .operations()
            .iter()
            .map(|o| format!("{}.{}", o.kind.keyword(), o.field.name))
            .collect()
    }

    #[test]
    fn conventional_root_names() {
        let schema = build(&[(
            "a.graphqls",
            "type Query { a: Int b: Int } type Mutation { c: Int }",
        )])
        .unwrap();
        assert_eq!(op_names(&schema), vec!["query.a", "query.b", "mutation.c"]);
    }

    #[test]
    fn schema_block_overrides_conventional_names() {
        let schema = build(&[(
            "a.graphqls",
            "schema { query: Root } type Root { a: Int } type Query { ignored: Int }",
        )])
        .unwrap();
        assert_eq!(op_names(&schema), vec!["query.a"]);
        assert!(!schema.is_root("Query"));
    }

    #[test]
    fn extensions_across_files_contribute_operations() {
        let schema = build(&[
            ("a.graphqls", "type Query { a: Int }"),
            ("b.graphqls", "extend type Query { b: String }"),
        ])
        .unwrap();
        assert_eq!(op_names(&schema), vec!["query.a", "query.b"]);
    }

    #[test]
    fn rejects_duplicates_and_unknown_references() {
        let err = build(&[("a.graphqls", "type A { x: Int } type A { y: Int }")]).unwrap_err();
        assert!(err.to_string().contains("type 'A' is defined at a.graphqls:1"), "{err}");

        let err = build(&[("a.graphqls", "type Query { a: Missing }")]).unwrap_err();
        assert!(err.to_string().contains("unknown type 'Missing'"), "{err}");

        let err = build(&[("a.graphqls", "type Query { a: Int a: Int }")]).unwrap_err();
        assert!(err.to_string().contains("more than once"), "{err}");

        let err = build(&[("a.graphqls", "extend type Query { a: Int }")]).unwrap_err();
        assert!(err.to_string().contains("cannot extend unknown type"), "{err}");
    }

    #[test]
    fn rejects_output_types_in_argument_position() {
        let err = build(&[(
            "a.graphqls",
            "type Office { id: ID } type Query { a(o: Office): Int }",
        )])
        .unwrap_err();
        assert!(err.to_string().contains("must have an input type"), "{err}");
    }

    #[test]
    fn rejects_missing_declared_root() {
        let err = build(&[("a.graphqls", "schema { query: Nope } type Query { a: Int }")]).unwrap_err();
        assert!(err.to_string().contains("'Nope' is not defined"), "{err}");
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = parse_source(Utf8Path::new("dir/bad.graphqls"), "type {").unwrap_err();
        assert_eq!(err.to_string(), "dir/bad.graphqls:1:6: expected a name, found '{'");
    }
}
