use crate::error::DescriptorError;
use crate::model::{Descriptor, TestEngineKind};
use manifold_types::Scope;
use std::collections::{BTreeMap, BTreeSet};

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final",
    "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "null", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw",
    "throws", "transient", "true", "try", "void", "volatile", "while", "_",
];

pub fn is_java_keyword(word: &str) -> bool {
    JAVA_KEYWORDS.contains(&word)
}

/// Dotted Java package name: each segment an identifier and not a keyword.
pub fn is_valid_package_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    name.split('.').all(|segment| {
        let mut chars = segment.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        (first.is_ascii_alphabetic() || first == '_' || first == '$')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
            && !is_java_keyword(segment)
    })
}

/// Cross-field checks that serde cannot express.
pub fn validate(d: &Descriptor) -> Result<(), DescriptorError> {
    if d.toolchain.version == 0 {
        return Err(DescriptorError::invalid(
            "toolchain.version",
            "must be a positive major version",
        ));
    }
    if d.toolchain.language.trim().is_empty() {
        return Err(DescriptorError::invalid("toolchain.language", "must not be empty"));
    }
    check_command("toolchain.probe", d.toolchain.probe.as_deref())?;

    for (id, version) in &d.plugins {
        if version.trim().is_empty() {
            return Err(DescriptorError::invalid(
                format!("plugins.{id}"),
                "plugin version must not be empty",
            ));
        }
    }

    let mut names = BTreeSet::new();
    for repo in &d.repositories {
        if repo.name.trim().is_empty() {
            return Err(DescriptorError::invalid("repositories.name", "must not be empty"));
        }
        if !names.insert(repo.name.as_str()) {
            return Err(DescriptorError::invalid(
                "repositories.name",
                format!("duplicate repository '{}'", repo.name),
            ));
        }
    }

    let has_dependencies = d.dependencies.values().any(|v| !v.is_empty());
    if has_dependencies && d.repositories.is_empty() {
        return Err(DescriptorError::invalid(
            "repositories",
            "dependencies are declared but no repository is configured",
        ));
    }

    for (module, version) in &d.dependency_management {
        if version.trim().is_empty() {
            return Err(DescriptorError::invalid(
                format!("dependency_management.\"{module}\""),
                "managed version must not be empty",
            ));
        }
    }

    check_inheritance(&d.configurations_graph())?;

    if let Some(codegen) = &d.codegen {
        if !is_valid_package_name(&codegen.package_name) {
            return Err(DescriptorError::invalid(
                "codegen.package_name",
                format!("'{}' is not a valid Java package name", codegen.package_name),
            ));
        }
        if codegen.schema_paths.is_empty() {
            return Err(DescriptorError::invalid(
                "codegen.schema_paths",
                "at least one schema path is required",
            ));
        }
    }

    check_command("compile.command", d.compile.command.as_deref())?;
    check_command("test.command", d.test.command.as_deref())?;
    if d.test.engine == TestEngineKind::Command && d.test.command.is_none() {
        return Err(DescriptorError::invalid(
            "test.command",
            "the `command` engine requires an explicit command",
        ));
    }

    Ok(())
}

fn check_command(key: &str, command: Option<&[String]>) -> Result<(), DescriptorError> {
    match command {
        Some(argv) if argv.first().is_none_or(|p| p.trim().is_empty()) => Err(
            DescriptorError::invalid(key, "command must name a program"),
        ),
        _ => Ok(()),
    }
}

impl Descriptor {
    fn configurations_graph(&self) -> BTreeMap<Scope, Vec<Scope>> {
        self.configurations
            .iter()
            .map(|(scope, decl)| (*scope, decl.extends_from.clone()))
            .collect()
    }
}

fn check_inheritance(graph: &BTreeMap<Scope, Vec<Scope>>) -> Result<(), DescriptorError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        scope: Scope,
        graph: &BTreeMap<Scope, Vec<Scope>>,
        marks: &mut BTreeMap<Scope, Mark>,
        path: &mut Vec<Scope>,
    ) -> Result<(), DescriptorError> {
        match marks.get(&scope) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                path.push(scope);
                let cycle: Vec<&str> = path.iter().map(|s| s.as_str()).collect();
                return Err(DescriptorError::invalid(
                    format!("configurations.{scope}.extends_from"),
                    format!("inheritance cycle: {}", cycle.join(" -> ")),
                ));
            }
            None => {}
        }
        marks.insert(scope, Mark::Visiting);
        path.push(scope);
        for parent in graph.get(&scope).into_iter().flatten() {
            visit(*parent, graph, marks, path)?;
        }
        path.pop();
        marks.insert(scope, Mark::Done);
        Ok(())
    }

    let mut marks = BTreeMap::new();
    for scope in graph.keys() {
        visit(*scope, graph, &mut marks, &mut Vec::new())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_names() {
        assert!(is_valid_package_name("com.spindox.ciams.codegen"));
        assert!(is_valid_package_name("codegen"));
        assert!(is_valid_package_name("a_b.$c1"));
        assert!(!is_valid_package_name(""));
        assert!(!is_valid_package_name("com..x"));
        assert!(!is_valid_package_name("com.1x"));
        assert!(!is_valid_package_name("com.class.x"));
        assert!(!is_valid_package_name("com._.x"));
        assert!(is_valid_package_name("com._x"));
        assert!(!is_valid_package_name("com-spindox"));
    }

    #[test]
    fn detects_inheritance_cycle() {
        let mut graph = BTreeMap::new();
        graph.insert(Scope::CompileOnly, vec![Scope::AnnotationProcessor]);
        graph.insert(Scope::AnnotationProcessor, vec![Scope::CompileOnly]);
        let err = check_inheritance(&graph).expect_err("cycle");
        assert!(err.to_string().contains("inheritance cycle"));
    }

    #[test]
    fn accepts_chain() {
        let mut graph = BTreeMap::new();
        graph.insert(Scope::CompileOnly, vec![Scope::AnnotationProcessor]);
        graph.insert(Scope::TestImplementation, vec![Scope::CompileOnly]);
        check_inheritance(&graph).expect("no cycle");
    }
}
