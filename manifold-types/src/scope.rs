use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declaration scope of a dependency.
///
/// The names match the keys used in the `[dependencies]` table of the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    #[serde(alias = "compile")]
    Implementation,
    CompileOnly,
    AnnotationProcessor,
    DevelopmentOnly,
    TestImplementation,
    TestRuntimeOnly,
}

impl Scope {
    pub const ALL: [Scope; 6] = [
        Scope::Implementation,
        Scope::CompileOnly,
        Scope::AnnotationProcessor,
        Scope::DevelopmentOnly,
        Scope::TestImplementation,
        Scope::TestRuntimeOnly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Implementation => "implementation",
            Scope::CompileOnly => "compileOnly",
            Scope::AnnotationProcessor => "annotationProcessor",
            Scope::DevelopmentOnly => "developmentOnly",
            Scope::TestImplementation => "testImplementation",
            Scope::TestRuntimeOnly => "testRuntimeOnly",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "compile" {
            return Ok(Scope::Implementation);
        }
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| format!("unknown scope '{s}'"))
    }
}

/// A resolved classpath: the set of artifacts visible to one build phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classpath {
    Compile,
    Runtime,
    TestCompile,
    TestRuntime,
    AnnotationProcessor,
    Development,
}

impl Classpath {
    pub const ALL: [Classpath; 6] = [
        Classpath::Compile,
        Classpath::Runtime,
        Classpath::TestCompile,
        Classpath::TestRuntime,
        Classpath::AnnotationProcessor,
        Classpath::Development,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Classpath::Compile => "compile",
            Classpath::Runtime => "runtime",
            Classpath::TestCompile => "test-compile",
            Classpath::TestRuntime => "test-runtime",
            Classpath::AnnotationProcessor => "annotation-processor",
            Classpath::Development => "development",
        }
    }

    /// Scopes whose declarations feed this classpath directly, before
    /// configuration inheritance is applied.
    pub fn base_scopes(self) -> &'static [Scope] {
        match self {
            Classpath::Compile => &[Scope::Implementation, Scope::CompileOnly],
            Classpath::Runtime => &[Scope::Implementation],
            Classpath::TestCompile => &[Scope::Implementation, Scope::TestImplementation],
            Classpath::TestRuntime => &[
                Scope::Implementation,
                Scope::TestImplementation,
                Scope::TestRuntimeOnly,
            ],
            Classpath::AnnotationProcessor => &[Scope::AnnotationProcessor],
            Classpath::Development => &[Scope::Implementation, Scope::DevelopmentOnly],
        }
    }

    /// Whether runtime-scoped transitive dependencies belong on this classpath.
    pub fn includes_runtime_transitives(self) -> bool {
        matches!(
            self,
            Classpath::Runtime | Classpath::TestRuntime | Classpath::Development
        )
    }
}

impl fmt::Display for Classpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classpath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Classpath::ALL
            .into_iter()
            .find(|cp| cp.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Classpath::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown classpath '{s}' (expected one of: {})", known.join(", "))
            })
    }
}
