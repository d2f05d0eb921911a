//! The build descriptor (`manifold.toml`).
//!
//! A descriptor declares the project's dependencies by scope, pins the
//! language runtime, and configures the GraphQL code-generation task and the
//! test engine. It is parsed once per invocation and never mutated.

mod error;
mod load;
mod model;
mod validate;

pub use error::DescriptorError;
pub use load::{DESCRIPTOR_FILE_NAME, discover, load_descriptor, load_from_root, parse_descriptor};
pub use model::{
    CodegenTask, CompileTask, ConfigurationDecl, Dependency, Descriptor, ProjectSection,
    RepositoryDecl, TestEngineKind, TestTask, ToolchainPin,
};
pub use validate::{is_java_keyword, is_valid_package_name, validate};
