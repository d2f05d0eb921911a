//! GraphQL client code generation.
//!
//! Schema files are discovered under the task's schema paths, parsed into a
//! small SDL syntax tree, merged and validated, then emitted as Java client
//! request classes. Nothing here writes to disk: [`generate`] returns the
//! planned files and [`check_output`] compares them with what is present.

pub mod ast;
mod discover;
mod emit;
mod error;
mod generate;
mod lexer;
mod parser;
mod schema;

pub use discover::{SCHEMA_EXTENSIONS, discover_schema_files};
pub use emit::{
    EmitOptions, GENERATED_MARKER, GeneratedFile, client_class_name, emit, operation_document,
};
pub use error::CodegenError;
pub use generate::{
    Drift, DriftKind, GeneratedOutput, check_output, generate, load_schema, package_dir,
    render_drift, stale_files,
};
pub use schema::{BUILTIN_SCALARS, Operation, Schema, SourceDocument, parse_source};
