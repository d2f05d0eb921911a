use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("no schema files found at {}", join_paths(paths))]
    SchemaNotFound { paths: Vec<Utf8PathBuf> },

    #[error("{path}:{line}:{column}: {message}")]
    SchemaParse {
        path: Utf8PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

fn join_paths(paths: &[Utf8PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl CodegenError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CodegenError::InvalidSchema {
            message: message.into(),
        }
    }
}
