use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("no descriptor found at {path}")]
    NotFound { path: Utf8PathBuf },

    #[error("read {path}: {message}")]
    Io { path: Utf8PathBuf, message: String },

    #[error("parse {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("invalid `{key}`: {message}")]
    Invalid { key: String, message: String },
}

impl DescriptorError {
    pub(crate) fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        DescriptorError::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}
