//! Auth store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while storing or clearing the bearer token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Tokens must contain at least one non-whitespace character.
    #[error("auth key must not be empty")]
    EmptyToken,

    /// Durable token storage could not be read or written.
    #[error("token storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AuthError {
    pub(crate) fn storage(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.to_path_buf(),
            source,
        }
    }
}
