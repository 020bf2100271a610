//! Durable storage backends for the bearer token.
//!
//! A backend holds a single raw token string. Absence of a token means the
//! operator is logged out.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};

use super::AuthError;

/// Synchronous, last-write-wins storage for one token.
pub trait TokenStorage: Send + Sync {
    /// Read the stored token, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backend cannot be read.
    fn load(&self) -> Result<Option<SecretString>, AuthError>;

    /// Replace the stored token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backend cannot be written.
    fn save(&self, token: &SecretString) -> Result<(), AuthError>;

    /// Remove the stored token. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backend cannot be written.
    fn clear(&self) -> Result<(), AuthError>;
}

/// Token persisted as the sole contents of a file.
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<SecretString>, AuthError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim_end_matches(['\r', '\n']);
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(SecretString::from(token.to_string())))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::storage(&self.path, e)),
        }
    }

    fn save(&self, token: &SecretString) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AuthError::storage(parent, e))?;
        }
        std::fs::write(&self.path, token.expose_secret())
            .map_err(|e| AuthError::storage(&self.path, e))?;

        // Owner-only: the file holds a credential.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| AuthError::storage(&self.path, e))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::storage(&self.path, e)),
        }
    }
}

/// In-process storage, used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `token`, as if persisted by an earlier run.
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<SecretString>, AuthError> {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
        Ok(token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::from(t.to_string())))
    }

    fn save(&self, token: &SecretString) -> Result<(), AuthError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            Some(token.expose_secret().to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
