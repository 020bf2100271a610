//! CLI commands.

pub mod auth;
pub mod products;

use catalog_console_admin::config::{ConfigError, ConsoleConfig};
use catalog_console_admin::error::AppError;
use catalog_console_admin::products::DataSourceError;
use catalog_console_admin::services::auth::AuthError;
use catalog_console_admin::services::toast::ToastLevel;
use catalog_console_admin::state::AppState;
use catalog_console_core::ProductId;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Console state could not be built.
    #[error("{0}")]
    App(#[from] AppError),

    /// The product list is no longer usable.
    #[error("{0}")]
    DataSource(#[from] DataSourceError),

    /// Token storage failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No product with this ID.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The product API call failed; details were reported as a toast.
    #[error("{0}")]
    Failed(&'static str),

    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the same state the web console uses.
///
/// # Errors
///
/// Returns an error if configuration is missing or the HTTP client cannot
/// be built.
pub fn load_state() -> Result<AppState, CliError> {
    let config = ConsoleConfig::from_env()?;
    Ok(AppState::new(config)?)
}

/// Report pending notifications through the log.
pub fn flush_toasts(state: &AppState) {
    for toast in state.toasts().drain() {
        match toast.level {
            ToastLevel::Success => tracing::info!("{}", toast.message),
            ToastLevel::Error => tracing::error!("{}", toast.message),
        }
    }
}
