//! Login state commands.

use catalog_console_admin::state::AppState;

use super::CliError;

/// Store `key` as the bearer token.
///
/// # Errors
///
/// Returns an error for a blank key or when the token file cannot be written.
pub fn login(state: &AppState, key: &str) -> Result<(), CliError> {
    state.auth().set_token(key)?;
    tracing::info!(path = %state.config().token_path.display(), "Auth key stored");
    Ok(())
}

/// Forget the stored token.
///
/// # Errors
///
/// Returns an error if the token file cannot be removed.
pub fn logout(state: &AppState) -> Result<(), CliError> {
    state.auth().logout()?;
    tracing::info!("Logged out");
    Ok(())
}

/// Print login state and the configured API.
#[allow(clippy::print_stdout)]
pub fn status(state: &AppState) {
    let logged_in = if state.auth().is_authenticated() {
        "yes"
    } else {
        "no"
    };
    println!("Product API: {}", state.config().api.base_url);
    println!("Token file:  {}", state.config().token_path.display());
    println!("Logged in:   {logged_in}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use catalog_console_admin::config::{
        ConsoleConfig, LogFormat, ProductApiConfig, parse_base_url,
    };
    use catalog_console_admin::services::auth::{AuthStore, MemoryTokenStorage};
    use secrecy::ExposeSecret;

    fn memory_state() -> AppState {
        let config = ConsoleConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            api: ProductApiConfig {
                base_url: parse_base_url("http://127.0.0.1:9").unwrap(),
                timeout: Duration::from_secs(1),
            },
            token_path: PathBuf::from("unused"),
            page_size: 10,
            log_format: LogFormat::Text,
            sentry: None,
        };
        AppState::with_auth(config, AuthStore::new(MemoryTokenStorage::new())).unwrap()
    }

    #[test]
    fn test_login_stores_key_as_given() {
        let state = memory_state();
        login(&state, "\tkey with spaces ").unwrap();

        let token = state.auth().token().unwrap();
        assert_eq!(token.expose_secret(), "\tkey with spaces ");
        assert!(state.auth().is_authenticated());
    }

    #[test]
    fn test_login_rejects_blank_key() {
        let state = memory_state();
        assert!(matches!(login(&state, "   "), Err(CliError::Auth(_))));
        assert!(!state.auth().is_authenticated());
    }

    #[test]
    fn test_logout_forgets_key() {
        let state = memory_state();
        login(&state, "secret-key").unwrap();
        logout(&state).unwrap();
        assert!(state.auth().token().is_none());
    }
}
