//! Route guard.
//!
//! Provides an extractor that only lets a request through when the auth
//! store holds a bearer token. The decision is local: the token is never
//! checked against the product API.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};

use crate::services::auth::AuthStore;

/// Path of the public login page.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires a stored bearer token.
///
/// If no token is present, returns a redirect to the login page for HTML
/// requests, or 401 Unauthorized for API requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireToken(_): RequireToken) -> impl IntoResponse {
///     "only with a token"
/// }
/// ```
pub struct RequireToken(pub SecretString);

/// Error returned when a protected route is requested without a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for TokenRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Decide whether a request to `path` may proceed with `token`.
///
/// # Errors
///
/// Returns the rejection to send when the token is missing or blank.
pub fn guard(token: Option<SecretString>, path: &str) -> Result<SecretString, TokenRejection> {
    match token {
        Some(token) if !token.expose_secret().trim().is_empty() => Ok(token),
        _ => {
            tracing::debug!(path, "Protected route requested without a token");
            if path.starts_with("/api/") {
                Err(TokenRejection::Unauthorized)
            } else {
                Err(TokenRejection::RedirectToLogin)
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireToken
where
    AuthStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = TokenRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthStore::from_ref(state);
        guard(auth.token(), parts.uri.path()).map(Self)
    }
}
