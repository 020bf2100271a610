//! Outbound request augmentation.

use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::ExposeSecret;

use crate::services::auth::AuthStore;

/// Rewrites every outgoing request just before it is sent.
pub trait RequestAugmenter: Send + Sync {
    fn augment(&self, request: reqwest::Request) -> reqwest::Request;
}

/// Adds `Authorization: Bearer <token>`, reading the token fresh from the
/// auth store for each request.
#[derive(Debug, Clone)]
pub struct BearerTokenAugmenter {
    auth: AuthStore,
}

impl BearerTokenAugmenter {
    #[must_use]
    pub const fn new(auth: AuthStore) -> Self {
        Self { auth }
    }
}

impl RequestAugmenter for BearerTokenAugmenter {
    fn augment(&self, mut request: reqwest::Request) -> reqwest::Request {
        let Some(token) = self.auth.token() else {
            tracing::debug!(url = %request.url(), "No bearer token, sending request unauthenticated");
            return request;
        };

        match HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => {
                tracing::warn!("Bearer token is not a valid header value, sending request unauthenticated");
            }
        }

        request
    }
}
