//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::ConsoleConfig;
use crate::error::AppError;
use crate::product_api::ProductApiClient;
use crate::products::ProductListView;
use crate::services::auth::{AuthStore, FileTokenStorage};
use crate::services::drafts::EditorDrafts;
use crate::services::toast::ToastQueue;

/// The product table as served by the console.
pub type ConsoleProductView = ProductListView<ProductApiClient, ToastQueue>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ConsoleConfig,
    auth: AuthStore,
    api: ProductApiClient,
    products: ConsoleProductView,
    toasts: ToastQueue,
    drafts: EditorDrafts,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("auth", &self.inner.auth)
            .field("api", &self.inner.api)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the state, persisting the token at `config.token_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ConsoleConfig) -> Result<Self, AppError> {
        let auth = AuthStore::new(FileTokenStorage::new(config.token_path.clone()));
        Self::with_auth(config, auth)
    }

    /// Build the state around an existing auth store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_auth(config: ConsoleConfig, auth: AuthStore) -> Result<Self, AppError> {
        let api = ProductApiClient::with_bearer_auth(&config.api, auth.clone())?;
        let toasts = ToastQueue::new();
        let products = ProductListView::new(api.clone(), toasts.clone(), config.page_size);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                auth,
                api,
                products,
                toasts,
                drafts: EditorDrafts::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    #[must_use]
    pub fn api(&self) -> &ProductApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn products(&self) -> &ConsoleProductView {
        &self.inner.products
    }

    #[must_use]
    pub fn toasts(&self) -> &ToastQueue {
        &self.inner.toasts
    }

    #[must_use]
    pub fn drafts(&self) -> &EditorDrafts {
        &self.inner.drafts
    }
}

impl FromRef<AppState> for AuthStore {
    fn from_ref(state: &AppState) -> Self {
        state.inner.auth.clone()
    }
}
