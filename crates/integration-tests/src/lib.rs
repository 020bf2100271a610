//! Integration test support for the catalog console.
//!
//! [`MockProductApi`] serves the product REST API from memory on an
//! ephemeral port and requires a bearer token, so the real reqwest client,
//! data source, list view and router can be exercised end to end.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p catalog-console-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use catalog_console_admin::config::{ConsoleConfig, LogFormat, ProductApiConfig, parse_base_url};
use catalog_console_admin::services::auth::{AuthStore, MemoryTokenStorage};
use catalog_console_admin::state::AppState;
use catalog_console_core::{Product, ProductId};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Token the mock API accepts.
pub const TEST_TOKEN: &str = "integration-test-key";

#[derive(Debug, Default)]
struct MockState {
    products: BTreeMap<i64, Product>,
    fail_create: bool,
    requests: Vec<String>,
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory product API on a local port.
pub struct MockProductApi {
    base_url: String,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockProductApi {
    /// Start the mock with `products`; products without an ID get one.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(products: Vec<Product>) -> Self {
        let mut state = MockState::default();
        for product in products {
            insert(&mut state, product);
        }
        let state = Arc::new(Mutex::new(state));

        let router = Router::new()
            .route("/products", get(list).post(create))
            .route("/products/{id}", axum::routing::put(update).delete(remove))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock product API");
        let addr = listener.local_addr().expect("Mock API has no local address");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            base_url: format!("http://{addr}/"),
            state,
            handle,
        }
    }

    /// Base URL for `PRODUCT_API_URL`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Products currently stored, by ID.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        lock(&self.state).products.values().cloned().collect()
    }

    /// Requests received so far, as `METHOD /path`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    /// Make every create request fail with 500.
    pub fn fail_creates(&self) {
        lock(&self.state).fail_create = true;
    }

    /// Console state wired to this API, logged in when `token` is given.
    ///
    /// # Panics
    ///
    /// Panics if the state cannot be built.
    #[must_use]
    pub fn console_state(&self, token: Option<&str>) -> AppState {
        let storage = token.map_or_else(MemoryTokenStorage::new, MemoryTokenStorage::with_token);
        let config = ConsoleConfig {
            host: "127.0.0.1".parse().expect("valid host"),
            port: 0,
            api: ProductApiConfig {
                base_url: parse_base_url(&self.base_url).expect("valid mock URL"),
                timeout: Duration::from_secs(5),
            },
            token_path: PathBuf::from("unused"),
            page_size: 10,
            log_format: LogFormat::Text,
            sentry: None,
        };
        AppState::with_auth(config, AuthStore::new(storage)).expect("Failed to build console state")
    }
}

impl Drop for MockProductApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve the console router on a local port and return its base URL.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn spawn_console(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind console");
    let addr = listener.local_addr().expect("Console has no local address");
    let app = catalog_console_admin::app(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// HTTP client that reports redirects instead of following them.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

fn insert(state: &mut MockState, mut product: Product) -> Product {
    let id = product.id.map_or_else(
        || state.products.keys().next_back().map_or(1, |last| last + 1),
        |id| id.as_i64(),
    );
    product.id = Some(ProductId::new(id));
    state.products.insert(id, product.clone());
    product
}

fn authorize(state: &Shared, headers: &HeaderMap, request: String) -> Result<(), Response> {
    lock(state).requests.push(request);
    let expected = format!("Bearer {TEST_TOKEN}");
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((StatusCode::UNAUTHORIZED, "missing or invalid token").into_response()),
    }
}

async fn list(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(rejection) = authorize(&state, &headers, "GET /products".to_string()) {
        return rejection;
    }
    let products: Vec<Product> = lock(&state).products.values().cloned().collect();
    Json(products).into_response()
}

async fn create(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(product): Json<Product>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers, "POST /products".to_string()) {
        return rejection;
    }
    let mut guard = lock(&state);
    if guard.fail_create {
        return (StatusCode::INTERNAL_SERVER_ERROR, "create failed").into_response();
    }
    let created = insert(&mut guard, Product { id: None, ..product });
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(product): Json<Product>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers, format!("PUT /products/{id}")) {
        return rejection;
    }
    let mut guard = lock(&state);
    if !guard.products.contains_key(&id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let updated = insert(
        &mut guard,
        Product {
            id: Some(ProductId::new(id)),
            ..product
        },
    );
    Json(updated).into_response()
}

async fn remove(State(state): State<Shared>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    if let Err(rejection) = authorize(&state, &headers, format!("DELETE /products/{id}")) {
        return rejection;
    }
    match lock(&state).products.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
