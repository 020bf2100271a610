//! HTTP route handlers for the console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                  - Health check
//!
//! # Auth
//! GET  /                                        - Redirect to /login
//! GET  /login                                   - Login page
//! POST /login                                   - Store the auth key
//! POST /logout                                  - Forget the auth key
//!
//! # Products (guarded)
//! GET  /products                                - Product table (?sort&direction&page&size)
//! GET  /products/new                            - Open the editor in create mode
//! GET  /products/{id}                           - Open the editor in view mode
//! GET  /products/{id}/edit                      - Open the editor in edit mode
//! GET  /products/{id}/delete                    - Delete confirmation dialog
//! POST /products/{id}/delete                    - Answer the confirmation dialog
//!
//! # Editor dialogs (guarded)
//! GET  /editor/{draft}                          - Render an open editor
//! POST /editor/{draft}/fields                   - Apply field values
//! POST /editor/{draft}/properties               - Add a custom property
//! POST /editor/{draft}/properties/{key}/toggle  - Toggle inline edit of a property
//! POST /editor/{draft}/properties/{key}/value   - Commit an edited property value
//! POST /editor/{draft}/properties/{key}/remove  - Remove a custom property
//! POST /editor/{draft}/submit                   - Submit the editor
//! POST /editor/{draft}/cancel                   - Close the editor without a result
//! ```

pub mod auth;
pub mod editor;
pub mod products;

use axum::{Router, routing::get};

use crate::services::toast::{Toast, ToastQueue};
use crate::state::AppState;

/// All console routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(products::router())
        .merge(editor::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the product API.
async fn health() -> &'static str {
    "ok"
}

/// Toast view for templates.
#[derive(Debug, Clone)]
pub struct ToastView {
    pub message: String,
    pub level: &'static str,
    pub duration_ms: u128,
}

impl From<Toast> for ToastView {
    fn from(toast: Toast) -> Self {
        Self {
            duration_ms: toast.duration_ms(),
            level: toast.level.as_str(),
            message: toast.message,
        }
    }
}

/// Take the pending toasts for the page being rendered.
pub(crate) fn take_toasts(queue: &ToastQueue) -> Vec<ToastView> {
    queue.drain().into_iter().map(ToastView::from).collect()
}
