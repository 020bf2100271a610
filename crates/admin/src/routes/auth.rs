//! Authentication route handlers.
//!
//! The operator pastes an opaque auth key; it is stored as the bearer token
//! and nothing else is checked.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use super::{ToastView, take_toasts};
use crate::error::AppError;
use crate::middleware::LOGIN_PATH;
use crate::services::toast::{Notifier, Toast};
use crate::state::AppState;

/// Toast shown after a successful login.
pub const LOGIN_SUCCEEDED_MESSAGE: &str = "Successfully logged in";

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
struct LoginPageTemplate {
    error: Option<String>,
    toasts: Vec<ToastView>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub key: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

/// GET /
async fn index() -> Redirect {
    Redirect::to(LOGIN_PATH)
}

/// Render the login page.
///
/// GET /login
async fn login_page(State(state): State<AppState>) -> impl IntoResponse {
    LoginPageTemplate {
        error: None,
        toasts: take_toasts(state.toasts()),
    }
}

/// Store the submitted key as the bearer token.
///
/// POST /login
#[instrument(skip_all)]
async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    if form.key.trim().is_empty() {
        let page = LoginPageTemplate {
            error: Some("Auth key is required".to_string()),
            toasts: take_toasts(state.toasts()),
        };
        return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
    }

    match state.auth().set_token(form.key) {
        Ok(()) => {
            tracing::info!("Operator logged in");
            state.toasts().notify(Toast::success(LOGIN_SUCCEEDED_MESSAGE));
        }
        Err(e) => {
            // The token is still held in memory for this run.
            tracing::error!(error = %e, "Failed to persist auth key");
            state
                .toasts()
                .notify(Toast::error("Logged in, but the auth key could not be saved"));
        }
    }

    Redirect::to("/products").into_response()
}

/// Forget the token.
///
/// POST /logout
#[instrument(skip_all)]
async fn logout(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.auth().logout()?;
    tracing::info!("Operator logged out");
    Ok(Redirect::to(LOGIN_PATH))
}
