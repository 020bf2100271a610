//! Unified error handling for the console.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::product_api::ProductApiError;
use crate::products::{DataSourceError, EditorError};
use crate::services::auth::AuthError;

/// Application-level error type for the console.
#[derive(Debug, Error)]
pub enum AppError {
    /// Product API call failed.
    #[error("Product API error: {0}")]
    ProductApi(#[from] ProductApiError),

    /// Token storage failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Product table misuse or teardown.
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),

    /// Editor operation rejected.
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    /// Page rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Auth(_) | Self::DataSource(_) | Self::Template(_)
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::ProductApi(e) if e.is_unauthorized() => StatusCode::UNAUTHORIZED,
            Self::ProductApi(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(_) | Self::DataSource(_) | Self::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Editor(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() || matches!(self, Self::ProductApi(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Console request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match &self {
            _ if self.is_server_error() => "Internal server error".to_string(),
            Self::ProductApi(_) => "Product service error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 7".to_string());
        assert_eq!(err.to_string(), "Not found: product 7");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::DataSource(DataSourceError::ControlsNotAttached)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Editor(EditorError::ReadOnly)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_product_api_status_mapping() {
        let upstream = |status| {
            AppError::ProductApi(ProductApiError::Status {
                status,
                body: String::new(),
            })
        };
        assert_eq!(
            get_status(upstream(StatusCode::UNAUTHORIZED)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(upstream(StatusCode::INTERNAL_SERVER_ERROR)),
            StatusCode::BAD_GATEWAY
        );
    }
}
