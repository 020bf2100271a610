//! Remote product API.
//!
//! The product REST service is an external collaborator:
//!
//! ```text
//! GET    /products        - List all products
//! POST   /products        - Create a product
//! PUT    /products/{id}   - Replace a product
//! DELETE /products/{id}   - Delete a product
//! ```
//!
//! Every call carries `Authorization: Bearer <token>`, added by a
//! [`RequestAugmenter`] at send time. Each operation is a single
//! request/response: no retries, no caching.

pub mod augment;
pub mod client;

pub use augment::{BearerTokenAugmenter, RequestAugmenter};
pub use client::ProductApiClient;

use std::future::Future;

use catalog_console_core::{Product, ProductId};
use thiserror::Error;

/// Errors that can occur when calling the product API.
#[derive(Debug, Error)]
pub enum ProductApiError {
    /// Transport failure (connect, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Product API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ProductApiError {
    /// True when the API rejected the bearer token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == reqwest::StatusCode::UNAUTHORIZED)
    }
}

/// Product CRUD operations.
///
/// Implemented by [`ProductApiClient`] over HTTP, and by in-memory fakes in
/// tests.
pub trait ProductApi: Send + Sync {
    /// Fetch the full product list.
    fn get_products(&self) -> impl Future<Output = Result<Vec<Product>, ProductApiError>> + Send;

    /// Create a product; the API assigns its ID.
    fn create_product(
        &self,
        product: &Product,
    ) -> impl Future<Output = Result<Product, ProductApiError>> + Send;

    /// Replace the product with ID `id`.
    fn update_product(
        &self,
        id: ProductId,
        product: &Product,
    ) -> impl Future<Output = Result<Product, ProductApiError>> + Send;

    /// Delete the product with ID `id`.
    fn delete_product(&self, id: ProductId)
    -> impl Future<Output = Result<(), ProductApiError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ProductApiError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            body: "no such product".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Product API returned 404 Not Found: no such product"
        );
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_is_unauthorized() {
        let err = ProductApiError::Status {
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: String::new(),
        };
        assert!(err.is_unauthorized());
    }
}
