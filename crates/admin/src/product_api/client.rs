//! HTTP client for the product REST API.

use std::sync::Arc;

use catalog_console_core::{Product, ProductId};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::{BearerTokenAugmenter, ProductApi, ProductApiError, RequestAugmenter};
use crate::config::ProductApiConfig;
use crate::services::auth::AuthStore;

/// Product API client.
///
/// Every request passes through the configured [`RequestAugmenter`] right
/// before it is sent.
#[derive(Clone)]
pub struct ProductApiClient {
    inner: Arc<ProductApiClientInner>,
}

struct ProductApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    augmenter: Box<dyn RequestAugmenter>,
}

impl std::fmt::Debug for ProductApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ProductApiClient {
    /// Create a client that augments requests with `augmenter`.
    ///
    /// # Errors
    ///
    /// Returns `ProductApiError::Http` if the HTTP client cannot be built.
    pub fn new(
        config: &ProductApiConfig,
        augmenter: impl RequestAugmenter + 'static,
    ) -> Result<Self, ProductApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ProductApiClientInner {
                client,
                base_url: config.base_url.clone(),
                augmenter: Box::new(augmenter),
            }),
        })
    }

    /// Create a client that sends the auth store's bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ProductApiError::Http` if the HTTP client cannot be built.
    pub fn with_bearer_auth(
        config: &ProductApiConfig,
        auth: AuthStore,
    ) -> Result<Self, ProductApiError> {
        Self::new(config, BearerTokenAugmenter::new(auth))
    }

    /// Base URL the endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn products_url(&self) -> Result<Url, ProductApiError> {
        Ok(self.inner.base_url.join("products")?)
    }

    fn product_url(&self, id: ProductId) -> Result<Url, ProductApiError> {
        Ok(self.inner.base_url.join(&format!("products/{id}"))?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner.client.request(method, url)
    }

    /// Build, augment and send a request; non-2xx statuses become errors.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ProductApiError> {
        let request = self.inner.augmenter.augment(builder.build()?);
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.inner.client.execute(request).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%method, %url, %status, "Product API request failed");
            return Err(ProductApiError::Status { status, body });
        }

        tracing::debug!(%method, %url, %status, "Product API request succeeded");
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ProductApiError> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl ProductApi for ProductApiClient {
    #[instrument(skip(self))]
    async fn get_products(&self) -> Result<Vec<Product>, ProductApiError> {
        let url = self.products_url()?;
        let response = self.send(self.request(Method::GET, url)).await?;
        let products: Vec<Product> = Self::json(response).await?;
        tracing::debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    #[instrument(skip(self, product), fields(sku = %product.sku))]
    async fn create_product(&self, product: &Product) -> Result<Product, ProductApiError> {
        let url = self.products_url()?;
        let response = self
            .send(self.request(Method::POST, url).json(product))
            .await?;
        Self::json(response).await
    }

    #[instrument(skip(self, product), fields(product_id = %id))]
    async fn update_product(
        &self,
        id: ProductId,
        product: &Product,
    ) -> Result<Product, ProductApiError> {
        let url = self.product_url(id)?;
        let response = self
            .send(self.request(Method::PUT, url).json(product))
            .await?;
        Self::json(response).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: ProductId) -> Result<(), ProductApiError> {
        let url = self.product_url(id)?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_base_url;
    use crate::services::auth::MemoryTokenStorage;
    use std::time::Duration;

    fn client(base: &str) -> ProductApiClient {
        let config = ProductApiConfig {
            base_url: parse_base_url(base).unwrap(),
            timeout: Duration::from_secs(5),
        };
        ProductApiClient::with_bearer_auth(&config, AuthStore::new(MemoryTokenStorage::new()))
            .unwrap()
    }

    #[test]
    fn test_endpoint_urls_keep_base_path() {
        let client = client("https://api.example.com/v1");
        assert_eq!(
            client.products_url().unwrap().as_str(),
            "https://api.example.com/v1/products"
        );
        assert_eq!(
            client.product_url(ProductId::new(7)).unwrap().as_str(),
            "https://api.example.com/v1/products/7"
        );
    }

    #[tokio::test]
    async fn test_transport_error_surfaces() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let client = client("http://127.0.0.1:9");
        let err = client.get_products().await.unwrap_err();
        assert!(matches!(err, ProductApiError::Http(_)));
    }
}
