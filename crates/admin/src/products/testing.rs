//! In-memory product API used by unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use catalog_console_core::{Product, ProductId};
use reqwest::StatusCode;
use rust_decimal::Decimal;

use crate::product_api::{ProductApi, ProductApiError};

/// Build a product with an ID and default profile.
pub fn product(id: i64, sku: &str, name: &str, cost: i64) -> Product {
    Product::new(sku, name, Decimal::from(cost))
        .with_description("test product")
        .with_id(ProductId::new(id))
}

#[derive(Debug, Default)]
struct FakeState {
    products: Vec<Product>,
    fail_get: bool,
    fail_create: bool,
    fail_update: bool,
    fail_delete: bool,
    get_delay: Option<Duration>,
    calls: Vec<String>,
}

/// Shared-state fake; clones observe the same products and call log.
#[derive(Debug, Clone, Default)]
pub struct FakeProductApi {
    state: Arc<Mutex<FakeState>>,
}

fn server_error() -> ProductApiError {
    ProductApiError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".to_string(),
    }
}

impl FakeProductApi {
    pub fn with_products(products: Vec<Product>) -> Self {
        let api = Self::default();
        api.set_products(products);
        api
    }

    pub fn set_products(&self, products: Vec<Product>) {
        self.state.lock().unwrap().products = products;
    }

    pub fn products(&self) -> Vec<Product> {
        self.state.lock().unwrap().products.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn fail_next_get(&self) {
        self.state.lock().unwrap().fail_get = true;
    }

    pub fn fail_next_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn fail_next_update(&self) {
        self.state.lock().unwrap().fail_update = true;
    }

    pub fn fail_next_delete(&self) {
        self.state.lock().unwrap().fail_delete = true;
    }

    pub fn delay_next_get(&self, delay: Duration) {
        self.state.lock().unwrap().get_delay = Some(delay);
    }
}

impl ProductApi for FakeProductApi {
    async fn get_products(&self) -> Result<Vec<Product>, ProductApiError> {
        let (delay, fail) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push("get".to_string());
            (state.get_delay.take(), std::mem::take(&mut state.fail_get))
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(server_error());
        }
        Ok(self.products())
    }

    async fn create_product(&self, product: &Product) -> Result<Product, ProductApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create {}", product.sku));
        if std::mem::take(&mut state.fail_create) {
            return Err(server_error());
        }

        let next_id = state
            .products
            .iter()
            .filter_map(|p| p.id.map(|id| id.as_i64()))
            .max()
            .unwrap_or(0)
            + 1;
        let created = product.clone().with_id(ProductId::new(next_id));
        state.products.push(created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        id: ProductId,
        product: &Product,
    ) -> Result<Product, ProductApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("update {id}"));
        if std::mem::take(&mut state.fail_update) {
            return Err(server_error());
        }

        let updated = product.clone().with_id(id);
        match state.products.iter_mut().find(|p| p.id == Some(id)) {
            Some(existing) => *existing = updated.clone(),
            None => {
                return Err(ProductApiError::Status {
                    status: StatusCode::NOT_FOUND,
                    body: String::new(),
                });
            }
        }
        Ok(updated)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), ProductApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete {id}"));
        if std::mem::take(&mut state.fail_delete) {
            return Err(server_error());
        }
        state.products.retain(|p| p.id != Some(id));
        Ok(())
    }
}
