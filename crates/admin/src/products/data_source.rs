//! Product list data source.
//!
//! Reduces (full product list, sort, page) to the rows a table renders. The
//! full list, the paginator and the sort header are three independent
//! triggers merged into a single recomputation stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use catalog_console_core::{Product, ProductId, project};
use futures::Stream;
use thiserror::Error;
use tokio::sync::watch;

use crate::components::{Paginator, SortHeader};
use crate::product_api::{ProductApi, ProductApiError};

/// Errors raised by the data source.
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// `connect`/`render` called before both controls were attached.
    #[error("paginator and sort must be attached to the data source before connecting")]
    ControlsNotAttached,

    /// The data source was torn down.
    #[error("data source has been disconnected")]
    Disconnected,

    /// A newer load was issued before this one completed; its result was discarded.
    #[error("product load superseded by a newer request")]
    Superseded,

    /// The product API call failed.
    #[error(transparent)]
    Api(#[from] ProductApiError),
}

/// Reactive holder of the loaded product list and loading flag.
pub struct ProductListDataSource<A> {
    api: A,
    products: watch::Sender<Arc<Vec<Product>>>,
    loading: watch::Sender<bool>,
    closed: watch::Sender<bool>,
    paginator: RwLock<Option<Paginator>>,
    sort: RwLock<Option<SortHeader>>,
    generation: AtomicU64,
}

impl<A> std::fmt::Debug for ProductListDataSource<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductListDataSource")
            .field("products", &self.products.borrow().len())
            .field("loading", &*self.loading.borrow())
            .field("closed", &*self.closed.borrow())
            .finish_non_exhaustive()
    }
}

impl<A: ProductApi> ProductListDataSource<A> {
    /// Create an empty data source with no controls attached.
    #[must_use]
    pub fn new(api: A) -> Self {
        let (products, _) = watch::channel(Arc::new(Vec::new()));
        let (loading, _) = watch::channel(false);
        let (closed, _) = watch::channel(false);

        Self {
            api,
            products,
            loading,
            closed,
            paginator: RwLock::new(None),
            sort: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// The API the list is loaded from.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Attach the page control.
    pub fn set_paginator(&self, paginator: Paginator) {
        *self.paginator.write().unwrap_or_else(PoisonError::into_inner) = Some(paginator);
    }

    /// Attach the sort control.
    pub fn set_sort(&self, sort: SortHeader) {
        *self.sort.write().unwrap_or_else(PoisonError::into_inner) = Some(sort);
    }

    fn controls(&self) -> Result<(Paginator, SortHeader), DataSourceError> {
        let paginator = self
            .paginator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let sort = self
            .sort
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match (paginator, sort) {
            (Some(paginator), Some(sort)) => Ok((paginator, sort)),
            _ => Err(DataSourceError::ControlsNotAttached),
        }
    }

    /// Stream of rendered pages.
    ///
    /// Emits the current page immediately, then again whenever the loaded
    /// list, the page or the sort changes. The stream ends on `disconnect`.
    ///
    /// # Errors
    ///
    /// Returns `DataSourceError::ControlsNotAttached` if the paginator or sort
    /// is missing, and `DataSourceError::Disconnected` after teardown.
    pub fn connect(&self) -> Result<impl Stream<Item = Vec<Product>> + Send + 'static, DataSourceError> {
        let (paginator, sort) = self.controls()?;
        if self.is_disconnected() {
            return Err(DataSourceError::Disconnected);
        }

        let mut products_rx = self.products.subscribe();
        let mut page_rx = paginator.subscribe();
        let mut sort_rx = sort.subscribe();
        let mut closed_rx = self.closed.subscribe();

        Ok(async_stream::stream! {
            loop {
                let rows = project(
                    &products_rx.borrow_and_update(),
                    *sort_rx.borrow_and_update(),
                    *page_rx.borrow_and_update(),
                );
                yield rows;

                tokio::select! {
                    biased;
                    _ = closed_rx.changed() => break,
                    changed = products_rx.changed() => if changed.is_err() { break },
                    changed = page_rx.changed() => if changed.is_err() { break },
                    changed = sort_rx.changed() => if changed.is_err() { break },
                }

                if *closed_rx.borrow() {
                    break;
                }
            }
        })
    }

    /// The rows that would currently be rendered.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ProductListDataSource::connect`].
    pub fn render(&self) -> Result<Vec<Product>, DataSourceError> {
        let (paginator, sort) = self.controls()?;
        if self.is_disconnected() {
            return Err(DataSourceError::Disconnected);
        }
        Ok(project(&self.products.borrow(), sort.sort(), paginator.page()))
    }

    /// Fetch the full list from the API and make it the rendered source.
    ///
    /// The loading flag is raised for the duration of the call and cleared
    /// on success and on failure. If another load is issued before this one
    /// completes, this result is discarded and the newer load owns the flag.
    ///
    /// # Errors
    ///
    /// Returns `DataSourceError::Api` if the request failed,
    /// `DataSourceError::Superseded` if a newer load was issued meanwhile, or
    /// `DataSourceError::Disconnected` if the source was torn down meanwhile.
    pub async fn load_products(&self) -> Result<Vec<Product>, DataSourceError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_loading(true);

        let result = self.api.get_products().await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "Discarding superseded product load");
            return Err(DataSourceError::Superseded);
        }
        if self.is_disconnected() {
            tracing::debug!(generation, "Discarding product load completed after teardown");
            return Err(DataSourceError::Disconnected);
        }
        self.set_loading(false);

        let products = result?;
        self.products.send_replace(Arc::new(products.clone()));
        Ok(products)
    }

    /// Snapshot of the full loaded list.
    #[must_use]
    pub fn data(&self) -> Arc<Vec<Product>> {
        Arc::clone(&self.products.borrow())
    }

    /// Find a loaded product by ID.
    #[must_use]
    pub fn find(&self, id: ProductId) -> Option<Product> {
        self.products
            .borrow()
            .iter()
            .find(|p| p.id == Some(id))
            .cloned()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.send_replace(loading);
    }

    /// Subscribe to the loading flag.
    #[must_use]
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Tear down: connected streams end and emit nothing further.
    pub fn disconnect(&self) {
        self.closed.send_replace(true);
    }

    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        *self.closed.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::testing::{FakeProductApi, product};
    use catalog_console_core::{Sort, SortDirection, SortField};
    use futures::StreamExt;
    use std::time::Duration;

    fn attached(api: FakeProductApi, page_size: usize) -> (ProductListDataSource<FakeProductApi>, Paginator, SortHeader) {
        let source = ProductListDataSource::new(api);
        let paginator = Paginator::new(page_size);
        let sort = SortHeader::new();
        source.set_paginator(paginator.clone());
        source.set_sort(sort.clone());
        (source, paginator, sort)
    }

    fn names(rows: &[Product]) -> Vec<String> {
        rows.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn test_connect_without_controls_fails() {
        let source = ProductListDataSource::new(FakeProductApi::default());
        assert!(matches!(
            source.connect().err(),
            Some(DataSourceError::ControlsNotAttached)
        ));

        source.set_paginator(Paginator::new(10));
        assert!(matches!(
            source.render(),
            Err(DataSourceError::ControlsNotAttached)
        ));
    }

    #[tokio::test]
    async fn test_load_products_stores_list_and_clears_loading() {
        let api = FakeProductApi::with_products(vec![product(1, "A1", "Chair", 20)]);
        let (source, _, _) = attached(api, 10);

        let loaded = source.load_products().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!source.is_loading());
        assert_eq!(names(&source.render().unwrap()), vec!["Chair"]);
    }

    #[tokio::test]
    async fn test_load_failure_clears_loading_and_keeps_previous_list() {
        let api = FakeProductApi::with_products(vec![product(1, "A1", "Chair", 20)]);
        let (source, _, _) = attached(api.clone(), 10);
        source.load_products().await.unwrap();

        api.fail_next_get();
        let err = source.load_products().await.unwrap_err();
        assert!(matches!(err, DataSourceError::Api(_)));
        assert!(!source.is_loading());
        assert_eq!(names(&source.render().unwrap()), vec!["Chair"]);
    }

    #[tokio::test]
    async fn test_stream_recomputes_on_each_trigger() {
        let api = FakeProductApi::with_products(vec![
            product(1, "D1", "Desk", 100),
            product(2, "A1", "Chair", 20),
            product(3, "L1", "Lamp", 45),
        ]);
        let (source, paginator, sort) = attached(api, 2);
        let mut rows = Box::pin(source.connect().unwrap());

        // Initial emission before anything is loaded.
        assert!(rows.next().await.unwrap().is_empty());

        source.load_products().await.unwrap();
        assert_eq!(names(&rows.next().await.unwrap()), vec!["Desk", "Chair"]);

        sort.set_sort(Sort::by(SortField::Name, SortDirection::Asc));
        assert_eq!(names(&rows.next().await.unwrap()), vec!["Chair", "Desk"]);

        paginator.set_page_index(1);
        assert_eq!(names(&rows.next().await.unwrap()), vec!["Lamp"]);
    }

    #[tokio::test]
    async fn test_disconnect_ends_stream() {
        let (source, paginator, _) = attached(FakeProductApi::default(), 10);
        let mut rows = Box::pin(source.connect().unwrap());
        assert!(rows.next().await.is_some());

        source.disconnect();
        paginator.set_page_index(3);
        assert!(rows.next().await.is_none());
        assert!(matches!(
            source.connect().err(),
            Some(DataSourceError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_load_after_disconnect_leaves_list_untouched() {
        let api = FakeProductApi::with_products(vec![product(1, "A1", "Chair", 20)]);
        let (source, _, _) = attached(api, 10);
        source.disconnect();

        assert!(matches!(
            source.load_products().await,
            Err(DataSourceError::Disconnected)
        ));
        assert!(source.data().is_empty());
    }

    #[tokio::test]
    async fn test_superseded_load_is_discarded() {
        let api = FakeProductApi::with_products(vec![product(1, "A1", "Chair", 20)]);
        api.delay_next_get(Duration::from_millis(200));
        let (source, _, _) = attached(api.clone(), 10);
        let source = Arc::new(source);

        let slow = {
            let source = Arc::clone(&source);
            tokio::spawn(async move { source.load_products().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        api.set_products(vec![product(1, "A1", "Chair", 20), product(2, "D1", "Desk", 100)]);
        let fresh = source.load_products().await.unwrap();
        assert_eq!(fresh.len(), 2);

        let stale = slow.await.unwrap();
        assert!(matches!(stale, Err(DataSourceError::Superseded)));
        assert_eq!(source.data().len(), 2);
        assert!(!source.is_loading());
    }
}
