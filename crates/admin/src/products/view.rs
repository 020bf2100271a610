//! Product list view: wires row actions to dialogs, the product API and the
//! data source.
//!
//! Every action follows the same shape: open a dialog, and only if it
//! returns a result, raise the loading flag, call the API, then reload and
//! notify on success or clear the loading flag and notify on failure.
//! Dialogs are suspension points: an action awaits the dialog's answer.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use catalog_console_core::{Product, Sort};
use futures::Stream;

use super::data_source::{DataSourceError, ProductListDataSource};
use super::editor::{EditorOutcome, EditorRequest};
use crate::components::{Paginator, SortHeader};
use crate::product_api::ProductApi;
use crate::services::toast::{Notifier, Toast};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load products. Please try again.";
pub const DELETE_SUCCEEDED_MESSAGE: &str = "Product deleted successfully";
pub const DELETE_FAILED_MESSAGE: &str = "Error deleting product";
pub const CREATE_FAILED_MESSAGE: &str = "Error creating product";
pub const UPDATE_SUCCEEDED_MESSAGE: &str = "Product updated successfully";
pub const UPDATE_FAILED_MESSAGE: &str = "Failed to update product";

const LOAD_FAILED_TOAST_DURATION: Duration = Duration::from_secs(5);

/// Content of a yes/no confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
}

impl ConfirmRequest {
    /// Confirmation shown before deleting `product`.
    #[must_use]
    pub fn delete(product: &Product) -> Self {
        Self {
            title: "Confirm Delete".to_string(),
            message: format!("Are you sure you want to delete {}?", product.name),
        }
    }
}

/// Modal dialogs the view opens. Each call resolves when the dialog closes.
pub trait Dialogs: Send + Sync {
    /// Ask a yes/no question; `true` means confirmed.
    fn confirm(&self, request: ConfirmRequest) -> impl Future<Output = bool> + Send;

    /// Open the product editor; `None` means closed without a result.
    fn open_editor(
        &self,
        request: EditorRequest,
    ) -> impl Future<Output = Option<EditorOutcome>> + Send;
}

/// How a row action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The dialog closed without a result; nothing was done.
    Cancelled,
    Succeeded,
    /// The API call failed; the user was notified.
    Failed,
    /// The view was torn down, or a newer load took over, before completion.
    Abandoned,
}

/// The product table and its actions.
pub struct ProductListView<A, N> {
    source: ProductListDataSource<A>,
    paginator: Paginator,
    sort: SortHeader,
    notifier: N,
    error: RwLock<Option<String>>,
    destroyed: AtomicBool,
}

impl<A, N> std::fmt::Debug for ProductListView<A, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductListView")
            .field("source", &self.source)
            .field("paginator", &self.paginator)
            .field("sort", &self.sort)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl<A: ProductApi, N: Notifier> ProductListView<A, N> {
    /// Create the view with its controls attached to a fresh data source.
    #[must_use]
    pub fn new(api: A, notifier: N, page_size: usize) -> Self {
        let source = ProductListDataSource::new(api);
        let paginator = Paginator::new(page_size);
        let sort = SortHeader::new();
        source.set_paginator(paginator.clone());
        source.set_sort(sort.clone());

        Self {
            source,
            paginator,
            sort,
            notifier,
            error: RwLock::new(None),
            destroyed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn data_source(&self) -> &ProductListDataSource<A> {
        &self.source
    }

    #[must_use]
    pub const fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    #[must_use]
    pub const fn sort_header(&self) -> &SortHeader {
        &self.sort
    }

    /// Error message of the last failed load.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_error(&self, error: Option<String>) {
        *self.error.write().unwrap_or_else(PoisonError::into_inner) = error;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.source.is_loading()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// The rows currently rendered.
    ///
    /// # Errors
    ///
    /// Returns `DataSourceError::Disconnected` after [`Self::destroy`].
    pub fn rows(&self) -> Result<Vec<Product>, DataSourceError> {
        self.source.render()
    }

    /// Live stream of rendered rows.
    ///
    /// # Errors
    ///
    /// Returns `DataSourceError::Disconnected` after [`Self::destroy`].
    pub fn connect(&self) -> Result<impl Stream<Item = Vec<Product>> + Send + 'static, DataSourceError> {
        self.source.connect()
    }

    /// Change the sort; the page index returns to the first page.
    pub fn sort_by(&self, sort: Sort) {
        self.sort.set_sort(sort);
        self.paginator.set_page_index(0);
    }

    /// Tear down: later completions neither mutate state nor notify.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.source.disconnect();
        tracing::debug!("Product list view destroyed");
    }

    /// Load the full list and size the paginator to it.
    pub async fn load_products(&self) -> ActionOutcome {
        if self.is_destroyed() {
            return ActionOutcome::Abandoned;
        }
        self.set_error(None);

        let result = self.source.load_products().await;
        if self.is_destroyed() {
            return ActionOutcome::Abandoned;
        }

        match result {
            Ok(products) => {
                self.paginator.set_length(products.len());
                ActionOutcome::Succeeded
            }
            Err(DataSourceError::Superseded | DataSourceError::Disconnected) => {
                ActionOutcome::Abandoned
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load products");
                self.set_error(Some(LOAD_FAILED_MESSAGE.to_string()));
                self.notifier.notify(
                    Toast::error(LOAD_FAILED_MESSAGE).with_duration(LOAD_FAILED_TOAST_DURATION),
                );
                ActionOutcome::Failed
            }
        }
    }

    /// Confirm, then delete `product`.
    #[tracing::instrument(skip_all, fields(product_id = ?product.id))]
    pub async fn confirm_delete(&self, product: &Product, dialogs: &impl Dialogs) -> ActionOutcome {
        let confirmed = dialogs.confirm(ConfirmRequest::delete(product)).await;
        if self.is_destroyed() {
            return ActionOutcome::Abandoned;
        }
        let (true, Some(id)) = (confirmed, product.id) else {
            return ActionOutcome::Cancelled;
        };

        self.source.set_loading(true);
        let result = self.source.api().delete_product(id).await;
        if self.is_destroyed() {
            return ActionOutcome::Abandoned;
        }

        match result {
            Ok(()) => {
                tracing::info!(product_id = %id, "Product deleted");
                self.load_products().await;
                self.notifier.notify(Toast::success(DELETE_SUCCEEDED_MESSAGE));
                ActionOutcome::Succeeded
            }
            Err(e) => {
                tracing::error!(product_id = %id, error = %e, "Failed to delete product");
                self.source.set_loading(false);
                self.notifier.notify(Toast::error(DELETE_FAILED_MESSAGE));
                ActionOutcome::Failed
            }
        }
    }

    /// Open the editor in create mode and create the submitted product.
    #[tracing::instrument(skip_all)]
    pub async fn open_create_dialog(&self, dialogs: &impl Dialogs) -> ActionOutcome {
        let outcome = dialogs.open_editor(EditorRequest::Create).await;
        if self.is_destroyed() {
            return ActionOutcome::Abandoned;
        }
        let Some(outcome) = outcome else {
            return ActionOutcome::Cancelled;
        };

        self.source.set_loading(true);
        let result = self.source.api().create_product(&outcome.product).await;
        if self.is_destroyed() {
            return ActionOutcome::Abandoned;
        }

        match result {
            Ok(created) => {
                tracing::info!(product_id = ?created.id, sku = %created.sku, "Product created");
                self.load_products().await;
                ActionOutcome::Succeeded
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create product");
                self.notifier.notify(Toast::error(CREATE_FAILED_MESSAGE));
                self.source.set_loading(false);
                ActionOutcome::Failed
            }
        }
    }

    /// Open the editor read-only. A result, which view mode does not
    /// normally produce, triggers a reload.
    #[tracing::instrument(skip_all, fields(product_id = ?product.id))]
    pub async fn view_product(&self, product: &Product, dialogs: &impl Dialogs) -> ActionOutcome {
        let outcome = dialogs.open_editor(EditorRequest::View(product.clone())).await;
        if self.is_destroyed() {
            return ActionOutcome::Abandoned;
        }
        if outcome.is_none() {
            return ActionOutcome::Cancelled;
        }
        self.load_products().await
    }

    /// Open the editor pre-filled and save the submitted product.
    #[tracing::instrument(skip_all, fields(product_id = ?product.id))]
    pub async fn edit_product(&self, product: &Product, dialogs: &impl Dialogs) -> ActionOutcome {
        let outcome = dialogs.open_editor(EditorRequest::Edit(product.clone())).await;
        if self.is_destroyed() {
            return ActionOutcome::Abandoned;
        }
        let Some(outcome) = outcome else {
            return ActionOutcome::Cancelled;
        };
        let Some(id) = product.id else {
            tracing::warn!(sku = %product.sku, "Cannot update a product without an ID");
            return ActionOutcome::Cancelled;
        };

        self.source.set_loading(true);
        let result = self.source.api().update_product(id, &outcome.product).await;
        if self.is_destroyed() {
            return ActionOutcome::Abandoned;
        }

        match result {
            Ok(_) => {
                tracing::info!(product_id = %id, "Product updated");
                self.load_products().await;
                self.notifier.notify(Toast::success(UPDATE_SUCCEEDED_MESSAGE));
                ActionOutcome::Succeeded
            }
            Err(e) => {
                tracing::error!(product_id = %id, error = %e, "Failed to update product");
                self.notifier.notify(Toast::error(UPDATE_FAILED_MESSAGE));
                self.source.set_loading(false);
                ActionOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::editor::{Field, ProductEditor};
    use crate::products::testing::{FakeProductApi, product};
    use crate::services::toast::{ToastLevel, ToastQueue};
    use catalog_console_core::{ProductId, Profile, SortDirection, SortField};
    use rust_decimal::Decimal;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;

    /// Dialogs that answer from a script and record what was opened.
    #[derive(Default)]
    struct ScriptedDialogs {
        confirm: bool,
        editor: Option<EditorOutcome>,
        confirmations: Mutex<Vec<ConfirmRequest>>,
        editors: Mutex<Vec<EditorRequest>>,
    }

    impl ScriptedDialogs {
        fn confirming() -> Self {
            Self {
                confirm: true,
                ..Self::default()
            }
        }

        fn submitting(product: Product, is_edit_mode: bool) -> Self {
            Self {
                editor: Some(EditorOutcome {
                    product,
                    is_edit_mode,
                }),
                ..Self::default()
            }
        }
    }

    impl Dialogs for ScriptedDialogs {
        async fn confirm(&self, request: ConfirmRequest) -> bool {
            self.confirmations.lock().unwrap().push(request);
            self.confirm
        }

        async fn open_editor(&self, request: EditorRequest) -> Option<EditorOutcome> {
            self.editors.lock().unwrap().push(request);
            self.editor.clone()
        }
    }

    /// Dialogs that tear the view down while open.
    struct DestroyingDialogs<'a> {
        view: &'a ProductListView<FakeProductApi, ToastQueue>,
        opened: AtomicBool,
    }

    impl Dialogs for DestroyingDialogs<'_> {
        async fn confirm(&self, _request: ConfirmRequest) -> bool {
            self.opened.store(true, Ordering::SeqCst);
            self.view.destroy();
            true
        }

        async fn open_editor(&self, _request: EditorRequest) -> Option<EditorOutcome> {
            self.opened.store(true, Ordering::SeqCst);
            self.view.destroy();
            None
        }
    }

    fn chair() -> Product {
        product(1, "A1", "Chair", 20)
    }

    fn view_with(products: Vec<Product>) -> (ProductListView<FakeProductApi, ToastQueue>, FakeProductApi, ToastQueue) {
        let api = FakeProductApi::with_products(products);
        let toasts = ToastQueue::new();
        let view = ProductListView::new(api.clone(), toasts.clone(), 10);
        (view, api, toasts)
    }

    fn messages(toasts: &ToastQueue) -> Vec<String> {
        toasts.drain().into_iter().map(|t| t.message).collect()
    }

    #[tokio::test]
    async fn test_load_sets_paginator_length() {
        let (view, _, toasts) = view_with(vec![chair(), product(2, "D1", "Desk", 100)]);
        assert_eq!(view.load_products().await, ActionOutcome::Succeeded);
        assert_eq!(view.paginator().length(), 2);
        assert_eq!(view.rows().unwrap().len(), 2);
        assert!(view.error().is_none());
        assert!(toasts.is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_records_error_and_toasts() {
        let (view, api, toasts) = view_with(vec![chair()]);
        api.fail_next_get();

        assert_eq!(view.load_products().await, ActionOutcome::Failed);
        assert_eq!(view.error().as_deref(), Some(LOAD_FAILED_MESSAGE));
        assert!(!view.is_loading());

        let toast = toasts.drain().remove(0);
        assert_eq!(toast.level, ToastLevel::Error);
        assert_eq!(toast.duration, Duration::from_secs(5));

        // A later successful load clears the error.
        view.load_products().await;
        assert!(view.error().is_none());
    }

    #[tokio::test]
    async fn test_sort_resets_page_index() {
        let products = (1..=12)
            .map(|i| product(i, &format!("S{i}"), &format!("Item {i:02}"), i))
            .collect();
        let (view, _, _) = view_with(products);
        view.load_products().await;
        view.paginator().set_page_index(1);

        view.sort_by(Sort::by(SortField::Cost, SortDirection::Desc));
        assert_eq!(view.paginator().page().page_index, 0);
        assert_eq!(view.rows().unwrap()[0].name, "Item 12");
    }

    #[tokio::test]
    async fn test_delete_confirmed() {
        let (view, api, toasts) = view_with(vec![chair(), product(2, "D1", "Desk", 100)]);
        view.load_products().await;
        let dialogs = ScriptedDialogs::confirming();

        assert_eq!(view.confirm_delete(&chair(), &dialogs).await, ActionOutcome::Succeeded);
        assert_eq!(
            dialogs.confirmations.lock().unwrap()[0],
            ConfirmRequest {
                title: "Confirm Delete".to_string(),
                message: "Are you sure you want to delete Chair?".to_string(),
            }
        );
        assert_eq!(view.paginator().length(), 1);
        assert!(!view.is_loading());
        assert_eq!(messages(&toasts), vec![DELETE_SUCCEEDED_MESSAGE]);
        assert!(api.calls().contains(&"delete 1".to_string()));
    }

    #[tokio::test]
    async fn test_delete_not_confirmed_or_without_id_is_noop() {
        let (view, api, toasts) = view_with(vec![chair()]);
        assert_eq!(
            view.confirm_delete(&chair(), &ScriptedDialogs::default()).await,
            ActionOutcome::Cancelled
        );

        let unsaved = Product::new("X1", "Unsaved", Decimal::ONE);
        assert_eq!(
            view.confirm_delete(&unsaved, &ScriptedDialogs::confirming()).await,
            ActionOutcome::Cancelled
        );
        assert!(api.calls().is_empty());
        assert!(toasts.is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_clears_loading() {
        let (view, api, toasts) = view_with(vec![chair()]);
        view.load_products().await;
        api.fail_next_delete();

        assert_eq!(
            view.confirm_delete(&chair(), &ScriptedDialogs::confirming()).await,
            ActionOutcome::Failed
        );
        assert!(!view.is_loading());
        assert_eq!(messages(&toasts), vec![DELETE_FAILED_MESSAGE]);
        assert_eq!(view.rows().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_then_reload_without_toast() {
        let (view, api, toasts) = view_with(vec![chair()]);
        view.load_products().await;

        let mut editor = ProductEditor::open(EditorRequest::Create);
        editor.set_field(Field::Name, "Desk").unwrap();
        editor.set_field(Field::Sku, "D1").unwrap();
        editor.set_field(Field::Cost, "100").unwrap();
        editor.set_field(Field::Description, "x").unwrap();
        editor.set_field(Field::ProfileBacklog, "2").unwrap();
        let outcome = editor.submit().unwrap();
        let dialogs = ScriptedDialogs::submitting(outcome.product, outcome.is_edit_mode);

        assert_eq!(view.open_create_dialog(&dialogs).await, ActionOutcome::Succeeded);
        assert_eq!(dialogs.editors.lock().unwrap()[0], EditorRequest::Create);
        assert_eq!(view.paginator().length(), 2);
        assert_eq!(view.rows().unwrap().len(), 2);
        assert!(toasts.is_empty());
        assert_eq!(api.products()[1].profile.backlog, 2);
    }

    #[tokio::test]
    async fn test_create_failure_keeps_rows() {
        let (view, api, toasts) = view_with(vec![chair()]);
        view.load_products().await;
        api.fail_next_create();
        let dialogs = ScriptedDialogs::submitting(Product::new("D1", "Desk", Decimal::from(100)), false);

        assert_eq!(view.open_create_dialog(&dialogs).await, ActionOutcome::Failed);
        assert_eq!(view.rows().unwrap().len(), 1);
        assert!(!view.is_loading());
        assert_eq!(messages(&toasts), vec![CREATE_FAILED_MESSAGE]);
    }

    #[tokio::test]
    async fn test_create_cancelled_calls_nothing() {
        let (view, api, _) = view_with(vec![]);
        assert_eq!(
            view.open_create_dialog(&ScriptedDialogs::default()).await,
            ActionOutcome::Cancelled
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_view_reloads_only_on_result() {
        let (view, api, _) = view_with(vec![chair()]);
        let dialogs = ScriptedDialogs::default();
        assert_eq!(view.view_product(&chair(), &dialogs).await, ActionOutcome::Cancelled);
        assert_eq!(dialogs.editors.lock().unwrap()[0], EditorRequest::View(chair()));
        assert!(api.calls().is_empty());

        let dialogs = ScriptedDialogs::submitting(chair(), false);
        assert_eq!(view.view_product(&chair(), &dialogs).await, ActionOutcome::Succeeded);
        assert_eq!(api.calls(), vec!["get"]);
    }

    #[tokio::test]
    async fn test_edit_updates_by_original_id() {
        let (view, api, toasts) = view_with(vec![chair()]);
        view.load_products().await;

        let mut updated = chair();
        updated.name = "Armchair".to_string();
        updated.profile = Profile::default().with_custom("color", "red").unwrap();
        let dialogs = ScriptedDialogs::submitting(updated, true);

        assert_eq!(view.edit_product(&chair(), &dialogs).await, ActionOutcome::Succeeded);
        assert!(api.calls().contains(&"update 1".to_string()));
        assert_eq!(view.rows().unwrap()[0].name, "Armchair");
        assert_eq!(view.rows().unwrap()[0].id, Some(ProductId::new(1)));
        assert_eq!(messages(&toasts), vec![UPDATE_SUCCEEDED_MESSAGE]);
    }

    #[tokio::test]
    async fn test_edit_failure() {
        let (view, api, toasts) = view_with(vec![chair()]);
        api.fail_next_update();
        let dialogs = ScriptedDialogs::submitting(chair(), true);

        assert_eq!(view.edit_product(&chair(), &dialogs).await, ActionOutcome::Failed);
        assert!(!view.is_loading());
        assert_eq!(messages(&toasts), vec![UPDATE_FAILED_MESSAGE]);
    }

    #[tokio::test]
    async fn test_destroy_during_dialog_abandons_action() {
        let (view, api, toasts) = view_with(vec![chair()]);
        let dialogs = DestroyingDialogs {
            view: &view,
            opened: AtomicBool::new(false),
        };

        assert_eq!(view.confirm_delete(&chair(), &dialogs).await, ActionOutcome::Abandoned);
        assert!(dialogs.opened.load(Ordering::SeqCst));
        assert!(api.calls().is_empty());
        assert!(toasts.is_empty());
        assert_eq!(view.load_products().await, ActionOutcome::Abandoned);
        assert!(view.rows().is_err());
    }
}
