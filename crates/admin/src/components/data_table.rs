//! Data table component types and controls.
//!
//! The configuration types describe how a table is rendered; the controls
//! ([`Paginator`], [`SortHeader`]) hold the live page and sort state and
//! publish every change so a data source can recompute its rows.

use std::sync::Arc;

use catalog_console_core::{PageRequest, Sort, SortField};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Unique key for the column.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Sort field, if the column is sortable.
    pub sort_field: Option<SortField>,
}

impl TableColumn {
    /// Create a new sortable column keyed by its sort field.
    #[must_use]
    pub fn sortable(field: SortField, label: &str) -> Self {
        Self {
            key: field.as_str().to_string(),
            label: label.to_string(),
            sort_field: Some(field),
        }
    }

    /// Create a new non-sortable column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sort_field: None,
        }
    }

    /// Whether the column header toggles sorting.
    #[must_use]
    pub const fn is_sortable(&self) -> bool {
        self.sort_field.is_some()
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Page sizes offered by the paginator.
    pub page_size_options: Vec<usize>,
    /// Title for empty state.
    pub empty_title: String,
    /// Description for empty state.
    pub empty_description: Option<String>,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            page_size_options: vec![5, 10, 20],
            empty_title: "No items found".to_string(),
            empty_description: None,
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the page sizes offered by the paginator.
    #[must_use]
    pub fn page_size_options(mut self, options: &[usize]) -> Self {
        self.page_size_options = options.to_vec();
        self
    }

    /// Set empty state configuration.
    #[must_use]
    pub fn empty_state(mut self, title: &str, description: Option<&str>) -> Self {
        self.empty_title = title.to_string();
        self.empty_description = description.map(ToString::to_string);
        self
    }

    /// Keys of all columns, in display order.
    #[must_use]
    pub fn column_keys(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.key.clone()).collect()
    }
}

/// Build the products table configuration.
#[must_use]
pub fn products_table_config() -> DataTableConfig {
    DataTableConfig::new("products")
        .column(TableColumn::sortable(SortField::Id, "ID"))
        .column(TableColumn::sortable(SortField::Sku, "SKU"))
        .column(TableColumn::sortable(SortField::Name, "Name"))
        .column(TableColumn::sortable(SortField::Cost, "Cost"))
        .column(TableColumn::new("actions", "Actions"))
        .page_size_options(&[5, 10, 20])
        .empty_state("No products found", Some("Create a product to get started"))
}

/// Page control: current page plus the total row count it pages over.
///
/// Page changes are published to subscribers; the total length is not a
/// page change and is not published.
#[derive(Debug, Clone)]
pub struct Paginator {
    inner: Arc<PaginatorInner>,
}

#[derive(Debug)]
struct PaginatorInner {
    page: watch::Sender<PageRequest>,
    length: watch::Sender<usize>,
}

impl Paginator {
    /// Create a paginator on the first page.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        let (page, _) = watch::channel(PageRequest::new(0, page_size.max(1)));
        let (length, _) = watch::channel(0);
        Self {
            inner: Arc::new(PaginatorInner { page, length }),
        }
    }

    /// Current page.
    #[must_use]
    pub fn page(&self) -> PageRequest {
        *self.inner.page.borrow()
    }

    /// Jump to `page_index`.
    pub fn set_page_index(&self, page_index: usize) {
        self.inner.page.send_modify(|page| page.page_index = page_index);
    }

    /// Change the page size; returns to the first page.
    pub fn set_page_size(&self, page_size: usize) {
        self.inner
            .page
            .send_replace(PageRequest::new(0, page_size.max(1)));
    }

    /// Advance one page if there is one.
    pub fn next_page(&self) {
        if self.has_next_page() {
            self.set_page_index(self.page().page_index + 1);
        }
    }

    /// Go back one page if there is one.
    pub fn previous_page(&self) {
        if self.has_previous_page() {
            self.set_page_index(self.page().page_index - 1);
        }
    }

    /// Total number of rows being paged over.
    #[must_use]
    pub fn length(&self) -> usize {
        *self.inner.length.borrow()
    }

    /// Set the total number of rows.
    pub fn set_length(&self, length: usize) {
        self.inner.length.send_replace(length);
    }

    /// Number of pages for the current length (at least one).
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.length().div_ceil(self.page().page_size).max(1)
    }

    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.page().page_index + 1 < self.page_count()
    }

    #[must_use]
    pub fn has_previous_page(&self) -> bool {
        self.page().page_index > 0
    }

    /// Subscribe to page changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PageRequest> {
        self.inner.page.subscribe()
    }
}

/// Sort control: the active column and direction.
#[derive(Debug, Clone)]
pub struct SortHeader {
    inner: Arc<watch::Sender<Sort>>,
}

impl Default for SortHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl SortHeader {
    /// Create an unsorted header.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Sort::none());
        Self { inner: Arc::new(tx) }
    }

    /// Current sort.
    #[must_use]
    pub fn sort(&self) -> Sort {
        *self.inner.borrow()
    }

    /// Replace the sort and publish the change.
    pub fn set_sort(&self, sort: Sort) {
        self.inner.send_replace(sort);
    }

    /// Subscribe to sort changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Sort> {
        self.inner.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_console_core::SortDirection;

    #[test]
    fn test_products_table_columns() {
        let config = products_table_config();
        assert_eq!(
            config.column_keys(),
            vec!["id", "sku", "name", "cost", "actions"]
        );
        assert!(config.columns.iter().take(4).all(TableColumn::is_sortable));
        assert!(!config.columns.last().unwrap().is_sortable());
    }

    #[test]
    fn test_paginator_navigation() {
        let paginator = Paginator::new(2);
        paginator.set_length(5);
        assert_eq!(paginator.page_count(), 3);
        assert!(!paginator.has_previous_page());

        paginator.next_page();
        paginator.next_page();
        assert_eq!(paginator.page().page_index, 2);
        assert!(!paginator.has_next_page());

        paginator.next_page();
        assert_eq!(paginator.page().page_index, 2);

        paginator.previous_page();
        assert_eq!(paginator.page().page_index, 1);
    }

    #[test]
    fn test_paginator_page_size_resets_index() {
        let paginator = Paginator::new(10);
        paginator.set_page_index(3);
        paginator.set_page_size(20);
        assert_eq!(paginator.page(), PageRequest::new(0, 20));
    }

    #[test]
    fn test_paginator_empty_has_one_page() {
        let paginator = Paginator::new(10);
        assert_eq!(paginator.page_count(), 1);
        assert!(!paginator.has_next_page());
    }

    #[tokio::test]
    async fn test_controls_publish_changes() {
        let paginator = Paginator::new(10);
        let sort = SortHeader::new();
        let mut page_rx = paginator.subscribe();
        let mut sort_rx = sort.subscribe();

        paginator.set_page_index(1);
        sort.set_sort(Sort::by(SortField::Name, SortDirection::Asc));

        page_rx.changed().await.unwrap();
        sort_rx.changed().await.unwrap();
        assert_eq!(page_rx.borrow().page_index, 1);
        assert_eq!(sort_rx.borrow().active, Some(SortField::Name));
    }

    #[test]
    fn test_length_is_not_a_page_change() {
        let paginator = Paginator::new(10);
        let rx = paginator.subscribe();
        paginator.set_length(42);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(paginator.length(), 42);
    }
}
