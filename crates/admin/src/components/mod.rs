//! Reusable UI components.

pub mod data_table;

pub use data_table::{DataTableConfig, Paginator, SortHeader, TableColumn, products_table_config};
