//! Core types for the catalog console.
//!
//! This module provides the product model and the pure table projection.

pub mod id;
pub mod product;
pub mod table;

pub use id::*;
pub use product::{
    CustomProperty, DEFAULT_PRODUCT_TYPE, Product, Profile, ProfileError, RESERVED_PROFILE_KEYS,
    is_reserved_key, value_as_text,
};
pub use table::{PageRequest, Sort, SortDirection, SortField, paginate, project, sort_products};
