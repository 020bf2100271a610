//! Catalog Console Core - Shared types library.
//!
//! This crate provides the types used across all catalog console components:
//! - `admin` - Server-rendered product console
//! - `cli` - Command-line companion for the same product API
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product model, type-safe IDs and the sort/paginate projection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
