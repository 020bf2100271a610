//! HTTP middleware for the console.
//!
//! The router applies, outermost first: the Sentry layers, `TraceLayer`,
//! then the [`auth::RequireToken`] extractor on protected handlers.

pub mod auth;

pub use auth::{LOGIN_PATH, RequireToken, TokenRejection};
