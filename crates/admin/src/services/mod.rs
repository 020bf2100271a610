//! Services backing the console.
//!
//! # Services
//!
//! - `auth` - Bearer token store with durable storage and a live login signal
//! - `drafts` - Server-held editor dialogs awaiting submit or cancel
//! - `toast` - Transient user notifications

pub mod auth;
pub mod drafts;
pub mod toast;

pub use auth::{AuthError, AuthStore, FileTokenStorage, MemoryTokenStorage, TokenStorage};
pub use drafts::{Draft, EditorDrafts, ResolvedDialog};
pub use toast::{Notifier, Toast, ToastLevel, ToastQueue};
