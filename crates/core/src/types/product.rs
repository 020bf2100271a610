//! Product catalog records as exchanged with the product API.
//!
//! The JSON shape mirrors the remote API: top-level product fields plus a
//! `profile` object that mixes three fixed keys with arbitrary user-defined
//! keys.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::id::ProductId;

/// Profile keys with a fixed meaning. Custom properties may never use them.
pub const RESERVED_PROFILE_KEYS: [&str; 3] = ["type", "available", "backlog"];

/// Product type assigned when none is given.
pub const DEFAULT_PRODUCT_TYPE: &str = "furniture";

/// Errors raised when mutating a profile's custom properties.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// The key is one of [`RESERVED_PROFILE_KEYS`].
    #[error("Profile key '{0}' is reserved")]
    ReservedKey(String),
}

/// Returns true if `key` is one of the fixed profile keys.
#[must_use]
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_PROFILE_KEYS.contains(&key)
}

/// Structured attribute bag of a product.
///
/// The custom map is private so that reserved keys can never end up in it.
/// On deserialization the reserved keys are consumed by the named fields and
/// everything else lands in the custom map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Product type (e.g. "furniture").
    #[serde(rename = "type", default = "default_product_type")]
    pub kind: String,
    /// Whether the product is available for sale.
    #[serde(default = "default_available")]
    pub available: bool,
    /// Number of units on backlog.
    #[serde(default)]
    pub backlog: u32,
    #[serde(flatten)]
    custom: BTreeMap<String, Value>,
}

fn default_product_type() -> String {
    DEFAULT_PRODUCT_TYPE.to_string()
}

const fn default_available() -> bool {
    true
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            kind: default_product_type(),
            available: default_available(),
            backlog: 0,
            custom: BTreeMap::new(),
        }
    }
}

impl Profile {
    /// User-defined properties, keyed by property name.
    #[must_use]
    pub const fn custom(&self) -> &BTreeMap<String, Value> {
        &self.custom
    }

    /// Look up a single custom property.
    #[must_use]
    pub fn custom_value(&self, key: &str) -> Option<&Value> {
        self.custom.get(key)
    }

    /// Insert or overwrite a custom property, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::ReservedKey` if `key` is a reserved profile key.
    pub fn insert_custom(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, ProfileError> {
        let key = key.into();
        if is_reserved_key(&key) {
            return Err(ProfileError::ReservedKey(key));
        }
        Ok(self.custom.insert(key, value.into()))
    }

    /// Remove a custom property.
    pub fn remove_custom(&mut self, key: &str) -> Option<Value> {
        self.custom.remove(key)
    }

    /// Replace every custom property with `properties`.
    ///
    /// Nothing is changed if any key is reserved.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::ReservedKey` for the first reserved key found.
    pub fn replace_custom(&mut self, properties: BTreeMap<String, Value>) -> Result<(), ProfileError> {
        if let Some(key) = properties.keys().find(|k| is_reserved_key(k)) {
            return Err(ProfileError::ReservedKey(key.clone()));
        }
        self.custom = properties;
        Ok(())
    }

    /// Builder-style variant of [`Profile::insert_custom`].
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::ReservedKey` if `key` is reserved.
    pub fn with_custom(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ProfileError> {
        self.insert_custom(key, value)?;
        Ok(self)
    }
}

/// A key/value pair as sent in the optional `customProperties` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomProperty {
    pub key: String,
    pub value: String,
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Assigned by the API; absent on create payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    /// Stock keeping unit. Immutable once the product exists.
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit cost, never negative.
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(default)]
    pub profile: Profile,
    #[serde(
        rename = "customProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_properties: Option<Vec<CustomProperty>>,
}

impl Product {
    /// Create a product without an ID and with a default profile.
    #[must_use]
    pub fn new(sku: &str, name: &str, cost: Decimal) -> Self {
        Self {
            id: None,
            sku: sku.to_string(),
            name: name.to_string(),
            description: String::new(),
            cost,
            profile: Profile::default(),
            custom_properties: None,
        }
    }

    /// Set the product ID.
    #[must_use]
    pub const fn with_id(mut self, id: ProductId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Set the profile.
    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }
}

/// Render a JSON value as plain text; strings are shown without quotes.
#[must_use]
pub fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
