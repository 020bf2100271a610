//! Custom property sub-editor.
//!
//! Edits the user-defined part of a product profile as a list of key/value
//! rows. Every committed change yields the full custom mapping, which the
//! product editor merges into its live profile.

use std::collections::BTreeMap;

use catalog_console_core::{Profile, is_reserved_key, value_as_text};
use serde_json::Value;
use thiserror::Error;

/// Full set of custom properties, as merged into a profile.
pub type PropertyMap = BTreeMap<String, Value>;

/// Errors raised by property operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("property key is required")]
    BlankKey,

    #[error("property value is required")]
    BlankValue,

    #[error("'{0}' is a reserved profile key")]
    ReservedKey(String),

    #[error("property '{0}' already exists")]
    DuplicateKey(String),

    #[error("property '{0}' not found")]
    NotFound(String),

    #[error("property '{0}' is not being edited")]
    NotEditing(String),

    #[error("properties are read-only")]
    ReadOnly,
}

/// One custom property row.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyItem {
    pub key: String,
    /// Committed value.
    pub value: String,
    pub is_editing: bool,
    /// In-progress value while editing.
    draft: Option<String>,
    /// Value as loaded, kept so untouched non-string values survive a save.
    raw: Option<Value>,
}

impl PropertyItem {
    /// The value shown in the inline input: the draft while editing.
    #[must_use]
    pub fn display_value(&self) -> &str {
        self.draft.as_deref().unwrap_or(&self.value)
    }

    fn to_value(&self) -> Value {
        match &self.raw {
            Some(raw) if value_as_text(raw) == self.value => raw.clone(),
            _ => Value::String(self.value.clone()),
        }
    }

    fn commit(&mut self) {
        if let Some(draft) = self.draft.take() {
            self.value = draft;
        }
    }
}

/// Editable list of custom properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyEditor {
    items: Vec<PropertyItem>,
    read_only: bool,
}

impl PropertyEditor {
    /// Rows for every non-reserved key of `profile`.
    #[must_use]
    pub fn from_profile(profile: &Profile, read_only: bool) -> Self {
        let items = profile
            .custom()
            .iter()
            .filter(|(key, _)| !is_reserved_key(key))
            .map(|(key, value)| PropertyItem {
                key: key.clone(),
                value: value_as_text(value),
                is_editing: false,
                draft: None,
                raw: Some(value.clone()),
            })
            .collect();

        Self { items, read_only }
    }

    #[must_use]
    pub fn items(&self) -> &[PropertyItem] {
        &self.items
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Current committed mapping.
    #[must_use]
    pub fn mapping(&self) -> PropertyMap {
        self.items
            .iter()
            .map(|item| (item.key.clone(), item.to_value()))
            .collect()
    }

    fn writable(&self) -> Result<(), PropertyError> {
        if self.read_only {
            Err(PropertyError::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn item_mut(&mut self, key: &str) -> Result<&mut PropertyItem, PropertyError> {
        self.items
            .iter_mut()
            .find(|item| item.key == key)
            .ok_or_else(|| PropertyError::NotFound(key.to_string()))
    }

    /// Add a new property.
    ///
    /// # Errors
    ///
    /// Rejects a blank key or value, a reserved key, or a key that already
    /// exists. Returns `PropertyError::ReadOnly` in view mode.
    pub fn add_property(&mut self, key: &str, value: &str) -> Result<PropertyMap, PropertyError> {
        self.writable()?;

        let key = key.trim();
        if key.is_empty() {
            return Err(PropertyError::BlankKey);
        }
        if value.trim().is_empty() {
            return Err(PropertyError::BlankValue);
        }
        if is_reserved_key(key) {
            return Err(PropertyError::ReservedKey(key.to_string()));
        }
        if self.items.iter().any(|item| item.key == key) {
            return Err(PropertyError::DuplicateKey(key.to_string()));
        }

        self.items.push(PropertyItem {
            key: key.to_string(),
            value: value.to_string(),
            is_editing: false,
            draft: None,
            raw: None,
        });
        Ok(self.mapping())
    }

    /// Remove a property.
    ///
    /// # Errors
    ///
    /// Returns `PropertyError::NotFound` for an unknown key, or
    /// `PropertyError::ReadOnly` in view mode.
    pub fn remove_property(&mut self, key: &str) -> Result<PropertyMap, PropertyError> {
        self.writable()?;
        let before = self.items.len();
        self.items.retain(|item| item.key != key);
        if self.items.len() == before {
            return Err(PropertyError::NotFound(key.to_string()));
        }
        Ok(self.mapping())
    }

    /// Toggle inline editing of a row.
    ///
    /// Turning editing off commits the drafted value and returns the new
    /// mapping; turning it on returns `None`.
    ///
    /// # Errors
    ///
    /// Returns `PropertyError::NotFound` or `PropertyError::ReadOnly`.
    pub fn toggle_edit(&mut self, key: &str) -> Result<Option<PropertyMap>, PropertyError> {
        self.writable()?;
        let item = self.item_mut(key)?;
        item.is_editing = !item.is_editing;

        if item.is_editing {
            item.draft = Some(item.value.clone());
            Ok(None)
        } else {
            item.commit();
            Ok(Some(self.mapping()))
        }
    }

    /// Update the drafted value of a row being edited. Nothing is emitted.
    ///
    /// # Errors
    ///
    /// Returns `PropertyError::NotEditing` if the row is not in edit mode.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), PropertyError> {
        self.writable()?;
        let item = self.item_mut(key)?;
        if !item.is_editing {
            return Err(PropertyError::NotEditing(key.to_string()));
        }
        item.draft = Some(value.to_string());
        Ok(())
    }

    /// Focus left a row's value input: commits while editing.
    ///
    /// # Errors
    ///
    /// Returns `PropertyError::NotFound` or `PropertyError::ReadOnly`.
    pub fn blur(&mut self, key: &str) -> Result<Option<PropertyMap>, PropertyError> {
        self.writable()?;
        let item = self.item_mut(key)?;
        if !item.is_editing {
            return Ok(None);
        }
        if let Some(draft) = &item.draft {
            item.value.clone_from(draft);
        }
        Ok(Some(self.mapping()))
    }
}
