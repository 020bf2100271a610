//! Product editor dialog.
//!
//! A form over one product in one of three modes. Which fields are editable,
//! required, defaulted or bounded is decided by [`field_policy`], evaluated
//! once when the editor is opened. Disabled fields keep the value of the
//! product the editor was opened with and are not validated.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use catalog_console_core::{DEFAULT_PRODUCT_TYPE, Product, ProductId, Profile, ProfileError};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

use super::properties::{PropertyEditor, PropertyError, PropertyMap};

/// What the editor was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorMode {
    Create,
    Edit,
    View,
}

impl EditorMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::View => "view",
        }
    }

    /// Dialog title.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Create => "Create Product",
            Self::Edit => "Edit Product",
            Self::View => "View Product",
        }
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self, Self::View)
    }
}

/// Data the caller opens the editor with. Edit and view always carry the
/// product to pre-populate from.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorRequest {
    Create,
    Edit(Product),
    View(Product),
}

impl EditorRequest {
    #[must_use]
    pub const fn mode(&self) -> EditorMode {
        match self {
            Self::Create => EditorMode::Create,
            Self::Edit(_) => EditorMode::Edit,
            Self::View(_) => EditorMode::View,
        }
    }

    #[must_use]
    pub const fn product(&self) -> Option<&Product> {
        match self {
            Self::Create => None,
            Self::Edit(product) | Self::View(product) => Some(product),
        }
    }
}

/// Result of a successful submit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorOutcome {
    pub product: Product,
    pub is_edit_mode: bool,
}

/// Form fields of the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Description,
    Sku,
    Cost,
    ProfileType,
    ProfileAvailable,
    ProfileBacklog,
}

impl Field {
    /// All fields, in form order.
    pub const ALL: [Self; 7] = [
        Self::Name,
        Self::Description,
        Self::Sku,
        Self::Cost,
        Self::ProfileType,
        Self::ProfileAvailable,
        Self::ProfileBacklog,
    ];

    /// Form input name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Sku => "sku",
            Self::Cost => "cost",
            Self::ProfileType => "profile_type",
            Self::ProfileAvailable => "profile_available",
            Self::ProfileBacklog => "profile_backlog",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Description => "Description",
            Self::Sku => "SKU",
            Self::Cost => "Cost",
            Self::ProfileType => "Type",
            Self::ProfileAvailable => "Available",
            Self::ProfileBacklog => "Backlog",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| EditorError::UnknownField(s.to_string()))
    }
}

/// Rules for one field in one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    pub editable: bool,
    pub required: bool,
    /// Initial value in create mode.
    pub default: Option<&'static str>,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
    /// Minimum numeric value.
    pub min: Option<Decimal>,
}

impl FieldPolicy {
    const fn text(editable: bool, max_length: usize) -> Self {
        Self {
            editable,
            required: true,
            default: None,
            max_length: Some(max_length),
            min: None,
        }
    }

    const fn defaulted(editable: bool, default: &'static str) -> Self {
        Self {
            editable,
            required: false,
            default: Some(default),
            max_length: None,
            min: None,
        }
    }
}

/// The field policy table.
#[must_use]
pub const fn field_policy(mode: EditorMode, field: Field) -> FieldPolicy {
    let writable = !mode.is_read_only();

    match field {
        Field::Name => FieldPolicy::text(writable, 50),
        Field::Description => FieldPolicy::text(writable, 200),
        Field::Sku => FieldPolicy::text(matches!(mode, EditorMode::Create), 20),
        Field::Cost => FieldPolicy {
            editable: writable,
            required: true,
            default: Some("0"),
            max_length: None,
            min: Some(Decimal::ZERO),
        },
        Field::ProfileType => FieldPolicy::defaulted(writable, DEFAULT_PRODUCT_TYPE),
        Field::ProfileAvailable => FieldPolicy::defaulted(writable, "true"),
        Field::ProfileBacklog => FieldPolicy {
            min: Some(Decimal::ZERO),
            ..FieldPolicy::defaulted(writable, "0")
        },
    }
}

/// Why a field failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Required,
    MaxLength(usize),
    Min(Decimal),
    InvalidNumber,
    InvalidBoolean,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("This field is required"),
            Self::MaxLength(max) => write!(f, "Must be at most {max} characters"),
            Self::Min(min) => write!(f, "Must be at least {min}"),
            Self::InvalidNumber => f.write_str("Must be a number"),
            Self::InvalidBoolean => f.write_str("Must be true or false"),
        }
    }
}

/// Validation failures keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> {
        self.0.iter().map(|(field, error)| (*field, error))
    }

    fn insert(&mut self, field: Field, error: FieldError) {
        self.0.insert(field, error);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(Field::name).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Errors raised by editor operations.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("product is opened read-only")]
    ReadOnly,

    #[error("field '{0}' cannot be changed")]
    FieldLocked(Field),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("form is invalid: {0}")]
    Invalid(ValidationErrors),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// An open editor dialog.
#[derive(Debug, Clone)]
pub struct ProductEditor {
    mode: EditorMode,
    base: Product,
    policies: BTreeMap<Field, FieldPolicy>,
    values: BTreeMap<Field, String>,
    profile: Profile,
    properties: PropertyEditor,
    errors: ValidationErrors,
}

fn field_value(product: &Product, field: Field) -> String {
    match field {
        Field::Name => product.name.clone(),
        Field::Description => product.description.clone(),
        Field::Sku => product.sku.clone(),
        Field::Cost => product.cost.normalize().to_string(),
        Field::ProfileType => product.profile.kind.clone(),
        Field::ProfileAvailable => product.profile.available.to_string(),
        Field::ProfileBacklog => product.profile.backlog.to_string(),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" | "" => Some(false),
        _ => None,
    }
}

impl ProductEditor {
    /// Open the editor. Edit and view pre-populate from the product; create
    /// starts from the policy defaults.
    #[must_use]
    pub fn open(request: EditorRequest) -> Self {
        let mode = request.mode();
        let policies = Field::ALL
            .into_iter()
            .map(|field| (field, field_policy(mode, field)))
            .collect();

        let base = request
            .product()
            .cloned()
            .unwrap_or_else(|| Product::new("", "", Decimal::ZERO));

        let values = Field::ALL
            .into_iter()
            .map(|field| {
                let value = match (&request, field_policy(mode, field).default) {
                    (EditorRequest::Create, Some(default)) => default.to_string(),
                    (EditorRequest::Create, None) => String::new(),
                    _ => field_value(&base, field),
                };
                (field, value)
            })
            .collect();

        let profile = base.profile.clone();
        let properties = PropertyEditor::from_profile(&profile, mode.is_read_only());

        tracing::debug!(mode = mode.as_str(), product_id = ?base.id, "Opened product editor");

        Self {
            mode,
            base,
            policies,
            values,
            profile,
            properties,
            errors: ValidationErrors::default(),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> EditorMode {
        self.mode
    }

    #[must_use]
    pub const fn product_id(&self) -> Option<ProductId> {
        self.base.id
    }

    #[must_use]
    pub fn policy(&self, field: Field) -> FieldPolicy {
        self.policies
            .get(&field)
            .copied()
            .unwrap_or_else(|| field_policy(self.mode, field))
    }

    /// Current raw value of a field.
    #[must_use]
    pub fn value(&self, field: Field) -> &str {
        self.values.get(&field).map_or("", String::as_str)
    }

    /// Errors from the last failed submit.
    #[must_use]
    pub const fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Live profile, including property sub-editor changes.
    #[must_use]
    pub const fn profile(&self) -> &Profile {
        &self.profile
    }

    #[must_use]
    pub const fn properties(&self) -> &PropertyEditor {
        &self.properties
    }

    /// Change one field.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::FieldLocked` if the policy makes the field
    /// read-only in this mode.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Result<(), EditorError> {
        if !self.policy(field).editable {
            return Err(EditorError::FieldLocked(field));
        }
        self.values.insert(field, value.into());
        Ok(())
    }

    /// Apply a submitted form; values for locked fields are ignored.
    pub fn apply_form(&mut self, values: impl IntoIterator<Item = (Field, String)>) {
        for (field, value) in values {
            if self.set_field(field, value).is_err() {
                tracing::debug!(%field, "Ignoring value for locked field");
            }
        }
    }

    /// Validate the form and build the resulting product.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<Product, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let mut product = self.base.clone();
        product.profile = self.profile.clone();

        for field in Field::ALL {
            let policy = self.policy(field);
            if !policy.editable {
                continue;
            }
            let raw = self.value(field);

            if policy.required && raw.trim().is_empty() {
                errors.insert(field, FieldError::Required);
                continue;
            }
            if let Some(max) = policy.max_length
                && raw.chars().count() > max
            {
                errors.insert(field, FieldError::MaxLength(max));
                continue;
            }

            match field {
                Field::Name => product.name = raw.to_string(),
                Field::Description => product.description = raw.to_string(),
                Field::Sku => product.sku = raw.to_string(),
                Field::ProfileType => {
                    product.profile.kind = if raw.trim().is_empty() {
                        DEFAULT_PRODUCT_TYPE.to_string()
                    } else {
                        raw.to_string()
                    };
                }
                Field::ProfileAvailable => match parse_bool(raw) {
                    Some(available) => product.profile.available = available,
                    None => errors.insert(field, FieldError::InvalidBoolean),
                },
                Field::Cost | Field::ProfileBacklog => {
                    let raw = if raw.trim().is_empty() { "0" } else { raw.trim() };
                    let Ok(number) = raw.parse::<Decimal>() else {
                        errors.insert(field, FieldError::InvalidNumber);
                        continue;
                    };
                    if let Some(min) = policy.min
                        && number < min
                    {
                        errors.insert(field, FieldError::Min(min));
                        continue;
                    }

                    if field == Field::Cost {
                        product.cost = number;
                    } else if let Some(backlog) = number.fract().is_zero().then(|| number.to_u32()).flatten() {
                        product.profile.backlog = backlog;
                    } else {
                        errors.insert(field, FieldError::InvalidNumber);
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(product)
        } else {
            Err(errors)
        }
    }

    /// Submit the dialog.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::ReadOnly` in view mode and `EditorError::Invalid`
    /// when validation fails; the errors are also kept on the editor.
    pub fn submit(&mut self) -> Result<EditorOutcome, EditorError> {
        if self.mode.is_read_only() {
            return Err(EditorError::ReadOnly);
        }

        match self.validate() {
            Ok(product) => {
                self.errors = ValidationErrors::default();
                Ok(EditorOutcome {
                    product,
                    is_edit_mode: self.mode == EditorMode::Edit,
                })
            }
            Err(errors) => {
                tracing::debug!(%errors, "Product editor submit blocked");
                self.errors = errors.clone();
                Err(EditorError::Invalid(errors))
            }
        }
    }

    /// Close without a result.
    #[must_use]
    pub fn cancel(&self) -> Option<EditorOutcome> {
        tracing::debug!(mode = self.mode.as_str(), "Product editor cancelled");
        None
    }

    fn apply_properties(&mut self, properties: PropertyMap) -> Result<(), EditorError> {
        self.profile.replace_custom(properties)?;
        Ok(())
    }

    /// Add a custom property and merge it into the profile.
    ///
    /// # Errors
    ///
    /// Propagates the sub-editor's rejection.
    pub fn add_property(&mut self, key: &str, value: &str) -> Result<(), EditorError> {
        let properties = self.properties.add_property(key, value)?;
        self.apply_properties(properties)
    }

    /// Remove a custom property from the profile.
    ///
    /// # Errors
    ///
    /// Propagates the sub-editor's rejection.
    pub fn remove_property(&mut self, key: &str) -> Result<(), EditorError> {
        let properties = self.properties.remove_property(key)?;
        self.apply_properties(properties)
    }

    /// Toggle inline editing of a property row.
    ///
    /// # Errors
    ///
    /// Propagates the sub-editor's rejection.
    pub fn toggle_property(&mut self, key: &str) -> Result<(), EditorError> {
        match self.properties.toggle_edit(key)? {
            Some(properties) => self.apply_properties(properties),
            None => Ok(()),
        }
    }

    /// Draft a new value for a property row being edited.
    ///
    /// # Errors
    ///
    /// Propagates the sub-editor's rejection.
    pub fn set_property_value(&mut self, key: &str, value: &str) -> Result<(), EditorError> {
        Ok(self.properties.set_value(key, value)?)
    }

    /// Commit a property row being edited when its input loses focus.
    ///
    /// # Errors
    ///
    /// Propagates the sub-editor's rejection.
    pub fn blur_property(&mut self, key: &str) -> Result<(), EditorError> {
        match self.properties.blur(key)? {
            Some(properties) => self.apply_properties(properties),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chair() -> Product {
        Product::new("A1", "Chair", Decimal::from(20))
            .with_description("Oak chair")
            .with_id(ProductId::new(1))
            .with_profile(Profile::default().with_custom("color", "red").unwrap())
    }

    fn fill(editor: &mut ProductEditor) {
        editor.set_field(Field::Name, "Desk").unwrap();
        editor.set_field(Field::Description, "x").unwrap();
        editor.set_field(Field::Sku, "D1").unwrap();
        editor.set_field(Field::Cost, "100").unwrap();
        editor.set_field(Field::ProfileBacklog, "2").unwrap();
    }

    #[test]
    fn test_policy_table() {
        let sku = field_policy(EditorMode::Create, Field::Sku);
        assert!(sku.editable && sku.required);
        assert_eq!(sku.max_length, Some(20));
        assert!(!field_policy(EditorMode::Edit, Field::Sku).editable);
        assert!(field_policy(EditorMode::Edit, Field::Name).editable);

        for field in Field::ALL {
            assert!(!field_policy(EditorMode::View, field).editable, "{field}");
        }
        assert_eq!(
            field_policy(EditorMode::Create, Field::ProfileType).default,
            Some("furniture")
        );
        assert_eq!(
            field_policy(EditorMode::Create, Field::Cost).min,
            Some(Decimal::ZERO)
        );
    }

    #[test]
    fn test_create_starts_from_defaults() {
        let editor = ProductEditor::open(EditorRequest::Create);
        assert_eq!(editor.mode(), EditorMode::Create);
        assert_eq!(editor.value(Field::Name), "");
        assert_eq!(editor.value(Field::ProfileType), "furniture");
        assert_eq!(editor.value(Field::ProfileAvailable), "true");
        assert_eq!(editor.value(Field::ProfileBacklog), "0");
        assert!(editor.properties().items().is_empty());
    }

    #[test]
    fn test_edit_prepopulates_and_locks_sku() {
        let mut editor = ProductEditor::open(EditorRequest::Edit(chair()));
        assert_eq!(editor.value(Field::Name), "Chair");
        assert_eq!(editor.value(Field::Cost), "20");
        assert_eq!(editor.properties().items().len(), 1);

        assert!(matches!(
            editor.set_field(Field::Sku, "B2"),
            Err(EditorError::FieldLocked(Field::Sku))
        ));
        editor.apply_form([(Field::Sku, "B2".to_string()), (Field::Name, "Stool".to_string())]);
        assert_eq!(editor.value(Field::Sku), "A1");
        assert_eq!(editor.value(Field::Name), "Stool");
    }

    #[test]
    fn test_create_submit_builds_product() {
        let mut editor = ProductEditor::open(EditorRequest::Create);
        fill(&mut editor);

        let outcome = editor.submit().unwrap();
        assert!(!outcome.is_edit_mode);
        let product = outcome.product;
        assert_eq!(product.id, None);
        assert_eq!(product.sku, "D1");
        assert_eq!(product.cost, Decimal::from(100));
        assert_eq!(product.profile.kind, "furniture");
        assert!(product.profile.available);
        assert_eq!(product.profile.backlog, 2);
    }

    #[test]
    fn test_submit_blocked_when_invalid() {
        let mut editor = ProductEditor::open(EditorRequest::Create);
        editor.set_field(Field::Name, "n".repeat(51)).unwrap();
        editor.set_field(Field::Cost, "-1").unwrap();
        editor.set_field(Field::ProfileBacklog, "lots").unwrap();

        let Err(EditorError::Invalid(errors)) = editor.submit() else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.get(Field::Name), Some(&FieldError::MaxLength(50)));
        assert_eq!(errors.get(Field::Description), Some(&FieldError::Required));
        assert_eq!(errors.get(Field::Sku), Some(&FieldError::Required));
        assert_eq!(errors.get(Field::Cost), Some(&FieldError::Min(Decimal::ZERO)));
        assert_eq!(errors.get(Field::ProfileBacklog), Some(&FieldError::InvalidNumber));
        assert_eq!(editor.errors(), &errors);
    }

    #[test]
    fn test_description_max_length() {
        let mut editor = ProductEditor::open(EditorRequest::Create);
        fill(&mut editor);
        editor.set_field(Field::Description, "d".repeat(201)).unwrap();
        let errors = editor.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(Field::Description), Some(&FieldError::MaxLength(200)));
    }

    #[test]
    fn test_edit_preserves_id_and_merges_properties() {
        let mut editor = ProductEditor::open(EditorRequest::Edit(chair()));
        editor.set_field(Field::Cost, "25.50").unwrap();
        editor.add_property("size", "L").unwrap();
        editor.toggle_property("color").unwrap();
        editor.set_property_value("color", "blue").unwrap();
        editor.blur_property("color").unwrap();

        // Applied live, before submit.
        assert_eq!(editor.profile().custom_value("color"), Some(&json!("blue")));

        let outcome = editor.submit().unwrap();
        assert!(outcome.is_edit_mode);
        assert_eq!(outcome.product.id, Some(ProductId::new(1)));
        assert_eq!(outcome.product.sku, "A1");
        assert_eq!(outcome.product.cost, Decimal::new(2550, 2));
        assert_eq!(outcome.product.profile.custom_value("size"), Some(&json!("L")));
        assert_eq!(outcome.product.profile.custom_value("color"), Some(&json!("blue")));
    }

    #[test]
    fn test_remove_property_updates_profile() {
        let mut editor = ProductEditor::open(EditorRequest::Edit(chair()));
        editor.remove_property("color").unwrap();
        assert!(editor.profile().custom().is_empty());
    }

    #[test]
    fn test_view_mode_is_read_only() {
        let mut editor = ProductEditor::open(EditorRequest::View(chair()));
        assert!(matches!(
            editor.set_field(Field::Name, "x"),
            Err(EditorError::FieldLocked(Field::Name))
        ));
        assert!(matches!(
            editor.add_property("size", "L"),
            Err(EditorError::Property(PropertyError::ReadOnly))
        ));
        assert!(matches!(editor.submit(), Err(EditorError::ReadOnly)));
        assert_eq!(editor.cancel(), None);
    }

    #[test]
    fn test_available_checkbox_values() {
        let mut editor = ProductEditor::open(EditorRequest::Create);
        fill(&mut editor);
        editor.set_field(Field::ProfileAvailable, "off").unwrap();
        assert!(!editor.validate().unwrap().profile.available);

        editor.set_field(Field::ProfileAvailable, "maybe").unwrap();
        assert_eq!(
            editor.validate().unwrap_err().get(Field::ProfileAvailable),
            Some(&FieldError::InvalidBoolean)
        );
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("profile_type".parse::<Field>().unwrap(), Field::ProfileType);
        assert!("price".parse::<Field>().is_err());
    }
}
