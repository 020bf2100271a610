//! Product table: data source, list view orchestration and the editor dialog.

pub mod data_source;
pub mod editor;
pub mod properties;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use data_source::{DataSourceError, ProductListDataSource};
pub use editor::{
    EditorError, EditorMode, EditorOutcome, EditorRequest, Field, FieldError, FieldPolicy,
    ProductEditor, ValidationErrors, field_policy,
};
pub use properties::{PropertyEditor, PropertyError, PropertyItem, PropertyMap};
pub use view::{ActionOutcome, ConfirmRequest, Dialogs, ProductListView};
