//! Editor dialog route handlers.
//!
//! Every button of the editor posts the whole form, so field values typed
//! before a property action are not lost. The handlers apply the posted
//! fields to the draft first and then perform their action.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

use super::{ToastView, take_toasts};
use crate::error::AppError;
use crate::middleware::RequireToken;
use crate::products::{
    ActionOutcome, EditorError, EditorOutcome, EditorRequest, Field, ProductEditor,
};
use crate::services::drafts::ResolvedDialog;
use crate::state::AppState;

/// Prefix of the inline property value inputs (`prop.<key>`).
const PROPERTY_INPUT_PREFIX: &str = "prop.";

/// Hidden input marking that the editable fields were posted.
const FIELDS_MARKER: &str = "fields_present";

/// Form field for templates.
#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub input: &'static str,
    pub editable: bool,
    pub required: bool,
    pub max_length: Option<usize>,
    pub error: Option<String>,
}

impl FieldView {
    /// Checkbox state for boolean fields.
    #[must_use]
    pub fn checked(&self) -> bool {
        self.value == "true"
    }
}

/// Custom property row for templates.
#[derive(Debug, Clone)]
pub struct PropertyRowView {
    pub key: String,
    pub value: String,
    pub is_editing: bool,
    pub input_name: String,
}

/// Editor dialog template.
#[derive(Template)]
#[template(path = "products/editor.html")]
pub struct EditorTemplate {
    pub draft_id: String,
    pub title: &'static str,
    pub read_only: bool,
    pub fields: Vec<FieldView>,
    pub properties: Vec<PropertyRowView>,
    pub property_error: Option<String>,
    pub new_key: String,
    pub new_value: String,
    pub toasts: Vec<ToastView>,
}

const fn input_kind(field: Field) -> &'static str {
    match field {
        Field::Description => "textarea",
        Field::Cost | Field::ProfileBacklog => "number",
        Field::ProfileAvailable => "checkbox",
        _ => "text",
    }
}

impl EditorTemplate {
    fn build(draft_id: Uuid, editor: &ProductEditor, toasts: Vec<ToastView>) -> Self {
        let fields = Field::ALL
            .into_iter()
            .map(|field| {
                let policy = editor.policy(field);
                FieldView {
                    name: field.name(),
                    label: field.label(),
                    value: editor.value(field).to_string(),
                    input: input_kind(field),
                    editable: policy.editable,
                    required: policy.required,
                    max_length: policy.max_length,
                    error: editor.errors().get(field).map(ToString::to_string),
                }
            })
            .collect();

        let properties = editor
            .properties()
            .items()
            .iter()
            .map(|item| PropertyRowView {
                key: item.key.clone(),
                value: item.display_value().to_string(),
                is_editing: item.is_editing,
                input_name: format!("{PROPERTY_INPUT_PREFIX}{}", item.key),
            })
            .collect();

        Self {
            draft_id: draft_id.to_string(),
            title: editor.mode().title(),
            read_only: editor.mode().is_read_only(),
            fields,
            properties,
            property_error: None,
            new_key: String::new(),
            new_value: String::new(),
            toasts,
        }
    }
}

/// Everything the editor form posts.
#[derive(Debug, Default, PartialEq)]
pub struct EditorForm {
    pub fields: Vec<(Field, String)>,
    pub new_key: String,
    pub new_value: String,
    pub property_values: HashMap<String, String>,
}

impl EditorForm {
    /// Sort raw form pairs into fields, the new-property inputs and inline
    /// property values. Unknown names are ignored.
    #[must_use]
    pub fn parse(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        let mut fields_posted = false;

        for (name, value) in pairs {
            if name == FIELDS_MARKER {
                fields_posted = true;
            } else if name == "new_key" {
                form.new_key = value;
            } else if name == "new_value" {
                form.new_value = value;
            } else if let Some(key) = name.strip_prefix(PROPERTY_INPUT_PREFIX) {
                form.property_values.insert(key.to_string(), value);
            } else if let Ok(field) = name.parse::<Field>() {
                form.fields.push((field, value));
            }
        }

        // Unchecked checkboxes are not posted at all.
        if fields_posted
            && !form
                .fields
                .iter()
                .any(|(field, _)| *field == Field::ProfileAvailable)
        {
            form.fields.push((Field::ProfileAvailable, "false".to_string()));
        }

        form
    }

    /// Apply the posted fields and drafted property values to `editor`.
    fn apply(&self, editor: &mut ProductEditor) {
        if editor.mode().is_read_only() {
            return;
        }
        editor.apply_form(self.fields.iter().cloned());

        for (key, value) in &self.property_values {
            let editing = editor
                .properties()
                .items()
                .iter()
                .any(|item| item.key == *key && item.is_editing);
            if editing && let Err(e) = editor.set_property_value(key, value) {
                tracing::debug!(key, error = %e, "Ignoring property value");
            }
        }
    }
}

/// Build the editor router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/editor/{draft}", get(show))
        .route("/editor/{draft}/fields", post(apply_fields))
        .route("/editor/{draft}/properties", post(add_property))
        .route("/editor/{draft}/properties/{key}/toggle", post(toggle_property))
        .route("/editor/{draft}/properties/{key}/value", post(commit_property))
        .route("/editor/{draft}/properties/{key}/remove", post(remove_property))
        .route("/editor/{draft}/submit", post(submit))
        .route("/editor/{draft}/cancel", post(cancel))
}

fn editor_url(draft: Uuid) -> String {
    format!("/editor/{draft}")
}

fn render(template: &EditorTemplate, status: StatusCode) -> Result<Response, AppError> {
    Ok((status, Html(template.render()?)).into_response())
}

/// Apply the form and run `action` on the draft.
///
/// On success the browser is sent back to the editor. A rejected property
/// action re-renders the editor with the rejection and the typed inputs.
async fn with_draft(
    state: &AppState,
    draft: Uuid,
    form: &EditorForm,
    action: impl FnOnce(&mut ProductEditor) -> Result<(), EditorError>,
) -> Result<Response, AppError> {
    let result = state
        .drafts()
        .update(draft, |editor| {
            form.apply(editor);
            action(editor).map_err(|e| (e, editor.clone()))
        })
        .await
        .ok_or_else(|| AppError::NotFound(format!("editor {draft}")))?;

    match result {
        Ok(()) => Ok(Redirect::to(&editor_url(draft)).into_response()),
        Err((EditorError::Property(e), editor)) => {
            let mut template = EditorTemplate::build(draft, &editor, take_toasts(state.toasts()));
            template.property_error = Some(e.to_string());
            template.new_key.clone_from(&form.new_key);
            template.new_value.clone_from(&form.new_value);
            render(&template, StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err((e, _)) => Err(e.into()),
    }
}

/// Hand the dialog's result to the product list view.
async fn resolve(
    state: &AppState,
    request: &EditorRequest,
    outcome: Option<EditorOutcome>,
) -> ActionOutcome {
    let dialog = ResolvedDialog::editor(outcome);
    let view = state.products();

    match request {
        EditorRequest::Create => view.open_create_dialog(&dialog).await,
        EditorRequest::Edit(product) => view.edit_product(product, &dialog).await,
        EditorRequest::View(product) => view.view_product(product, &dialog).await,
    }
}

/// GET /editor/{draft}
#[instrument(skip(state))]
async fn show(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Path(draft): Path<Uuid>,
) -> Result<Response, AppError> {
    let Some(open) = state.drafts().get(draft).await else {
        tracing::debug!(%draft, "Editor already closed");
        return Ok(Redirect::to("/products").into_response());
    };
    let template = EditorTemplate::build(draft, &open.editor, take_toasts(state.toasts()));
    render(&template, StatusCode::OK)
}

/// POST /editor/{draft}/fields
#[instrument(skip(state, pairs))]
async fn apply_fields(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Path(draft): Path<Uuid>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = EditorForm::parse(pairs);
    with_draft(&state, draft, &form, |_| Ok(())).await
}

/// POST /editor/{draft}/properties
#[instrument(skip(state, pairs))]
async fn add_property(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Path(draft): Path<Uuid>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = EditorForm::parse(pairs);
    with_draft(&state, draft, &form, |editor| {
        editor.add_property(&form.new_key, &form.new_value)
    })
    .await
}

/// POST /editor/{draft}/properties/{key}/toggle
#[instrument(skip(state, pairs))]
async fn toggle_property(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Path((draft, key)): Path<(Uuid, String)>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = EditorForm::parse(pairs);
    with_draft(&state, draft, &form, |editor| editor.toggle_property(&key)).await
}

/// Commit an inline property value, as when its input loses focus.
///
/// POST /editor/{draft}/properties/{key}/value
#[instrument(skip(state, pairs))]
async fn commit_property(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Path((draft, key)): Path<(Uuid, String)>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = EditorForm::parse(pairs);
    with_draft(&state, draft, &form, |editor| editor.blur_property(&key)).await
}

/// POST /editor/{draft}/properties/{key}/remove
#[instrument(skip(state, pairs))]
async fn remove_property(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Path((draft, key)): Path<(Uuid, String)>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = EditorForm::parse(pairs);
    with_draft(&state, draft, &form, |editor| editor.remove_property(&key)).await
}

/// Submit the dialog. Invalid forms are re-rendered with their errors.
///
/// POST /editor/{draft}/submit
#[instrument(skip(state, pairs))]
async fn submit(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Path(draft): Path<Uuid>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = EditorForm::parse(pairs);
    let result = state
        .drafts()
        .update(draft, |editor| {
            form.apply(editor);
            editor.submit().map_err(|e| (e, editor.clone()))
        })
        .await
        .ok_or_else(|| AppError::NotFound(format!("editor {draft}")))?;

    let outcome = match result {
        Ok(outcome) => Some(outcome),
        // View mode has nothing to submit; closing it is all that happens.
        Err((EditorError::ReadOnly, _)) => None,
        Err((EditorError::Invalid(_), editor)) => {
            let template = EditorTemplate::build(draft, &editor, take_toasts(state.toasts()));
            return render(&template, StatusCode::UNPROCESSABLE_ENTITY);
        }
        Err((e, _)) => return Err(e.into()),
    };

    let Some(open) = state.drafts().take(draft).await else {
        return Ok(Redirect::to("/products").into_response());
    };
    let action = resolve(&state, &open.request, outcome).await;
    tracing::debug!(mode = open.editor.mode().as_str(), ?action, "Editor submitted");

    Ok(Redirect::to("/products").into_response())
}

/// Close the dialog without a result.
///
/// POST /editor/{draft}/cancel
#[instrument(skip(state))]
async fn cancel(
    RequireToken(_): RequireToken,
    State(state): State<AppState>,
    Path(draft): Path<Uuid>,
) -> Redirect {
    if let Some(open) = state.drafts().take(draft).await {
        let outcome = open.editor.cancel();
        let action = resolve(&state, &open.request, outcome).await;
        tracing::debug!(mode = open.editor.mode().as_str(), ?action, "Editor cancelled");
    }
    Redirect::to("/products")
}
