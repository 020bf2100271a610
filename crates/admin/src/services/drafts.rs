//! Server-held dialog state.
//!
//! A browser cannot keep a modal open across requests, so an open editor
//! dialog lives here as a draft keyed by a random ID until it is submitted
//! or cancelled. The answer is then replayed to the list view through
//! [`ResolvedDialog`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::products::{ConfirmRequest, Dialogs, EditorOutcome, EditorRequest, ProductEditor};

/// Open drafts kept before the oldest is discarded.
const MAX_OPEN_DRAFTS: usize = 64;

/// An open editor dialog.
#[derive(Debug, Clone)]
pub struct Draft {
    /// What the dialog was opened with.
    pub request: EditorRequest,
    pub editor: ProductEditor,
    /// Open order, for eviction.
    seq: u64,
}

#[derive(Debug, Default)]
struct DraftStore {
    drafts: HashMap<Uuid, Draft>,
    next_seq: u64,
}

/// Store of open editor dialogs.
#[derive(Debug, Clone, Default)]
pub struct EditorDrafts {
    inner: Arc<RwLock<DraftStore>>,
}

impl EditorDrafts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new editor dialog and return its ID.
    pub async fn open(&self, request: EditorRequest) -> Uuid {
        let id = Uuid::new_v4();
        let editor = ProductEditor::open(request.clone());

        let mut store = self.inner.write().await;
        if store.drafts.len() >= MAX_OPEN_DRAFTS
            && let Some(oldest) = store
                .drafts
                .iter()
                .min_by_key(|(_, draft)| draft.seq)
                .map(|(id, _)| *id)
        {
            tracing::debug!(draft_id = %oldest, "Discarding oldest editor draft");
            store.drafts.remove(&oldest);
        }

        let seq = store.next_seq;
        store.next_seq += 1;
        store.drafts.insert(id, Draft { request, editor, seq });
        id
    }

    /// Snapshot of a draft.
    pub async fn get(&self, id: Uuid) -> Option<Draft> {
        self.inner.read().await.drafts.get(&id).cloned()
    }

    /// Mutate a draft's editor in place.
    pub async fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut ProductEditor) -> R) -> Option<R> {
        self.inner
            .write()
            .await
            .drafts
            .get_mut(&id)
            .map(|draft| f(&mut draft.editor))
    }

    /// Close a draft. Returns `None` if it was already resolved.
    pub async fn take(&self, id: Uuid) -> Option<Draft> {
        self.inner.write().await.drafts.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.drafts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Dialogs whose answers are already known.
#[derive(Debug, Clone, Default)]
pub struct ResolvedDialog {
    confirmed: bool,
    editor: Option<EditorOutcome>,
}

impl ResolvedDialog {
    /// Answer to a confirmation dialog.
    #[must_use]
    pub fn confirmed(confirmed: bool) -> Self {
        Self {
            confirmed,
            editor: None,
        }
    }

    /// Result of an editor dialog.
    #[must_use]
    pub fn editor(outcome: Option<EditorOutcome>) -> Self {
        Self {
            confirmed: false,
            editor: outcome,
        }
    }
}

impl Dialogs for ResolvedDialog {
    async fn confirm(&self, request: ConfirmRequest) -> bool {
        tracing::debug!(title = %request.title, confirmed = self.confirmed, "Confirmation resolved");
        self.confirmed
    }

    async fn open_editor(&self, request: EditorRequest) -> Option<EditorOutcome> {
        tracing::debug!(
            mode = request.mode().as_str(),
            submitted = self.editor.is_some(),
            "Editor resolved"
        );
        self.editor.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::Field;

    #[tokio::test]
    async fn test_draft_lifecycle() {
        let drafts = EditorDrafts::new();
        let id = drafts.open(EditorRequest::Create).await;

        drafts
            .update(id, |editor| editor.set_field(Field::Name, "Desk"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(drafts.get(id).await.unwrap().editor.value(Field::Name), "Desk");

        assert!(drafts.take(id).await.is_some());
        assert!(drafts.take(id).await.is_none());
        assert!(drafts.update(id, |_| ()).await.is_none());
    }

    #[tokio::test]
    async fn test_oldest_draft_is_evicted() {
        let drafts = EditorDrafts::new();
        let first = drafts.open(EditorRequest::Create).await;
        for _ in 0..MAX_OPEN_DRAFTS {
            drafts.open(EditorRequest::Create).await;
        }
        assert_eq!(drafts.len().await, MAX_OPEN_DRAFTS);
        assert!(drafts.get(first).await.is_none());
    }

    #[tokio::test]
    async fn test_resolved_dialog_replays_answers() {
        let product = catalog_console_core::Product::new("A1", "Chair", rust_decimal::Decimal::ONE);
        assert!(ResolvedDialog::confirmed(true).confirm(ConfirmRequest::delete(&product)).await);
        assert!(
            ResolvedDialog::editor(None)
                .open_editor(EditorRequest::Create)
                .await
                .is_none()
        );
    }
}
