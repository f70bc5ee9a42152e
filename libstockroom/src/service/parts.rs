//! Part CRUD actions
//!
//! Create and update race the backend write against a fixed timeout. Losing
//! the race stops the local wait only; the in-flight write is not cancelled
//! and may still land remotely, so a reported timeout means "unknown
//! outcome", never "guaranteed not-applied".

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::images::ImageService;
use crate::backend::DocumentStore;
use crate::error::{DataError, Result, StockroomError};
use crate::store::{Store, Transition};
use crate::types::{Part, PartDraft, PartPatch};
use crate::Config;

#[derive(Clone)]
pub struct PartsService {
    store: Store,
    documents: Arc<dyn DocumentStore>,
    images: ImageService,
    config: Arc<Config>,
}

impl PartsService {
    pub fn new(
        store: Store,
        documents: Arc<dyn DocumentStore>,
        images: ImageService,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            documents,
            images,
            config,
        }
    }

    fn collection(&self) -> &str {
        &self.config.backend.parts_collection
    }

    /// Replace the local part list with the remote collection, ordered by
    /// creation time descending. Category and threshold defaults are applied
    /// on read.
    ///
    /// Known hazard: distinct in-flight actions have no mutual ordering. A
    /// list started before a concurrent [`create`](Self::create) replaces the
    /// whole list when it resolves, and can drop the just-added part until
    /// the next refresh.
    pub async fn list(&self) -> Result<()> {
        self.store.dispatch(Transition::SetPartsLoading(true));
        self.store.dispatch(Transition::ClearError);

        let result = self
            .documents
            .list_all(self.collection(), "created_at", true)
            .await;

        let outcome = match result {
            Ok(documents) => {
                let parts: Vec<Part> = documents
                    .into_iter()
                    .map(|d| Part::from_document(d.id, &d.fields))
                    .collect();
                debug!(count = parts.len(), "loaded parts");
                self.store.dispatch(Transition::SetParts(parts));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load parts");
                self.store
                    .dispatch(Transition::SetError(Some("Failed to load parts".to_string())));
                Err(err.into())
            }
        };

        self.store.dispatch(Transition::SetPartsLoading(false));
        outcome
    }

    /// Create a part from a draft.
    ///
    /// Fails fast without a network call when no user is authenticated. A
    /// single "now" is reused for both timestamps; on success the complete
    /// part (draft + backend id + timestamps) is appended locally.
    pub async fn create(&self, draft: PartDraft) -> Result<Part> {
        self.store.dispatch(Transition::SetLoading(true));
        self.store.dispatch(Transition::ClearError);

        let result = self.create_inner(draft).await;
        self.store.dispatch(Transition::SetLoading(false));

        result.map_err(|err| {
            if !err.is_validation() {
                self.store
                    .dispatch(Transition::SetError(Some(write_message(&err))));
            }
            err
        })
    }

    async fn create_inner(&self, draft: PartDraft) -> Result<Part> {
        if self.store.user().is_none() {
            return Err(StockroomError::NotAuthenticated);
        }
        draft.validate()?;

        let now = Utc::now();
        let fields = draft.fields(now);
        debug!(name = %draft.name, "creating part");

        let insert = self.documents.insert(self.collection(), fields);
        let id = match timeout(self.config.write_timeout(), insert).await {
            Err(_) => return Err(StockroomError::Timeout),
            Ok(Err(err)) => return Err(err.into()),
            Ok(Ok(id)) => id,
        };

        let part = Part::from_draft(draft, id, now);
        self.store.dispatch(Transition::AddPart(part.clone()));
        info!(id = %part.id, "part created");
        Ok(part)
    }

    /// Merge the given fields into a part, by identifier.
    ///
    /// No existence check is made before the call; a missing identifier fails
    /// however the backend reports it. The server stamps its own
    /// `updated_at`; the local merge independently re-stamps, so the two
    /// values are not guaranteed identical.
    pub async fn update(&self, id: &str, patch: PartPatch) -> Result<()> {
        self.store.dispatch(Transition::SetLoading(true));
        self.store.dispatch(Transition::ClearError);

        let result = self.update_inner(id, &patch).await;
        self.store.dispatch(Transition::SetLoading(false));

        match result {
            Ok(()) => {
                self.store.dispatch(Transition::UpdatePart {
                    id: id.to_string(),
                    patch,
                });
                info!(id, "part updated");
                Ok(())
            }
            Err(err) => {
                self.store
                    .dispatch(Transition::SetError(Some(write_message(&err))));
                Err(err)
            }
        }
    }

    async fn update_inner(&self, id: &str, patch: &PartPatch) -> Result<()> {
        let mut fields = patch.fields();
        fields.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        debug!(id, "updating part");

        let update = self.documents.update_fields(self.collection(), id, fields);
        match timeout(self.config.write_timeout(), update).await {
            Err(_) => Err(StockroomError::Timeout),
            Ok(Err(err)) => Err(err.into()),
            Ok(Ok(())) => Ok(()),
        }
    }

    /// Delete a part by identifier.
    ///
    /// If the part is known locally and carries an image reference, the image
    /// is deleted best-effort first; an image-cleanup failure never blocks
    /// the document delete.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.dispatch(Transition::SetLoading(true));
        self.store.dispatch(Transition::ClearError);

        let result = self.delete_inner(id).await;
        self.store.dispatch(Transition::SetLoading(false));

        result.map_err(|err| {
            self.store.dispatch(Transition::SetError(Some(
                "Failed to delete part".to_string(),
            )));
            err
        })
    }

    async fn delete_inner(&self, id: &str) -> Result<()> {
        let image_url = self
            .store
            .parts()
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| p.image_url.clone());
        if let Some(url) = image_url {
            self.images.delete(&url).await;
        }

        self.documents.delete(self.collection(), id).await?;
        self.store.dispatch(Transition::RemovePart(id.to_string()));
        info!(id, "part deleted");
        Ok(())
    }
}

/// Fixed user-facing messages for the create/update write path.
fn write_message(error: &StockroomError) -> String {
    match error {
        StockroomError::Timeout => {
            "The operation took too long. Check your internet connection".to_string()
        }
        StockroomError::NotAuthenticated => "Not authenticated".to_string(),
        StockroomError::Data(DataError::PermissionDenied) => {
            "You do not have permission to modify parts".to_string()
        }
        StockroomError::Data(DataError::Unavailable) => {
            "Service unavailable. Check your internet connection".to_string()
        }
        StockroomError::Data(DataError::Unauthenticated) => {
            "Not authenticated. Sign in again".to_string()
        }
        other => other.to_string(),
    }
}
