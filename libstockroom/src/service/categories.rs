//! Category CRUD actions
//!
//! Structurally the part actions minus the timeout race and image handling:
//! one fixed user-facing message per operation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::backend::DocumentStore;
use crate::error::{Result, StockroomError};
use crate::store::{Store, Transition};
use crate::types::{Category, CategoryDraft, CategoryPatch};
use crate::Config;

#[derive(Clone)]
pub struct CategoryService {
    store: Store,
    documents: Arc<dyn DocumentStore>,
    config: Arc<Config>,
}

impl CategoryService {
    pub fn new(store: Store, documents: Arc<dyn DocumentStore>, config: Arc<Config>) -> Self {
        Self {
            store,
            documents,
            config,
        }
    }

    fn collection(&self) -> &str {
        &self.config.backend.categories_collection
    }

    /// Replace the local category list with the remote collection, ordered by
    /// creation time descending.
    pub async fn list(&self) -> Result<()> {
        self.store.dispatch(Transition::SetCategoriesLoading(true));
        self.store.dispatch(Transition::ClearError);

        let result = self
            .documents
            .list_all(self.collection(), "created_at", true)
            .await;

        let outcome = match result {
            Ok(documents) => {
                let categories: Vec<Category> = documents
                    .into_iter()
                    .map(|d| Category::from_document(d.id, &d.fields))
                    .collect();
                debug!(count = categories.len(), "loaded categories");
                self.store.dispatch(Transition::SetCategories(categories));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load categories");
                self.store.dispatch(Transition::SetError(Some(
                    "Failed to load categories".to_string(),
                )));
                Err(err.into())
            }
        };

        self.store.dispatch(Transition::SetCategoriesLoading(false));
        outcome
    }

    /// Create a category from a draft. Requires an authenticated user.
    pub async fn create(&self, draft: CategoryDraft) -> Result<Category> {
        self.store.dispatch(Transition::SetLoading(true));
        self.store.dispatch(Transition::ClearError);

        let result = self.create_inner(draft).await;
        self.store.dispatch(Transition::SetLoading(false));

        result.map_err(|err| {
            if !err.is_validation() {
                self.store.dispatch(Transition::SetError(Some(
                    "Failed to create category".to_string(),
                )));
            }
            err
        })
    }

    async fn create_inner(&self, draft: CategoryDraft) -> Result<Category> {
        if self.store.user().is_none() {
            return Err(StockroomError::NotAuthenticated);
        }
        draft.validate()?;

        let now = Utc::now();
        let fields = draft.fields(now);
        let id = self.documents.insert(self.collection(), fields).await?;

        let category = Category::from_draft(draft, id, now);
        self.store
            .dispatch(Transition::AddCategory(category.clone()));
        info!(id = %category.id, "category created");
        Ok(category)
    }

    /// Merge the given fields into a category, by identifier. No timestamp
    /// stamp on the merge.
    pub async fn update(&self, id: &str, patch: CategoryPatch) -> Result<()> {
        self.store.dispatch(Transition::SetLoading(true));
        self.store.dispatch(Transition::ClearError);

        let result = self
            .documents
            .update_fields(self.collection(), id, patch.fields())
            .await;
        self.store.dispatch(Transition::SetLoading(false));

        match result {
            Ok(()) => {
                self.store.dispatch(Transition::UpdateCategory {
                    id: id.to_string(),
                    patch,
                });
                info!(id, "category updated");
                Ok(())
            }
            Err(err) => {
                self.store.dispatch(Transition::SetError(Some(
                    "Failed to update category".to_string(),
                )));
                Err(err.into())
            }
        }
    }

    /// Delete a category by identifier. Parts referencing it keep their
    /// category string; nothing re-points them.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.dispatch(Transition::SetLoading(true));
        self.store.dispatch(Transition::ClearError);

        let result = self.documents.delete(self.collection(), id).await;
        self.store.dispatch(Transition::SetLoading(false));

        match result {
            Ok(()) => {
                self.store
                    .dispatch(Transition::RemoveCategory(id.to_string()));
                info!(id, "category deleted");
                Ok(())
            }
            Err(err) => {
                self.store.dispatch(Transition::SetError(Some(
                    "Failed to delete category".to_string(),
                )));
                Err(err.into())
            }
        }
    }
}
