//! Service layer for Stockroom
//!
//! This module provides the action API consumed by screens. The facade
//! pattern mirrors the rest of the crate's layering: [`InventoryService`] is
//! the single entry point, coordinating specialized sub-services that share
//! the same [`Store`] and backend adapters:
//!
//! - `SessionService`: authentication actions
//! - `PartsService`: part CRUD with the timeout-bounded write race
//! - `CategoryService`: category CRUD
//! - `ImageService`: blob upload and fire-and-forget cleanup
//!
//! Every sub-service follows the same skeleton: set the relevant loading
//! flag, clear the prior error, call the backend, dispatch a transition on
//! success, reset the loading flag in all outcomes, and on failure store a
//! user-facing message in the error slot while re-signalling the error to the
//! caller.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use libstockroom::backend::memory::MemoryBackend;
//! use libstockroom::{Config, InventoryService, PartDraft};
//!
//! # async fn example() -> libstockroom::Result<()> {
//! let backend = Arc::new(MemoryBackend::new());
//! let service = InventoryService::new(
//!     backend.clone(),
//!     backend.clone(),
//!     backend.clone(),
//!     Config::default_config(),
//! );
//!
//! service.session().register("user@example.com", "secret1").await?;
//! service.parts().create(PartDraft {
//!     name: "Oil filter".to_string(),
//!     price: 8.5,
//!     quantity: 12,
//!     ..Default::default()
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod categories;
pub mod images;
pub mod parts;
pub mod session;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use self::categories::CategoryService;
use self::images::ImageService;
use self::parts::PartsService;
use self::session::SessionService;
use crate::backend::{AuthBackend, BlobStore, DocumentStore};
use crate::store::{InventoryState, Store, Transition};
use crate::types::User;
use crate::Config;

/// Main service facade coordinating all sub-services
///
/// Owns the single [`Store`] and the standing session subscription. Backends
/// are injected explicitly at construction; nothing is resolved from ambient
/// context, so the service must exist before any screen is built.
pub struct InventoryService {
    store: Store,
    session: SessionService,
    parts: PartsService,
    categories: CategoryService,
    images: ImageService,
    session_task: JoinHandle<()>,
}

impl InventoryService {
    /// Create a service wired to the given backends.
    ///
    /// Spawns the session-subscription task, which is the sole writer of the
    /// current user: every transition reported by the auth backend dispatches
    /// `SetUser`, and a transition to "absent" also clears the in-memory part
    /// and category lists. Must be called within a Tokio runtime.
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        config: Config,
    ) -> Self {
        let store = Store::new();
        let config = Arc::new(config);

        let session_task = spawn_session_watcher(store.clone(), auth.subscribe_sessions());

        let images = ImageService::new(store.clone(), blobs, Arc::clone(&config));
        let session = SessionService::new(store.clone(), auth);
        let parts = PartsService::new(
            store.clone(),
            Arc::clone(&documents),
            images.clone(),
            Arc::clone(&config),
        );
        let categories = CategoryService::new(store.clone(), documents, config);

        Self {
            store,
            session,
            parts,
            categories,
            images,
            session_task,
        }
    }

    /// The shared state handle.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// A cloned snapshot of the current state.
    pub fn state(&self) -> InventoryState {
        self.store.snapshot()
    }

    /// Access the session (authentication) actions.
    pub fn session(&self) -> &SessionService {
        &self.session
    }

    /// Access the part CRUD actions.
    pub fn parts(&self) -> &PartsService {
        &self.parts
    }

    /// Access the category CRUD actions.
    pub fn categories(&self) -> &CategoryService {
        &self.categories
    }

    /// Access the image transfer actions.
    pub fn images(&self) -> &ImageService {
        &self.images
    }

    /// Clear the error slot after the consumer has displayed it.
    pub fn clear_error(&self) {
        self.store.dispatch(Transition::ClearError);
    }
}

impl Drop for InventoryService {
    fn drop(&mut self) {
        self.session_task.abort();
    }
}

fn spawn_session_watcher(
    store: Store,
    mut sessions: watch::Receiver<Option<User>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let current = sessions.borrow_and_update().clone();
            match current {
                Some(user) => store.dispatch(Transition::SetUser(Some(user))),
                None => {
                    store.dispatch(Transition::SetUser(None));
                    store.dispatch(Transition::SetParts(Vec::new()));
                    store.dispatch(Transition::SetCategories(Vec::new()));
                }
            }
            if sessions.changed().await.is_err() {
                break;
            }
        }
    })
}
