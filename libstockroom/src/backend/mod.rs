//! Backend adapter traits
//!
//! The core consumes the remote backend through three narrow traits: an
//! authentication service, a document store with collection-level CRUD and
//! ordered listing, and a blob store for images. Adapters translate whatever
//! error shape the real backend produces into the closed kinds in
//! [`crate::error`]; the core never inspects raw backend payloads.
//!
//! Two implementations ship with the crate: [`memory::MemoryBackend`], a
//! deterministic reference backend, and [`mock::MockBackend`], a configurable
//! test double. Both are available to all builds so integration tests can
//! drive the full action surface without network access.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::{AuthError, DataError, StorageError};
use crate::types::User;

pub mod memory;
pub mod mock;

/// Raw field map of a stored document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Custom metadata attached to a blob upload.
pub type Metadata = HashMap<String, String>;

/// A document read back from a collection.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Opaque handle to an uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRef {
    pub key: String,
}

impl StorageRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Authentication service.
///
/// Sign-in and sign-out never report the resulting user directly; the watch
/// channel from [`subscribe_sessions`](AuthBackend::subscribe_sessions) is
/// the sole source of session transitions, and it fires at least once with
/// the current value on subscribe.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError>;

    async fn create_account(&self, email: &str, password: &str) -> Result<(), AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    fn subscribe_sessions(&self) -> watch::Receiver<Option<User>>;
}

/// Document database with collection-level CRUD and ordered queries.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a record; the backend assigns and returns the identifier.
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, DataError>;

    /// All documents of a collection, ordered by the named field.
    async fn list_all(
        &self,
        collection: &str,
        order_by: &str,
        descending: bool,
    ) -> Result<Vec<Document>, DataError>;

    /// Merge the given fields into an existing document.
    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), DataError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DataError>;
}

/// Blob store for images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: Metadata,
    ) -> Result<StorageRef, StorageError>;

    /// Public download URL for an uploaded blob.
    fn public_url(&self, storage_ref: &StorageRef) -> String;

    async fn delete(&self, storage_ref: &StorageRef) -> Result<(), StorageError>;
}
