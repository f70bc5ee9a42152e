//! Mock backend implementation for testing
//!
//! A configurable backend that can simulate successes, injected error kinds
//! and delays across all three adapter traits. Designed for integration tests
//! that verify action behavior without network access or real credentials.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::backend::{AuthBackend, BlobStore, Document, DocumentStore, Fields, Metadata, StorageRef};
use crate::error::{AuthError, DataError, StorageError};
use crate::types::User;

/// Configuration for mock backend behavior
#[derive(Clone)]
pub struct MockBackendConfig {
    /// Delay before completing any async operation (simulates latency)
    pub delay: Duration,

    /// Error to return from sign_in (None = succeed)
    pub sign_in_error: Option<AuthError>,

    /// Error to return from create_account
    pub create_account_error: Option<AuthError>,

    /// Error to return from send_password_reset
    pub password_reset_error: Option<AuthError>,

    /// Error to return from insert
    pub insert_error: Option<DataError>,

    /// Error to return from list_all
    pub list_error: Option<DataError>,

    /// Error to return from update_fields
    pub update_error: Option<DataError>,

    /// Error to return from delete
    pub delete_error: Option<DataError>,

    /// Error to return from blob upload
    pub upload_error: Option<StorageError>,

    /// Error to return from blob delete
    pub blob_delete_error: Option<StorageError>,

    /// Documents returned by a successful list_all
    pub list_result: Vec<Document>,

    /// Identifier returned by a successful insert
    pub insert_id: String,

    /// Public-URL base used by public_url
    pub public_base: String,
}

impl Default for MockBackendConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(0),
            sign_in_error: None,
            create_account_error: None,
            password_reset_error: None,
            insert_error: None,
            list_error: None,
            update_error: None,
            delete_error: None,
            upload_error: None,
            blob_delete_error: None,
            list_result: Vec::new(),
            insert_id: "mock-id".to_string(),
            public_base: "https://storage.example.com/v0/b/stockroom".to_string(),
        }
    }
}

/// Mock backend for testing
pub struct MockBackend {
    config: MockBackendConfig,
    session: watch::Sender<Option<User>>,

    insert_calls: Arc<Mutex<usize>>,
    update_calls: Arc<Mutex<usize>>,
    delete_calls: Arc<Mutex<usize>>,
    list_calls: Arc<Mutex<usize>>,
    upload_calls: Arc<Mutex<usize>>,
    blob_delete_calls: Arc<Mutex<usize>>,

    inserted: Arc<Mutex<Vec<(String, Fields)>>>,
    updated: Arc<Mutex<Vec<(String, String, Fields)>>>,
    uploaded: Arc<Mutex<Vec<(String, usize, String, Metadata)>>>,
    deleted_blobs: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Create a new mock backend with the given configuration
    pub fn new(config: MockBackendConfig) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            config,
            session,
            insert_calls: Arc::new(Mutex::new(0)),
            update_calls: Arc::new(Mutex::new(0)),
            delete_calls: Arc::new(Mutex::new(0)),
            list_calls: Arc::new(Mutex::new(0)),
            upload_calls: Arc::new(Mutex::new(0)),
            blob_delete_calls: Arc::new(Mutex::new(0)),
            inserted: Arc::new(Mutex::new(Vec::new())),
            updated: Arc::new(Mutex::new(Vec::new())),
            uploaded: Arc::new(Mutex::new(Vec::new())),
            deleted_blobs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock backend where every operation succeeds
    pub fn healthy() -> Self {
        Self::new(MockBackendConfig::default())
    }

    /// Create a mock backend with a delay on every async operation
    pub fn with_delay(delay: Duration) -> Self {
        Self::new(MockBackendConfig {
            delay,
            ..Default::default()
        })
    }

    /// Create a mock backend whose inserts fail with the given kind
    pub fn failing_insert(error: DataError) -> Self {
        Self::new(MockBackendConfig {
            insert_error: Some(error),
            ..Default::default()
        })
    }

    /// Create a mock backend whose sign_in fails with the given kind
    pub fn failing_sign_in(error: AuthError) -> Self {
        Self::new(MockBackendConfig {
            sign_in_error: Some(error),
            ..Default::default()
        })
    }

    /// Create a mock backend whose blob uploads fail with the given kind
    pub fn failing_upload(error: StorageError) -> Self {
        Self::new(MockBackendConfig {
            upload_error: Some(error),
            ..Default::default()
        })
    }

    /// Push a session transition directly (simulates backend-driven change)
    pub fn emit_session(&self, user: Option<User>) {
        let _ = self.session.send(user);
    }

    pub fn insert_calls(&self) -> usize {
        *self.insert_calls.lock().unwrap()
    }

    pub fn update_calls(&self) -> usize {
        *self.update_calls.lock().unwrap()
    }

    pub fn delete_calls(&self) -> usize {
        *self.delete_calls.lock().unwrap()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    pub fn upload_calls(&self) -> usize {
        *self.upload_calls.lock().unwrap()
    }

    pub fn blob_delete_calls(&self) -> usize {
        *self.blob_delete_calls.lock().unwrap()
    }

    /// All (collection, fields) pairs passed to insert
    pub fn inserted(&self) -> Vec<(String, Fields)> {
        self.inserted.lock().unwrap().clone()
    }

    /// All (collection, id, fields) triples passed to update_fields
    pub fn updated(&self) -> Vec<(String, String, Fields)> {
        self.updated.lock().unwrap().clone()
    }

    /// All (key, byte_count, content_type, metadata) tuples passed to upload
    pub fn uploaded(&self) -> Vec<(String, usize, String, Metadata)> {
        self.uploaded.lock().unwrap().clone()
    }

    /// All storage keys passed to blob delete
    pub fn deleted_blobs(&self) -> Vec<String> {
        self.deleted_blobs.lock().unwrap().clone()
    }

    async fn simulate_latency(&self) {
        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<(), AuthError> {
        self.simulate_latency().await;
        if let Some(error) = &self.config.sign_in_error {
            return Err(error.clone());
        }
        let _ = self.session.send(Some(User {
            uid: format!("uid-{email}"),
            email: email.to_string(),
            display_name: None,
        }));
        Ok(())
    }

    async fn create_account(&self, email: &str, _password: &str) -> Result<(), AuthError> {
        self.simulate_latency().await;
        if let Some(error) = &self.config.create_account_error {
            return Err(error.clone());
        }
        let _ = self.session.send(Some(User {
            uid: format!("uid-{email}"),
            email: email.to_string(),
            display_name: None,
        }));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.simulate_latency().await;
        let _ = self.session.send(None);
        Ok(())
    }

    async fn send_password_reset(&self, _email: &str) -> Result<(), AuthError> {
        self.simulate_latency().await;
        if let Some(error) = &self.config.password_reset_error {
            return Err(error.clone());
        }
        Ok(())
    }

    fn subscribe_sessions(&self) -> watch::Receiver<Option<User>> {
        self.session.subscribe()
    }
}

#[async_trait]
impl DocumentStore for MockBackend {
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, DataError> {
        *self.insert_calls.lock().unwrap() += 1;
        self.simulate_latency().await;
        if let Some(error) = &self.config.insert_error {
            return Err(error.clone());
        }
        self.inserted
            .lock()
            .unwrap()
            .push((collection.to_string(), fields));
        Ok(self.config.insert_id.clone())
    }

    async fn list_all(
        &self,
        _collection: &str,
        _order_by: &str,
        _descending: bool,
    ) -> Result<Vec<Document>, DataError> {
        *self.list_calls.lock().unwrap() += 1;
        self.simulate_latency().await;
        if let Some(error) = &self.config.list_error {
            return Err(error.clone());
        }
        Ok(self.config.list_result.clone())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), DataError> {
        *self.update_calls.lock().unwrap() += 1;
        self.simulate_latency().await;
        if let Some(error) = &self.config.update_error {
            return Err(error.clone());
        }
        self.updated
            .lock()
            .unwrap()
            .push((collection.to_string(), id.to_string(), fields));
        Ok(())
    }

    async fn delete(&self, _collection: &str, _id: &str) -> Result<(), DataError> {
        *self.delete_calls.lock().unwrap() += 1;
        self.simulate_latency().await;
        if let Some(error) = &self.config.delete_error {
            return Err(error.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MockBackend {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: Metadata,
    ) -> Result<StorageRef, StorageError> {
        *self.upload_calls.lock().unwrap() += 1;
        self.simulate_latency().await;
        if let Some(error) = &self.config.upload_error {
            return Err(error.clone());
        }
        self.uploaded.lock().unwrap().push((
            key.to_string(),
            bytes.len(),
            content_type.to_string(),
            metadata,
        ));
        Ok(StorageRef::new(key))
    }

    fn public_url(&self, storage_ref: &StorageRef) -> String {
        format!(
            "{}/o/{}?alt=media",
            self.config.public_base,
            storage_ref.key.replace('/', "%2F")
        )
    }

    async fn delete(&self, storage_ref: &StorageRef) -> Result<(), StorageError> {
        *self.blob_delete_calls.lock().unwrap() += 1;
        self.simulate_latency().await;
        if let Some(error) = &self.config.blob_delete_error {
            return Err(error.clone());
        }
        self.deleted_blobs
            .lock()
            .unwrap()
            .push(storage_ref.key.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_sign_in_emits_session() {
        let backend = MockBackend::healthy();
        let mut sessions = backend.subscribe_sessions();
        assert!(sessions.borrow_and_update().is_none());

        backend.sign_in("user@example.com", "pw").await.unwrap();
        let user = sessions.borrow_and_update().clone().unwrap();
        assert_eq!(user.email, "user@example.com");

        backend.sign_out().await.unwrap();
        assert!(sessions.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_mock_sign_in_failure() {
        let backend = MockBackend::failing_sign_in(AuthError::InvalidCredentials);
        let err = backend.sign_in("user@example.com", "pw").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_mock_insert_captures_fields() {
        let backend = MockBackend::healthy();
        let mut fields = Fields::new();
        fields.insert("name".to_string(), json!("Oil filter"));

        let id = backend.insert("parts", fields).await.unwrap();
        assert_eq!(id, "mock-id");
        assert_eq!(backend.insert_calls(), 1);

        let inserted = backend.inserted();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].0, "parts");
        assert_eq!(inserted[0].1["name"], json!("Oil filter"));
    }

    #[tokio::test]
    async fn test_mock_insert_failure_still_counts() {
        let backend = MockBackend::failing_insert(DataError::PermissionDenied);
        let err = backend.insert("parts", Fields::new()).await.unwrap_err();
        assert_eq!(err, DataError::PermissionDenied);
        assert_eq!(backend.insert_calls(), 1);
        assert!(backend.inserted().is_empty());
    }

    #[tokio::test]
    async fn test_mock_delay() {
        let backend = MockBackend::with_delay(Duration::from_millis(50));

        let start = std::time::Instant::now();
        backend.list_all("parts", "created_at", true).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_mock_blob_roundtrip() {
        let backend = MockBackend::healthy();
        let storage_ref = backend
            .upload("parts/1_a.jpg", vec![0u8; 16], "image/jpeg", Metadata::new())
            .await
            .unwrap();

        let url = backend.public_url(&storage_ref);
        assert!(url.contains("parts%2F1_a.jpg"));

        BlobStore::delete(&backend, &storage_ref).await.unwrap();
        assert_eq!(backend.deleted_blobs(), vec!["parts/1_a.jpg".to_string()]);
    }
}
