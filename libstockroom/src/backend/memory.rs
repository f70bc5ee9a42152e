//! In-memory reference backend
//!
//! Deterministic implementation of all three adapter traits. Used by the
//! integration tests and doc examples; also a faithful description of the
//! semantics a real adapter must provide (session watch fires on subscribe,
//! listing orders by field, deletes of missing blobs fail).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;
use uuid::Uuid;

use crate::backend::{AuthBackend, BlobStore, Document, DocumentStore, Fields, Metadata, StorageRef};
use crate::error::{AuthError, DataError, StorageError};
use crate::types::User;

const DEFAULT_PUBLIC_BASE: &str = "https://storage.example.com/v0/b/stockroom";

struct Account {
    uid: String,
    password: String,
}

struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
    metadata: Metadata,
}

/// In-memory backend implementing auth, documents and blobs.
pub struct MemoryBackend {
    accounts: Mutex<HashMap<String, Account>>,
    session: watch::Sender<Option<User>>,
    collections: Mutex<HashMap<String, Vec<Document>>>,
    blobs: Mutex<HashMap<String, StoredBlob>>,
    public_base: String,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_public_base(DEFAULT_PUBLIC_BASE)
    }

    pub fn with_public_base(public_base: impl Into<String>) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session,
            collections: Mutex::new(HashMap::new()),
            blobs: Mutex::new(HashMap::new()),
            public_base: public_base.into(),
        }
    }

    /// Push a session transition directly, bypassing sign-in/out. Lets tests
    /// simulate an externally lost or restored session.
    pub fn emit_session(&self, user: Option<User>) {
        let _ = self.session.send(user);
    }

    /// Number of stored blobs.
    pub fn blob_count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    /// Metadata recorded for a stored blob key.
    pub fn blob_metadata(&self, key: &str) -> Option<Metadata> {
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .map(|b| b.metadata.clone())
    }

    fn user_for(email: &str, uid: &str) -> User {
        User {
            uid: uid.to_string(),
            email: email.to_string(),
            display_name: None,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        let accounts = self.accounts.lock().unwrap();
        let account = accounts.get(email).ok_or(AuthError::UserNotFound)?;
        if account.password != password {
            return Err(AuthError::InvalidCredentials);
        }
        let user = Self::user_for(email, &account.uid);
        drop(accounts);
        let _ = self.session.send(Some(user));
        Ok(())
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if password.len() < 6 {
            return Err(AuthError::WeakPassword);
        }
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(AuthError::EmailInUse);
        }
        let uid = Uuid::new_v4().to_string();
        accounts.insert(
            email.to_string(),
            Account {
                uid: uid.clone(),
                password: password.to_string(),
            },
        );
        drop(accounts);
        // Account creation starts a session, like the real backend.
        let _ = self.session.send(Some(Self::user_for(email, &uid)));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let _ = self.session.send(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if !self.accounts.lock().unwrap().contains_key(email) {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    fn subscribe_sessions(&self) -> watch::Receiver<Option<User>> {
        self.session.subscribe()
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, DataError> {
        let id = Uuid::new_v4().to_string();
        let mut collections = self.collections.lock().unwrap();
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });
        Ok(id)
    }

    async fn list_all(
        &self,
        collection: &str,
        order_by: &str,
        descending: bool,
    ) -> Result<Vec<Document>, DataError> {
        let collections = self.collections.lock().unwrap();
        let mut documents = collections.get(collection).cloned().unwrap_or_default();
        documents.sort_by(|a, b| {
            let ordering = compare_values(a.fields.get(order_by), b.fields.get(order_by));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        Ok(documents)
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), DataError> {
        let mut collections = self.collections.lock().unwrap();
        let documents = collections
            .get_mut(collection)
            .ok_or(DataError::NotFound)?;
        let document = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(DataError::NotFound)?;
        for (key, value) in fields {
            document.fields.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DataError> {
        let mut collections = self.collections.lock().unwrap();
        if let Some(documents) = collections.get_mut(collection) {
            documents.retain(|d| d.id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBackend {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: Metadata,
    ) -> Result<StorageRef, StorageError> {
        self.blobs.lock().unwrap().insert(
            key.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
                metadata,
            },
        );
        Ok(StorageRef::new(key))
    }

    fn public_url(&self, storage_ref: &StorageRef) -> String {
        format!(
            "{}/o/{}?alt=media",
            self.public_base,
            encode_key(&storage_ref.key)
        )
    }

    async fn delete(&self, storage_ref: &StorageRef) -> Result<(), StorageError> {
        match self.blobs.lock().unwrap().remove(&storage_ref.key) {
            Some(_) => Ok(()),
            None => Err(StorageError::Unknown),
        }
    }
}

/// Path separators in a storage key are percent-encoded in the download URL.
fn encode_key(key: &str) -> String {
    key.replace('/', "%2F")
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(std::cmp::Ordering::Equal),
        _ => std::cmp::Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_account_then_sign_in() {
        let backend = MemoryBackend::new();
        let mut sessions = backend.subscribe_sessions();

        backend
            .create_account("user@example.com", "secret1")
            .await
            .unwrap();
        assert!(sessions.borrow_and_update().is_some());

        backend.sign_out().await.unwrap();
        backend.sign_in("user@example.com", "secret1").await.unwrap();
        let user = sessions.borrow_and_update().clone().unwrap();
        assert_eq!(user.email, "user@example.com");
    }

    #[tokio::test]
    async fn test_sign_in_error_kinds() {
        let backend = MemoryBackend::new();
        backend
            .create_account("user@example.com", "secret1")
            .await
            .unwrap();

        assert_eq!(
            backend.sign_in("nobody@example.com", "x").await.unwrap_err(),
            AuthError::UserNotFound
        );
        assert_eq!(
            backend.sign_in("user@example.com", "wrong").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            backend.sign_in("not-an-email", "x").await.unwrap_err(),
            AuthError::InvalidEmail
        );
    }

    #[tokio::test]
    async fn test_create_account_error_kinds() {
        let backend = MemoryBackend::new();
        backend
            .create_account("user@example.com", "secret1")
            .await
            .unwrap();

        assert_eq!(
            backend
                .create_account("user@example.com", "secret1")
                .await
                .unwrap_err(),
            AuthError::EmailInUse
        );
        assert_eq!(
            backend
                .create_account("new@example.com", "short")
                .await
                .unwrap_err(),
            AuthError::WeakPassword
        );
    }

    #[tokio::test]
    async fn test_password_reset_requires_known_account() {
        let backend = MemoryBackend::new();
        backend
            .create_account("user@example.com", "secret1")
            .await
            .unwrap();

        assert!(backend.send_password_reset("user@example.com").await.is_ok());
        assert_eq!(
            backend
                .send_password_reset("nobody@example.com")
                .await
                .unwrap_err(),
            AuthError::UserNotFound
        );
    }

    #[tokio::test]
    async fn test_list_all_orders_descending() {
        let backend = MemoryBackend::new();
        for stamp in ["2024-01-01T00:00:00+00:00", "2024-03-01T00:00:00+00:00", "2024-02-01T00:00:00+00:00"] {
            let mut fields = Fields::new();
            fields.insert("created_at".to_string(), json!(stamp));
            backend.insert("parts", fields).await.unwrap();
        }

        let documents = backend.list_all("parts", "created_at", true).await.unwrap();
        let stamps: Vec<&str> = documents
            .iter()
            .map(|d| d.fields["created_at"].as_str().unwrap())
            .collect();
        assert_eq!(
            stamps,
            vec![
                "2024-03-01T00:00:00+00:00",
                "2024-02-01T00:00:00+00:00",
                "2024-01-01T00:00:00+00:00"
            ]
        );
    }

    #[tokio::test]
    async fn test_update_fields_merges() {
        let backend = MemoryBackend::new();
        let mut fields = Fields::new();
        fields.insert("name".to_string(), json!("Oil filter"));
        fields.insert("quantity".to_string(), json!(5));
        let id = backend.insert("parts", fields).await.unwrap();

        let mut patch = Fields::new();
        patch.insert("quantity".to_string(), json!(9));
        backend.update_fields("parts", &id, patch).await.unwrap();

        let documents = backend.list_all("parts", "name", false).await.unwrap();
        assert_eq!(documents[0].fields["quantity"], json!(9));
        assert_eq!(documents[0].fields["name"], json!("Oil filter"));
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let backend = MemoryBackend::new();
        let err = backend
            .update_fields("parts", "missing", Fields::new())
            .await
            .unwrap_err();
        assert_eq!(err, DataError::NotFound);
    }

    #[tokio::test]
    async fn test_blob_upload_url_and_delete() {
        let backend = MemoryBackend::new();
        let storage_ref = backend
            .upload("parts/123_abc.jpg", vec![1, 2, 3], "image/jpeg", Metadata::new())
            .await
            .unwrap();

        let url = backend.public_url(&storage_ref);
        assert!(url.starts_with(DEFAULT_PUBLIC_BASE));
        assert!(url.contains("parts%2F123_abc.jpg"));
        assert!(url.ends_with("?alt=media"));

        BlobStore::delete(&backend, &storage_ref).await.unwrap();
        assert_eq!(backend.blob_count(), 0);

        // Deleting again fails; callers decide whether that matters.
        assert!(BlobStore::delete(&backend, &storage_ref).await.is_err());
    }
}
