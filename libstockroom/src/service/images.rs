//! Image transfer actions
//!
//! Upload is a normal failing action; deletion is fire-and-forget. An image
//! cleanup failure is logged at warn level and never surfaces to callers, so
//! it cannot block a part delete or update flow.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, warn};

use crate::backend::{BlobStore, Metadata, StorageRef};
use crate::error::{Result, StockroomError, StorageError};
use crate::store::{Store, Transition};
use crate::Config;

const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Clone)]
pub struct ImageService {
    store: Store,
    blobs: Arc<dyn BlobStore>,
    config: Arc<Config>,
}

impl ImageService {
    pub fn new(store: Store, blobs: Arc<dyn BlobStore>, config: Arc<Config>) -> Self {
        Self {
            store,
            blobs,
            config,
        }
    }

    /// Upload a local image and return its public download URL.
    ///
    /// Requires an authenticated user. The storage key is current millis plus
    /// a random suffix under the configured prefix; uploads carry the
    /// uploader identity and upload time as custom metadata.
    pub async fn upload(&self, local_path: &Path) -> Result<String> {
        let result = self.upload_inner(local_path).await;
        result.map_err(|err| {
            warn!(error = %err, path = %local_path.display(), "image upload failed");
            self.store
                .dispatch(Transition::SetError(Some(upload_message(&err))));
            err
        })
    }

    async fn upload_inner(&self, local_path: &Path) -> Result<String> {
        let user = self.store.user().ok_or(StockroomError::NotAuthenticated)?;

        let now = Utc::now();
        let key = format!(
            "{}/{}_{}.jpg",
            self.config.backend.storage_prefix,
            now.timestamp_millis(),
            random_suffix()
        );

        let bytes = tokio::fs::read(local_path).await.map_err(|err| {
            StockroomError::InvalidInput(format!("Failed to read image: {err}"))
        })?;
        if bytes.is_empty() {
            return Err(StockroomError::InvalidInput(
                "Image is empty or corrupt".to_string(),
            ));
        }

        let mut metadata = Metadata::new();
        metadata.insert("uploadedBy".to_string(), user.uid);
        metadata.insert("uploadedAt".to_string(), now.to_rfc3339());

        debug!(key = %key, bytes = bytes.len(), "uploading image");
        let storage_ref = self
            .blobs
            .upload(&key, bytes, IMAGE_CONTENT_TYPE, metadata)
            .await?;
        Ok(self.blobs.public_url(&storage_ref))
    }

    /// Delete an uploaded image by its download URL. Fire-and-forget:
    /// silently no-ops on URLs outside the configured storage base and
    /// swallows every backend failure.
    pub async fn delete(&self, url: &str) {
        let Some(key) = storage_key_from_url(url, &self.config.backend.storage_public_base)
        else {
            debug!(url, "ignoring image URL outside the configured storage base");
            return;
        };

        if let Err(err) = self.blobs.delete(&StorageRef::new(key)).await {
            warn!(error = %err, url, "failed to delete image");
        }
    }
}

/// Recover the storage key from a download URL of the expected shape
/// (`<base>/o/<percent-encoded key>?...`). Returns `None` for anything else.
pub(crate) fn storage_key_from_url(url: &str, public_base: &str) -> Option<String> {
    if !url.starts_with(public_base) {
        return None;
    }
    let path_start = url.find("/o/")? + 3;
    let path_end = url[path_start..].find('?')? + path_start;
    Some(url[path_start..path_end].replace("%2F", "/"))
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

fn upload_message(error: &StockroomError) -> String {
    match error {
        StockroomError::NotAuthenticated => "Not authenticated".to_string(),
        StockroomError::Storage(StorageError::Unauthorized) => {
            "You do not have permission to upload images".to_string()
        }
        StockroomError::Storage(StorageError::Canceled) => "Image upload canceled".to_string(),
        StockroomError::Storage(StorageError::Unknown) => {
            "Unknown storage error. Check your connection".to_string()
        }
        StockroomError::Storage(StorageError::InvalidFormat) => "Invalid image format".to_string(),
        StockroomError::Storage(StorageError::InvalidArgument) => "Invalid image data".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://storage.example.com/v0/b/stockroom";

    #[test]
    fn test_storage_key_from_url_recovers_key() {
        let url = format!("{BASE}/o/parts%2F1717000000_ab12cd.jpg?alt=media");
        assert_eq!(
            storage_key_from_url(&url, BASE),
            Some("parts/1717000000_ab12cd.jpg".to_string())
        );
    }

    #[test]
    fn test_storage_key_from_url_rejects_foreign_host() {
        let url = "https://elsewhere.example.com/o/parts%2Fx.jpg?alt=media";
        assert_eq!(storage_key_from_url(url, BASE), None);
    }

    #[test]
    fn test_storage_key_from_url_requires_object_path_and_query() {
        let missing_path = format!("{BASE}/parts%2Fx.jpg?alt=media");
        assert_eq!(storage_key_from_url(&missing_path, BASE), None);

        let missing_query = format!("{BASE}/o/parts%2Fx.jpg");
        assert_eq!(storage_key_from_url(&missing_query, BASE), None);
    }

    #[test]
    fn test_random_suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(suffix, suffix.to_lowercase());

        // Collision resistance is probabilistic; two equal draws are
        // astronomically unlikely.
        assert_ne!(random_suffix(), random_suffix());
    }

    #[test]
    fn test_upload_messages_per_kind() {
        assert!(upload_message(&StockroomError::Storage(StorageError::Unauthorized))
            .contains("permission"));
        assert_eq!(
            upload_message(&StockroomError::Storage(StorageError::Canceled)),
            "Image upload canceled"
        );
        assert_eq!(
            upload_message(&StockroomError::Storage(StorageError::InvalidFormat)),
            "Invalid image format"
        );
        let raw = StockroomError::Storage(StorageError::Backend("bucket gone".to_string()));
        assert!(upload_message(&raw).contains("bucket gone"));
    }
}
