use crate::auth::Principal;
use crate::blob::{decode_data_url, generate_key, BlobStore, StoredBlob};
use crate::error::JobsiteError;
use log::{debug, info};
use std::sync::Arc;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Hands uploaded files and drawn signatures to the blob store, one folder per company
pub struct UploadService {
    store: Arc<dyn BlobStore>,
    max_upload_bytes: usize,
}

impl UploadService {
    pub fn new(store: Arc<dyn BlobStore>, max_upload_bytes: usize) -> Self {
        Self {
            store,
            max_upload_bytes,
        }
    }

    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// # Errors
    /// `BadInput` for an empty file, `PayloadTooLarge` beyond the configured limit
    /// and `BlobStore` if the bytes could not be written
    pub async fn upload(
        &self,
        principal: &Principal,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredBlob, JobsiteError> {
        self.check_size(bytes.len())?;
        let content_type = content_type
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE);
        let key = generate_key(
            &principal.company_id().to_string(),
            file_name,
            content_type,
        );
        let stored = self.store.put(&key, content_type, bytes).await?;
        info!("Uploaded {} ({} bytes)", stored.key, stored.size);
        Ok(stored)
    }

    /// Stores a signature captured as a png or jpeg data url
    ///
    /// # Errors
    /// `BadInput` for anything but a base64 png or jpeg data url
    pub async fn upload_signature(
        &self,
        principal: &Principal,
        data_url: &str,
    ) -> Result<StoredBlob, JobsiteError> {
        let (content_type, bytes) = decode_data_url(data_url)?;
        self.check_size(bytes.len())?;
        let key = generate_key(
            &format!("{}/signatures", principal.company_id()),
            None,
            &content_type,
        );
        self.store.put(&key, &content_type, &bytes).await
    }

    /// Deletes the stored file behind `url` when it belongs to the caller's company.
    /// Urls pointing outside the store or into another company are left alone.
    ///
    /// # Errors
    /// `BlobStore` or `Io` if the file could not be removed
    pub async fn remove(&self, principal: &Principal, url: &str) -> Result<bool, JobsiteError> {
        let Some(key) = self.store.key_for_url(url) else {
            return Ok(false);
        };
        if !key.starts_with(&format!("{}/", principal.company_id())) {
            debug!("Not removing {key}, it belongs to another company");
            return Ok(false);
        }
        let removed = self.store.delete(&key).await?;
        if removed {
            info!("Removed {key}");
        }
        Ok(removed)
    }

    fn check_size(&self, size: usize) -> Result<(), JobsiteError> {
        if size == 0 {
            return Err(JobsiteError::BadInput("The file is empty".to_string()));
        }
        if size > self.max_upload_bytes {
            return Err(JobsiteError::PayloadTooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }
        Ok(())
    }
}
