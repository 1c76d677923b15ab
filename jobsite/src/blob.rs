//! Storage of uploaded files. Only the metadata of a document lives in the database;
//! the bytes are handed to a `BlobStore` which returns the public url.
use crate::error::JobsiteError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use lazy_static::lazy_static;
use log::debug;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBlob {
    pub key: String,
    pub url: String,
    pub size: usize,
    pub content_type: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key`, replacing any previous content
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredBlob, JobsiteError>;

    /// Returns `false` if there was nothing stored under `key`
    async fn delete(&self, key: &str) -> Result<bool, JobsiteError>;

    /// The key of a url returned by `put`, `None` for urls pointing elsewhere
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// Keeps blobs as plain files below `root`
pub struct FileSystemBlobStore {
    root: PathBuf,
    public_base_url: Url,
}

impl FileSystemBlobStore {
    /// # Errors
    /// Returns `JobsiteError::InvalidUrl` if the base url does not parse
    pub fn new(root: &Path, public_base_url: &str) -> Result<Self, JobsiteError> {
        Ok(FileSystemBlobStore {
            root: root.to_path_buf(),
            public_base_url: Url::parse(public_base_url)?,
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, JobsiteError> {
        if !is_safe_key(key) {
            return Err(JobsiteError::BlobStore(format!("Invalid blob key '{key}'")));
        }
        Ok(key.split('/').fold(self.root.clone(), |path, part| path.join(part)))
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl BlobStore for FileSystemBlobStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredBlob, JobsiteError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            JobsiteError::BlobStore(format!("Unable to write {}: {e}", path.display()))
        })?;
        debug!("Stored {} bytes in {}", bytes.len(), path.display());
        Ok(StoredBlob {
            key: key.to_string(),
            url: self.url_for(key),
            size: bytes.len(),
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<bool, JobsiteError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        let base = format!("{}/", self.public_base_url.as_str().trim_end_matches('/'));
        url.strip_prefix(&base)
            .filter(|key| is_safe_key(key))
            .map(str::to_string)
    }
}

/// Keys are `/` separated segments of ascii letters, digits, `.`, `_` and `-`,
/// none of them starting with a dot.
fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && !segment.starts_with('.')
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        })
}

/// Creates a unique key below `prefix`, keeping a sane extension from the file name
/// or deriving one from the content type.
#[must_use]
pub fn generate_key(prefix: &str, file_name: Option<&str>, content_type: &str) -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    let stem = format!("{}-{}", Utc::now().format("%Y%m%d%H%M%S"), random.to_lowercase());
    match extension_for(file_name, content_type) {
        Some(ext) => format!("{prefix}/{stem}.{ext}"),
        None => format!("{prefix}/{stem}"),
    }
}

fn extension_for(file_name: Option<&str>, content_type: &str) -> Option<String> {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });
    from_name.or_else(|| {
        let ext = match content_type {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "application/pdf" => "pdf",
            "text/plain" => "txt",
            _ => return None,
        };
        Some(ext.to_string())
    })
}

/// Decodes a `data:image/png;base64,...` or `data:image/jpeg;base64,...` url into
/// its content type and bytes.
///
/// # Errors
/// Returns `JobsiteError::BadInput` for other media types, malformed urls and
/// invalid or empty base64 content
#[allow(clippy::missing_panics_doc)]
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>), JobsiteError> {
    lazy_static! {
        static ref DATA_URL: Regex =
            Regex::new(r"^data:(image/(?:png|jpeg));base64,([A-Za-z0-9+/=\s]+)$").unwrap();
    }
    let captures = DATA_URL.captures(data_url.trim()).ok_or_else(|| {
        JobsiteError::BadInput("Expected a base64 encoded png or jpeg data url".to_string())
    })?;
    let content_type = captures[1].to_string();
    let encoded: String = captures[2].chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| JobsiteError::BadInput(format!("Invalid base64 content: {e}")))?;
    if bytes.is_empty() {
        return Err(JobsiteError::BadInput("The data url is empty".to_string()));
    }
    Ok((content_type, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_keys() {
        assert!(is_safe_key("1/20240304-abc.png"));
        assert!(!is_safe_key("../etc/passwd"));
        assert!(!is_safe_key("1//x"));
        assert!(!is_safe_key("1/.hidden"));
        assert!(!is_safe_key("a b"));
        assert!(!is_safe_key(""));
    }

    #[test]
    fn test_generate_key_extension() {
        let key = generate_key("7", Some("Site Plan.PDF"), "application/octet-stream");
        assert!(key.starts_with("7/"));
        assert!(key.ends_with(".pdf"));
        assert!(is_safe_key(&key));

        let key = generate_key("7", Some("no-extension"), "image/png");
        assert!(key.ends_with(".png"));

        let key = generate_key("7", None, "application/zip");
        assert!(!key.contains('.'));
    }

    #[test]
    fn test_decode_data_url() -> Result<(), JobsiteError> {
        let encoded = STANDARD.encode(b"\x89PNG fake");
        let (content_type, bytes) = decode_data_url(&format!("data:image/png;base64,{encoded}"))?;
        assert_eq!(content_type, "image/png");
        assert_eq!(bytes, b"\x89PNG fake");

        assert!(decode_data_url("data:image/gif;base64,R0lGOD").is_err());
        assert!(decode_data_url("data:image/png;base64,!!!").is_err());
        assert!(decode_data_url("https://example.com/a.png").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_file_system_store() -> Result<(), JobsiteError> {
        let dir = tempfile::tempdir()?;
        let store = FileSystemBlobStore::new(dir.path(), "http://localhost:4000/files/")?;

        let blob = store.put("3/hello.txt", "text/plain", b"hello").await?;
        assert_eq!(blob.url, "http://localhost:4000/files/3/hello.txt");
        assert_eq!(blob.size, 5);
        assert_eq!(std::fs::read(dir.path().join("3").join("hello.txt"))?, b"hello");

        assert_eq!(store.key_for_url(&blob.url), Some("3/hello.txt".to_string()));
        assert_eq!(store.key_for_url("https://elsewhere.example/3/hello.txt"), None);
        assert_eq!(store.key_for_url("http://localhost:4000/files/../secret"), None);

        assert!(store.delete("3/hello.txt").await?);
        assert!(!store.delete("3/hello.txt").await?);
        assert!(store.put("../escape.txt", "text/plain", b"x").await.is_err());
        Ok(())
    }
}
