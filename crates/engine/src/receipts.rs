//! Receipt uploads and the storage capability the expense ledger writes to.
//!
//! The engine never talks to a disk or bucket directly: it is handed an
//! `Arc<dyn ReceiptStore>` at build time. Uploads are validated before the
//! store or the database are touched.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Upper bound for a single receipt (5 MB).
pub const MAX_RECEIPT_BYTES: usize = 5 * 1024 * 1024;

/// Content types accepted for receipts.
pub const ALLOWED_RECEIPT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

/// A receipt file as received from the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ReceiptUpload {
    pub fn validate(&self) -> ResultEngine<()> {
        if self.bytes.is_empty() {
            return Err(EngineError::InvalidArgument(
                "receipt file is empty".to_string(),
            ));
        }
        if self.bytes.len() > MAX_RECEIPT_BYTES {
            return Err(EngineError::InvalidArgument(format!(
                "receipt exceeds {} bytes",
                MAX_RECEIPT_BYTES
            )));
        }
        let content_type = self.content_type.trim().to_lowercase();
        if !ALLOWED_RECEIPT_TYPES.contains(&content_type.as_str()) {
            return Err(EngineError::InvalidArgument(
                "only JPG, PNG, or PDF receipts are allowed".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
pub trait ReceiptStore: Send + Sync + std::fmt::Debug {
    /// Persist the receipt and return a handle a client can resolve later.
    async fn put(&self, upload: &ReceiptUpload) -> ResultEngine<String>;

    /// Remove a previously stored receipt. Unknown handles are ignored.
    async fn remove(&self, handle: &str) -> ResultEngine<()>;
}

/// Stores receipts as files in one directory.
///
/// Handles look like `{public_prefix}/{uuid}-{sanitized name}`.
#[derive(Clone, Debug)]
pub struct DiskReceiptStore {
    root: PathBuf,
    public_prefix: String,
}

impl DiskReceiptStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_name_for(&self, handle: &str) -> Option<String> {
        let name = handle.strip_prefix(&self.public_prefix)?.trim_start_matches('/');
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return None;
        }
        Some(name.to_string())
    }
}

fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "receipt".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl ReceiptStore for DiskReceiptStore {
    async fn put(&self, upload: &ReceiptUpload) -> ResultEngine<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| EngineError::Storage(err.to_string()))?;

        let stored = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(&upload.file_name));
        tokio::fs::write(self.root.join(&stored), &upload.bytes)
            .await
            .map_err(|err| EngineError::Storage(err.to_string()))?;

        tracing::debug!("stored receipt {stored} ({} bytes)", upload.bytes.len());
        Ok(format!("{}/{stored}", self.public_prefix))
    }

    async fn remove(&self, handle: &str) -> ResultEngine<()> {
        let Some(name) = self.file_name_for(handle) else {
            return Ok(());
        };
        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(EngineError::Storage(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, len: usize) -> ReceiptUpload {
        ReceiptUpload {
            file_name: "fuel.pdf".to_string(),
            content_type: content_type.to_string(),
            bytes: vec![1; len],
        }
    }

    #[test]
    fn accepts_allowed_types_within_limit() {
        for ty in ALLOWED_RECEIPT_TYPES {
            assert!(upload(ty, 10).validate().is_ok());
        }
        assert!(upload("IMAGE/PNG", MAX_RECEIPT_BYTES).validate().is_ok());
    }

    #[test]
    fn rejects_oversized_or_disallowed() {
        assert!(upload("image/png", MAX_RECEIPT_BYTES + 1).validate().is_err());
        assert!(upload("image/gif", 10).validate().is_err());
        assert!(upload("application/pdf", 0).validate().is_err());
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my receipt (1).png"), "my_receipt__1_.png");
        assert_eq!(sanitize_file_name(".."), "receipt");
    }

    #[tokio::test]
    async fn disk_store_round_trip() {
        let root = std::env::temp_dir().join(format!("receipts-{}", Uuid::new_v4()));
        let store = DiskReceiptStore::new(&root, "/receipts/");

        let handle = store.put(&upload("application/pdf", 4)).await.unwrap();
        assert!(handle.starts_with("/receipts/"));
        let name = store.file_name_for(&handle).unwrap();
        assert_eq!(tokio::fs::read(root.join(&name)).await.unwrap(), vec![1; 4]);

        store.remove(&handle).await.unwrap();
        assert!(!root.join(&name).exists());
        store.remove(&handle).await.unwrap();
        store.remove("/elsewhere/../x").await.unwrap();

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
