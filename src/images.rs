//! Image storage seam
//!
//! Managed blob storage stays an external collaborator; the self-hosted
//! default writes under the configured media directory, which the router
//! serves at `/media`.

use crate::error::AppError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores the bytes and returns the public URL to persist on the record.
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, AppError>;
    /// Removes previously stored images. Unknown URLs are ignored.
    async fn purge(&self, urls: &[String]) -> Result<(), AppError>;
}

pub struct FsImageStore {
    root: PathBuf,
    public_base: String,
}

impl FsImageStore {
    pub fn new(root: PathBuf, public_base: impl Into<String>) -> Self {
        Self { root, public_base: public_base.into() }
    }

    fn file_name_for(url: &str) -> Option<&str> {
        let name = url.rsplit("/media/").next()?;
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return None;
        }
        Some(name)
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, AppError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin");
        let name = format!("{}.{}", Uuid::new_v4(), extension);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Internal(format!("media dir: {e}")))?;
        tokio::fs::write(self.root.join(&name), bytes)
            .await
            .map_err(|e| AppError::Internal(format!("storing image: {e}")))?;

        Ok(format!("{}/media/{}", self.public_base.trim_end_matches('/'), name))
    }

    async fn purge(&self, urls: &[String]) -> Result<(), AppError> {
        for url in urls {
            let Some(name) = Self::file_name_for(url) else {
                tracing::warn!(url, "skipping purge of unrecognized image url");
                continue;
            };
            match tokio::fs::remove_file(self.root.join(name)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(AppError::Internal(format!("purging image: {e}"))),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FsImageStore {
        let root = std::env::temp_dir().join(format!("mayorista-test-{}", Uuid::new_v4()));
        FsImageStore::new(root, "http://localhost:8080")
    }

    #[tokio::test]
    async fn stores_and_purges() {
        let store = temp_store();
        let url = store.store("foto.png", b"not really a png").await.unwrap();
        assert!(url.starts_with("http://localhost:8080/media/"));
        assert!(url.ends_with(".png"));

        store.purge(&[url.clone()]).await.unwrap();
        // purging again is a no-op
        store.purge(&[url]).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_traversal_in_purge() {
        let store = temp_store();
        let outside = "http://localhost:8080/media/../../etc/passwd".to_string();
        // silently skipped, never an error touching a foreign path
        store.purge(&[outside]).await.unwrap();
    }

    #[test]
    fn odd_extensions_fall_back() {
        assert_eq!(
            Path::new("weird.name.tar.gz").extension().and_then(|e| e.to_str()),
            Some("gz")
        );
        assert!(FsImageStore::file_name_for("http://x/media/a.png").is_some());
        assert!(FsImageStore::file_name_for("http://x/other/a.png").is_none());
    }
}
