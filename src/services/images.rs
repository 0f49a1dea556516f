use crate::errors::ServiceError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Public URL prefix under which stored product images are served.
pub const PUBLIC_IMAGE_PREFIX: &str = "/uploads/products";

const PRODUCTS_SUBDIR: &str = "products";

/// Filesystem store for uploaded product images.
///
/// Files are written under `<root>/products/` with generated names; the
/// catalog only ever records the public `/uploads/products/...` path.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn products_dir(&self) -> PathBuf {
        self.root.join(PRODUCTS_SUBDIR)
    }

    /// Maps an upload content type to a file extension. Only common raster
    /// image formats are accepted.
    fn extension_for(content_type: &str) -> Result<&'static str, ServiceError> {
        match content_type {
            "image/jpeg" => Ok("jpg"),
            "image/png" => Ok("png"),
            "image/webp" => Ok("webp"),
            other => Err(ServiceError::ValidationError(format!(
                "Unsupported image content type: {}",
                other
            ))),
        }
    }

    /// Creates the storage directories if missing. Called once at startup.
    pub async fn ensure_dirs(&self) -> Result<(), ServiceError> {
        tokio::fs::create_dir_all(self.products_dir())
            .await
            .map_err(|e| {
                ServiceError::InternalError(format!("Failed to create upload directory: {}", e))
            })
    }

    /// Persists an uploaded image and returns its public path.
    pub async fn save(&self, content_type: &str, bytes: &[u8]) -> Result<String, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::ValidationError(
                "Uploaded image is empty".to_string(),
            ));
        }

        let ext = Self::extension_for(content_type)?;
        let file_name = format!("{}.{}", Uuid::new_v4(), ext);
        let target = self.products_dir().join(&file_name);

        self.ensure_dirs().await?;
        tokio::fs::write(&target, bytes).await.map_err(|e| {
            ServiceError::InternalError(format!("Failed to store image {}: {}", file_name, e))
        })?;

        debug!(file = %file_name, size = bytes.len(), "Stored product image");
        Ok(format!("{}/{}", PUBLIC_IMAGE_PREFIX, file_name))
    }

    /// Best-effort removal of an image previously returned by `save`.
    ///
    /// Paths outside the store's public prefix are ignored, so externally
    /// hosted image URLs survive product deletion untouched.
    pub async fn delete_if_owned(&self, public_path: &str) {
        let Some(file_name) = public_path.strip_prefix(&format!("{}/", PUBLIC_IMAGE_PREFIX)) else {
            return;
        };
        // Reject anything that could escape the products directory
        if file_name.is_empty() || file_name.contains('/') || file_name.contains("..") {
            return;
        }

        let target = self.products_dir().join(file_name);
        if let Err(e) = tokio::fs::remove_file(&target).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %target.display(), error = %e, "Failed to remove product image");
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> ImageStore {
        let dir = std::env::temp_dir().join(format!("storefront-images-{}", Uuid::new_v4()));
        ImageStore::new(dir)
    }

    #[tokio::test]
    async fn saves_and_deletes_an_image() {
        let store = temp_store();
        let path = store
            .save("image/png", b"not-really-a-png")
            .await
            .expect("save should succeed");
        assert!(path.starts_with("/uploads/products/"));
        assert!(path.ends_with(".png"));

        let file_name = path.strip_prefix("/uploads/products/").unwrap();
        let on_disk = store.root().join("products").join(file_name);
        assert!(tokio::fs::metadata(&on_disk).await.is_ok());

        store.delete_if_owned(&path).await;
        assert!(tokio::fs::metadata(&on_disk).await.is_err());
    }

    #[tokio::test]
    async fn rejects_unsupported_content_type() {
        let store = temp_store();
        let result = store.save("application/pdf", b"%PDF-").await;
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn rejects_empty_upload() {
        let store = temp_store();
        let result = store.save("image/jpeg", b"").await;
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn ignores_paths_outside_the_store() {
        let store = temp_store();
        // Must be a no-op, not an error or a deletion attempt
        store.delete_if_owned("https://cdn.example.com/pic.png").await;
        store.delete_if_owned("/uploads/products/../secret").await;
    }
}
