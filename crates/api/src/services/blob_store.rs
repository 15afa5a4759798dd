use async_trait::async_trait;
use domain::services::{BlobStore, CollaboratorError};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Filesystem-backed blob store. Locations are paths relative to the
/// configured root so the root can move without rewriting rows.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, location: &str) -> Result<PathBuf, CollaboratorError> {
        // Reject traversal; stored locations are always flat names.
        let path = Path::new(location);
        if path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(CollaboratorError::Storage(format!(
                "invalid blob location: {location}"
            )));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, CollaboratorError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CollaboratorError::Storage(e.to_string()))?;

        let safe_name: String = file_name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let location = format!("{}_{}", Uuid::new_v4(), safe_name);

        let path = self.resolve(&location)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CollaboratorError::Storage(e.to_string()))?;
        Ok(location)
    }

    async fn read(&self, location: &str) -> Result<Vec<u8>, CollaboratorError> {
        let path = self.resolve(location)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CollaboratorError::NotFound(location.to_string()))
            }
            Err(e) => Err(CollaboratorError::Storage(e.to_string())),
        }
    }

    async fn delete(&self, location: &str) -> Result<(), CollaboratorError> {
        let path = self.resolve(location)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CollaboratorError::Storage(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_read_delete_round_trip() {
        let dir = std::env::temp_dir().join(format!("blob-test-{}", Uuid::new_v4()));
        let store = LocalBlobStore::new(&dir);

        let location = store.save("lesson 1.pdf", b"%PDF-1.4").await.unwrap();
        assert!(!location.contains(' '));

        let bytes = store.read(&location).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4");

        store.delete(&location).await.unwrap();
        assert!(matches!(
            store.read(&location).await,
            Err(CollaboratorError::NotFound(_))
        ));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_traversal_locations_are_rejected() {
        let store = LocalBlobStore::new("/tmp/blobs");
        assert!(store.read("../etc/passwd").await.is_err());
        assert!(store.read("/etc/passwd").await.is_err());
    }
}
