//! Contracts for external collaborators: file persistence, OTP delivery
//! and PDF watermarking. Implementations live at the API layer and are
//! injected into services, which keeps the domain free of I/O details.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("watermarking failed: {0}")]
    Watermark(String),
}

/// File persistence, swappable between local filesystem and object
/// storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persists the bytes and returns an opaque location string.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, CollaboratorError>;

    async fn read(&self, location: &str) -> Result<Vec<u8>, CollaboratorError>;

    async fn delete(&self, location: &str) -> Result<(), CollaboratorError>;
}

/// Best-effort OTP delivery. Returns whether the send was accepted;
/// failure degrades to logging outside production.
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, mobile: &str, code: &str) -> bool;
}

/// Pure PDF transform stamping a per-download identifier into the
/// document. No state.
pub trait Watermarker: Send + Sync {
    fn stamp(&self, pdf: &[u8], identifier: &str) -> Result<Vec<u8>, CollaboratorError>;
}
