use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    #[error("Decompression error")]
    Decompression,

    #[error("Corrupted data: {0}")]
    Corrupted(String),

    #[error("Version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Checksum mismatch")]
    ChecksumMismatch,
}

impl StoreError {
    /// The stored bytes exist but cannot be turned back into a session.
    pub fn is_corruption(&self) -> bool {
        match self {
            StoreError::Io(_) => false,
            StoreError::Serialization(_) => false,
            StoreError::Json(_) => true,
            StoreError::Deserialization(_) => true,
            StoreError::Decompression => true,
            StoreError::Corrupted(_) => true,
            StoreError::VersionMismatch { .. } => true,
            StoreError::ChecksumMismatch => true,
        }
    }
}
