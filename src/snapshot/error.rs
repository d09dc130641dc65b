//! Snapshot error types.

use thiserror::Error;

/// Errors that can occur during snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Serialization to JSON failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Snapshot version is not supported by this version
    #[error("Unsupported snapshot version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}
