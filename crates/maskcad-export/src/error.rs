//! Error types for document assembly and batch export.

use maskcad_pipeline::ConfigError;

/// The document could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// The requested DXF version is not one of the supported releases.
    #[error("unsupported DXF version {0:?} (expected one of R12, R2000, R2010, R2018)")]
    UnsupportedVersion(String),

    /// Writing the serialized bytes failed.
    #[error("failed to write DXF output: {0}")]
    Io(#[from] std::io::Error),
}

/// A whole export run failed. Per-mask failures never surface here;
/// they are recorded in the [`ExportReport`](crate::ExportReport).
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Pipeline configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Version selection or serialization failed.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
