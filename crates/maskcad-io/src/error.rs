//! Errors from reading and writing files.

use std::path::PathBuf;

use maskcad_pipeline::{FailedStage, InputError, MaskError, MaskErrorKind};

/// A file could not be read, decoded or written.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Opening, reading or writing a file failed.
    #[error("{}: {source}", path.display())]
    File {
        /// The file involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A mask image could not be decoded.
    #[error("{}: failed to decode image: {source}", path.display())]
    Decode {
        /// The image file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: image::ImageError,
    },

    /// A JSON document is malformed.
    #[error("{}: invalid JSON: {source}", path.display())]
    Json {
        /// The JSON file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A decoded mask was rejected.
    #[error("{}: {source}", path.display())]
    Mask {
        /// The image file.
        path: PathBuf,
        /// Why the mask is invalid.
        #[source]
        source: InputError,
    },

    /// A manifest is well-formed JSON but semantically invalid.
    #[error("{}: {reason}", path.display())]
    Manifest {
        /// The manifest file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },
}

impl IoError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

/// A mask file that cannot be loaded fails only its own slot in a batch.
impl From<IoError> for MaskError {
    fn from(error: IoError) -> Self {
        Self::new(FailedStage::Load, MaskErrorKind::Unreadable(error.to_string()))
    }
}
