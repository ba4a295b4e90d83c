//! Error types for preprocessing and inference.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of every [`Error`].
///
/// Callers only ever need to tell a missing file apart from anything else
/// that went wrong while decoding or running the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    ProcessingFailure,
}

#[derive(Error, Debug)]
pub enum Error {
    /// The image path does not exist.
    #[error("image not found: {path:?}")]
    NotFound { path: PathBuf },

    /// The image path exists but could not be read.
    #[error("failed to read image from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading an in-memory or streamed upload failed.
    #[error("failed to read image stream: {0}")]
    Stream(#[source] std::io::Error),

    /// The bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The image decoded but has no pixels.
    #[error("decoded image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("model file not found: {path:?}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load ONNX model {path:?}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    #[error("tensor shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("model inference failed: {0}")]
    Inference(#[source] ort::Error),

    #[error("model returned no usable class scores")]
    EmptyOutput,

    #[error("session mutex poisoned")]
    SessionPoisoned,

    #[error("failed to load labels from {path:?}: {source}")]
    Labels {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } | Error::ModelNotFound { .. } => ErrorKind::FileNotFound,
            Error::Labels { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::FileNotFound
            }
            _ => ErrorKind::ProcessingFailure,
        }
    }

    /// Short, stable name of the variant, used as a metrics attribute.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Io { .. } => "io",
            Error::Stream(_) => "stream",
            Error::Decode(_) => "decode",
            Error::EmptyImage { .. } => "empty_image",
            Error::ModelNotFound { .. } => "model_not_found",
            Error::ModelLoad { .. } => "model_load",
            Error::ShapeMismatch { .. } => "shape_mismatch",
            Error::Inference(_) => "inference",
            Error::EmptyOutput => "empty_output",
            Error::SessionPoisoned => "session_poisoned",
            Error::Labels { .. } => "labels",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_are_file_not_found() {
        let err = Error::NotFound {
            path: PathBuf::from("invalid/path/to/image.jpeg"),
        };
        assert_eq!(err.kind(), ErrorKind::FileNotFound);

        let err = Error::Labels {
            path: PathBuf::from("labels.txt"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn test_everything_else_is_processing_failure() {
        let errors = [
            Error::Stream(std::io::Error::from(std::io::ErrorKind::UnexpectedEof)),
            Error::EmptyImage {
                width: 0,
                height: 0,
            },
            Error::ShapeMismatch {
                expected: vec![1, 224, 224, 3],
                actual: vec![1, 3, 224, 224],
            },
            Error::EmptyOutput,
            Error::SessionPoisoned,
        ];

        for err in errors {
            assert_eq!(err.kind(), ErrorKind::ProcessingFailure, "{}", err);
        }
    }
}
