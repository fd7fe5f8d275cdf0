//! Error types for visual comparison.

use std::path::PathBuf;

use cdp_adapter::AdapterError;
use thiserror::Error;
use uitest_core_types::ToolFailure;

#[derive(Debug, Error)]
pub enum VisualError {
    #[error("screenshot capture failed: {0}")]
    Capture(#[from] AdapterError),

    #[error("image size {current_width}x{current_height} differs from baseline {baseline_width}x{baseline_height}")]
    DimensionMismatch {
        baseline_width: u32,
        baseline_height: u32,
        current_width: u32,
        current_height: u32,
    },

    #[error("image processing error: {0}")]
    ImageProcessing(String),

    #[error("no capture recorded for check '{0}'")]
    NoCurrentCapture(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("internal: {0}")]
    Internal(String),
}

impl VisualError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VisualError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<image::ImageError> for VisualError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing(err.to_string())
    }
}

impl From<VisualError> for ToolFailure {
    fn from(err: VisualError) -> Self {
        match err {
            VisualError::Capture(inner) => ToolFailure::from(inner),
            VisualError::DimensionMismatch { .. } | VisualError::NoCurrentCapture(_) => {
                ToolFailure::precondition(err.to_string())
            }
            VisualError::InvalidInput(_) => ToolFailure::invalid_input(err.to_string()),
            VisualError::ImageProcessing(_) | VisualError::Io { .. } | VisualError::Internal(_) => {
                ToolFailure::internal(err.to_string())
            }
        }
    }
}
