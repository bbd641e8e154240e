use thiserror::Error;

/// Failures that abort an edit before any grid is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorridorError {
    /// Missing or incompatible input (shape mismatch, invalid option, too few
    /// control points).
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Geometry that leaves nothing to edit, such as a zero-length curve.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

impl CorridorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry(message.into())
    }
}

pub type CorridorResult<T> = Result<T, CorridorError>;
