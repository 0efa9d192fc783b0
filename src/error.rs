use thiserror::Error;

/// Per-frame failures. All of them are recoverable: the frame is dropped or
/// left unrendered and the next frame is processed normally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("invalid observation: expected {expected} landmarks, got {actual}")]
    InvalidObservation { expected: usize, actual: usize },

    #[error("invalid observation: {0}")]
    DegenerateGeometry(&'static str),

    #[error("render surface unavailable")]
    SurfaceUnavailable,
}

impl FrameError {
    /// True for malformed landmark input, as opposed to a missing surface.
    pub fn is_invalid_observation(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidObservation { .. } | FrameError::DegenerateGeometry(_)
        )
    }
}

pub type FrameResult<T> = std::result::Result<T, FrameError>;
