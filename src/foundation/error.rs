/// Convenience result type used across phasewarp.
pub type PhasewarpResult<T> = Result<T, PhasewarpError>;

/// Top-level error taxonomy used by library APIs.
///
/// The interactive session itself never fails a tick; these errors come from entry points that
/// accept external data (configuration, pixel buffers, decoder and encoder processes).
#[derive(thiserror::Error, Debug)]
pub enum PhasewarpError {
    /// Invalid user-provided configuration or buffer geometry.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while sampling or decoding frames from a video source.
    #[error("capture error: {0}")]
    Capture(String),

    /// Errors while evaluating or compositing a frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PhasewarpError {
    /// Build a [`PhasewarpError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PhasewarpError::Capture`] value.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`PhasewarpError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`PhasewarpError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
