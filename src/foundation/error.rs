/// Convenience result type used across onair.
pub type OnAirResult<T> = Result<T, OnAirError>;

/// Top-level error taxonomy used by studio APIs.
#[derive(thiserror::Error, Debug)]
pub enum OnAirError {
    /// Rejected mutation or invalid user-provided data. State is left untouched.
    #[error("validation error: {0}")]
    Validation(String),

    /// Device, capture or decode failures while acquiring source content.
    #[error("acquisition error: {0}")]
    Acquisition(String),

    /// Failures of the composite surface itself (allocation, context loss).
    #[error("render error: {0}")]
    Render(String),

    /// Malformed or unsupported control protocol messages.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Errors when serializing or deserializing profiles and messages.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OnAirError {
    /// Build a [`OnAirError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`OnAirError::Acquisition`] value.
    pub fn acquisition(msg: impl Into<String>) -> Self {
        Self::Acquisition(msg.into())
    }

    /// Build a [`OnAirError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`OnAirError::Protocol`] value.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Build a [`OnAirError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
