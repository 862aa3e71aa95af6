/// Result alias used across the crate.
pub type BlackboxResult<T> = Result<T, BlackboxError>;

/// Error type for telemetry loading, rendering and export.
#[derive(thiserror::Error, Debug)]
pub enum BlackboxError {
    /// Invalid caller-provided input (dimensions, frame rates, paths, ranges).
    #[error("validation error: {0}")]
    Validation(String),

    /// Telemetry could not be loaded or is inconsistent.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Rasterization failed.
    #[error("render error: {0}")]
    Render(String),

    /// An output sink or background video failed.
    #[error("export error: {0}")]
    Export(String),

    /// Configuration (graphs, layout, presets) could not be parsed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other failure, usually I/O with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BlackboxError {
    /// Build a [`BlackboxError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BlackboxError::Telemetry`].
    pub fn telemetry(msg: impl Into<String>) -> Self {
        Self::Telemetry(msg.into())
    }

    /// Build a [`BlackboxError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`BlackboxError::Export`].
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`BlackboxError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for BlackboxError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
