/// Convenience result type used across glyphcast.
pub type GlyphcastResult<T> = Result<T, GlyphcastError>;

/// Top-level error taxonomy used by conversion and cache APIs.
#[derive(thiserror::Error, Debug)]
pub enum GlyphcastError {
    /// Invalid caller-provided data (image dimensions, pixel buffers, field overflow).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Persisted cache bytes are malformed (bad magic, truncation, length mismatch).
    #[error("corrupt cache: {0}")]
    CorruptCache(String),

    /// Persisted cache carries a format version this build does not read.
    #[error("unsupported cache version: {0}")]
    UnsupportedVersion(u8),

    /// Filesystem failure while reading, writing or deleting cache files.
    #[error("io error: {context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Errors when serializing or deserializing settings and reports.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlyphcastError {
    /// Build a [`GlyphcastError::InvalidInput`] value.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`GlyphcastError::CorruptCache`] value.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptCache(msg.into())
    }

    /// Build a [`GlyphcastError::Io`] value.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Build a [`GlyphcastError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
