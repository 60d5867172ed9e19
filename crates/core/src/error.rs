/// Result alias that carries the custom [`ChordDiagramError`] type.
pub type Result<T> = std::result::Result<T, ChordDiagramError>;

/// Common error type for the core crate.
///
/// Problems with individual finger placements are not errors: they are
/// recorded as [`crate::Diagnostic`] values and rendering continues.
#[derive(Debug, thiserror::Error)]
pub enum ChordDiagramError {
    /// Free-form message for failures without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Input that cannot be processed at all, such as an empty timeline.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed configuration or song JSON.
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    /// An export run was cancelled before it completed.
    #[error("export cancelled")]
    Cancelled,
}

impl ChordDiagramError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for ChordDiagramError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ChordDiagramError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
