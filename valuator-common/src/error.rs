//! Error types for the valuator workspace.

use thiserror::Error;

/// Result type alias using the workspace error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for configuration and I/O plumbing.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration failed validation
    #[error(transparent)]
    Validation(#[from] crate::validation::ValidationError),

    /// Other error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error was caused by a configuration the user must fix.
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::Validation(_) => true,
            Self::WithContext { source, .. } => source.is_user_error(),
            _ => false,
        }
    }

    /// Process exit code for this error when surfaced by a binary.
    pub fn exit_code(&self) -> i32 {
        if self.is_user_error() {
            2
        } else {
            1
        }
    }
}

/// Extension trait for adding context to any error type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}
