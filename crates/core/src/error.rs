use std::path::PathBuf;
use thiserror::Error;

/// Result type for keyhoist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for keyhoist operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source file could not be read or parsed
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Two distinct keys normalize to the same identifier
    #[error("Identifier collision: '{identifier}' is produced by both '{first}' and '{second}'")]
    IdentifierCollision {
        identifier: String,
        first: String,
        second: String,
    },

    /// Registry or caption endpoint failures
    #[error("Network error: {0}")]
    Network(String),

    /// Spreadsheet output failures
    #[error("Report error: {0}")]
    Report(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a parse error
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Creates a parse error for a path on disk
    pub fn parse_path(file: &std::path::Path, message: impl Into<String>) -> Self {
        Self::parse(file.display().to_string(), message)
    }

    /// Creates an identifier collision error
    pub fn collision(
        identifier: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::IdentifierCollision {
            identifier: identifier.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Creates a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Creates a report error
    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report(msg.into())
    }

    /// Creates an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Adds context to any error
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Wraps an I/O error with the path it happened on
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        Self::with_context(format!("{}", path.display()), source)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::with_context(context, e))
    }
}
