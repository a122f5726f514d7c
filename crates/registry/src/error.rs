//! Error types for the registry and caption clients

use std::fmt;

/// Errors that can occur while talking to a remote endpoint
#[derive(Debug)]
pub enum RegistryError {
    /// The request could not be sent or timed out
    Request { kind: &'static str, message: String },

    /// The server answered with a non-success status
    Status { status: u16, url: String },

    /// The response body was not the expected JSON
    Decode(String),

    /// Client configuration error
    ConfigError(String),
}

impl RegistryError {
    /// Whether another attempt could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::ConfigError(_) => false,
        }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            "timeout"
        } else if e.is_connect() {
            "connection"
        } else if e.is_request() {
            "request build"
        } else if e.is_body() {
            "body"
        } else if e.is_decode() {
            return Self::Decode(e.to_string());
        } else {
            "unknown"
        };
        Self::Request {
            kind,
            message: e.to_string(),
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { kind, message } => write!(f, "Request failed ({kind}): {message}"),
            Self::Status { status, url } => write!(f, "HTTP {status} from {url}"),
            Self::Decode(msg) => write!(f, "Invalid response: {msg}"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<RegistryError> for keyhoist_core::error::Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::ConfigError(msg) => keyhoist_core::error::Error::config(msg),
            other => keyhoist_core::error::Error::network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RegistryError::Status {
            status: 503,
            url: "u".to_string()
        }
        .is_transient());
        assert!(RegistryError::Status {
            status: 429,
            url: "u".to_string()
        }
        .is_transient());
        assert!(!RegistryError::Status {
            status: 404,
            url: "u".to_string()
        }
        .is_transient());
        assert!(!RegistryError::Decode("bad".to_string()).is_transient());
    }

    #[test]
    fn test_into_core_error() {
        let err: keyhoist_core::Error = RegistryError::Status {
            status: 500,
            url: "http://x".to_string(),
        }
        .into();
        assert!(matches!(err, keyhoist_core::Error::Network(_)));
        assert!(err.to_string().contains("HTTP 500"));
    }
}
