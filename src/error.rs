//! Error types for the data-service client.
//!
//! Every failure that leaves the crate is one of the [`ClientError`] kinds.
//! Lower-level errors (HTTP, XML, I/O) are wrapped at the transport and
//! decoder boundaries and kept reachable through [`std::error::Error::source`].

use thiserror::Error;

/// Boxed cause carried by wrapping error kinds.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Client error taxonomy
#[derive(Error, Debug)]
pub enum ClientError {
    /// The address string could not be parsed into a connection descriptor
    #[error("Invalid connection address '{address}': {reason}")]
    MalformedAddress { address: String, reason: String },

    /// Network or HTTP status failure
    #[error("Error connecting to server: {message}")]
    Connectivity {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    /// Malformed listing document or row stream, or too many redirects
    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    /// Operation not offered by the read-only surface
    #[error("{operation} is not supported by the thin data-service client")]
    UnsupportedOperation { operation: String },

    /// Local mode requested but no in-process service is registered
    #[error("Local client service is not installed")]
    LocalServiceUnavailable,
}

impl ClientError {
    pub fn malformed_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        ClientError::MalformedAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        ClientError::Connectivity {
            message: message.into(),
            source: None,
        }
    }

    pub fn connectivity_with(
        message: impl Into<String>,
        source: impl Into<BoxedCause>,
    ) -> Self {
        ClientError::Connectivity {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        ClientError::Protocol {
            message: message.into(),
            source: None,
        }
    }

    pub fn protocol_with(message: impl Into<String>, source: impl Into<BoxedCause>) -> Self {
        ClientError::Protocol {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        ClientError::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    /// Stable, machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::MalformedAddress { .. } => "malformed_address",
            ClientError::Connectivity { .. } => "connectivity",
            ClientError::Protocol { .. } => "protocol",
            ClientError::UnsupportedOperation { .. } => "unsupported_operation",
            ClientError::LocalServiceUnavailable => "local_service_unavailable",
        }
    }
}

impl From<quick_xml::Error> for ClientError {
    fn from(e: quick_xml::Error) -> Self {
        ClientError::protocol_with(format!("Malformed service listing: {e}"), e)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            "Request timed out".to_string()
        } else if e.is_connect() {
            "Unable to reach server".to_string()
        } else {
            format!("HTTP failure: {e}")
        };
        ClientError::connectivity_with(message, e)
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_connectivity_preserves_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ClientError::connectivity_with("status check failed", io);
        assert_eq!(err.kind(), "connectivity");
        let source = err.source().expect("cause kept");
        assert_eq!(source.to_string(), "refused");
    }

    #[test]
    fn test_display_messages() {
        let err = ClientError::malformed_address("jdbc:mysql://x", "missing prefix");
        assert!(err.to_string().contains("jdbc:mysql://x"));

        let err = ClientError::unsupported("commit");
        assert_eq!(
            err.to_string(),
            "commit is not supported by the thin data-service client"
        );

        assert_eq!(
            ClientError::LocalServiceUnavailable.to_string(),
            "Local client service is not installed"
        );
    }

    #[test]
    fn test_protocol_without_cause() {
        let err = ClientError::protocol("truncated row");
        assert!(err.source().is_none());
        assert_eq!(err.kind(), "protocol");
    }
}
