//! Error types for service calls.
//!
//! Every failure an operation can produce is recovered into one of these
//! variants; nothing is fatal to the process and nothing is silently
//! swallowed. [`FailureKind`] is the flat taxonomy surfaced to callers
//! that only need to branch on the category.

use thiserror::Error;

/// Category of a failed operation, for display-level branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Policy violation caught before any network activity.
    ValidationFailed,
    /// No response was obtained (DNS, connection refused, reset, timeout).
    NetworkError,
    /// The exchange was explicitly cancelled.
    Aborted,
    /// The service answered with a status outside [200, 300).
    ServerError,
    /// A response arrived but could not be read as success or error.
    ProtocolError,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::ValidationFailed => "validation failed",
            Self::NetworkError => "network error",
            Self::Aborted => "aborted",
            Self::ServerError => "server error",
            Self::ProtocolError => "protocol error",
        };
        f.write_str(label)
    }
}

/// Errors from one operation against the processing service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The candidate files or parameters failed local policy. No network
    /// call was made.
    #[error("{message}")]
    Validation {
        /// Human-readable description of the violated rule.
        message: String,
    },

    /// Network-level error before any response (DNS, connection, TLS, reset).
    #[error("network error calling {endpoint}: {source}")]
    Network {
        /// Endpoint path that failed.
        endpoint: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The in-flight exchange was cancelled by the caller.
    #[error("upload aborted")]
    Aborted,

    /// HTTP error response, with the message extracted from its body.
    #[error("{message}")]
    Server {
        /// The HTTP status code.
        status: u16,
        /// Message from the body: JSON `detail`/`message` field, raw text,
        /// or `Failed (<status>)` when the body is empty or undecodable.
        message: String,
    },

    /// A response was received but its body could not be read.
    #[error("unreadable response from {endpoint}: {source}")]
    Protocol {
        /// Endpoint path that produced the response.
        endpoint: String,
        /// The underlying read error.
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Creates a server error from a status and extracted message.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates a protocol error for an unreadable response body.
    pub fn protocol(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Protocol {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// The flat failure category for this error.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation { .. } => FailureKind::ValidationFailed,
            Self::Network { .. } => FailureKind::NetworkError,
            Self::Aborted => FailureKind::Aborted,
            Self::Server { .. } => FailureKind::ServerError,
            Self::Protocol { .. } => FailureKind::ProtocolError,
        }
    }
}

// No blanket `From<reqwest::Error>`: the variants need the endpoint context
// that the source error does not carry, so the helper constructors are the
// conversion points.
