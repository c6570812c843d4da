//! Errors surfaced to grain callers.

use std::fmt;
use std::time::Duration;

use grain_define::BridgeVersion;
use thiserror::Error;

use super::response::GrainErrorResponse;

/// Boxed error returned by business methods.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Address of one grain activation: kind name plus identity string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterIdentity {
    pub kind: String,
    pub identity: String,
}

impl ClusterIdentity {
    pub fn new(identity: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            identity: identity.into(),
        }
    }
}

impl fmt::Display for ClusterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.identity)
    }
}

/// Errors from client calls and cluster operations.
#[derive(Debug, Error)]
pub enum GrainError {
    /// A client was constructed for an empty identity.
    #[error("empty grain identity")]
    EmptyIdentity,

    /// The cluster was shut down.
    #[error("cluster is not running")]
    ClusterStopped,

    /// No Tokio runtime is available to host an activation.
    #[error("no tokio runtime available to activate {0}")]
    NoRuntime(ClusterIdentity),

    /// The target kind was never registered.
    #[error("kind '{0}' is not registered")]
    KindNotRegistered(String),

    /// The activation terminated before it took the request.
    #[error("activation {0} stopped before handling the request")]
    ActivationStopped(ClusterIdentity),

    /// The request was taken but no response will ever arrive.
    #[error("activation {0} dropped the request without responding")]
    NoResponse(ClusterIdentity),

    /// No response within the call timeout.
    #[error("request to {identity} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        identity: ClusterIdentity,
        timeout: Duration,
    },

    /// A blocking call failed in transport.
    #[error("error request {method}: {source}")]
    Request {
        /// Method name.
        method: &'static str,
        #[source]
        source: Box<GrainError>,
    },

    /// A future call failed to send.
    #[error("error request future {method}: {source}")]
    RequestFuture {
        /// Method name.
        method: &'static str,
        #[source]
        source: Box<GrainError>,
    },

    /// The grain answered with a reason-code error.
    #[error(transparent)]
    Remote(#[from] GrainErrorResponse),

    /// The grain answered with a plain-message error.
    #[error("{0}")]
    RemoteMessage(String),

    /// The grain answered with the other bridge version's error shape.
    #[error("error response uses bridge {found}, expected {expected}")]
    BridgeMismatch {
        expected: BridgeVersion,
        found: BridgeVersion,
    },

    /// The grain answered with a message of another type.
    #[error("unknown response type {0}")]
    UnexpectedResponse(String),

    /// The response payload could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The task driving a future call panicked or was aborted.
    #[error("grain call task failed: {0}")]
    Join(String),
}

impl GrainError {
    pub fn request(method: &'static str, source: GrainError) -> Self {
        Self::Request {
            method,
            source: Box::new(source),
        }
    }

    pub fn request_future(method: &'static str, source: GrainError) -> Self {
        Self::RequestFuture {
            method,
            source: Box::new(source),
        }
    }

    /// Returns the reason-code error the grain responded with, if any.
    ///
    /// ## Examples
    ///
    /// ```
    /// use grain::{ErrorReason, GrainError, GrainErrorResponse};
    ///
    /// let err = GrainError::Remote(GrainErrorResponse::new(ErrorReason::NotFound, "gone"));
    /// assert_eq!(err.remote().map(|r| r.code), Some(5));
    /// assert!(GrainError::EmptyIdentity.remote().is_none());
    /// ```
    pub fn remote(&self) -> Option<&GrainErrorResponse> {
        match self {
            Self::Remote(response) => Some(response),
            _ => None,
        }
    }

    /// Returns true when resending the request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ActivationStopped(_) | Self::Timeout { .. } => true,
            Self::Request { source, .. } | Self::RequestFuture { source, .. } => {
                source.is_retryable()
            }
            _ => false,
        }
    }
}
