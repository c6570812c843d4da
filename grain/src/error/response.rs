//! Wire error bodies and the built-in reason taxonomy.

use std::collections::HashMap;
use std::fmt;

use prost::Message;
use strum::{Display, EnumIter, EnumString};

/// Built-in error reasons used by the runtime and generated dispatchers.
///
/// Codes follow the gRPC status numbering so they can be mapped onto other
/// transports without a lookup table.
///
/// ## Examples
///
/// ```
/// use grain::ErrorReason;
///
/// assert_eq!(ErrorReason::InvalidArgument.code(), 3);
/// assert_eq!(ErrorReason::InvalidArgument.to_string(), "INVALID_ARGUMENT");
/// assert_eq!(ErrorReason::from_code(12), Some(ErrorReason::Unimplemented));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ErrorReason {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl ErrorReason {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|reason| reason.code() == code)
    }
}

/// Error response in the reason-code shape (bridge v2).
///
/// `reason` names the cause, `code` is its numeric value, and `metadata`
/// carries free-form context such as the undecodable argument.
///
/// Business code returns it directly, or through the constructors generated
/// for an `ErrorReason` catalog, to control what the caller sees.
///
/// ## Examples
///
/// ```
/// use grain::{ErrorReason, GrainErrorResponse};
///
/// let err = GrainErrorResponse::new(ErrorReason::NotFound, "user 42 not found")
///     .with_metadata("user", "42");
///
/// assert_eq!(err.code, 5);
/// assert_eq!(err.reason, "NOT_FOUND");
/// assert_eq!(err.metadata.get("user").map(String::as_str), Some("42"));
/// assert!(err.is(ErrorReason::NotFound));
/// ```
#[derive(Clone, PartialEq, Message)]
pub struct GrainErrorResponse {
    /// Symbolic reason name.
    #[prost(string, tag = "1")]
    pub reason: String,
    /// Numeric reason code.
    #[prost(int32, tag = "2")]
    pub code: i32,
    /// Human-readable message.
    #[prost(string, tag = "3")]
    pub message: String,
    #[prost(map = "string, string", tag = "4")]
    pub metadata: HashMap<String, String>,
}

impl GrainErrorResponse {
    /// Creates an error with a built-in reason.
    pub fn new(reason: ErrorReason, message: impl Into<String>) -> Self {
        Self::with_reason(reason.to_string(), reason.code(), message)
    }

    /// Creates an error with an arbitrary reason name and code.
    pub fn with_reason(reason: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            code,
            message: message.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns true when this error carries the built-in `reason`.
    pub fn is(&self, reason: ErrorReason) -> bool {
        self.code == reason.code() && self.reason == reason.to_string()
    }
}

impl fmt::Display for GrainErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.message)
    }
}

impl std::error::Error for GrainErrorResponse {}

/// Error response in the plain-message shape (bridge v1).
#[derive(Clone, PartialEq, Message)]
pub struct LegacyGrainError {
    #[prost(string, tag = "1")]
    pub message: String,
}

impl fmt::Display for LegacyGrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for LegacyGrainError {}
