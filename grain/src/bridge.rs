//! Translation between business errors and wire error responses.
//!
//! Generated dispatchers call [`to_wire`], [`invalid_argument`] and
//! [`unimplemented`]; generated clients call [`from_wire`]. Each generated
//! unit pins one [`BridgeVersion`] and passes it to every call, so a client
//! and a dispatcher generated with different versions fail loudly with
//! [`GrainError::BridgeMismatch`] instead of misreading each other.

use prost::DecodeError;

pub use grain_define::BridgeVersion;

use crate::error::{BoxError, ErrorReason, GrainError, GrainErrorResponse, LegacyGrainError};
use crate::wire::{GrainResponse, WireError};

/// Metadata key holding the raw payload of an undecodable request.
pub const ARGUMENT_METADATA_KEY: &str = "argument";

/// Converts a business error into a wire error response.
///
/// For [`BridgeVersion::V2`], a [`GrainErrorResponse`] passes through with its
/// reason, code and metadata intact. Any other error becomes `INTERNAL` with
/// the error's display text. For [`BridgeVersion::V1`], only the display text
/// travels.
///
/// ## Examples
///
/// ```
/// use grain::bridge::{BridgeVersion, to_wire};
/// use grain::{ErrorReason, GrainErrorResponse, WireError};
///
/// let err = GrainErrorResponse::with_reason("USER_NOT_FOUND", 7, "no user 42");
/// let response = to_wire(BridgeVersion::V2, Box::new(err));
///
/// match response.wire_error() {
///     Some(WireError::V2(body)) => assert_eq!(body.code, 7),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
pub fn to_wire(version: BridgeVersion, err: BoxError) -> GrainResponse {
    match version {
        BridgeVersion::V1 => GrainResponse::legacy_error(err.to_string()),
        BridgeVersion::V2 => GrainResponse::error(from_business_error(err)),
    }
}

/// Encodes an already structured error in the given bridge shape.
pub fn encode(version: BridgeVersion, err: GrainErrorResponse) -> GrainResponse {
    match version {
        BridgeVersion::V1 => GrainResponse::legacy_error(err.to_string()),
        BridgeVersion::V2 => GrainResponse::error(err),
    }
}

/// Response for a request payload that does not decode.
///
/// The v2 shape carries the raw payload, rendered as lossy UTF-8, under
/// [`ARGUMENT_METADATA_KEY`].
pub fn invalid_argument(version: BridgeVersion, payload: &[u8], err: &DecodeError) -> GrainResponse {
    let body = GrainErrorResponse::new(ErrorReason::InvalidArgument, err.to_string())
        .with_metadata(ARGUMENT_METADATA_KEY, String::from_utf8_lossy(payload));
    encode(version, body)
}

/// Response for a method index the dispatcher does not know.
pub fn unimplemented(version: BridgeVersion, kind: &str, method_index: u32) -> GrainResponse {
    let body = GrainErrorResponse::new(
        ErrorReason::Unimplemented,
        format!("kind {kind} has no method with index {method_index}"),
    )
    .with_metadata("method_index", method_index.to_string());
    encode(version, body)
}

/// Converts a wire error back into a caller-side error.
///
/// ## Errors
///
/// Always produces an error value; the shape must match `version` or the
/// result is [`GrainError::BridgeMismatch`].
pub fn from_wire(version: BridgeVersion, err: WireError) -> GrainError {
    match (version, err) {
        (BridgeVersion::V2, WireError::V2(body)) => GrainError::Remote(body),
        (BridgeVersion::V1, WireError::V1(body)) => GrainError::RemoteMessage(body.message),
        (expected, WireError::V1(_)) => GrainError::BridgeMismatch {
            expected,
            found: BridgeVersion::V1,
        },
        (expected, WireError::V2(_)) => GrainError::BridgeMismatch {
            expected,
            found: BridgeVersion::V2,
        },
    }
}

fn from_business_error(err: BoxError) -> GrainErrorResponse {
    match err.downcast::<GrainErrorResponse>() {
        Ok(body) => *body,
        Err(err) => match err.downcast::<LegacyGrainError>() {
            Ok(legacy) => GrainErrorResponse::new(ErrorReason::Unknown, legacy.message),
            Err(err) => GrainErrorResponse::new(ErrorReason::Internal, err.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn v2_body(response: GrainResponse) -> GrainErrorResponse {
        match response.wire_error() {
            Some(WireError::V2(body)) => body,
            other => panic!("expected v2 error, got {other:?}"),
        }
    }

    #[test]
    fn structured_error_keeps_reason_and_metadata() {
        let err = GrainErrorResponse::with_reason("QUOTA", 42, "slow down").with_metadata("limit", "10");
        let body = v2_body(to_wire(BridgeVersion::V2, Box::new(err.clone())));
        assert_eq!(body, err);
    }

    #[test]
    fn foreign_error_becomes_internal() {
        let err = io::Error::other("disk on fire");
        let body = v2_body(to_wire(BridgeVersion::V2, Box::new(err)));
        assert!(body.is(ErrorReason::Internal));
        assert_eq!(body.message, "disk on fire");
    }

    #[test]
    fn v1_carries_only_the_message() {
        let err = GrainErrorResponse::new(ErrorReason::NotFound, "gone");
        let response = to_wire(BridgeVersion::V1, Box::new(err));
        assert_eq!(
            response.wire_error(),
            Some(WireError::V1(LegacyGrainError {
                message: "NOT_FOUND: gone".to_string()
            }))
        );
    }

    #[test]
    fn invalid_argument_records_payload() {
        let decode_err = <String as prost::Message>::decode(&b"garbage"[..]).unwrap_err();
        let body = v2_body(invalid_argument(BridgeVersion::V2, b"garbage", &decode_err));
        assert!(body.is(ErrorReason::InvalidArgument));
        assert_eq!(body.metadata.get(ARGUMENT_METADATA_KEY).map(String::as_str), Some("garbage"));
    }

    #[test]
    fn unimplemented_names_kind_and_index() {
        let body = v2_body(unimplemented(BridgeVersion::V2, "Hello", 9));
        assert!(body.is(ErrorReason::Unimplemented));
        assert!(body.message.contains("Hello"));
        assert_eq!(body.metadata.get("method_index").map(String::as_str), Some("9"));
    }

    #[test]
    fn matching_shapes_convert() {
        let err = from_wire(
            BridgeVersion::V2,
            WireError::V2(GrainErrorResponse::with_reason("X", 1, "m")),
        );
        assert_eq!(err.remote().map(|b| b.code), Some(1));

        let err = from_wire(
            BridgeVersion::V1,
            WireError::V1(LegacyGrainError {
                message: "plain".to_string(),
            }),
        );
        assert_eq!(err.to_string(), "plain");
    }

    #[test]
    fn mismatched_shapes_are_reported() {
        let err = from_wire(
            BridgeVersion::V1,
            WireError::V2(GrainErrorResponse::with_reason("X", 1, "m")),
        );
        assert!(matches!(
            err,
            GrainError::BridgeMismatch {
                expected: BridgeVersion::V1,
                found: BridgeVersion::V2
            }
        ));
    }
}
