//! Wire envelopes exchanged between clients and activations.
//!
//! - [`GrainRequest`] - `{method_index, payload}` sent by a client
//! - [`GrainResponse`] - tagged result: typed message, v2 error, v1 error or empty
//! - [`GrainReply`] - the client-side reading of a response for one expected type

use bytes::Bytes;
use prost::{DecodeError, Message, Name};

use crate::error::{GrainErrorResponse, LegacyGrainError};

/// Request envelope addressed to one method of a grain.
#[derive(Clone, PartialEq, Message)]
pub struct GrainRequest {
    /// Stable method index from the service's unfiltered method list.
    #[prost(uint32, tag = "1")]
    pub method_index: u32,
    /// Encoded request message.
    #[prost(bytes = "bytes", tag = "2")]
    pub payload: Bytes,
}

impl GrainRequest {
    pub fn new(method_index: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            method_index,
            payload: payload.into(),
        }
    }

    /// Encodes `message` as the payload for `method_index`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use grain::GrainRequest;
    ///
    /// let request = GrainRequest::from_message(2, &"hi".to_string());
    /// assert_eq!(request.method_index, 2);
    /// assert_eq!(request.decode::<String>().unwrap(), "hi");
    /// ```
    pub fn from_message<M: Message>(method_index: u32, message: &M) -> Self {
        Self::new(method_index, message.encode_to_vec())
    }

    /// Decodes the payload as `M`.
    ///
    /// ## Errors
    ///
    /// Returns the protobuf decode error for truncated or malformed payloads.
    pub fn decode<M: Message + Default>(&self) -> Result<M, DecodeError> {
        M::decode(self.payload.clone())
    }

    /// The raw payload rendered as text, with invalid UTF-8 replaced.
    pub fn payload_lossy(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// A successful response: the encoded message plus its fully qualified type.
#[derive(Clone, PartialEq, Message)]
pub struct TypedPayload {
    /// Fully qualified proto name, e.g. `hello.SayHelloResponse`.
    #[prost(string, tag = "1")]
    pub type_name: String,
    #[prost(bytes = "bytes", tag = "2")]
    pub payload: Bytes,
}

/// Response envelope. The `outcome` field is the wire discriminator.
#[derive(Clone, PartialEq, Message)]
pub struct GrainResponse {
    #[prost(oneof = "grain_response::Outcome", tags = "1, 2, 3")]
    pub outcome: Option<grain_response::Outcome>,
}

pub mod grain_response {
    use super::TypedPayload;
    use crate::error::{GrainErrorResponse, LegacyGrainError};

    /// Discriminated response body.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Outcome {
        #[prost(message, tag = "1")]
        Message(TypedPayload),
        /// Reason-code error shape (bridge v2).
        #[prost(message, tag = "2")]
        ErrorV2(GrainErrorResponse),
        /// Plain-message error shape (bridge v1).
        #[prost(message, tag = "3")]
        ErrorV1(LegacyGrainError),
    }
}

impl GrainResponse {
    /// Wraps a response message together with its type name.
    pub fn message<M: Message + Name>(message: &M) -> Self {
        Self {
            outcome: Some(grain_response::Outcome::Message(TypedPayload {
                type_name: M::full_name(),
                payload: message.encode_to_vec().into(),
            })),
        }
    }

    pub fn error(error: GrainErrorResponse) -> Self {
        Self {
            outcome: Some(grain_response::Outcome::ErrorV2(error)),
        }
    }

    pub fn legacy_error(message: impl Into<String>) -> Self {
        Self {
            outcome: Some(grain_response::Outcome::ErrorV1(LegacyGrainError {
                message: message.into(),
            })),
        }
    }

    /// A response that carries neither a message nor an error.
    pub fn empty() -> Self {
        Self { outcome: None }
    }

    /// Returns the error body in either shape, if this is an error response.
    pub fn wire_error(&self) -> Option<WireError> {
        match &self.outcome {
            Some(grain_response::Outcome::ErrorV2(err)) => Some(WireError::V2(err.clone())),
            Some(grain_response::Outcome::ErrorV1(err)) => Some(WireError::V1(err.clone())),
            _ => None,
        }
    }

    /// Reads the response as a reply to a call expecting `M`.
    ///
    /// A message whose type name differs from `M`'s is reported as
    /// [`GrainReply::Unexpected`] carrying that name.
    ///
    /// ## Errors
    ///
    /// Returns a decode error when the type name matches but the payload
    /// does not decode.
    pub fn into_reply<M: Message + Name + Default>(self) -> Result<GrainReply<M>, DecodeError> {
        use grain_response::Outcome;

        let reply = match self.outcome {
            None => GrainReply::Empty,
            Some(Outcome::ErrorV2(err)) => GrainReply::WireError(WireError::V2(err)),
            Some(Outcome::ErrorV1(err)) => GrainReply::WireError(WireError::V1(err)),
            Some(Outcome::Message(typed)) if typed.type_name == M::full_name() => {
                GrainReply::Message(M::decode(typed.payload)?)
            }
            Some(Outcome::Message(typed)) => GrainReply::Unexpected(typed.type_name),
        };
        Ok(reply)
    }
}

/// An error body as it arrived on the wire, tagged with its shape.
#[derive(Debug, Clone, PartialEq)]
pub enum WireError {
    V1(LegacyGrainError),
    V2(GrainErrorResponse),
}

/// Client-side view of a response for one expected message type.
#[derive(Debug, Clone, PartialEq)]
pub enum GrainReply<M> {
    /// The expected message.
    Message(M),
    /// An error response in one of the two bridge shapes.
    WireError(WireError),
    /// No error and no response.
    Empty,
    /// A message of some other type; carries its type name.
    Unexpected(String),
}
