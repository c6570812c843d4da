//! Error types for the grain runtime.
//!
//! - [`GrainError`] - what callers of a grain see
//! - [`GrainErrorResponse`] - reason-code error body (bridge v2)
//! - [`LegacyGrainError`] - plain-message error body (bridge v1)
//! - [`ErrorReason`] - built-in reasons used by the runtime itself

mod grain_error;
mod response;

pub use grain_error::{BoxError, ClusterIdentity, GrainError};
pub use response::{ErrorReason, GrainErrorResponse, LegacyGrainError};
