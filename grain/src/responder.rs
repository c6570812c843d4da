//! Deferred responses for reentrant grain methods.

use std::fmt;
use std::marker::PhantomData;

use prost::{Message, Name};
use tracing::debug;

use crate::bridge::{self, BridgeVersion};
use crate::context::{Envelope, Mailbox, ReplySlot, take_reply};
use crate::error::{BoxError, GrainErrorResponse};
use crate::wire::GrainResponse;

/// One-shot completion handle for a reentrant request.
///
/// A reentrant method receives a `Responder`, returns right away, and later
/// calls [`Responder::respond`] or [`Responder::fail`] from wherever the work
/// finished. Both consume the responder, so the caller sees at most one
/// answer. The completion does not reach the caller directly; it is queued on
/// the owning activation's mailbox and delivered from there, in the order the
/// activation sees it.
///
/// Dropping a responder without completing it leaves the caller with
/// [`crate::GrainError::NoResponse`].
///
/// ## Examples
///
/// ```ignore
/// fn say_hello(
///     &mut self,
///     request: SayHelloRequest,
///     responder: Responder<SayHelloResponse>,
///     _ctx: &GrainContext,
/// ) -> Result<(), BoxError> {
///     tokio::spawn(async move {
///         let greeting = slow_lookup(&request.name).await;
///         responder.respond(SayHelloResponse { message: greeting });
///     });
///     Ok(())
/// }
/// ```
pub struct Responder<T> {
    slot: ReplySlot,
    mailbox: Mailbox,
    bridge: BridgeVersion,
    _response: PhantomData<fn(T)>,
}

impl<T: Message + Name> Responder<T> {
    pub(crate) fn new(slot: ReplySlot, mailbox: Mailbox, bridge: BridgeVersion) -> Self {
        Self {
            slot,
            mailbox,
            bridge,
            _response: PhantomData,
        }
    }

    /// Completes the request with `response`.
    pub fn respond(self, response: T) {
        self.complete(GrainResponse::message(&response));
    }

    /// Completes the request with an error, converted through the bridge.
    pub fn fail(self, err: impl Into<BoxError>) {
        let response = bridge::to_wire(self.bridge, err.into());
        self.complete(response);
    }

    /// Completes the request with a structured error.
    pub fn fail_with(self, err: GrainErrorResponse) {
        let response = bridge::encode(self.bridge, err);
        self.complete(response);
    }

    /// Returns false once the request was answered by other means.
    pub fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .map(|reply| reply.is_some())
            .unwrap_or(false)
    }

    fn complete(self, response: GrainResponse) {
        let Some(reply) = take_reply(&self.slot) else {
            debug!("reentrant completion ignored: request already answered");
            return;
        };

        if self
            .mailbox
            .send(Envelope::Complete { reply, response })
            .is_err()
        {
            debug!("reentrant completion dropped: activation terminated");
        }
    }
}

impl<T> fmt::Debug for Responder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}
