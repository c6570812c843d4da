//! Handles for calls that complete asynchronously.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::{JoinError, JoinHandle};

use crate::error::GrainError;
use crate::wire::GrainResponse;

/// Decodes a raw response into the typed result of one generated method.
pub type DecodeReply<T> = fn(GrainResponse) -> Result<Option<T>, GrainError>;

/// A request already in flight, not yet interpreted.
///
/// Returned by [`crate::Cluster::request_future`]. Await it for the raw
/// [`GrainResponse`], or turn it into a typed [`GrainFuture`] with
/// [`PendingResponse::decode_with`].
#[derive(Debug)]
pub struct PendingResponse {
    handle: JoinHandle<Result<GrainResponse, GrainError>>,
}

impl PendingResponse {
    pub(crate) fn new(handle: JoinHandle<Result<GrainResponse, GrainError>>) -> Self {
        Self { handle }
    }

    pub fn decode_with<T>(self, decode: DecodeReply<T>) -> GrainFuture<T> {
        GrainFuture {
            handle: self.handle,
            decode,
        }
    }

    /// Stops waiting. The grain may still handle the request.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Future for PendingResponse {
    type Output = Result<GrainResponse, GrainError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(flatten_join)
    }
}

/// Typed result of a future-returning client call.
///
/// Resolves to the same value the blocking call would have returned.
#[derive(Debug)]
pub struct GrainFuture<T> {
    handle: JoinHandle<Result<GrainResponse, GrainError>>,
    decode: DecodeReply<T>,
}

impl<T> GrainFuture<T> {
    /// Stops waiting. The grain may still handle the request.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for GrainFuture<T> {
    type Output = Result<Option<T>, GrainError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let decode = self.decode;
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|joined| flatten_join(joined).and_then(decode))
    }
}

fn flatten_join(
    joined: Result<Result<GrainResponse, GrainError>, JoinError>,
) -> Result<GrainResponse, GrainError> {
    joined.map_err(|err| GrainError::Join(err.to_string()))?
}
