//! The actor contract every activation runs.
//!
//! Generated `<Service>Actor` types implement [`Actor`]; hand-written actors
//! can too. An activation calls [`Actor::receive`] for one [`Message`] at a
//! time, so an actor never needs locking for its own state.

use std::any::Any;

use crate::context::ActorContext;
use crate::wire::GrainRequest;

/// A message sent with [`crate::Cluster::send`] or [`crate::GrainContext::send_self`].
pub type UserMessage = Box<dyn Any + Send>;

/// Everything an activation delivers to its actor.
#[derive(Debug)]
pub enum Message {
    /// The cluster assigned an identity; first message of every activation.
    Init,
    /// A client request. Answer through [`ActorContext::respond`] or a
    /// [`crate::Responder`].
    Request(GrainRequest),
    /// No message arrived within the receive timeout.
    ReceiveTimeout,
    /// Last message of every activation.
    Stopped,
    /// Anything else.
    User(UserMessage),
}

/// Message handler of one grain activation.
pub trait Actor: Send + 'static {
    fn receive(&mut self, ctx: &mut ActorContext, message: Message);
}
