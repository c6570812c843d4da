//! Per-activation contexts.
//!
//! [`GrainContext`] is the cheap, cloneable view business code keeps: who am
//! I, which cluster am I in, how do I message myself. [`ActorContext`] is the
//! per-turn handle the activation passes to [`crate::Actor::receive`]; it
//! owns the reply slot of the request being handled.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use prost::{Message, Name};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::bridge::BridgeVersion;
use crate::cluster::{Cluster, WeakCluster};
use crate::error::ClusterIdentity;
use crate::responder::Responder;
use crate::wire::{GrainRequest, GrainResponse};

/// What an activation's mailbox carries.
pub(crate) enum Envelope {
    Request {
        request: GrainRequest,
        reply: ReplyTo,
    },
    /// A reentrant completion travelling back to its owning activation.
    Complete {
        reply: ReplyTo,
        response: GrainResponse,
    },
    User(crate::actor::UserMessage),
    Stop,
}

/// Outcome delivered to a waiting caller.
#[derive(Debug)]
pub(crate) enum Delivery {
    Response(GrainResponse),
    /// The activation terminated before handling the request.
    Rejected,
}

pub(crate) type ReplyTo = oneshot::Sender<Delivery>;
pub(crate) type ReplySlot = Arc<Mutex<Option<ReplyTo>>>;
pub(crate) type Mailbox = mpsc::UnboundedSender<Envelope>;

pub(crate) fn take_reply(slot: &ReplySlot) -> Option<ReplyTo> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Business-facing view of an activation.
#[derive(Clone)]
pub struct GrainContext {
    identity: ClusterIdentity,
    cluster: WeakCluster,
    mailbox: Mailbox,
}

impl GrainContext {
    pub(crate) fn new(identity: ClusterIdentity, cluster: WeakCluster, mailbox: Mailbox) -> Self {
        Self {
            identity,
            cluster,
            mailbox,
        }
    }

    /// Identity string of this grain.
    pub fn identity(&self) -> &str {
        &self.identity.identity
    }

    /// Kind name of this grain.
    pub fn kind(&self) -> &str {
        &self.identity.kind
    }

    pub fn cluster_identity(&self) -> &ClusterIdentity {
        &self.identity
    }

    /// The cluster hosting this grain, for calling other grains.
    ///
    /// Activations do not keep their cluster alive; this is `None` once every
    /// [`Cluster`] handle has been dropped.
    pub fn cluster(&self) -> Option<Cluster> {
        self.cluster.upgrade()
    }

    /// Queues `message` for this grain's own `receive_default` hook.
    ///
    /// Background work uses this to hand results back to the grain's state
    /// on its own execution context. Returns false once the activation is gone.
    pub fn send_self<M: Any + Send>(&self, message: M) -> bool {
        self.mailbox.send(Envelope::User(Box::new(message))).is_ok()
    }

    pub(crate) fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }
}

impl fmt::Debug for GrainContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrainContext")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

enum ReplyState {
    Direct(ReplyTo),
    Deferred(ReplySlot),
}

/// Per-turn handle passed to [`crate::Actor::receive`].
pub struct ActorContext {
    grain: GrainContext,
    reply: Option<ReplyState>,
    receive_timeout: Option<Duration>,
    stopping: bool,
}

impl ActorContext {
    pub(crate) fn new(grain: GrainContext) -> Self {
        Self {
            grain,
            reply: None,
            receive_timeout: None,
            stopping: false,
        }
    }

    pub fn grain(&self) -> &GrainContext {
        &self.grain
    }

    /// Answers the request currently being handled.
    ///
    /// Returns false if there is no request to answer or it was already
    /// answered; the response is dropped in that case.
    pub fn respond(&mut self, response: GrainResponse) -> bool {
        let reply = match self.reply.take() {
            Some(ReplyState::Direct(reply)) => Some(reply),
            Some(ReplyState::Deferred(slot)) => take_reply(&slot),
            None => None,
        };

        match reply {
            Some(reply) => {
                if reply.send(Delivery::Response(response)).is_err() {
                    debug!(grain = %self.grain.identity, "caller went away before the response");
                }
                true
            }
            None => {
                warn!(grain = %self.grain.identity, "response dropped: request already answered");
                false
            }
        }
    }

    /// Hands the current request's reply to a [`Responder`] for later completion.
    ///
    /// The context keeps a claim on the same reply, so a synchronous error
    /// can still be answered through [`ActorContext::respond`] as long as the
    /// responder has not completed first.
    pub fn responder<T: Message + Name>(&mut self, bridge: BridgeVersion) -> Responder<T> {
        let slot: ReplySlot = match self.reply.take() {
            Some(ReplyState::Direct(reply)) => Arc::new(Mutex::new(Some(reply))),
            Some(ReplyState::Deferred(slot)) => slot,
            None => Arc::new(Mutex::new(None)),
        };
        self.reply = Some(ReplyState::Deferred(Arc::clone(&slot)));
        Responder::new(slot, self.grain.mailbox().clone(), bridge)
    }

    /// Fires [`crate::Message::ReceiveTimeout`] after `timeout` without messages.
    pub fn set_receive_timeout(&mut self, timeout: Duration) {
        self.receive_timeout = (!timeout.is_zero()).then_some(timeout);
    }

    pub fn cancel_receive_timeout(&mut self) {
        self.receive_timeout = None;
    }

    pub fn receive_timeout(&self) -> Option<Duration> {
        self.receive_timeout
    }

    /// Requests graceful termination once the current message is handled.
    pub fn poison(&mut self) {
        self.stopping = true;
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub(crate) fn begin_request(&mut self, reply: ReplyTo) {
        self.reply = Some(ReplyState::Direct(reply));
    }

    /// Ends the turn. An unanswered direct reply is dropped, which the
    /// caller observes as [`crate::GrainError::NoResponse`].
    pub(crate) fn finish_request(&mut self) {
        if let Some(ReplyState::Direct(_)) = self.reply.take() {
            warn!(grain = %self.grain.identity, "request finished without a response");
        }
    }
}

impl fmt::Debug for ActorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorContext")
            .field("grain", &self.grain)
            .field("receive_timeout", &self.receive_timeout)
            .field("stopping", &self.stopping)
            .finish_non_exhaustive()
    }
}
