//! The single-consumer task behind each grain identity.
//!
//! One activation is one Tokio task draining one unbounded mailbox. Requests,
//! reentrant completions, user messages and stop signals all travel through
//! that mailbox, so everything touching the actor runs on the same task, one
//! message at a time.
//!
//! ## Life-cycle
//!
//! 1. `Init` is delivered before any other message.
//! 2. Each mailbox message is handled to completion before the next one.
//! 3. With a receive timeout armed, an idle period of that length delivers
//!    `ReceiveTimeout`. Generated actors poison themselves in response.
//! 4. After a poison or an explicit stop, the loop ends and `Stopped` is delivered.
//! 5. Requests still queued are rejected so the cluster can re-activate the
//!    identity and resend them. Queued reentrant completions are dropped.

use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, trace};

use crate::actor::{Actor, Message};
use crate::cluster::WeakCluster;
use crate::context::{ActorContext, Delivery, Envelope, GrainContext, Mailbox};
use crate::error::ClusterIdentity;
use crate::kind::Kind;

/// Cluster-side handle of a running activation.
#[derive(Debug, Clone)]
pub(crate) struct ActivationHandle {
    pub id: u64,
    pub mailbox: Mailbox,
}

/// Spawns a new activation of `kind` for `identity` on the current runtime.
pub(crate) fn spawn(
    runtime: &tokio::runtime::Handle,
    kind: &Kind,
    identity: ClusterIdentity,
    cluster: WeakCluster,
    id: u64,
) -> ActivationHandle {
    let (mailbox, rx) = mpsc::unbounded_channel();
    let actor = kind.produce();
    let grain = GrainContext::new(identity, cluster, mailbox.clone());

    runtime.spawn(run(actor, ActorContext::new(grain), rx, id));

    ActivationHandle { id, mailbox }
}

async fn run(
    mut actor: Box<dyn Actor>,
    mut ctx: ActorContext,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    id: u64,
) {
    let identity = ctx.grain().cluster_identity().clone();
    debug!(grain = %identity, activation = id, "activation started");

    actor.receive(&mut ctx, Message::Init);

    while !ctx.is_stopping() {
        let next = match ctx.receive_timeout() {
            Some(timeout) => match time::timeout(timeout, rx.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    trace!(grain = %identity, "receive timeout");
                    actor.receive(&mut ctx, Message::ReceiveTimeout);
                    continue;
                }
            },
            None => rx.recv().await,
        };

        let Some(envelope) = next else { break };

        match envelope {
            Envelope::Request { request, reply } => {
                ctx.begin_request(reply);
                actor.receive(&mut ctx, Message::Request(request));
                ctx.finish_request();
            }
            Envelope::Complete { reply, response } => {
                if reply.send(Delivery::Response(response)).is_err() {
                    trace!(grain = %identity, "caller went away before reentrant completion");
                }
            }
            Envelope::User(message) => actor.receive(&mut ctx, Message::User(message)),
            Envelope::Stop => ctx.poison(),
        }
    }

    if let Some(cluster) = ctx.grain().cluster() {
        cluster.remove_activation(&identity, id);
    }
    rx.close();
    let mut rejected = 0usize;
    while let Ok(envelope) = rx.try_recv() {
        if let Envelope::Request { reply, .. } = envelope {
            if reply.send(Delivery::Rejected).is_err() {
                trace!(grain = %identity, "caller gone before rejection");
            }
            rejected += 1;
        }
    }

    actor.receive(&mut ctx, Message::Stopped);
    debug!(grain = %identity, activation = id, rejected, "activation stopped");
}
