//! Runtime for generated grain services.
//!
//! A grain is a virtual actor addressed by kind name and identity string.
//! `protoc-gen-grain` turns a service definition into a business trait, an
//! actor, kind constructors and a client; this crate is what that generated
//! code calls into.
//!
//! ## Features
//!
//! - **Explicit kind registry**: [`KindRegistry`] maps kind names to
//!   constructors and is handed to the [`Cluster`]; no global state
//! - **One task per identity**: every activation drains a single-consumer
//!   mailbox, so grain state needs no locks
//! - **Reentrant completions**: [`Responder`] posts the deferred answer back
//!   onto the owning activation's mailbox
//! - **Tagged responses**: [`GrainResponse`] carries an explicit discriminator
//!   read as [`GrainReply`] by clients
//! - **Versioned error bridge**: [`bridge`] converts business errors to and
//!   from the v1 (plain message) or v2 (reason + metadata) wire shape
//!
//! ## Example
//!
//! ```rust,ignore
//! use grain::{Cluster, KindRegistry};
//! use grain_hello::{Greeter, HelloGrainClient, SayHelloRequest, register_hello_kind};
//!
//! let mut registry = KindRegistry::new();
//! register_hello_kind(&mut registry, Greeter::default);
//! let cluster = Cluster::new(registry);
//!
//! let client = HelloGrainClient::new(&cluster, "user-1")?;
//! let reply = client.say_hello(&SayHelloRequest { name: "Ada".into() }).await?;
//! ```

mod activation;
pub mod actor;
pub mod bridge;
pub mod cluster;
pub mod context;
pub mod error;
pub mod future;
pub mod kind;
pub mod options;
pub mod responder;
pub mod wire;

pub use actor::{Actor, Message, UserMessage};
pub use bridge::BridgeVersion;
pub use cluster::Cluster;
pub use context::{ActorContext, GrainContext};
pub use error::{BoxError, ClusterIdentity, ErrorReason, GrainError, GrainErrorResponse, LegacyGrainError};
pub use future::{DecodeReply, GrainFuture, PendingResponse};
pub use kind::{Kind, KindRegistry};
pub use options::{CallOptions, ClusterConfig, DEFAULT_CALL_TIMEOUT, DEFAULT_DEACTIVATION_TIMEOUT};
pub use responder::Responder;
pub use wire::{GrainReply, GrainRequest, GrainResponse, WireError};

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}
