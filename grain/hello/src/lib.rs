//! The `Hello` grain.
//!
//! Message types are written by hand here; the grain trait, actor, kind
//! constructors, client and error reasons come from `protoc-gen-grain` at
//! build time (see `build.rs`).
//!
//! ```no_run
//! use grain::{Cluster, KindRegistry};
//! use grain_hello::{Greeter, HelloGrainClient, SayHelloRequest, register_hello_kind};
//!
//! # async fn demo() -> Result<(), grain::GrainError> {
//! let mut registry = KindRegistry::new();
//! register_hello_kind(&mut registry, Greeter::default);
//! let cluster = Cluster::new(registry);
//!
//! let client = HelloGrainClient::new(&cluster, "ada")?;
//! let reply = client
//!     .say_hello(&SayHelloRequest { name: "Ada".to_string() })
//!     .await?;
//! assert_eq!(reply.map(|r| r.message), Some("Hello, Ada! (#1)".to_string()));
//! # Ok(())
//! # }
//! ```

use grain::{BoxError, GrainContext, Responder, UserMessage};
use prost::Name;
use tracing::debug;

include!(concat!(env!("OUT_DIR"), "/hello_grain.rs"));

/// Largest `units` a single `Dowork` call accepts.
pub const MAX_UNITS: u32 = 1_000;

#[derive(Clone, PartialEq, prost::Message)]
pub struct SayHelloRequest {
    #[prost(string, tag = "1")]
    pub name: String,
}

impl Name for SayHelloRequest {
    const NAME: &'static str = "SayHelloRequest";
    const PACKAGE: &'static str = "hello";
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SayHelloResponse {
    #[prost(string, tag = "1")]
    pub message: String,
}

impl Name for SayHelloResponse {
    const NAME: &'static str = "SayHelloResponse";
    const PACKAGE: &'static str = "hello";
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DoworkRequest {
    #[prost(uint32, tag = "1")]
    pub units: u32,
}

impl Name for DoworkRequest {
    const NAME: &'static str = "DoworkRequest";
    const PACKAGE: &'static str = "hello";
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DoworkResponse {
    #[prost(uint64, tag = "1")]
    pub total: u64,
}

impl Name for DoworkResponse {
    const NAME: &'static str = "DoworkResponse";
    const PACKAGE: &'static str = "hello";
}

/// Clears the work counter when sent to a `Hello` grain.
#[derive(Debug, Clone, Copy)]
pub struct ResetWork;

/// Reference `Hello` implementation.
///
/// `SayHello` answers from a spawned task; an empty name is
/// `USER_NOT_FOUND`. `Dowork` accumulates units per identity and refuses
/// batches above [`MAX_UNITS`] with `QUOTA_EXCEEDED`.
#[derive(Debug, Default)]
pub struct Greeter {
    greeted: u32,
    work: u64,
}

impl Hello for Greeter {
    fn init(&mut self, ctx: &GrainContext) {
        debug!(grain = %ctx.cluster_identity(), "greeter activated");
    }

    fn receive_default(&mut self, message: UserMessage, _ctx: &GrainContext) {
        if message.is::<ResetWork>() {
            self.work = 0;
        }
    }

    fn say_hello(
        &mut self,
        request: SayHelloRequest,
        responder: Responder<SayHelloResponse>,
        _ctx: &GrainContext,
    ) -> Result<(), BoxError> {
        if request.name.is_empty() {
            return Err(error_user_not_found("no name given").into());
        }

        self.greeted += 1;
        let message = format!("Hello, {}! (#{})", request.name, self.greeted);
        tokio::spawn(async move {
            responder.respond(SayHelloResponse { message });
        });
        Ok(())
    }

    fn dowork(&mut self, request: DoworkRequest, _ctx: &GrainContext) -> Result<DoworkResponse, BoxError> {
        if request.units > MAX_UNITS {
            return Err(ErrorReasonKind::QuotaExceeded
                .error(format!("{} units requested, at most {MAX_UNITS} allowed", request.units))
                .into());
        }
        self.work += u64::from(request.units);
        Ok(DoworkResponse { total: self.work })
    }

    fn rest(&mut self, _request: DoworkRequest, _ctx: &GrainContext) -> Result<DoworkResponse, BoxError> {
        Ok(DoworkResponse { total: self.work })
    }

    fn legacy(&mut self, request: DoworkRequest, ctx: &GrainContext) -> Result<DoworkResponse, BoxError> {
        self.dowork(request, ctx)
    }
}
