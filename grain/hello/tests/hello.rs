//! End-to-end tests of the generated `Hello` grain against the runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use grain::bridge::ARGUMENT_METADATA_KEY;
use grain::{
    Actor, ActorContext, BoxError, CallOptions, Cluster, ErrorReason, GrainContext, GrainError,
    GrainReply, GrainRequest, GrainResponse, Kind, KindRegistry, Message, Responder, WireError,
};
use grain_hello::{
    DoworkRequest, DoworkResponse, ErrorReasonKind, Greeter, HELLO_BRIDGE, HELLO_KIND, Hello,
    HelloGrainClient, MAX_UNITS, ResetWork, SayHelloRequest, SayHelloResponse, new_hello_kind,
    register_hello_kind,
};

fn greeter_cluster() -> Cluster {
    let mut registry = KindRegistry::new();
    register_hello_kind(&mut registry, Greeter::default);
    Cluster::new(registry)
}

fn hello(name: &str) -> SayHelloRequest {
    SayHelloRequest {
        name: name.to_string(),
    }
}

fn work(units: u32) -> DoworkRequest {
    DoworkRequest { units }
}

/// Sends raw bytes to `index` and returns the v2 error body it produced.
async fn raw_error(cluster: &Cluster, index: u32, payload: Vec<u8>) -> grain::GrainErrorResponse {
    let response = cluster
        .request("raw", HELLO_KIND, GrainRequest::new(index, payload), &CallOptions::default())
        .await
        .unwrap();
    match response.into_reply::<DoworkResponse>().unwrap() {
        GrainReply::WireError(WireError::V2(body)) => body,
        other => panic!("expected an error reply, got {other:?}"),
    }
}

/// Counts every business call.
#[derive(Clone, Default)]
struct Counting {
    calls: Arc<AtomicUsize>,
}

impl Hello for Counting {
    fn say_hello(
        &mut self,
        request: SayHelloRequest,
        responder: Responder<SayHelloResponse>,
        _ctx: &GrainContext,
    ) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        responder.respond(SayHelloResponse {
            message: request.name,
        });
        Ok(())
    }

    fn dowork(&mut self, request: DoworkRequest, _ctx: &GrainContext) -> Result<DoworkResponse, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DoworkResponse {
            total: u64::from(request.units),
        })
    }

    fn rest(&mut self, request: DoworkRequest, ctx: &GrainContext) -> Result<DoworkResponse, BoxError> {
        self.dowork(request, ctx)
    }

    fn legacy(&mut self, request: DoworkRequest, ctx: &GrainContext) -> Result<DoworkResponse, BoxError> {
        self.dowork(request, ctx)
    }
}

/// Answers every request with neither a message nor an error.
struct Silent;

impl Actor for Silent {
    fn receive(&mut self, ctx: &mut ActorContext, message: Message) {
        if let Message::Request(_) = message {
            ctx.respond(GrainResponse::empty());
        }
    }
}

// === client tests ===

#[tokio::test]
async fn say_hello_round_trip_keeps_state_per_identity() {
    let cluster = greeter_cluster();
    let ada = HelloGrainClient::new(&cluster, "ada").unwrap();
    let bob = HelloGrainClient::new(&cluster, "bob").unwrap();

    let first = ada.say_hello(&hello("Ada")).await.unwrap().unwrap();
    let second = ada.say_hello(&hello("Ada")).await.unwrap().unwrap();
    let other = bob.say_hello(&hello("Bob")).await.unwrap().unwrap();

    assert_eq!(first.message, "Hello, Ada! (#1)");
    assert_eq!(second.message, "Hello, Ada! (#2)");
    assert_eq!(other.message, "Hello, Bob! (#1)");
    assert_eq!(ada.identity(), "ada");
}

#[tokio::test]
async fn blocking_and_future_calls_agree() {
    let cluster = greeter_cluster();
    let client = HelloGrainClient::new(&cluster, "worker").unwrap();

    let blocking = client.dowork(&work(3)).await.unwrap();
    let future = client.dowork_future(&work(4)).unwrap().await.unwrap();

    assert_eq!(blocking, Some(DoworkResponse { total: 3 }));
    assert_eq!(future, Some(DoworkResponse { total: 7 }));
}

#[tokio::test]
async fn empty_response_is_none_for_blocking_and_future_calls() {
    let mut registry = KindRegistry::new();
    registry.register(Kind::new(HELLO_KIND, || Box::new(Silent)));
    let cluster = Cluster::new(registry);
    let client = HelloGrainClient::new(&cluster, "quiet").unwrap();

    assert_eq!(client.dowork(&work(1)).await.unwrap(), None);
    assert_eq!(client.say_hello(&hello("Ada")).await.unwrap(), None);
    assert_eq!(client.dowork_future(&work(1)).unwrap().await.unwrap(), None);
}

#[tokio::test]
async fn empty_identity_is_rejected_at_construction() {
    let cluster = greeter_cluster();
    assert!(matches!(
        HelloGrainClient::new(&cluster, ""),
        Err(GrainError::EmptyIdentity)
    ));
}

#[tokio::test]
async fn stopped_cluster_is_rejected_at_construction() {
    let cluster = greeter_cluster();
    cluster.shutdown();
    assert!(matches!(
        HelloGrainClient::new(&cluster, "ada"),
        Err(GrainError::ClusterStopped)
    ));
}

#[tokio::test]
async fn unregistered_kind_names_the_method() {
    let cluster = Cluster::new(KindRegistry::new());
    let client = HelloGrainClient::new(&cluster, "ada").unwrap();

    let err = client.dowork(&work(1)).await.unwrap_err();
    assert_eq!(err.to_string(), "error request Dowork: kind 'Hello' is not registered");
}

#[tokio::test]
async fn deprecated_method_is_still_callable() {
    let cluster = greeter_cluster();
    let client = HelloGrainClient::new(&cluster, "old").unwrap();

    #[allow(deprecated)]
    let reply = client.legacy(&work(2)).await.unwrap();
    assert_eq!(reply, Some(DoworkResponse { total: 2 }));
}

#[tokio::test]
async fn user_messages_reach_the_default_hook_in_order() {
    let cluster = greeter_cluster();
    let client = HelloGrainClient::new(&cluster, "worker").unwrap();

    client.dowork(&work(5)).await.unwrap();
    cluster.send("worker", HELLO_KIND, ResetWork).unwrap();

    assert_eq!(client.dowork(&work(1)).await.unwrap(), Some(DoworkResponse { total: 1 }));
}

// === error reason tests ===

#[tokio::test]
async fn synchronous_error_from_reentrant_method_reaches_the_caller() {
    let cluster = greeter_cluster();
    let client = HelloGrainClient::new(&cluster, "nobody").unwrap();

    let err = client.say_hello(&hello("")).await.unwrap_err();

    assert_eq!(ErrorReasonKind::from_error(&err), Some(ErrorReasonKind::UserNotFound));
    let remote = err.remote().unwrap();
    assert_eq!(remote.reason, "USER_NOT_FOUND");
    assert_eq!(remote.code, 0);
    assert_eq!(remote.message, "no name given");
}

#[tokio::test]
async fn blocking_error_carries_the_declared_code() {
    let cluster = greeter_cluster();
    let client = HelloGrainClient::new(&cluster, "busy").unwrap();

    let err = client.dowork(&work(MAX_UNITS + 1)).await.unwrap_err();

    assert_eq!(ErrorReasonKind::from_error(&err), Some(ErrorReasonKind::QuotaExceeded));
    assert_eq!(err.remote().map(|r| r.code), Some(ErrorReasonKind::QuotaExceeded.code()));
}

#[test]
fn error_reason_catalog_matches_the_enum() {
    assert_eq!(ErrorReasonKind::ALL.len(), 2);
    assert_eq!(ErrorReasonKind::from_code(1), Some(ErrorReasonKind::QuotaExceeded));
    assert_eq!(ErrorReasonKind::from_code(9), None);
    assert_eq!(ErrorReasonKind::UserNotFound.name(), "USER_NOT_FOUND");
    assert_eq!(
        ErrorReasonKind::UserNotFound.description(),
        Some("The user does not exist.")
    );
    assert_eq!(ErrorReasonKind::QuotaExceeded.description(), None);
    assert_eq!(HELLO_BRIDGE, grain::BridgeVersion::V2);
}

// === dispatch tests ===

#[tokio::test]
async fn undecodable_request_is_invalid_argument_without_a_business_call() {
    let counting = Counting::default();
    let calls = Arc::clone(&counting.calls);
    let mut registry = KindRegistry::new();
    register_hello_kind(&mut registry, move || counting.clone());
    let cluster = Cluster::new(registry);

    let body = raw_error(&cluster, 1, vec![0xff, 0xff]).await;

    assert!(body.is(ErrorReason::InvalidArgument));
    assert!(body.metadata.contains_key(ARGUMENT_METADATA_KEY));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_method_index_is_unimplemented() {
    let cluster = greeter_cluster();

    let body = raw_error(&cluster, 42, Vec::new()).await;

    assert!(body.is(ErrorReason::Unimplemented));
    assert_eq!(body.metadata.get("method_index").map(String::as_str), Some("42"));
}

#[tokio::test]
async fn skipped_methods_keep_their_indices_unimplemented() {
    let cluster = greeter_cluster();

    // 2 is the streaming Watch, 3 the unannotated Plain.
    for index in [2, 3] {
        let body = raw_error(&cluster, index, Vec::new()).await;
        assert!(body.is(ErrorReason::Unimplemented), "index {index}");
    }

    // Rest sits at 4 even though two methods before it were skipped.
    let response = cluster
        .request(
            "raw",
            HELLO_KIND,
            GrainRequest::from_message(4, &work(0)),
            &CallOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.into_reply::<DoworkResponse>().unwrap(),
        GrainReply::Message(DoworkResponse { total: 0 })
    );
}

#[tokio::test]
async fn registering_twice_returns_the_replaced_kind() {
    let mut registry = KindRegistry::new();
    assert!(register_hello_kind(&mut registry, Greeter::default).is_none());
    let replaced = register_hello_kind(&mut registry, Greeter::default).unwrap();
    assert_eq!(replaced.name(), HELLO_KIND);
}

// === life-cycle tests ===

#[tokio::test(start_paused = true)]
async fn idle_grain_deactivates_after_the_kind_timeout() {
    let mut registry = KindRegistry::new();
    registry.register(new_hello_kind(Greeter::default, Duration::from_secs(10)));
    let cluster = Cluster::new(registry);
    let client = HelloGrainClient::new(&cluster, "sleepy").unwrap();

    client.dowork(&work(5)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(!cluster.is_active("sleepy", HELLO_KIND));

    // A fresh activation starts from zero.
    assert_eq!(client.dowork(&work(1)).await.unwrap(), Some(DoworkResponse { total: 1 }));
}

#[tokio::test(start_paused = true)]
async fn method_timeout_override_shortens_the_idle_period() {
    let cluster = greeter_cluster();
    let client = HelloGrainClient::new(&cluster, "resting").unwrap();

    client.dowork(&work(5)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(cluster.is_active("resting", HELLO_KIND));

    client.rest(&work(0)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!cluster.is_active("resting", HELLO_KIND));
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_disables_deactivation() {
    let mut registry = KindRegistry::new();
    registry.register(new_hello_kind(Greeter::default, Duration::ZERO));
    let cluster = Cluster::new(registry);
    let client = HelloGrainClient::new(&cluster, "awake").unwrap();

    client.dowork(&work(1)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3_600)).await;
    assert!(cluster.is_active("awake", HELLO_KIND));
}
