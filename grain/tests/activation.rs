//! Integration tests for activations, routing and reentrant completion.
//!
//! These use a hand-written actor so the runtime is exercised without any
//! generated code in the way.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use grain::{
    Actor, ActorContext, BridgeVersion, CallOptions, Cluster, GrainError, GrainReply, GrainRequest,
    GrainResponse, Kind, KindRegistry, Message, Responder,
};
use prost::Name;

const COUNTER: &str = "Counter";

#[derive(Clone, PartialEq, prost::Message)]
struct Add {
    #[prost(uint64, tag = "1")]
    amount: u64,
}

impl Name for Add {
    const NAME: &'static str = "Add";
    const PACKAGE: &'static str = "counter";
}

#[derive(Clone, PartialEq, prost::Message)]
struct Total {
    #[prost(uint64, tag = "1")]
    value: u64,
}

impl Name for Total {
    const NAME: &'static str = "Total";
    const PACKAGE: &'static str = "counter";
}

#[derive(Default)]
struct Lifecycle {
    started: AtomicUsize,
    stopped: AtomicUsize,
}

/// Index 0 adds synchronously, 1 answers later, 2 never answers, 3 parks the responder.
struct CounterActor {
    total: u64,
    lifecycle: Arc<Lifecycle>,
    parked: Option<Responder<Total>>,
    idle: Duration,
}

impl Actor for CounterActor {
    fn receive(&mut self, ctx: &mut ActorContext, message: Message) {
        match message {
            Message::Init => {
                self.lifecycle.started.fetch_add(1, Ordering::SeqCst);
                ctx.set_receive_timeout(self.idle);
            }
            Message::ReceiveTimeout => ctx.poison(),
            Message::Stopped => {
                self.lifecycle.stopped.fetch_add(1, Ordering::SeqCst);
            }
            Message::Request(request) => {
                let Ok(add) = request.decode::<Add>() else {
                    return;
                };
                self.total += add.amount;
                let total = Total { value: self.total };
                match request.method_index {
                    0 => {
                        ctx.respond(GrainResponse::message(&total));
                    }
                    1 => {
                        let responder = ctx.responder::<Total>(BridgeVersion::V2);
                        tokio::spawn(async move {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            responder.respond(total);
                        });
                    }
                    2 => {}
                    _ => self.parked = Some(ctx.responder::<Total>(BridgeVersion::V2)),
                }
            }
            Message::User(_) => {}
        }
    }
}

fn cluster_with(lifecycle: Arc<Lifecycle>, idle: Duration) -> Cluster {
    let mut registry = KindRegistry::new();
    registry.register(Kind::new(COUNTER, move || {
        Box::new(CounterActor {
            total: 0,
            lifecycle: Arc::clone(&lifecycle),
            parked: None,
            idle,
        })
    }));
    Cluster::new(registry)
}

async fn add(cluster: &Cluster, identity: &str, index: u32, amount: u64) -> Result<u64, GrainError> {
    let request = GrainRequest::from_message(index, &Add { amount });
    let response = cluster
        .request(identity, COUNTER, request, &CallOptions::default())
        .await?;
    match response.into_reply::<Total>()? {
        GrainReply::Message(total) => Ok(total.value),
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[tokio::test]
async fn state_is_kept_per_identity() {
    let cluster = cluster_with(Arc::default(), Duration::from_secs(60));

    assert_eq!(add(&cluster, "a", 0, 2).await.unwrap(), 2);
    assert_eq!(add(&cluster, "a", 0, 3).await.unwrap(), 5);
    assert_eq!(add(&cluster, "b", 0, 1).await.unwrap(), 1);
    assert_eq!(cluster.activation_count(), 2);
}

#[tokio::test]
async fn unregistered_kind_is_rejected() {
    let cluster = cluster_with(Arc::default(), Duration::from_secs(60));
    let err = cluster
        .request("a", "Missing", GrainRequest::new(0, Vec::new()), &CallOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GrainError::KindNotRegistered(kind) if kind == "Missing"));
}

#[tokio::test]
async fn reentrant_completion_arrives_once_and_frees_the_activation() {
    let cluster = cluster_with(Arc::default(), Duration::from_secs(60));

    let deferred = {
        let cluster = cluster.clone();
        tokio::spawn(async move { add(&cluster, "a", 1, 10).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Handled while the first request is still pending.
    assert_eq!(add(&cluster, "a", 0, 1).await.unwrap(), 11);
    assert!(!deferred.is_finished());

    assert_eq!(deferred.await.unwrap().unwrap(), 10);
}

#[tokio::test]
async fn unanswered_request_reports_no_response() {
    let cluster = cluster_with(Arc::default(), Duration::from_secs(60));
    let err = add(&cluster, "a", 2, 1).await.unwrap_err();
    assert!(matches!(err, GrainError::NoResponse(_)));
}

#[tokio::test(start_paused = true)]
async fn parked_responder_times_out_the_caller() {
    let cluster = cluster_with(Arc::default(), Duration::from_secs(600));
    let request = GrainRequest::from_message(3, &Add { amount: 1 });
    let options = CallOptions::default().with_timeout(Duration::from_millis(100));

    let err = cluster.request("a", COUNTER, request, &options).await.unwrap_err();
    assert!(matches!(err, GrainError::Timeout { .. }));
}

#[tokio::test(start_paused = true)]
async fn idle_activation_deactivates_and_reactivates_fresh() {
    let lifecycle = Arc::new(Lifecycle::default());
    let cluster = cluster_with(Arc::clone(&lifecycle), Duration::from_secs(60));

    assert_eq!(add(&cluster, "a", 0, 4).await.unwrap(), 4);
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(lifecycle.stopped.load(Ordering::SeqCst), 1);
    assert!(!cluster.is_active("a", COUNTER));

    assert_eq!(add(&cluster, "a", 0, 1).await.unwrap(), 1);
    assert_eq!(lifecycle.started.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn explicit_stop_runs_stopped_hook() {
    let lifecycle = Arc::new(Lifecycle::default());
    let cluster = cluster_with(Arc::clone(&lifecycle), Duration::from_secs(60));

    add(&cluster, "a", 0, 1).await.unwrap();
    assert!(cluster.stop("a", COUNTER));

    for _ in 0..50 {
        if lifecycle.stopped.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(lifecycle.stopped.load(Ordering::SeqCst), 1);
    assert!(!cluster.stop("a", COUNTER));
}

#[tokio::test]
async fn dropping_the_last_handle_stops_idle_grains() {
    let lifecycle = Arc::new(Lifecycle::default());
    let cluster = cluster_with(Arc::clone(&lifecycle), Duration::ZERO);

    add(&cluster, "a", 0, 1).await.unwrap();
    add(&cluster, "b", 0, 1).await.unwrap();
    drop(cluster);

    for _ in 0..50 {
        if lifecycle.stopped.load(Ordering::SeqCst) == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(lifecycle.stopped.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn future_request_resolves_to_raw_response() {
    let cluster = cluster_with(Arc::default(), Duration::from_secs(60));
    let pending = cluster
        .request_future(
            "a",
            COUNTER,
            GrainRequest::from_message(0, &Add { amount: 7 }),
            CallOptions::default(),
        )
        .unwrap();

    let response = pending.await.unwrap();
    assert_eq!(
        response.into_reply::<Total>().unwrap(),
        GrainReply::Message(Total { value: 7 })
    );
}

#[tokio::test]
async fn shutdown_refuses_new_requests() {
    let cluster = cluster_with(Arc::default(), Duration::from_secs(60));
    add(&cluster, "a", 0, 1).await.unwrap();

    cluster.shutdown();
    assert_eq!(cluster.activation_count(), 0);
    assert!(matches!(
        add(&cluster, "a", 0, 1).await.unwrap_err(),
        GrainError::ClusterStopped
    ));
    assert!(matches!(
        cluster.request_future("a", COUNTER, GrainRequest::new(0, Vec::new()), CallOptions::default()),
        Err(GrainError::ClusterStopped)
    ));
}
