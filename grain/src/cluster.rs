//! In-process cluster: identity directory, activation and request routing.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::oneshot;
use tokio::time;
use tracing::{debug, info, trace};

use crate::activation::{self, ActivationHandle};
use crate::context::{Delivery, Envelope};
use crate::error::{ClusterIdentity, GrainError};
use crate::future::PendingResponse;
use crate::kind::KindRegistry;
use crate::options::{CallOptions, ClusterConfig};
use crate::wire::{GrainRequest, GrainResponse};

/// Handle to a running cluster. Cheap to clone.
///
/// Grains are activated on their first message and live until they
/// deactivate themselves, are stopped, or the cluster shuts down. Dropping
/// the last handle shuts the cluster down as well. Each identity has at most
/// one live activation at a time.
///
/// ## Examples
///
/// ```
/// use grain::{Cluster, GrainError, KindRegistry};
///
/// let cluster = Cluster::new(KindRegistry::new());
/// assert!(cluster.check_client("user-1").is_ok());
/// assert!(matches!(cluster.check_client(""), Err(GrainError::EmptyIdentity)));
///
/// cluster.shutdown();
/// assert!(matches!(cluster.check_client("user-1"), Err(GrainError::ClusterStopped)));
/// ```
#[derive(Clone)]
pub struct Cluster {
    inner: Arc<ClusterInner>,
}

struct ClusterInner {
    config: ClusterConfig,
    registry: KindRegistry,
    activations: Mutex<HashMap<ClusterIdentity, ActivationHandle>>,
    next_activation: AtomicU64,
    running: AtomicBool,
}

impl Drop for ClusterInner {
    fn drop(&mut self) {
        let activations = self.activations.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !activations.is_empty() {
            debug!(cluster = %self.config.name, activations = activations.len(), "last cluster handle dropped");
        }
        for (identity, handle) in activations.drain() {
            if handle.mailbox.send(Envelope::Stop).is_err() {
                trace!(grain = %identity, "activation already stopped");
            }
        }
    }
}

/// Non-owning cluster handle held by activations.
#[derive(Clone)]
pub(crate) struct WeakCluster {
    inner: Weak<ClusterInner>,
}

impl WeakCluster {
    pub(crate) fn upgrade(&self) -> Option<Cluster> {
        self.inner.upgrade().map(|inner| Cluster { inner })
    }
}

impl Cluster {
    pub fn new(registry: KindRegistry) -> Self {
        Self::with_config(registry, ClusterConfig::default())
    }

    pub fn with_config(registry: KindRegistry, config: ClusterConfig) -> Self {
        info!(cluster = %config.name, kinds = ?registry.names(), "cluster started");
        Self {
            inner: Arc::new(ClusterInner {
                config,
                registry,
                activations: Mutex::new(HashMap::new()),
                next_activation: AtomicU64::new(1),
                running: AtomicBool::new(true),
            }),
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.inner.registry
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Number of live activations.
    pub fn activation_count(&self) -> usize {
        self.activations().len()
    }

    /// Returns true when `identity` of `kind` currently has an activation.
    pub fn is_active(&self, identity: &str, kind: &str) -> bool {
        self.activations()
            .contains_key(&ClusterIdentity::new(identity, kind))
    }

    /// Checks the arguments of a generated client constructor.
    ///
    /// ## Errors
    ///
    /// - [`GrainError::EmptyIdentity`] for an empty identity
    /// - [`GrainError::ClusterStopped`] after [`Cluster::shutdown`]
    pub fn check_client(&self, identity: &str) -> Result<(), GrainError> {
        if identity.is_empty() {
            return Err(GrainError::EmptyIdentity);
        }
        if !self.is_running() {
            return Err(GrainError::ClusterStopped);
        }
        Ok(())
    }

    /// Sends `request` to `identity` of `kind` and waits for the response.
    ///
    /// The identity is activated if needed. When the activation terminates
    /// before taking the request, the identity is re-activated and the
    /// request resent, up to `options.retries` times.
    ///
    /// ## Errors
    ///
    /// - [`GrainError::ClusterStopped`], [`GrainError::KindNotRegistered`]
    /// - [`GrainError::ActivationStopped`] once retries are exhausted
    /// - [`GrainError::NoResponse`] if the grain dropped the request
    /// - [`GrainError::Timeout`] after `options.timeout`
    pub async fn request(
        &self,
        identity: &str,
        kind: &str,
        request: GrainRequest,
        options: &CallOptions,
    ) -> Result<GrainResponse, GrainError> {
        let target = ClusterIdentity::new(identity, kind);
        let mut attempt = 0;

        loop {
            let handle = self.activation(&target)?;
            let (reply, response) = oneshot::channel();
            let envelope = Envelope::Request {
                request: request.clone(),
                reply,
            };

            let delivery = if handle.mailbox.send(envelope).is_err() {
                self.remove_activation(&target, handle.id);
                Delivery::Rejected
            } else {
                match time::timeout(options.timeout, response).await {
                    Ok(Ok(delivery)) => delivery,
                    Ok(Err(_)) => return Err(GrainError::NoResponse(target)),
                    Err(_) => {
                        return Err(GrainError::Timeout {
                            identity: target,
                            timeout: options.timeout,
                        });
                    }
                }
            };

            match delivery {
                Delivery::Response(response) => return Ok(response),
                Delivery::Rejected if attempt < options.retries => {
                    attempt += 1;
                    debug!(grain = %target, attempt, "activation stopped; resending");
                }
                Delivery::Rejected => return Err(GrainError::ActivationStopped(target)),
            }
        }
    }

    /// Sends `request` without waiting; the returned handle resolves later.
    ///
    /// ## Errors
    ///
    /// Fails immediately with [`GrainError::ClusterStopped`],
    /// [`GrainError::KindNotRegistered`] or [`GrainError::NoRuntime`].
    /// Everything else surfaces when the handle is awaited.
    pub fn request_future(
        &self,
        identity: &str,
        kind: &str,
        request: GrainRequest,
        options: CallOptions,
    ) -> Result<PendingResponse, GrainError> {
        let target = ClusterIdentity::new(identity, kind);
        self.ensure_routable(&target)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| GrainError::NoRuntime(target.clone()))?;

        let cluster = self.clone();
        let handle = runtime.spawn(async move {
            cluster
                .request(&target.identity, &target.kind, request, &options)
                .await
        });
        Ok(PendingResponse::new(handle))
    }

    /// Delivers `message` to the grain's default handler without a reply.
    ///
    /// ## Errors
    ///
    /// Fails when the identity cannot be activated.
    pub fn send<M: Any + Send>(&self, identity: &str, kind: &str, message: M) -> Result<(), GrainError> {
        let target = ClusterIdentity::new(identity, kind);
        let handle = self.activation(&target)?;
        handle
            .mailbox
            .send(Envelope::User(Box::new(message)))
            .map_err(|_| GrainError::ActivationStopped(target))
    }

    /// Asks the activation of `identity` to stop. Returns false if none was live.
    pub fn stop(&self, identity: &str, kind: &str) -> bool {
        let target = ClusterIdentity::new(identity, kind);
        let handle = self.activations().get(&target).cloned();
        match handle {
            Some(handle) => handle.mailbox.send(Envelope::Stop).is_ok(),
            None => false,
        }
    }

    /// Stops every activation and refuses new ones.
    pub fn shutdown(&self) {
        self.inner.running.store(false, Ordering::Release);
        let drained: Vec<ActivationHandle> =
            self.activations().drain().map(|(_, handle)| handle).collect();
        info!(cluster = %self.inner.config.name, activations = drained.len(), "cluster shutting down");
        for handle in drained {
            if handle.mailbox.send(Envelope::Stop).is_err() {
                trace!(activation = handle.id, "activation already stopped");
            }
        }
    }

    pub(crate) fn remove_activation(&self, identity: &ClusterIdentity, id: u64) {
        let mut activations = self.activations();
        if activations.get(identity).is_some_and(|handle| handle.id == id) {
            activations.remove(identity);
        }
    }

    fn ensure_routable(&self, target: &ClusterIdentity) -> Result<(), GrainError> {
        if !self.is_running() {
            return Err(GrainError::ClusterStopped);
        }
        if !self.inner.registry.contains(&target.kind) {
            return Err(GrainError::KindNotRegistered(target.kind.clone()));
        }
        Ok(())
    }

    fn activation(&self, target: &ClusterIdentity) -> Result<ActivationHandle, GrainError> {
        self.ensure_routable(target)?;

        let mut activations = self.activations();
        if let Some(handle) = activations.get(target) {
            if !handle.mailbox.is_closed() {
                return Ok(handle.clone());
            }
            activations.remove(target);
        }

        let kind = self
            .inner
            .registry
            .get(&target.kind)
            .ok_or_else(|| GrainError::KindNotRegistered(target.kind.clone()))?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| GrainError::NoRuntime(target.clone()))?;

        let id = self.inner.next_activation.fetch_add(1, Ordering::Relaxed);
        let handle = activation::spawn(&runtime, kind, target.clone(), self.downgrade(), id);
        activations.insert(target.clone(), handle.clone());
        Ok(handle)
    }

    fn downgrade(&self) -> WeakCluster {
        WeakCluster {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn activations(&self) -> MutexGuard<'_, HashMap<ClusterIdentity, ActivationHandle>> {
        self.inner
            .activations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("name", &self.inner.config.name)
            .field("running", &self.is_running())
            .field("activations", &self.activation_count())
            .finish()
    }
}
