//! Kinds and the explicit kind registry.
//!
//! A [`Kind`] names a grain type and knows how to build a fresh actor for a
//! new activation. Kinds are collected in a [`KindRegistry`] that is handed
//! to [`crate::Cluster::new`]; there is no process-wide registration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::actor::Actor;

type Producer = Arc<dyn Fn() -> Box<dyn Actor> + Send + Sync>;

/// Named blueprint for the grains of one type.
#[derive(Clone)]
pub struct Kind {
    name: String,
    producer: Producer,
}

impl Kind {
    /// Creates a kind whose activations run the actor built by `producer`.
    pub fn new<F>(name: impl Into<String>, producer: F) -> Self
    where
        F: Fn() -> Box<dyn Actor> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            producer: Arc::new(producer),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn produce(&self) -> Box<dyn Actor> {
        (self.producer)()
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kind").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Kinds known to a cluster, keyed by name.
///
/// ## Examples
///
/// ```
/// use grain::{Actor, ActorContext, Kind, KindRegistry, Message};
///
/// struct Noop;
/// impl Actor for Noop {
///     fn receive(&mut self, _ctx: &mut ActorContext, _message: Message) {}
/// }
///
/// let mut registry = KindRegistry::new();
/// registry.register(Kind::new("Noop", || Box::new(Noop)));
///
/// assert!(registry.get("Noop").is_some());
/// assert!(registry.get("Other").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: HashMap<String, Kind>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `kind`, returning the kind it replaced under the same name.
    pub fn register(&mut self, kind: Kind) -> Option<Kind> {
        self.kinds.insert(kind.name.clone(), kind)
    }

    pub fn get(&self, name: &str) -> Option<&Kind> {
        self.kinds.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Registered kind names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
