//! Backend handles and their availability state.
//!
//! # States
//! ```text
//! Uninitialized → Available | Unavailable   (first probe, in `establish`)
//! Available ←→ Unavailable                  (every later probe or call outcome)
//! ```
//!
//! No hysteresis: the most recent outcome always wins. The flag is a
//! relaxed atomic and concurrent writers may race on it.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::backend::{Backend, BackendKind, BackendResult, CounterCache, VisitLog};

/// Availability state, stored as `u8` in the handle.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Uninitialized = 0,
    Available = 1,
    Unavailable = 2,
}

impl From<u8> for Availability {
    fn from(val: u8) -> Self {
        match val {
            1 => Availability::Available,
            2 => Availability::Unavailable,
            _ => Availability::Uninitialized,
        }
    }
}

/// Result of a single liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub reachable: bool,
    /// Error text when the probe failed.
    pub error: Option<String>,
}

/// One configured dependent backend.
pub struct BackendHandle<B: ?Sized> {
    name: String,
    kind: BackendKind,
    endpoint: String,
    state: AtomicU8,
    backend: Arc<B>,
}

pub type CacheHandle = BackendHandle<dyn CounterCache>;
pub type StoreHandle = BackendHandle<dyn VisitLog>;

impl<B: Backend + ?Sized> BackendHandle<B> {
    /// Wrap a backend without probing it.
    pub fn new(name: impl Into<String>, backend: Arc<B>) -> Self {
        Self {
            name: name.into(),
            kind: backend.kind(),
            endpoint: backend.endpoint(),
            state: AtomicU8::new(Availability::Uninitialized as u8),
            backend,
        }
    }

    /// Wrap a backend and run the first probe.
    pub async fn establish(name: impl Into<String>, backend: Arc<B>) -> Self {
        let handle = Self::new(name, backend);
        let outcome = handle.probe_once().await;
        if outcome.reachable {
            tracing::info!(backend = %handle.name, endpoint = %handle.endpoint, "Backend connected");
        } else {
            tracing::warn!(
                backend = %handle.name,
                endpoint = %handle.endpoint,
                error = outcome.error.as_deref().unwrap_or_default(),
                "Backend unavailable at startup"
            );
        }
        handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn availability(&self) -> Availability {
        Availability::from(self.state.load(Ordering::Relaxed))
    }

    /// Last-known reachability. A stale answer costs at most one doomed call.
    pub fn is_available(&self) -> bool {
        self.availability() == Availability::Available
    }

    pub fn mark_available(&self) {
        self.state.store(Availability::Available as u8, Ordering::Relaxed);
    }

    pub fn mark_unavailable(&self) {
        let prev = self.state.swap(Availability::Unavailable as u8, Ordering::Relaxed);
        if prev == Availability::Available as u8 {
            tracing::warn!(backend = %self.name, "Backend marked unavailable");
        }
    }

    /// Record the outcome of a data call against the availability flag.
    ///
    /// Only connectivity failures flip the flag; a rejected write on a live
    /// connection leaves it alone.
    pub fn observe<T>(&self, result: &BackendResult<T>) {
        match result {
            Ok(_) => self.mark_available(),
            Err(e) if e.is_connectivity() => self.mark_unavailable(),
            Err(_) => {}
        }
    }

    async fn probe_once(&self) -> ProbeOutcome {
        match self.backend.ping().await {
            Ok(()) => {
                self.mark_available();
                ProbeOutcome { reachable: true, error: None }
            }
            Err(e) => {
                self.mark_unavailable();
                ProbeOutcome { reachable: false, error: Some(e.to_string()) }
            }
        }
    }

    pub async fn close(&self) {
        self.backend.close().await;
        tracing::info!(backend = %self.name, "Backend closed");
    }
}

/// Kind-agnostic probe used by the health aggregator.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> BackendKind;
    async fn probe(&self) -> ProbeOutcome;
}

#[async_trait]
impl<B: Backend + ?Sized> Probe for BackendHandle<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn probe(&self) -> ProbeOutcome {
        self.probe_once().await
    }
}

/// Configuration outcome for one backend position.
pub enum BackendSlot<B: ?Sized> {
    /// No configuration was supplied.
    NotConfigured,
    /// Configured, but the client could not be constructed.
    Disconnected(String),
    /// Configured and constructed; reachability is tracked by the handle.
    Ready(Arc<BackendHandle<B>>),
}

impl<B: ?Sized> BackendSlot<B> {
    pub fn handle(&self) -> Option<&Arc<BackendHandle<B>>> {
        match self {
            BackendSlot::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, BackendSlot::NotConfigured)
    }
}

impl<B: ?Sized> Clone for BackendSlot<B> {
    fn clone(&self) -> Self {
        match self {
            BackendSlot::NotConfigured => BackendSlot::NotConfigured,
            BackendSlot::Disconnected(reason) => BackendSlot::Disconnected(reason.clone()),
            BackendSlot::Ready(handle) => BackendSlot::Ready(handle.clone()),
        }
    }
}
