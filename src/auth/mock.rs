//! auth::mock
//!
//! Mock authentication capability for deterministic testing.
//!
//! # Design
//!
//! Outcomes are scripted per call (falling back to a default), every call is
//! recorded, and calls can be held in flight until released so tests can
//! observe the gate while an attempt is outstanding.
//!
//! # Example
//!
//! ```
//! use sso_bridge::auth::mock::MockApiClient;
//! use sso_bridge::auth::{ApiClient, AuthFailure};
//!
//! # tokio_test::block_on(async {
//! let api = MockApiClient::succeeding();
//! api.push_outcome(Err(AuthFailure::network("flaky")));
//!
//! assert!(api.authenticate_by_name("u", "p").await.is_err());
//! assert!(api.authenticate_by_name("u", "p").await.is_ok());
//! assert_eq!(api.auth_calls(), 2);
//! # });
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use super::errors::AuthFailure;
use super::ApiClient;
use crate::core::credentials::CredentialProbe;

/// Mock authentication capability.
///
/// Cloning shares state, so a test can keep a handle after installing it.
#[derive(Clone)]
pub struct MockApiClient {
    inner: Arc<Mutex<MockApiInner>>,
    hold: Arc<watch::Sender<bool>>,
}

struct MockApiInner {
    scripted: VecDeque<Result<(), AuthFailure>>,
    default_outcome: Result<(), AuthFailure>,
    calls: Vec<String>,
    completed: usize,
    live_connections: usize,
    logouts: usize,
    writer: Option<CredentialProbe>,
}

impl MockApiClient {
    fn with_default(default_outcome: Result<(), AuthFailure>) -> Self {
        let (hold, _) = watch::channel(false);
        Self {
            inner: Arc::new(Mutex::new(MockApiInner {
                scripted: VecDeque::new(),
                default_outcome,
                calls: Vec::new(),
                completed: 0,
                live_connections: 0,
                logouts: 0,
                writer: None,
            })),
            hold: Arc::new(hold),
        }
    }

    /// Every call succeeds unless scripted otherwise.
    pub fn succeeding() -> Self {
        Self::with_default(Ok(()))
    }

    /// Every call fails with `failure` unless scripted otherwise.
    pub fn failing(failure: AuthFailure) -> Self {
        Self::with_default(Err(failure))
    }

    /// On success, write a populated record through `probe`, the way a real
    /// capability persists its session.
    pub fn writing_credentials(self, probe: CredentialProbe) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.writer = Some(probe);
        }
        self
    }

    /// Script the outcome of the next unscripted call.
    pub fn push_outcome(&self, outcome: Result<(), AuthFailure>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.scripted.push_back(outcome);
        }
    }

    /// Hold every subsequent call in flight until [`release`](Self::release).
    pub fn hold(&self) {
        self.hold.send_replace(true);
    }

    /// Let held calls complete.
    pub fn release(&self) {
        self.hold.send_replace(false);
    }

    /// Number of `authenticate_by_name` calls started.
    pub fn auth_calls(&self) -> usize {
        self.inner.lock().map(|i| i.calls.len()).unwrap_or(0)
    }

    /// Number of `authenticate_by_name` calls that returned.
    pub fn completed_calls(&self) -> usize {
        self.inner.lock().map(|i| i.completed).unwrap_or(0)
    }

    /// Names passed to `authenticate_by_name`, in order.
    pub fn call_names(&self) -> Vec<String> {
        self.inner.lock().map(|i| i.calls.clone()).unwrap_or_default()
    }

    pub fn live_connections(&self) -> usize {
        self.inner.lock().map(|i| i.live_connections).unwrap_or(0)
    }

    pub fn logouts(&self) -> usize {
        self.inner.lock().map(|i| i.logouts).unwrap_or(0)
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn authenticate_by_name(&self, name: &str, _secret: &str) -> Result<(), AuthFailure> {
        let (outcome, writer) = {
            let mut inner = self
                .inner
                .lock()
                .map_err(|_| AuthFailure::network("mock poisoned"))?;
            inner.calls.push(name.to_string());
            let outcome = inner
                .scripted
                .pop_front()
                .unwrap_or_else(|| inner.default_outcome.clone());
            (outcome, inner.writer.clone())
        };

        let mut held = self.hold.subscribe();
        // A closed channel cannot happen while `self` is alive; treat it as released.
        let _ = held.wait_for(|h| !*h).await;

        if outcome.is_ok() {
            if let Some(probe) = writer {
                probe
                    .record_login("mock-server", "mock-user", "mock-token")
                    .map_err(|e| AuthFailure::network(e.to_string()))?;
            }
        }

        if let Ok(mut inner) = self.inner.lock() {
            inner.completed += 1;
        }
        outcome
    }

    fn ensure_live_connection(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.live_connections += 1;
        }
    }

    fn logout(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.logouts += 1;
        }
    }
}

impl std::fmt::Debug for MockApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockApiClient")
            .field("auth_calls", &self.auth_calls())
            .field("held", &*self.hold.borrow())
            .finish_non_exhaustive()
    }
}
