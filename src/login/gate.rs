//! login::gate
//!
//! The single guard around the authentication action.
//!
//! # State Machine
//!
//! ```text
//!            attempt()                 success
//!   Idle ─────────────────> InProgress ─────────> Completed
//!    ^                        │    │
//!    └──── transient failure ─┘    │ unauthorized failure
//!                                  v
//!                        RedirectingExternal
//! ```
//!
//! `redirect_external` moves `Idle` or `InProgress` straight to
//! `RedirectingExternal`. Both `Completed` and `RedirectingExternal` are
//! terminal for the lifetime of the gate.
//!
//! # Invariants
//!
//! - `Idle -> InProgress` happens inside `attempt()` before any task is
//!   spawned, so two triggers firing back to back cannot both launch a call
//! - At most one authentication call is in flight
//! - Nothing leaves a terminal state
//! - An in-flight call always runs to completion, even after cancellation

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::auth::{ApiClient, ApiSlot, AuthFailure, FailureClass};
use crate::core::config::{LoginConfig, RedirectConfig, TimingConfig};
use crate::host::Page;
use crate::trigger::TimerSet;

/// Gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateState {
    Idle,
    InProgress,
    Completed,
    RedirectingExternal,
}

impl GateState {
    /// Whether no further attempt can ever start from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GateState::Completed | GateState::RedirectingExternal)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateState::Idle => "idle",
            GateState::InProgress => "in-progress",
            GateState::Completed => "completed",
            GateState::RedirectingExternal => "redirecting-external",
        };
        f.write_str(name)
    }
}

/// Guard around the one authentication action.
pub struct ActionGate {
    state: Mutex<GateState>,
    api: Arc<ApiSlot>,
    page: Arc<dyn Page>,
    triggers: Arc<TimerSet>,
    login: LoginConfig,
    redirects: RedirectConfig,
    timing: TimingConfig,
    launched: AtomicUsize,
    last_failure: Mutex<Option<AuthFailure>>,
}

impl ActionGate {
    /// Create an `Idle` gate.
    ///
    /// `triggers` is the timer set cancelled when the gate reaches a terminal
    /// state.
    pub fn new(
        api: Arc<ApiSlot>,
        page: Arc<dyn Page>,
        triggers: Arc<TimerSet>,
        login: LoginConfig,
        redirects: RedirectConfig,
        timing: TimingConfig,
    ) -> Self {
        Self {
            state: Mutex::new(GateState::Idle),
            api,
            page,
            triggers,
            login,
            redirects,
            timing,
            launched: AtomicUsize::new(0),
            last_failure: Mutex::new(None),
        }
    }

    pub fn state(&self) -> GateState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(GateState::RedirectingExternal)
    }

    /// Number of authentication calls launched so far.
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    /// The most recent failure, if any.
    pub fn last_failure(&self) -> Option<AuthFailure> {
        self.last_failure.lock().ok().and_then(|f| f.clone())
    }

    /// Launch one authentication attempt if the gate is `Idle` and the
    /// capability is available.
    ///
    /// Returns whether a call was actually launched. Requires a tokio
    /// runtime; without one nothing is launched and the gate stays `Idle`.
    pub fn attempt(self: &Arc<Self>) -> bool {
        let Some(api) = self.api.current() else {
            debug!("authentication capability not available yet");
            return false;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no tokio runtime; cannot launch authentication");
            return false;
        };

        {
            let Ok(mut state) = self.state.lock() else {
                return false;
            };
            if *state != GateState::Idle {
                debug!(state = %*state, "attempt refused");
                return false;
            }
            *state = GateState::InProgress;
        }

        let n = self.launched.fetch_add(1, Ordering::SeqCst) + 1;
        info!(attempt = n, "authentication attempt launched");

        let gate = Arc::clone(self);
        runtime.spawn(async move { gate.run(api).await });
        true
    }

    /// Enter `RedirectingExternal`, stop every trigger and leave the page via
    /// a history-replacing navigation to `url`.
    ///
    /// Returns false, doing nothing, when the gate is already terminal.
    pub fn redirect_external(&self, url: &str) -> bool {
        {
            let Ok(mut state) = self.state.lock() else {
                return false;
            };
            if state.is_terminal() {
                debug!(state = %*state, "redirect refused");
                return false;
            }
            *state = GateState::RedirectingExternal;
        }
        info!(target_url = url, "redirecting to identity provider");
        self.triggers.cancel_all();
        self.page.replace(url);
        true
    }

    async fn run(&self, api: Arc<dyn ApiClient>) {
        let outcome = api
            .authenticate_by_name(&self.login.username, &self.login.secret)
            .await;
        match outcome {
            Ok(()) => self.on_success(api.as_ref()).await,
            Err(failure) => self.on_failure(failure),
        }
    }

    async fn on_success(&self, api: &dyn ApiClient) {
        {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if *state == GateState::RedirectingExternal {
                info!("authentication succeeded after redirect started; ignoring");
                return;
            }
            *state = GateState::Completed;
        }
        info!("authentication completed");
        self.triggers.cancel_all();
        api.ensure_live_connection();

        // Give the capability's credential write time to land.
        tokio::time::sleep(self.timing.settle()).await;
        self.page.set_route_fragment(&self.redirects.home_route);
        self.page.notify_navigation(&self.redirects.home_state_path);
        tokio::time::sleep(self.timing.renotify()).await;
        self.page.notify_navigation(&self.redirects.home_state_path);
    }

    fn on_failure(&self, failure: AuthFailure) {
        if let Ok(mut last) = self.last_failure.lock() {
            *last = Some(failure.clone());
        }
        match failure.class() {
            FailureClass::Unauthorized(shape) => {
                info!(?shape, "authentication rejected as unauthorized");
                self.redirect_external(&self.redirects.sign_in);
            }
            FailureClass::Transient => {
                if let Ok(mut state) = self.state.lock() {
                    if *state == GateState::InProgress {
                        *state = GateState::Idle;
                    }
                }
                warn!(error = %failure, "authentication failed; will retry");
            }
        }
    }
}

impl fmt::Debug for ActionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionGate")
            .field("state", &self.state())
            .field("launched", &self.launched())
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}
