//! login::coordinator
//!
//! Wires every readiness signal into the [`ActionGate`].
//!
//! # Triggers
//!
//! | Trigger          | Kind                    | Stops when                           |
//! |------------------|-------------------------|--------------------------------------|
//! | session status   | spawned query, once     | answered                             |
//! | startup          | immediate               | n/a                                  |
//! | quick poll       | check now, then bounded | launched an attempt, max ticks,      |
//! |                  | interval                | authenticated, completed             |
//! | content ready    | page listener, once     | n/a                                  |
//! | load             | page listener, once     | n/a                                  |
//! | route change     | page listener           | n/a                                  |
//! | backup poll      | interval, unbounded     | authenticated (cancels everything)   |
//! | capability poll  | interval                | capability seen                      |
//! | load begin       | page listener, optional | n/a                                  |
//!
//! All recurring triggers live in one [`TimerSet`]. Page listeners stay
//! attached after cancellation; they go inert because every firing rechecks
//! the credential probe and the gate refuses once terminal.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};

use tracing::{debug, info};

use super::gate::{ActionGate, GateState};
use crate::auth::{ApiSlot, SessionStatus, SessionStatusSource};
use crate::core::config::{BridgeConfig, RedirectConfig, TimingConfig};
use crate::core::credentials::CredentialProbe;
use crate::core::route::RouteClassifier;
use crate::host::{Page, PageEvent, ReadyState};
use crate::trigger::TimerSet;

/// Result of [`LoginCoordinator::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The credential store already holds a usable token; nothing was registered.
    AlreadyAuthenticated,
    /// Triggers are registered and running.
    Started,
}

/// Owner of the login gate and its trigger registry.
pub struct LoginCoordinator {
    gate: Arc<ActionGate>,
    timers: Arc<TimerSet>,
    page: Arc<dyn Page>,
    api: Arc<ApiSlot>,
    probe: CredentialProbe,
    classifier: RouteClassifier,
    session: Option<Arc<dyn SessionStatusSource>>,
    redirects: RedirectConfig,
    timing: TimingConfig,
}

impl LoginCoordinator {
    pub fn new(
        config: &BridgeConfig,
        page: Arc<dyn Page>,
        api: Arc<ApiSlot>,
        probe: CredentialProbe,
        session: Option<Arc<dyn SessionStatusSource>>,
    ) -> Arc<Self> {
        let timers = Arc::new(TimerSet::new());
        let gate = Arc::new(ActionGate::new(
            api.clone(),
            page.clone(),
            timers.clone(),
            config.login.clone(),
            config.redirects.clone(),
            config.timing.clone(),
        ));
        Arc::new(Self {
            gate,
            timers,
            page,
            api,
            probe,
            classifier: RouteClassifier::new(&config.routes),
            session,
            redirects: config.redirects.clone(),
            timing: config.timing.clone(),
        })
    }

    pub fn gate(&self) -> &Arc<ActionGate> {
        &self.gate
    }

    pub fn state(&self) -> GateState {
        self.gate.state()
    }

    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    /// Stop every recurring trigger. Idempotent.
    pub fn cancel_all(&self) {
        self.timers.cancel_all();
    }

    /// Whether a trigger firing right now should try to sign in.
    pub fn should_attempt(&self) -> bool {
        if self.probe.is_authenticated() {
            return false;
        }
        self.classifier
            .classify(&self.page.route_fragment())
            .wants_login()
    }

    /// A trigger fired. Returns whether an attempt was launched.
    pub fn fire(self: &Arc<Self>, source: &'static str) -> bool {
        let launched = self.should_attempt() && self.gate.attempt();
        debug!(trigger = source, launched, "trigger fired");
        launched
    }

    /// Register every trigger and run the startup checks.
    pub fn start(self: &Arc<Self>) -> StartOutcome {
        if self.probe.is_authenticated() {
            info!("already authenticated; login triggers not installed");
            return StartOutcome::AlreadyAuthenticated;
        }

        self.spawn_session_check();
        self.fire("startup");
        self.spawn_quick_poll();
        self.hook_page_events();
        self.spawn_backup_poll();
        self.spawn_capability_poll();

        info!(timers = self.timers.active(), "login triggers installed");
        StartOutcome::Started
    }

    fn spawn_session_check(self: &Arc<Self>) {
        let Some(source) = self.session.clone() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let weak = Arc::downgrade(self);
        runtime.spawn(async move {
            let status = source.query().await;
            let Some(this) = weak.upgrade() else {
                return;
            };
            info!(%status, "session status");
            match status {
                SessionStatus::Authenticated => {
                    this.gate.attempt();
                }
                SessionStatus::Unauthenticated => {
                    this.gate.redirect_external(&this.redirects.session_sign_in);
                }
                SessionStatus::Inconclusive => {}
            }
        });
    }

    /// The first check runs synchronously. The poll ends once it has
    /// launched an attempt; later retries belong to the slower triggers.
    fn spawn_quick_poll(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let max = self.timing.quick_poll_max;
        let mut ticks = 0u32;
        let mut check = move || {
            let Some(this) = weak.upgrade() else {
                return ControlFlow::Break(());
            };
            ticks += 1;
            if this.probe.is_authenticated() || this.gate.state() == GateState::Completed {
                return ControlFlow::Break(());
            }
            if this.fire("quick-poll") {
                debug!(ticks, "quick poll launched an attempt");
                return ControlFlow::Break(());
            }
            if ticks >= max {
                debug!(ticks, "quick poll exhausted");
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };

        if check().is_break() {
            return;
        }
        self.timers
            .spawn_interval("quick-poll", self.timing.quick_poll(), check);
    }

    fn spawn_backup_poll(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.timers
            .spawn_interval("backup-poll", self.timing.backup_poll(), move || {
                let Some(this) = weak.upgrade() else {
                    return ControlFlow::Break(());
                };
                if this.probe.is_authenticated() {
                    info!("authenticated elsewhere; stopping login triggers");
                    this.cancel_all();
                    return ControlFlow::Break(());
                }
                this.fire("backup-poll");
                ControlFlow::Continue(())
            });
    }

    fn spawn_capability_poll(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.timers.spawn_interval(
            "capability-poll",
            self.timing.capability_poll(),
            move || {
                let Some(this) = weak.upgrade() else {
                    return ControlFlow::Break(());
                };
                if !this.api.is_available() {
                    return ControlFlow::Continue(());
                }
                debug!("authentication capability detected");
                this.fire("capability-poll");
                ControlFlow::Break(())
            },
        );
    }

    fn hook_page_events(self: &Arc<Self>) {
        if self.page.ready_state() == ReadyState::Loading {
            self.listen(PageEvent::ContentReady, "content-ready");
        } else {
            self.fire("content-ready");
        }
        self.listen(PageEvent::Load, "load");
        self.listen(PageEvent::RouteChange, "route-change");
        if self.page.supports(PageEvent::LoadBegin) {
            self.listen(PageEvent::LoadBegin, "load-begin");
        }
    }

    fn listen(self: &Arc<Self>, event: PageEvent, source: &'static str) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.page.add_listener(
            event,
            Arc::new(move || {
                if let Some(this) = weak.upgrade() {
                    this.fire(source);
                }
            }),
        );
    }
}

impl fmt::Debug for LoginCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCoordinator")
            .field("gate", &self.gate)
            .field("timers", &self.timers)
            .field("session_check", &self.session.is_some())
            .finish_non_exhaustive()
    }
}
