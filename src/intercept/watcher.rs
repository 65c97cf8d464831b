//! intercept::watcher
//!
//! Keeps destructive controls rewritten for the lifetime of the page.
//!
//! # Drivers
//!
//! A scan is cheap and idempotent, so it simply runs on every signal:
//!
//! - once at initialisation
//! - on every structural change under the body (one observer)
//! - on a fallback poll for changes the observer misses (one timer)
//! - on full page load, if initialisation left something out
//!
//! Initialisation waits for content-ready while the page is loading. When
//! the body is missing it polls for it and forces initialisation after a
//! timeout. Nothing here is ever cancelled.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use super::matcher::{find_all, find_match};
use super::rewrite::{force_visible, rewrite, ActionEffects};
use super::rules::{InterceptRule, RuleKind};
use crate::auth::ApiSlot;
use crate::core::config::{BridgeConfig, TimingConfig};
use crate::core::credentials::CredentialProbe;
use crate::host::{Document, Page, PageEvent, ReadyState};
use crate::trigger::TimerSet;

/// Element interceptor.
pub struct Interceptor {
    document: Arc<dyn Document>,
    page: Arc<dyn Page>,
    rules: Vec<InterceptRule>,
    effects: Arc<ActionEffects>,
    timers: TimerSet,
    timing: TimingConfig,
    observing: AtomicBool,
    polling: AtomicBool,
    scans: AtomicUsize,
    rewrites: AtomicUsize,
}

impl Interceptor {
    pub fn new(
        config: &BridgeConfig,
        document: Arc<dyn Document>,
        page: Arc<dyn Page>,
        api: Arc<ApiSlot>,
        probe: CredentialProbe,
    ) -> Arc<Self> {
        let effects = Arc::new(ActionEffects::new(api, probe, page.clone()));
        Arc::new(Self {
            document,
            page,
            rules: InterceptRule::standard(&config.redirects),
            effects,
            timers: TimerSet::new(),
            timing: config.timing.clone(),
            observing: AtomicBool::new(false),
            polling: AtomicBool::new(false),
            scans: AtomicUsize::new(0),
            rewrites: AtomicUsize::new(0),
        })
    }

    pub fn rules(&self) -> &[InterceptRule] {
        &self.rules
    }

    pub fn is_observing(&self) -> bool {
        self.observing.load(Ordering::SeqCst)
    }

    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::SeqCst)
    }

    /// Number of scans run so far.
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    /// Number of successful rewrites so far.
    pub fn rewrites(&self) -> usize {
        self.rewrites.load(Ordering::SeqCst)
    }

    /// Force-visible every switch-user control, then match and rewrite once
    /// per rule. Returns the number of rewrites performed.
    pub fn scan(&self) -> usize {
        if !self.document.has_body() {
            return 0;
        }
        self.scans.fetch_add(1, Ordering::SeqCst);

        let candidates = self.document.interactive_elements();
        for rule in self.rules.iter().filter(|r| r.kind == RuleKind::SwitchUser) {
            for element in find_all(&candidates, rule) {
                force_visible(element.as_ref());
            }
        }

        let mut performed = 0;
        for rule in &self.rules {
            if let Some(element) = find_match(&candidates, rule) {
                if rewrite(&element, rule, &self.effects) {
                    info!(rule = %rule.kind, "control rewritten");
                    performed += 1;
                }
            }
        }
        self.rewrites.fetch_add(performed, Ordering::SeqCst);
        performed
    }

    /// Scan now and attach whichever of the observer and the fallback poll
    /// is not attached yet.
    pub fn init(self: &Arc<Self>) {
        self.scan();

        if self.document.has_body() && !self.is_observing() {
            let weak = Arc::downgrade(self);
            let attached = self.document.observe_subtree(Arc::new(move || {
                if let Some(this) = weak.upgrade() {
                    this.scan();
                }
            }));
            self.observing.store(attached, Ordering::SeqCst);
        }

        if !self.is_polling() {
            let weak = Arc::downgrade(self);
            let handle = self.timers.spawn_interval(
                "intercept-poll",
                self.timing.intercept_poll(),
                move || match weak.upgrade() {
                    Some(this) => {
                        this.scan();
                        ControlFlow::Continue(())
                    }
                    None => ControlFlow::Break(()),
                },
            );
            self.polling.store(handle.is_some(), Ordering::SeqCst);
        }

        info!(
            observing = self.is_observing(),
            polling = self.is_polling(),
            "interceptor initialised"
        );
    }

    /// Arrange for [`init`](Self::init) to run as soon as the page allows.
    pub fn install(self: &Arc<Self>) {
        if self.page.ready_state() == ReadyState::Loading {
            let weak = Arc::downgrade(self);
            self.page.add_listener(
                PageEvent::ContentReady,
                Arc::new(move || {
                    if let Some(this) = weak.upgrade() {
                        this.init();
                    }
                }),
            );
        } else if self.document.has_body() {
            self.init();
        } else {
            self.wait_for_body();
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        self.page.add_listener(
            PageEvent::Load,
            Arc::new(move || {
                let Some(this) = weak.upgrade() else {
                    return;
                };
                if !this.is_observing() || !this.is_polling() {
                    info!("initialising interceptor from load event");
                    this.init();
                }
            }),
        );
    }

    fn wait_for_body(self: &Arc<Self>) {
        debug!("document body missing; waiting");
        let weak = Arc::downgrade(self);
        let waiting = self
            .timers
            .spawn_interval("body-wait", self.timing.body_wait(), move || {
                let Some(this) = weak.upgrade() else {
                    return ControlFlow::Break(());
                };
                if this.document.has_body() {
                    this.init();
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            });

        let weak = Arc::downgrade(self);
        self.timers.spawn_interval(
            "body-wait-timeout",
            self.timing.body_wait_timeout(),
            move || {
                if let Some(this) = weak.upgrade() {
                    if let Some(handle) = waiting {
                        this.timers.cancel(handle);
                    }
                    if !this.is_observing() && !this.is_polling() {
                        warn!("timed out waiting for document body; initialising anyway");
                        this.init();
                    }
                }
                ControlFlow::Break(())
            },
        );
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("observing", &self.is_observing())
            .field("polling", &self.is_polling())
            .field("scans", &self.scans())
            .field("rewrites", &self.rewrites())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessPage, VirtualDom};
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn interceptor(dom: &VirtualDom, page: Arc<HeadlessPage>) -> Arc<Interceptor> {
        let config = BridgeConfig::default();
        let probe = CredentialProbe::new(Arc::new(MemoryStore::new()), &config.storage);
        Interceptor::new(
            &config,
            Arc::new(dom.clone()),
            page,
            Arc::new(ApiSlot::new()),
            probe,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn init_is_singleton() {
        let dom = VirtualDom::with_body();
        let page = Arc::new(HeadlessPage::new("").with_ready_state(ReadyState::Complete));
        let i = interceptor(&dom, page);

        i.init();
        i.init();
        i.init();

        assert!(i.is_observing());
        assert!(i.is_polling());
        assert_eq!(dom.observer_count(), 1);
        assert_eq!(i.timers.active_names(), vec!["intercept-poll"]);
    }

    #[tokio::test(start_paused = true)]
    async fn loading_page_waits_for_content_ready() {
        let dom = VirtualDom::with_body();
        let page = Arc::new(HeadlessPage::new(""));
        let i = interceptor(&dom, page.clone());

        i.install();
        assert_eq!(i.scans(), 0);
        assert!(!i.is_observing());

        page.advance_to(ReadyState::Interactive);
        assert_eq!(i.scans(), 1);
        assert!(i.is_observing());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_body_is_polled_for() {
        let dom = VirtualDom::new();
        let page = Arc::new(HeadlessPage::new("").with_ready_state(ReadyState::Interactive));
        let i = interceptor(&dom, page);

        i.install();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!i.is_observing());

        dom.attach_body();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(i.is_observing());
        assert!(i.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn body_timeout_forces_initialisation() {
        let dom = VirtualDom::new();
        let page = Arc::new(HeadlessPage::new("").with_ready_state(ReadyState::Interactive));
        let i = interceptor(&dom, page);

        i.install();
        tokio::time::sleep(Duration::from_millis(5_010)).await;

        // No body to observe, but the fallback poll is running.
        assert!(!i.is_observing());
        assert!(i.is_polling());
        assert!(!i.timers.active_names().contains(&"body-wait"));
    }

    #[tokio::test(start_paused = true)]
    async fn load_event_attaches_missing_observer() {
        let dom = VirtualDom::new();
        let page = Arc::new(HeadlessPage::new("").with_ready_state(ReadyState::Interactive));
        let i = interceptor(&dom, page.clone());

        i.install();
        tokio::time::sleep(Duration::from_millis(5_010)).await;
        assert!(!i.is_observing());

        dom.attach_body();
        page.advance_to(ReadyState::Complete);
        assert!(i.is_observing());
        assert_eq!(i.timers.active_names(), vec!["intercept-poll"]);
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_poll_rescans() {
        let dom = VirtualDom::with_body();
        let page = Arc::new(HeadlessPage::new("").with_ready_state(ReadyState::Complete));
        let i = interceptor(&dom, page);

        i.install();
        assert_eq!(i.scans(), 1);
        tokio::time::sleep(Duration::from_millis(1_010)).await;
        assert_eq!(i.scans(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_switch_user_is_revealed_and_rewritten() {
        let dom = VirtualDom::with_body();
        let body = dom.body().unwrap();
        let menu = dom.append(body, "div", "").unwrap();
        dom.set_style(menu, "display", "none");
        let button = dom.append(menu, "button", "Switch User").unwrap();
        dom.set_style(button, "display", "none");

        let page = Arc::new(HeadlessPage::new("").with_ready_state(ReadyState::Complete));
        let i = interceptor(&dom, page);

        assert_eq!(i.scan(), 1);
        assert!(dom.style(menu, "display").is_none());
        let current = dom.find_by_text("Switch User").unwrap();
        assert_eq!(dom.listener_count(current), 1);
    }
}
