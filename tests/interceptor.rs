//! Integration tests for control interception.
//!
//! A [`VirtualDom`] stands in for the host's document. Mutation
//! notifications are delivered on the runtime, so tests await a short
//! (paused) sleep after changing the tree.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sso_bridge::auth::mock::MockApiClient;
use sso_bridge::auth::ApiSlot;
use sso_bridge::core::config::BridgeConfig;
use sso_bridge::core::credentials::CredentialProbe;
use sso_bridge::host::{
    ClickEvent, Document, ElementRef, HeadlessPage, Listener, ListenerPhase, Navigation, NodeId,
    ReadyState, VirtualDom,
};
use sso_bridge::intercept::marker::is_marked;
use sso_bridge::intercept::rewrite::rewrite;
use sso_bridge::intercept::{ActionEffects, InterceptRule, Interceptor, RuleKind};
use sso_bridge::store::MemoryStore;

// =============================================================================
// Test Fixtures
// =============================================================================

struct Fixture {
    config: BridgeConfig,
    dom: VirtualDom,
    body: NodeId,
    page: Arc<HeadlessPage>,
    probe: CredentialProbe,
    api: MockApiClient,
    slot: Arc<ApiSlot>,
}

impl Fixture {
    fn new() -> Self {
        let config = BridgeConfig::default();
        let dom = VirtualDom::with_body();
        let body = dom.body().expect("body");
        let page = Arc::new(HeadlessPage::new("#!/home").with_ready_state(ReadyState::Complete));
        let probe = CredentialProbe::new(Arc::new(MemoryStore::new()), &config.storage);
        probe.record_login("server", "user", "token").unwrap();
        let api = MockApiClient::succeeding();
        let slot = Arc::new(ApiSlot::with_client(Arc::new(api.clone())));
        Self {
            config,
            dom,
            body,
            page,
            probe,
            api,
            slot,
        }
    }

    fn interceptor(&self) -> Arc<Interceptor> {
        self.interceptor_over(Arc::new(self.dom.clone()))
    }

    fn interceptor_over(&self, document: Arc<dyn Document>) -> Arc<Interceptor> {
        Interceptor::new(
            &self.config,
            document,
            self.page.clone(),
            self.slot.clone(),
            self.probe.clone(),
        )
    }

    fn effects(&self) -> Arc<ActionEffects> {
        Arc::new(ActionEffects::new(
            self.slot.clone(),
            self.probe.clone(),
            self.page.clone(),
        ))
    }

    fn sign_out_rule(&self) -> InterceptRule {
        InterceptRule::new(RuleKind::SignOut, &self.config.redirects.sign_out)
    }

    fn button(&self, text: &str) -> NodeId {
        self.dom.append(self.body, "button", text).expect("append")
    }
}

/// A document whose mutation observer never attaches.
struct DeafDocument(VirtualDom);

impl Document for DeafDocument {
    fn has_body(&self) -> bool {
        self.0.has_body()
    }

    fn interactive_elements(&self) -> Vec<ElementRef> {
        self.0.interactive_elements()
    }

    fn observe_subtree(&self, _callback: Listener) -> bool {
        false
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

// =============================================================================
// Idempotent rewriting
// =============================================================================

#[tokio::test]
async fn rewriting_twice_attaches_one_handler() {
    let f = Fixture::new();
    let id = f.button("注销退出");
    let element = f.dom.element(id).unwrap();
    let effects = f.effects();
    let rule = f.sign_out_rule();

    assert!(rewrite(&element, &rule, &effects));
    assert!(!rewrite(&element, &rule, &effects));

    let clone_id = f.dom.find_by_text("注销退出").unwrap();
    assert_ne!(clone_id, id);
    let clone = f.dom.element(clone_id).unwrap();
    assert!(!rewrite(&clone, &rule, &effects));

    assert!(is_marked(element.as_ref()));
    assert!(is_marked(clone.as_ref()));
    assert_eq!(f.dom.listener_count(clone_id), 1);
    assert!(!f.dom.is_attached(id));
}

#[tokio::test(start_paused = true)]
async fn repeated_scans_do_not_stack_handlers() {
    let f = Fixture::new();
    f.button("Sign out");
    let interceptor = f.interceptor();
    interceptor.install();
    assert_eq!(interceptor.rewrites(), 1);

    for _ in 0..5 {
        assert_eq!(interceptor.scan(), 0);
    }
    tokio::time::sleep(Duration::from_secs(3)).await;

    let id = f.dom.find_by_text("Sign out").unwrap();
    assert_eq!(f.dom.listener_count(id), 1);
    assert_eq!(interceptor.rewrites(), 1);
}

#[tokio::test(start_paused = true)]
async fn rerendered_control_is_rewritten_again() {
    let f = Fixture::new();
    f.button("注销退出");
    let interceptor = f.interceptor();
    interceptor.install();
    let rewritten = f.dom.find_by_text("注销退出").unwrap();

    let fresh = f.dom.rerender(rewritten).unwrap();
    assert!(!is_marked(f.dom.element(fresh).unwrap().as_ref()));
    assert_eq!(interceptor.scan(), 1);

    let current = f.dom.find_by_text("注销退出").unwrap();
    assert!(is_marked(f.dom.element(current).unwrap().as_ref()));
    assert_eq!(f.dom.listener_count(current), 1);
}

#[tokio::test(start_paused = true)]
async fn rerender_is_caught_by_the_observer() {
    let f = Fixture::new();
    f.button("Switch User");
    let interceptor = f.interceptor();
    interceptor.install();
    settle().await;

    let rewritten = f.dom.find_by_text("Switch User").unwrap();
    f.dom.rerender(rewritten);
    settle().await;

    assert_eq!(interceptor.rewrites(), 2);
    let current = f.dom.find_by_text("Switch User").unwrap();
    assert!(is_marked(f.dom.element(current).unwrap().as_ref()));
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test(start_paused = true)]
async fn scenario_injected_sign_out_is_neutralised() {
    let f = Fixture::new();
    let interceptor = f.interceptor();
    interceptor.install();
    assert!(interceptor.is_observing());
    assert_eq!(interceptor.rewrites(), 0);

    let host_clicks = Arc::new(AtomicUsize::new(0));
    let id = f.button("注销退出");
    let counter = host_clicks.clone();
    f.dom.add_click_listener(
        id,
        ListenerPhase::Bubble,
        Arc::new(move |_: &mut ClickEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    let body_clicks = Arc::new(AtomicUsize::new(0));
    let counter = body_clicks.clone();
    f.dom.add_click_listener(
        f.body,
        ListenerPhase::Bubble,
        Arc::new(move |_: &mut ClickEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    settle().await;
    assert_eq!(interceptor.rewrites(), 1);

    let control = f.dom.find_by_text("注销退出").unwrap();
    let event = f.dom.click(control);

    assert!(event.default_prevented());
    assert_eq!(host_clicks.load(Ordering::SeqCst), 0);
    assert_eq!(body_clicks.load(Ordering::SeqCst), 0);
    assert!(!f.probe.is_authenticated());
    assert_eq!(f.api.logouts(), 1);
    assert_eq!(
        f.page.last_navigation(),
        Some(Navigation::Assign("/oauth2/sign_out?rd=%2Flogin.html".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn switch_user_clears_without_logout() {
    let f = Fixture::new();
    f.button("切换用户");
    let interceptor = f.interceptor();
    interceptor.install();

    let control = f.dom.find_by_text("切换用户").unwrap();
    f.dom.click(control);

    assert!(!f.probe.is_authenticated());
    assert_eq!(f.api.logouts(), 0);
    assert_eq!(
        f.page.last_navigation(),
        Some(Navigation::Assign("/oauth2/sign_in?rd=%2F".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn sign_out_without_capability_still_navigates() {
    let f = Fixture::new();
    f.slot.clear();
    f.button("Logout");
    let interceptor = f.interceptor();
    interceptor.install();

    let control = f.dom.find_by_text("Logout").unwrap();
    f.dom.click(control);

    assert_eq!(f.api.logouts(), 0);
    assert!(!f.probe.is_authenticated());
    assert_eq!(
        f.page.last_navigation(),
        Some(Navigation::Assign("/oauth2/sign_out?rd=%2Flogin.html".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn fallback_poll_covers_a_missing_observer() {
    let f = Fixture::new();
    let interceptor = f.interceptor_over(Arc::new(DeafDocument(f.dom.clone())));
    interceptor.install();
    assert!(!interceptor.is_observing());
    assert!(interceptor.is_polling());

    f.button("Abmelden");
    settle().await;
    assert_eq!(interceptor.rewrites(), 0);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(interceptor.rewrites(), 1);
    let control = f.dom.find_by_text("Abmelden").unwrap();
    assert!(is_marked(f.dom.element(control).unwrap().as_ref()));
}

#[tokio::test(start_paused = true)]
async fn hidden_switch_user_is_revealed_and_rewritten() {
    let f = Fixture::new();
    let menu = f.dom.append(f.body, "div", "").unwrap();
    f.dom.set_style(menu, "display", "none");
    let control = f.dom.append(menu, "button", "Switch User").unwrap();
    f.dom.set_style(control, "visibility", "hidden");

    let interceptor = f.interceptor();
    interceptor.install();

    assert_eq!(f.dom.style(menu, "display"), None);
    assert_eq!(interceptor.rewrites(), 1);
    let current = f.dom.find_by_text("Switch User").unwrap();
    assert!(is_marked(f.dom.element(current).unwrap().as_ref()));
}
