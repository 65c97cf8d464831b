//! intercept::rewrite
//!
//! One-shot replacement of a destructive control's behaviour.
//!
//! # Rewrite
//!
//! The matched element is replaced with a structural clone, which sheds every
//! listener the host attached. The clone is stamped and gets one
//! capture-phase click listener that stops the event and runs the rule's
//! [`ActionEffects`] instead.
//!
//! # Invariants
//!
//! - A stamped element is never rewritten again
//! - A replacement created by the host is a new instance and carries no stamp

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::marker;
use super::rules::{InterceptRule, RuleKind};
use crate::auth::ApiSlot;
use crate::core::credentials::CredentialProbe;
use crate::host::{ClickEvent, Element, ElementRef, ListenerPhase, Page};

/// Side effects run by a rewritten control.
pub struct ActionEffects {
    api: Arc<ApiSlot>,
    probe: CredentialProbe,
    page: Arc<dyn Page>,
}

impl ActionEffects {
    pub fn new(api: Arc<ApiSlot>, probe: CredentialProbe, page: Arc<dyn Page>) -> Self {
        Self { api, probe, page }
    }

    /// Run `rule`'s action.
    ///
    /// Sign-out ends the server session when the capability is present;
    /// both rules then clear cached credentials and leave the page.
    pub fn perform(&self, rule: &InterceptRule) {
        info!(rule = %rule.kind, target_url = %rule.target, "intercepted control clicked");
        if rule.kind == RuleKind::SignOut {
            match self.api.current() {
                Some(api) => api.logout(),
                None => debug!("authentication capability absent; skipping logout"),
            }
        }
        self.probe.clear();
        self.page.assign(&rule.target);
    }
}

impl fmt::Debug for ActionEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEffects")
            .field("api", &self.api)
            .field("probe", &self.probe)
            .finish_non_exhaustive()
    }
}

/// Rewrite `element` for `rule`.
///
/// Returns false when the element is already stamped or is no longer
/// attached to a parent.
pub fn rewrite(element: &ElementRef, rule: &InterceptRule, effects: &Arc<ActionEffects>) -> bool {
    if marker::is_marked(element.as_ref()) {
        return false;
    }
    // Stamp first so stale handles to the old instance read as done.
    marker::stamp(element.as_ref());

    let Some(replacement) = element.replace_with_clone() else {
        debug!(rule = %rule.kind, "matched element detached; skipping");
        return false;
    };
    marker::stamp(replacement.as_ref());

    let rule = rule.clone();
    let effects = Arc::clone(effects);
    replacement.add_click_listener(
        ListenerPhase::Capture,
        Arc::new(move |event: &mut ClickEvent| {
            event.prevent_default();
            event.stop_immediate_propagation();
            effects.perform(&rule);
        }),
    );
    true
}

/// Inline properties cleared on the control itself.
const OWN_HIDE_PROPERTIES: &[&str] = &["display", "visibility", "opacity", "min-width", "min-height"];

/// Clear inline hide styling on `element` and on any ancestor that hides it.
///
/// Idempotent. Returns whether anything was cleared.
pub fn force_visible(element: &dyn Element) -> bool {
    let mut cleared = false;
    for property in OWN_HIDE_PROPERTIES {
        if element.style(property).is_some() {
            element.remove_style(property);
            cleared = true;
        }
    }

    let mut ancestor = element.parent();
    while let Some(node) = ancestor {
        for (property, hiding) in [("display", "none"), ("visibility", "hidden"), ("opacity", "0")] {
            if node.style(property).as_deref() == Some(hiding) {
                node.remove_style(property);
                cleared = true;
            }
        }
        ancestor = node.parent();
    }
    cleared
}
