//! host::page
//!
//! The page-level view of the host: route fragment, navigation, readiness
//! and page events.

use std::sync::Arc;

/// A page event listener.
///
/// Listeners run synchronously on the host's event loop and must not block.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Page events a component can hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageEvent {
    /// Document content parsed (fires once).
    ContentReady,
    /// Full page load, including subresources (fires once).
    Load,
    /// The route fragment changed.
    RouteChange,
    /// The host application started loading a view. Optional capability.
    LoadBegin,
}

/// Document readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// The host page.
pub trait Page: Send + Sync {
    /// Current route fragment, e.g. `#!/startup/manuallogin`.
    fn route_fragment(&self) -> String;

    /// Change the route fragment. Fires [`PageEvent::RouteChange`] when the
    /// value actually changes.
    fn set_route_fragment(&self, fragment: &str);

    /// Issue a synthetic navigation-state notification carrying `state_path`.
    fn notify_navigation(&self, state_path: &str);

    /// Navigate to `url`, keeping the current entry in history.
    fn assign(&self, url: &str);

    /// Navigate to `url`, replacing the current history entry.
    fn replace(&self, url: &str);

    fn ready_state(&self) -> ReadyState;

    /// Register a listener. Listeners are never removed.
    fn add_listener(&self, event: PageEvent, listener: Listener);

    /// Whether the host exposes `event` at all.
    fn supports(&self, event: PageEvent) -> bool {
        !matches!(event, PageEvent::LoadBegin)
    }
}
