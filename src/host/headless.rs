//! host::headless
//!
//! An in-process [`Page`] that records every navigation instead of
//! performing it. Used by the CLI and by tests.
//!
//! # Example
//!
//! ```
//! use sso_bridge::host::{HeadlessPage, Navigation, Page};
//!
//! let page = HeadlessPage::new("#!/startup/manuallogin");
//! page.replace("/oauth2/sign_in?rd=%2F");
//! assert_eq!(
//!     page.last_navigation(),
//!     Some(Navigation::Replace("/oauth2/sign_in?rd=%2F".into()))
//! );
//! ```

use std::sync::Mutex;

use super::page::{Listener, Page, PageEvent, ReadyState};

/// A recorded navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// History-preserving navigation.
    Assign(String),
    /// History-replacing navigation.
    Replace(String),
    /// Route fragment change.
    Route(String),
    /// Synthetic navigation-state notification.
    Notify(String),
}

impl Navigation {
    /// Whether this navigation leaves the page.
    pub fn leaves_page(&self) -> bool {
        matches!(self, Navigation::Assign(_) | Navigation::Replace(_))
    }
}

struct HeadlessInner {
    fragment: String,
    ready: ReadyState,
    listeners: Vec<(PageEvent, Listener)>,
    log: Vec<Navigation>,
}

/// Headless page.
pub struct HeadlessPage {
    inner: Mutex<HeadlessInner>,
    load_begin: bool,
}

impl HeadlessPage {
    /// A page at `fragment`, still loading.
    pub fn new(fragment: &str) -> Self {
        Self {
            inner: Mutex::new(HeadlessInner {
                fragment: fragment.to_string(),
                ready: ReadyState::Loading,
                listeners: Vec::new(),
                log: Vec::new(),
            }),
            load_begin: false,
        }
    }

    /// Expose the optional [`PageEvent::LoadBegin`] capability.
    pub fn with_load_begin(mut self) -> Self {
        self.load_begin = true;
        self
    }

    /// Start in the given readiness state without firing events.
    pub fn with_ready_state(self, state: ReadyState) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.ready = state;
        }
        self
    }

    /// Deliver `event` to its listeners.
    pub fn fire(&self, event: PageEvent) {
        let listeners: Vec<Listener> = match self.inner.lock() {
            Ok(inner) => inner
                .listeners
                .iter()
                .filter(|(e, _)| *e == event)
                .map(|(_, l)| l.clone())
                .collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener();
        }
    }

    /// Advance readiness, firing `ContentReady` / `Load` on the way.
    pub fn advance_to(&self, state: ReadyState) {
        let previous = match self.inner.lock() {
            Ok(mut inner) if inner.ready < state => std::mem::replace(&mut inner.ready, state),
            _ => return,
        };
        if previous < ReadyState::Interactive && state >= ReadyState::Interactive {
            self.fire(PageEvent::ContentReady);
        }
        if state == ReadyState::Complete {
            self.fire(PageEvent::Load);
        }
    }

    /// Every navigation so far, oldest first.
    pub fn navigations(&self) -> Vec<Navigation> {
        self.inner.lock().map(|i| i.log.clone()).unwrap_or_default()
    }

    pub fn last_navigation(&self) -> Option<Navigation> {
        self.inner.lock().ok().and_then(|i| i.log.last().cloned())
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: PageEvent) -> usize {
        self.inner
            .lock()
            .map(|i| i.listeners.iter().filter(|(e, _)| *e == event).count())
            .unwrap_or(0)
    }

    fn record(&self, navigation: Navigation) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.log.push(navigation);
        }
    }
}

impl Page for HeadlessPage {
    fn route_fragment(&self) -> String {
        self.inner
            .lock()
            .map(|i| i.fragment.clone())
            .unwrap_or_default()
    }

    fn set_route_fragment(&self, fragment: &str) {
        let changed = match self.inner.lock() {
            Ok(mut inner) if inner.fragment != fragment => {
                inner.fragment = fragment.to_string();
                inner.log.push(Navigation::Route(fragment.to_string()));
                true
            }
            _ => false,
        };
        if changed {
            self.fire(PageEvent::RouteChange);
        }
    }

    fn notify_navigation(&self, state_path: &str) {
        self.record(Navigation::Notify(state_path.to_string()));
    }

    fn assign(&self, url: &str) {
        self.record(Navigation::Assign(url.to_string()));
    }

    fn replace(&self, url: &str) {
        self.record(Navigation::Replace(url.to_string()));
    }

    fn ready_state(&self) -> ReadyState {
        self.inner
            .lock()
            .map(|i| i.ready)
            .unwrap_or(ReadyState::Loading)
    }

    fn add_listener(&self, event: PageEvent, listener: Listener) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.listeners.push((event, listener));
        }
    }

    fn supports(&self, event: PageEvent) -> bool {
        match event {
            PageEvent::LoadBegin => self.load_begin,
            _ => true,
        }
    }
}

impl std::fmt::Debug for HeadlessPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessPage")
            .field("fragment", &self.route_fragment())
            .field("ready", &self.ready_state())
            .field("load_begin", &self.load_begin)
            .finish_non_exhaustive()
    }
}
