//! core::route
//!
//! Navigation-state classification of the current route fragment.
//!
//! Classification is a pure function of the fragment passed in. Callers read
//! the fragment from the page every time; nothing is cached because the host
//! may change routes between two trigger firings.

use crate::core::config::RouteConfig;

/// Where the page currently is, as far as sign-in is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    /// The fragment contains a login or startup marker.
    LoginRequired,
    /// The fragment is empty or one of the root markers.
    Initial,
    /// Anything else.
    Other,
}

impl NavigationState {
    /// Whether a sign-in attempt is appropriate from this state.
    pub fn wants_login(self) -> bool {
        matches!(self, NavigationState::LoginRequired | NavigationState::Initial)
    }
}

/// Classifies route fragments against configured markers.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    login_markers: Vec<String>,
    root_markers: Vec<String>,
}

impl RouteClassifier {
    pub fn new(config: &RouteConfig) -> Self {
        Self {
            login_markers: config.login_markers.clone(),
            root_markers: config.root_markers.clone(),
        }
    }

    /// Classify a route fragment such as `#!/startup/manuallogin`.
    ///
    /// Login markers win over root markers.
    pub fn classify(&self, fragment: &str) -> NavigationState {
        if self
            .login_markers
            .iter()
            .any(|marker| fragment.contains(marker.as_str()))
        {
            NavigationState::LoginRequired
        } else if fragment.is_empty() || self.root_markers.iter().any(|m| m == fragment) {
            NavigationState::Initial
        } else {
            NavigationState::Other
        }
    }
}

impl Default for RouteClassifier {
    fn default() -> Self {
        Self::new(&RouteConfig::default())
    }
}
