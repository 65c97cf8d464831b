//! core::config::schema
//!
//! Configuration schema types.
//!
//! Every section is optional in the file; missing sections and fields take
//! the defaults below. Unknown fields are rejected so typos surface early.
//!
//! # Example
//!
//! ```toml
//! [login]
//! username = "household"
//! secret = ""
//!
//! [storage]
//! provider = "file"
//! credentials_key = "servercredentials3"
//!
//! [redirects]
//! sign_in = "/oauth2/sign_in?rd=%2F"
//!
//! [timing]
//! backup_poll_ms = 2000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Fixed credential pair used for every sign-in attempt
    pub login: LoginConfig,

    /// Host storage keys and provider
    pub storage: StorageConfig,

    /// Identity-provider and home navigation targets
    pub redirects: RedirectConfig,

    /// Advisory endpoints
    pub endpoints: EndpointConfig,

    /// Route fragment markers
    pub routes: RouteConfig,

    /// Trigger intervals and delays
    pub timing: TimingConfig,
}

impl BridgeConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.login.username.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "login.username must not be empty".into(),
            ));
        }

        if !crate::store::PROVIDERS.contains(&self.storage.provider.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "invalid storage provider '{}', must be one of: {}",
                self.storage.provider,
                crate::store::PROVIDERS.join(", ")
            )));
        }
        if self.storage.credentials_key.is_empty() {
            return Err(ConfigError::InvalidValue(
                "storage.credentials_key must not be empty".into(),
            ));
        }

        for (name, value) in [
            ("redirects.sign_in", &self.redirects.sign_in),
            ("redirects.session_sign_in", &self.redirects.session_sign_in),
            ("redirects.sign_out", &self.redirects.sign_out),
            ("redirects.switch_user", &self.redirects.switch_user),
            ("endpoints.session_status", &self.endpoints.session_status),
        ] {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must not be empty",
                    name
                )));
            }
        }

        // An empty login marker would classify every route as a login page.
        if self.routes.login_markers.iter().any(|m| m.is_empty()) {
            return Err(ConfigError::InvalidValue(
                "routes.login_markers must not contain empty strings".into(),
            ));
        }

        self.timing.validate()
    }
}

/// Fixed credential pair.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoginConfig {
    /// User name passed to the authentication capability
    pub username: String,

    /// Secret passed alongside the user name (may be empty)
    pub secret: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            username: "autologin".to_string(),
            secret: String::new(),
        }
    }
}

// Custom Debug to avoid exposing the secret
impl std::fmt::Debug for LoginConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginConfig")
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Host storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Store provider ("file" or "memory")
    pub provider: String,

    /// Storage file override for the file provider
    pub path: Option<PathBuf>,

    /// Key holding the JSON credential record
    pub credentials_key: String,

    /// Key holding the PIN-validated session flag
    pub session_flag_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: crate::store::DEFAULT_PROVIDER.to_string(),
            path: None,
            credentials_key: "servercredentials3".to_string(),
            session_flag_key: "pin_validated".to_string(),
        }
    }
}

/// Navigation targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RedirectConfig {
    /// Identity-provider sign-in, used when an attempt is rejected as unauthorized
    pub sign_in: String,

    /// Identity-provider sign-in, used when the session endpoint answers 401
    pub session_sign_in: String,

    /// Identity-provider sign-out, used by the sign-out control
    pub sign_out: String,

    /// Identity-provider sign-in, used by the switch-user control
    pub switch_user: String,

    /// Route fragment navigated to after a successful sign-in
    pub home_route: String,

    /// State path carried by the synthetic navigation notifications
    pub home_state_path: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            sign_in: "/oauth2/sign_in?rd=%2F".to_string(),
            session_sign_in: "/oauth2/sign_in?rd=%2Fweb%2Findex.html".to_string(),
            sign_out: "/oauth2/sign_out?rd=%2Flogin.html".to_string(),
            switch_user: "/oauth2/sign_in?rd=%2F".to_string(),
            home_route: "#!/home".to_string(),
            home_state_path: "/web#!/home".to_string(),
        }
    }
}

/// Advisory endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointConfig {
    /// Session-status path (200 = authenticated, 401 = unauthenticated)
    pub session_status: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            session_status: "/oauth2/userinfo".to_string(),
        }
    }
}

/// Route fragment markers used by the navigation classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RouteConfig {
    /// Substrings marking a login or startup route
    pub login_markers: Vec<String>,

    /// Exact fragments marking the initial (root) route
    pub root_markers: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            login_markers: vec!["manuallogin".to_string(), "startup".to_string()],
            root_markers: vec![String::new(), "#!/".to_string(), "#!/web".to_string()],
        }
    }
}

/// Trigger intervals and delays, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Fast bounded poll interval
    pub quick_poll_ms: u64,

    /// Fast bounded poll iteration cap
    pub quick_poll_max: u32,

    /// Unbounded backup poll interval
    pub backup_poll_ms: u64,

    /// Authentication capability detection poll interval
    pub capability_poll_ms: u64,

    /// Delay between a successful sign-in and the home navigation
    pub settle_ms: u64,

    /// Delay before the second navigation notification
    pub renotify_ms: u64,

    /// Interceptor fallback poll interval
    pub intercept_poll_ms: u64,

    /// Interval while waiting for the document body
    pub body_wait_ms: u64,

    /// Give up waiting for the body and initialise anyway after this long
    pub body_wait_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            quick_poll_ms: 50,
            quick_poll_max: 200,
            backup_poll_ms: 2000,
            capability_poll_ms: 100,
            settle_ms: 50,
            renotify_ms: 1,
            intercept_poll_ms: 500,
            body_wait_ms: 50,
            body_wait_timeout_ms: 5000,
        }
    }
}

impl TimingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("timing.quick_poll_ms", self.quick_poll_ms),
            ("timing.backup_poll_ms", self.backup_poll_ms),
            ("timing.capability_poll_ms", self.capability_poll_ms),
            ("timing.intercept_poll_ms", self.intercept_poll_ms),
            ("timing.body_wait_ms", self.body_wait_ms),
            ("timing.body_wait_timeout_ms", self.body_wait_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        if self.quick_poll_max == 0 {
            return Err(ConfigError::InvalidValue(
                "timing.quick_poll_max must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn quick_poll(&self) -> Duration {
        Duration::from_millis(self.quick_poll_ms)
    }

    pub fn backup_poll(&self) -> Duration {
        Duration::from_millis(self.backup_poll_ms)
    }

    pub fn capability_poll(&self) -> Duration {
        Duration::from_millis(self.capability_poll_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn renotify(&self) -> Duration {
        Duration::from_millis(self.renotify_ms)
    }

    pub fn intercept_poll(&self) -> Duration {
        Duration::from_millis(self.intercept_poll_ms)
    }

    pub fn body_wait(&self) -> Duration {
        Duration::from_millis(self.body_wait_ms)
    }

    pub fn body_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.body_wait_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        BridgeConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn parse_partial_file_fills_defaults() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [login]
            username = "household"

            [timing]
            backup_poll_ms = 5000
            "#,
        )
        .unwrap();

        assert_eq!(config.login.username, "household");
        assert_eq!(config.login.secret, "");
        assert_eq!(config.timing.backup_poll_ms, 5000);
        assert_eq!(config.timing.quick_poll_ms, 50);
        assert_eq!(config.storage.credentials_key, "servercredentials3");
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<BridgeConfig, _> = toml::from_str(
            r#"
            [login]
            user = "typo"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_username_rejected() {
        let mut config = BridgeConfig::default();
        config.login.username = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_provider_rejected() {
        let mut config = BridgeConfig::default();
        config.storage.provider = "keychain".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("keychain"));
    }

    #[test]
    fn empty_login_marker_rejected() {
        let mut config = BridgeConfig::default();
        config.routes.login_markers.push(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = BridgeConfig::default();
        config.timing.intercept_poll_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("intercept_poll_ms"));
    }

    #[test]
    fn zero_body_wait_timeout_rejected() {
        let config: BridgeConfig = toml::from_str("[timing]\nbody_wait_timeout_ms = 0").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("body_wait_timeout_ms"));
    }

    #[test]
    fn debug_redacts_secret() {
        let login = LoginConfig {
            username: "household".into(),
            secret: "hunter2".into(),
        };
        let debug = format!("{:?}", login);
        assert!(debug.contains("household"));
        assert!(!debug.contains("hunter2"));
    }
}
