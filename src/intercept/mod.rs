//! intercept - Neutralise the host's own sign-out and switch-user controls
//!
//! # Architecture
//!
//! The host regenerates its menus at will, so interception is a scan that
//! is re-run on every signal rather than a one-time patch:
//!
//! - [`rules`] - The two destructive controls and their locale labels
//! - [`matcher`] - Finding a control among the interactive elements
//! - [`marker`] - Per-instance stamp that makes rewriting idempotent
//! - [`rewrite`] - Replacing a control's behaviour, and force-visible
//! - [`Interceptor`] - Observer, fallback poll and start-up handling
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sso_bridge::auth::ApiSlot;
//! use sso_bridge::core::config::BridgeConfig;
//! use sso_bridge::core::credentials::CredentialProbe;
//! use sso_bridge::host::{HeadlessPage, ReadyState, VirtualDom};
//! use sso_bridge::intercept::Interceptor;
//! use sso_bridge::store::MemoryStore;
//!
//! # tokio_test::block_on(async {
//! let config = BridgeConfig::default();
//! let dom = VirtualDom::with_body();
//! let body = dom.body().unwrap();
//! dom.append(body, "button", "注销退出");
//!
//! let interceptor = Interceptor::new(
//!     &config,
//!     Arc::new(dom.clone()),
//!     Arc::new(HeadlessPage::new("").with_ready_state(ReadyState::Complete)),
//!     Arc::new(ApiSlot::new()),
//!     CredentialProbe::new(Arc::new(MemoryStore::new()), &config.storage),
//! );
//! interceptor.install();
//! assert_eq!(interceptor.rewrites(), 1);
//! # });
//! ```

pub mod marker;
pub mod matcher;
pub mod rewrite;
pub mod rules;
mod watcher;

pub use rewrite::ActionEffects;
pub use rules::{InterceptRule, RuleKind};
pub use watcher::Interceptor;
