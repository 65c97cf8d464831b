//! login - Automatic sign-in
//!
//! # Architecture
//!
//! Many independent readiness signals race to sign the user in. None of them
//! is guaranteed to fire, so all of them are registered, and every one of
//! them funnels into a single [`ActionGate`] that launches at most one
//! authentication call at a time.
//!
//! - [`ActionGate`] - The state machine around the authentication call
//! - [`LoginCoordinator`] - Owns the gate and registers every trigger
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sso_bridge::auth::{mock::MockApiClient, ApiSlot};
//! use sso_bridge::core::config::BridgeConfig;
//! use sso_bridge::core::credentials::CredentialProbe;
//! use sso_bridge::host::HeadlessPage;
//! use sso_bridge::login::{GateState, LoginCoordinator, StartOutcome};
//! use sso_bridge::store::MemoryStore;
//!
//! # tokio_test::block_on(async {
//! let config = BridgeConfig::default();
//! let probe = CredentialProbe::new(Arc::new(MemoryStore::new()), &config.storage);
//! let api = MockApiClient::succeeding().writing_credentials(probe.clone());
//! let page = Arc::new(HeadlessPage::new("#!/"));
//!
//! let coordinator = LoginCoordinator::new(
//!     &config,
//!     page,
//!     Arc::new(ApiSlot::with_client(Arc::new(api))),
//!     probe.clone(),
//!     None,
//! );
//! assert_eq!(coordinator.start(), StartOutcome::Started);
//! assert_eq!(coordinator.state(), GateState::InProgress);
//!
//! tokio::time::sleep(std::time::Duration::from_millis(100)).await;
//! assert_eq!(coordinator.state(), GateState::Completed);
//! assert!(probe.is_authenticated());
//! # });
//! ```

mod coordinator;
mod gate;

pub use coordinator::{LoginCoordinator, StartOutcome};
pub use gate::{ActionGate, GateState};
