//! auth - Authentication capability and session status
//!
//! # Architecture
//!
//! The host application owns the real authentication capability (its API
//! client). The coordinator never assumes it exists at startup; it probes an
//! [`ApiSlot`] every time it needs one, and the host installs the client
//! whenever it becomes ready.
//!
//! # Components
//!
//! - [`ApiClient`] - Trait for the host's authentication capability
//! - [`ApiSlot`] - Capability probe the host installs a client into
//! - [`AuthFailure`] - Failure shape and unauthorized classification
//! - [`SessionStatusSource`] - Advisory session-status query
//! - [`EmbyApiClient`] - HTTP capability used by the CLI
//! - [`mock::MockApiClient`] - Scriptable capability for tests
//!
//! # Security
//!
//! Secrets and access tokens never appear in logs, errors, or `Debug` output.

mod emby;
mod errors;
pub mod mock;
mod session_status;

use std::sync::{Arc, RwLock};

pub use emby::{AuthenticatedUser, AuthenticationResult, EmbyApiClient};
pub use errors::{AuthFailure, FailureClass, UnauthorizedShape, UNAUTHORIZED};
pub use session_status::{
    FixedSessionStatus, HttpSessionStatus, SessionStatus, SessionStatusError,
    SessionStatusSource,
};

/// The host's authentication capability.
///
/// # Implementation Notes
///
/// - `authenticate_by_name` persists the resulting session into the
///   credential record itself; the coordinator only observes the record.
/// - `ensure_live_connection` and `logout` are fire-and-forget.
#[async_trait::async_trait]
pub trait ApiClient: Send + Sync {
    /// Sign in with a user name and secret.
    async fn authenticate_by_name(&self, name: &str, secret: &str) -> Result<(), AuthFailure>;

    /// Open (or confirm) the live server connection after sign-in.
    fn ensure_live_connection(&self);

    /// End the server-side session.
    fn logout(&self);
}

/// Capability probe for the authentication capability.
///
/// Empty until the host installs a client.
#[derive(Default)]
pub struct ApiSlot {
    client: RwLock<Option<Arc<dyn ApiClient>>>,
}

impl ApiSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that already holds `client`.
    pub fn with_client(client: Arc<dyn ApiClient>) -> Self {
        Self {
            client: RwLock::new(Some(client)),
        }
    }

    /// Make the capability available.
    pub fn install(&self, client: Arc<dyn ApiClient>) {
        if let Ok(mut slot) = self.client.write() {
            *slot = Some(client);
        }
    }

    /// Withdraw the capability.
    pub fn clear(&self) {
        if let Ok(mut slot) = self.client.write() {
            *slot = None;
        }
    }

    /// The capability, if currently available.
    pub fn current(&self) -> Option<Arc<dyn ApiClient>> {
        self.client.read().ok().and_then(|slot| slot.clone())
    }

    pub fn is_available(&self) -> bool {
        self.current().is_some()
    }
}

impl std::fmt::Debug for ApiSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSlot")
            .field("available", &self.is_available())
            .finish()
    }
}
