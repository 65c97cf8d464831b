//! auth::errors
//!
//! Authentication failure shape and its classification.
//!
//! # Design
//!
//! The upstream authentication capability reports failures in several
//! inconsistent shapes: sometimes an HTTP-style `status`, sometimes a
//! `statusCode`, sometimes an `ok: false` flag next to the status. Every
//! shape is kept on [`AuthFailure`] and classification checks each accepted
//! shape explicitly rather than trusting a single field.
//!
//! # Example
//!
//! ```
//! use sso_bridge::auth::{AuthFailure, FailureClass, UnauthorizedShape};
//!
//! let failure = AuthFailure::with_status_code(401, "bad credentials");
//! assert_eq!(
//!     failure.class(),
//!     FailureClass::Unauthorized(UnauthorizedShape::StatusCode)
//! );
//! assert_eq!(AuthFailure::network("timed out").class(), FailureClass::Transient);
//! ```

use thiserror::Error;

/// HTTP status code meaning "unauthorized".
pub const UNAUTHORIZED: u16 = 401;

/// A failed authentication call, in whatever shape upstream reported it.
///
/// Never carries the secret that was submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("authentication failed: {message} (status: {status:?}, status code: {status_code:?}, ok: {ok:?})")]
pub struct AuthFailure {
    /// Primary HTTP status, when reported.
    pub status: Option<u16>,
    /// Secondary status code field, when reported.
    pub status_code: Option<u16>,
    /// Response-ok flag, when reported.
    pub ok: Option<bool>,
    /// Human-readable description.
    pub message: String,
}

/// The accepted shapes of an "unauthorized" failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedShape {
    /// `ok` is false and `status` is 401.
    NotOkStatus,
    /// `status` is 401.
    Status,
    /// `status_code` is 401.
    StatusCode,
}

/// How the gate should react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Terminal: redirect to the identity provider, never retry locally.
    Unauthorized(UnauthorizedShape),
    /// Retryable: log, reset, let the next trigger try again.
    Transient,
}

impl AuthFailure {
    /// Failure from an HTTP response with the given status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            status_code: None,
            ok: Some(false),
            message: message.into(),
        }
    }

    /// Failure reported only through the secondary status code field.
    pub fn with_status_code(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            message: message.into(),
            ..Default::default()
        }
    }

    /// Failure with no response at all (transport error, malformed body).
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Which unauthorized shape this failure matches, if any.
    pub fn unauthorized_shape(&self) -> Option<UnauthorizedShape> {
        if self.ok == Some(false) && self.status == Some(UNAUTHORIZED) {
            Some(UnauthorizedShape::NotOkStatus)
        } else if self.status == Some(UNAUTHORIZED) {
            Some(UnauthorizedShape::Status)
        } else if self.status_code == Some(UNAUTHORIZED) {
            Some(UnauthorizedShape::StatusCode)
        } else {
            None
        }
    }

    pub fn class(&self) -> FailureClass {
        match self.unauthorized_shape() {
            Some(shape) => FailureClass::Unauthorized(shape),
            None => FailureClass::Transient,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.unauthorized_shape().is_some()
    }
}

impl From<reqwest::Error> for AuthFailure {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AuthFailure::http(status.as_u16(), err.to_string()),
            None => AuthFailure::network(err.to_string()),
        }
    }
}
