//! sso-bridge - Automatic sign-in and sign-out interception behind an OAuth2 proxy
//!
//! A media server sits behind an OAuth2 proxy. Users who pass the proxy
//! should never see the server's own login screen, and the server's own
//! sign-out and switch-user controls must send them through the identity
//! provider instead of leaving them on a dead end.
//!
//! # Architecture
//!
//! Two subsystems share one pattern: many unreliable signals feeding one
//! idempotent action.
//!
//! - [`login`] - Gate plus trigger registry; at most one sign-in in flight
//! - [`intercept`] - Re-applied rewrite of destructive controls
//! - [`trigger`] - Cancellable recurring timers
//! - [`host`] - Page and document traits, with in-process implementations
//! - [`auth`] - Authentication capability, failure classification, session status
//! - [`store`] - Key-value storage standing in for the page's local storage
//! - [`core`] - Configuration, credential record, route classification
//! - [`cli`] - Command-line interface layer
//!
//! # Correctness Invariants
//!
//! 1. At most one authentication attempt is ever in flight
//! 2. Once redirecting to the identity provider, no further attempts occur
//! 3. An element instance is rewritten at most once
//! 4. All login timers stop together once signed in or terminal

pub mod auth;
pub mod cli;
pub mod core;
pub mod host;
pub mod intercept;
pub mod login;
pub mod store;
pub mod trigger;
