//! core
//!
//! Core domain types and configuration for sso-bridge.
//!
//! # Modules
//!
//! - [`config`] - Configuration schema and loading
//! - [`credentials`] - Credential record model and the auth-state probe
//! - [`route`] - Navigation-state classification of route fragments
//!
//! # Design Principles
//!
//! - Schemas are strict and self-describing
//! - Reading external data never panics; bad data reads as "not yet"
//! - Classification is a pure function of its input

pub mod config;
pub mod credentials;
pub mod route;
