//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and opens the store
//! 2. Builds the host objects the library needs
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! `status` and `login` talk to the network. Their handlers build a tokio
//! runtime and block on an async implementation.

mod completion;
mod config_cmd;
mod login;
mod logout;
mod probe;
mod status;

pub use completion::completion;
pub use config_cmd::{path as config_path, show as config_show};
pub use login::{login, LoginArgs};
pub use logout::logout;
pub use probe::probe;
pub use status::status;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::args::{Command, ConfigAction};
use super::Context;
use crate::core::config::BridgeConfig;
use crate::core::credentials::CredentialProbe;
use crate::store::{create_store, FileStore, KeyValueStore};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Probe { store } => probe::probe(ctx, store.as_deref()),
        Command::Status { base_url } => status::status(ctx, &base_url),
        Command::Login {
            server,
            route,
            timeout_secs,
            prompt_secret,
            store,
        } => login::login(
            ctx,
            LoginArgs {
                server,
                route,
                timeout_secs,
                prompt_secret,
                store,
            },
        ),
        Command::Logout { store } => logout::logout(ctx, store.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Show => config_cmd::show(ctx),
            ConfigAction::Path => config_cmd::path(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Open the store named by the configuration, or the file at `store_override`.
fn open_store(config: &BridgeConfig, store_override: Option<&Path>) -> Result<Arc<dyn KeyValueStore>> {
    if let Some(path) = store_override {
        return Ok(Arc::new(FileStore::with_path(path.to_path_buf())));
    }
    let store = create_store(&config.storage.provider, config.storage.path.as_deref())
        .context("Failed to open credential store")?;
    Ok(Arc::from(store))
}

/// Credential probe over the configured (or overridden) store.
fn open_probe(config: &BridgeConfig, store_override: Option<&Path>) -> Result<CredentialProbe> {
    let store = open_store(config, store_override)?;
    Ok(CredentialProbe::new(store, &config.storage))
}
