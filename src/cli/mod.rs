//! cli
//!
//! Command-line interface layer for sso-bridge.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers load configuration, build the store and
//! host objects, and hand them to the library. Errors surface as `anyhow`
//! here and nowhere else.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit config file, if given
    pub config_path: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
}

impl Context {
    /// Load the configuration for this invocation.
    pub fn load_config(&self) -> Result<Config> {
        Config::load(self.config_path.as_deref()).context("Failed to load configuration")
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug, cli.quiet);

    let ctx = Context {
        config_path: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Install the global subscriber, logging to stderr.
///
/// `--debug` and `--quiet` win over `RUST_LOG`; otherwise `RUST_LOG` applies
/// with `info` as the fallback.
fn init_logging(debug: bool, quiet: bool) {
    let filter = if debug {
        EnvFilter::new("debug,hyper=warn,reqwest=warn,h2=warn")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // A second call (e.g. from tests) leaves the first subscriber in place.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
