//! login command - Run the login coordinator headlessly
//!
//! # Design
//!
//! The command plays the part of the page: it builds a [`HeadlessPage`] at
//! the requested route, installs an [`EmbyApiClient`] as the capability,
//! starts the coordinator, then advances the page to fully loaded so every
//! page-event trigger fires. It waits for a terminal gate state and prints
//! the navigation log.
//!
//! The secret is never printed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use tokio::time::Instant;

use super::open_probe;
use crate::auth::{ApiSlot, EmbyApiClient, HttpSessionStatus, SessionStatusSource};
use crate::cli::Context;
use crate::host::{HeadlessPage, Navigation, ReadyState};
use crate::login::{GateState, LoginCoordinator, StartOutcome};

/// Arguments of the `login` command.
#[derive(Debug, Clone)]
pub struct LoginArgs {
    pub server: String,
    pub route: String,
    pub timeout_secs: u64,
    pub prompt_secret: bool,
    pub store: Option<PathBuf>,
}

const WAIT_STEP: Duration = Duration::from_millis(50);

/// Run the login command.
pub fn login(ctx: &Context, args: LoginArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(login_async(ctx, args))
}

async fn login_async(ctx: &Context, args: LoginArgs) -> Result<()> {
    let mut config = ctx.load_config()?.file;
    if args.prompt_secret {
        config.login.secret =
            rpassword::prompt_password("Secret: ").context("Failed to read secret")?;
    }

    let probe = open_probe(&config, args.store.as_deref())?;
    let page = Arc::new(HeadlessPage::new(&args.route));
    let api = Arc::new(ApiSlot::with_client(Arc::new(EmbyApiClient::new(
        &args.server,
        probe.clone(),
    ))));
    let session: Arc<dyn SessionStatusSource> = Arc::new(HttpSessionStatus::new(
        &args.server,
        &config.endpoints.session_status,
    ));

    let coordinator =
        LoginCoordinator::new(&config, page.clone(), api, probe.clone(), Some(session));

    if coordinator.start() == StartOutcome::AlreadyAuthenticated {
        println!("Already authenticated; nothing to do.");
        return Ok(());
    }
    page.advance_to(ReadyState::Complete);

    let deadline = Instant::now() + Duration::from_secs(args.timeout_secs);
    while !coordinator.state().is_terminal() && Instant::now() < deadline {
        tokio::time::sleep(WAIT_STEP).await;
    }
    let state = coordinator.state();
    if state == GateState::Completed {
        // Let the home navigation and both notifications land.
        tokio::time::sleep(config.timing.settle() + config.timing.renotify() + WAIT_STEP).await;
    }
    coordinator.cancel_all();

    if !ctx.quiet {
        for navigation in page.navigations() {
            println!("  {}", describe(&navigation));
        }
    }
    println!("state: {}", state);

    match state {
        GateState::Completed => {
            if !probe.is_authenticated() {
                bail!("Sign-in reported success but no usable token was stored");
            }
            Ok(())
        }
        GateState::RedirectingExternal => {
            let target = page
                .navigations()
                .into_iter()
                .rev()
                .find_map(|n| match n {
                    Navigation::Replace(url) => Some(url),
                    _ => None,
                })
                .unwrap_or_default();
            bail!("Not authorized; sign in through the identity provider at {}", target)
        }
        _ => {
            if let Some(failure) = coordinator.gate().last_failure() {
                bail!(
                    "Timed out after {}s; last failure: {}",
                    args.timeout_secs,
                    failure
                );
            }
            bail!("Timed out after {}s", args.timeout_secs)
        }
    }
}

fn describe(navigation: &Navigation) -> String {
    match navigation {
        Navigation::Assign(url) => format!("assign   {}", url),
        Navigation::Replace(url) => format!("replace  {}", url),
        Navigation::Route(fragment) => format!("route    {}", fragment),
        Navigation::Notify(path) => format!("notify   {}", path),
    }
}
