//! probe command - Report whether the credential store holds a usable token

use std::path::Path;

use crate::cli::Context;
use anyhow::Result;

use super::open_probe;

/// Print `authenticated` or `signed out`.
///
/// The probe never fails on store contents; only opening the store can.
pub fn probe(ctx: &Context, store: Option<&Path>) -> Result<()> {
    let config = ctx.load_config()?;
    let probe = open_probe(&config.file, store)?;

    if probe.is_authenticated() {
        println!("authenticated");
    } else {
        println!("signed out");
    }
    Ok(())
}
