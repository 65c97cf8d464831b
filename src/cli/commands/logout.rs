//! logout command - Clear cached credentials and the session flag

use std::path::Path;

use crate::cli::Context;
use anyhow::Result;

use super::open_probe;

/// Clear the store the way a rewritten sign-out control does.
pub fn logout(ctx: &Context, store: Option<&Path>) -> Result<()> {
    let config = ctx.load_config()?;
    let probe = open_probe(&config.file, store)?;

    probe.clear();

    if !ctx.quiet {
        println!("Cleared cached credentials.");
    }
    Ok(())
}
