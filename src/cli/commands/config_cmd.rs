//! config command - Show the effective configuration or its path

use crate::cli::Context;
use crate::core::config::Config;
use anyhow::{Context as _, Result};

/// Print the effective configuration with the secret redacted.
pub fn show(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let rendered = config
        .render_redacted()
        .context("Failed to render configuration")?;

    if !ctx.quiet {
        match config.loaded_from() {
            Some(path) => println!("# loaded from {}", path.display()),
            None => println!("# defaults (no config file found)"),
        }
    }
    print!("{}", rendered);
    Ok(())
}

/// Print the configuration file in use, or where one would be created.
pub fn path(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    match config.loaded_from() {
        Some(path) => println!("{}", path.display()),
        None => {
            let canonical = Config::canonical_path().context("Failed to resolve config path")?;
            println!("{}", canonical.display());
            if !ctx.quiet {
                eprintln!("(not present; defaults in effect)");
            }
        }
    }
    Ok(())
}
