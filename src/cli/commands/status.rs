//! status command - Query the session-status endpoint

use crate::auth::{HttpSessionStatus, SessionStatus};
use crate::cli::Context;
use anyhow::Result;

/// Print the session-status classification for `base_url`.
pub fn status(ctx: &Context, base_url: &str) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(status_async(ctx, base_url))
}

async fn status_async(ctx: &Context, base_url: &str) -> Result<()> {
    let config = ctx.load_config()?;
    let source = HttpSessionStatus::new(base_url, &config.file.endpoints.session_status);

    let status = match source.fetch().await {
        Ok(code) => {
            if !ctx.quiet {
                println!("{} -> HTTP {}", source.url(), code.as_u16());
            }
            SessionStatus::from_status(code)
        }
        Err(e) => {
            if !ctx.quiet {
                println!("{} -> {}", source.url(), e);
            }
            SessionStatus::Inconclusive
        }
    };
    println!("{}", status);
    Ok(())
}
