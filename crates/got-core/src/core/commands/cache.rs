use anyhow::{Context, Result};
use serde_json::json;

use crate::sync::checked_registrations;
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug, Default)]
pub struct ClearCacheRequest;

/// Erases the local cache shared by every repository on this machine.
///
/// # Errors
/// Returns an error if the repository is not initialized or the cache
/// directory survives removal.
pub fn clear_local_cache(ctx: &CommandContext, _request: &ClearCacheRequest) -> Result<ExecutionOutcome> {
    checked_registrations(&ctx.repo_root()?)?;
    let cache = ctx.cache();
    let location = &ctx.config().cache().location;
    tracing::debug!(root = %cache.root().display(), source = location.source, "clearing cache");
    cache.clear().context("Failed to clear cache")?;
    Ok(ExecutionOutcome::report(
        "Erasing git got local cache\nCleared local cache",
        json!({ "path": cache.root().display().to_string() }),
    ))
}
