use std::fs;

use anyhow::{Context, Result};
use got_domain::IgnoreList;
use serde_json::json;
use tracing::debug;

use super::walker::TrackedEntity;
use super::{describe_files, Session};
use crate::errors::GotError;
use crate::fs::remove_if_exists;
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug, Default)]
pub struct RmRequest {
    pub paths: Vec<String>,
    pub recurse: bool,
}

/// Stops tracking files. Remote objects are left in place.
///
/// # Errors
/// Returns an error on the first file that cannot be removed.
pub fn rm(ctx: &CommandContext, request: &RmRequest) -> Result<ExecutionOutcome> {
    if request.paths.is_empty() {
        return Err(GotError::usage("Not enough arguments to rm command").into());
    }
    let session = Session::open(ctx)?;
    let walker = session.walker();
    if !request.recurse {
        walker.reject_directories(&request.paths, "removed")?;
    }

    let mut removed = Vec::new();
    for entity in walker.tracked(&request.paths)? {
        remove_one(ctx, &session, &entity)
            .with_context(|| format!("Failed to remove '{}'", entity.label))?;
        removed.push(entity.label);
    }
    let message = if removed.is_empty() {
        "nothing to remove".to_string()
    } else {
        format!("removed {}", describe_files(&removed))
    };
    Ok(ExecutionOutcome::success(message, json!({ "files": removed })))
}

fn remove_one(ctx: &CommandContext, session: &Session, entity: &TrackedEntity) -> Result<()> {
    if !entity.is_tracked() {
        return Err(GotError::NotTracked(entity.label.clone()).into());
    }
    if let Err(err) = remove_if_exists(&entity.real) {
        debug!(file = %entity.label, %err, "leaving working file in place");
    }

    let root = session.root();
    let git = ctx.git();
    let sidecar = entity.sidecar_in(root);
    if git.staged_additions(root)?.contains(&sidecar) {
        git.unstage(root, &sidecar)?;
        fs::remove_file(&entity.sidecar)
            .with_context(|| format!("failed to delete {}", entity.sidecar.display()))?;
    } else {
        fs::remove_file(&entity.sidecar)
            .with_context(|| format!("failed to delete {}", entity.sidecar.display()))?;
        git.stage_removal(root, &sidecar)?;
    }

    let mut ignore = IgnoreList::load(root)?;
    if ignore.remove(&entity.label) {
        ignore.save()?;
        git.stage(root, ignore.path())?;
    }
    Ok(())
}
