use std::fs;

use anyhow::{Context, Result};
use got_domain::IgnoreList;
use serde_json::json;
use tracing::debug;

use super::walker::TrackedEntity;
use super::Session;
use crate::errors::GotError;
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug)]
pub struct MvRequest {
    pub source: String,
    pub destination: String,
}

/// Renames a tracked file together with its sidecar and ignore entry.
///
/// # Errors
/// Returns an error if the source is a directory or is not tracked, or if
/// the destination is already tracked.
pub fn mv(ctx: &CommandContext, request: &MvRequest) -> Result<ExecutionOutcome> {
    let session = Session::open(ctx)?;
    let walker = session.walker();
    walker.reject_directories(std::slice::from_ref(&request.source), "moved")?;
    walker.resolve_all(&[request.source.clone(), request.destination.clone()])?;

    let source = walker.entity(&request.source);
    let mut destination = walker.entity(&request.destination);
    if destination.real.is_dir() {
        let name = source.real.file_name().unwrap_or_default().to_string_lossy();
        destination = walker.entity(&format!("{}/{name}", request.destination));
    }
    move_one(ctx, &session, &source, &destination).with_context(|| {
        format!(
            "Failed to move '{}' to '{}'",
            source.label, destination.label
        )
    })?;
    Ok(ExecutionOutcome::success(
        format!("moved '{}' to '{}'", source.label, destination.label),
        json!({ "from": source.label, "to": destination.label }),
    ))
}

fn move_one(
    ctx: &CommandContext,
    session: &Session,
    source: &TrackedEntity,
    destination: &TrackedEntity,
) -> Result<()> {
    if !source.is_tracked() {
        return Err(GotError::NotTracked(source.label.clone()).into());
    }
    if destination.is_tracked() {
        return Err(GotError::usage(format!(
            "'{}' is already tracked by got",
            destination.label
        ))
        .into());
    }
    if let Some(parent) = destination.real.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    debug!(from = %source.label, to = %destination.label, "moving working file");
    if let Err(err) = fs::rename(&source.real, &destination.real) {
        debug!(file = %source.label, %err, "working file not moved");
    }

    let root = session.root();
    let git = ctx.git();
    let old_sidecar = source.sidecar_in(root);
    let new_sidecar = destination.sidecar_in(root);
    let staged = git.staged_additions(root)?.contains(&old_sidecar);
    if staged {
        git.unstage(root, &old_sidecar)?;
    }
    fs::rename(&source.sidecar, &destination.sidecar).with_context(|| {
        format!(
            "failed to rename {} to {}",
            source.sidecar.display(),
            destination.sidecar.display()
        )
    })?;
    if !staged {
        git.stage(root, &old_sidecar)?;
    }
    git.stage(root, &new_sidecar)?;

    let mut ignore = IgnoreList::load(root)?;
    ignore.rename(&source.label, &destination.label);
    ignore.save()?;
    git.stage(root, ignore.path())?;
    Ok(())
}
