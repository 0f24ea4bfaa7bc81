use anyhow::Result;
use serde_json::json;
use tracing::debug;

use super::Session;
use crate::fs::remove_if_exists;
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug, Default)]
pub struct RmLocalRequest;

/// Deletes every tracked working file under the invocation directory;
/// records stay, so the next `get` downloads them again.
///
/// # Errors
/// Returns an error if the repository cannot be opened or walked.
pub fn rm_local(ctx: &CommandContext, _request: &RmLocalRequest) -> Result<ExecutionOutcome> {
    let session = Session::open(ctx)?;
    let mut removed = Vec::new();
    for entity in session.walker().tracked(&[".".to_string()])? {
        match remove_if_exists(&entity.real) {
            Ok(true) => removed.push(entity.label),
            Ok(false) => {}
            Err(err) => debug!(file = %entity.label, %err, "could not remove working file"),
        }
    }
    Ok(ExecutionOutcome::success(
        format!("removed {} local file(s)", removed.len()),
        json!({ "files": removed }),
    ))
}
