use std::collections::HashSet;

use anyhow::{Context, Result};
use got_domain::{file_sha256, IgnoreList, TrackedFileRecord};
use serde_json::json;
use tracing::debug;

use super::walker::TrackedEntity;
use super::{describe_files, Session};
use crate::errors::GotError;
use crate::fs::file_mode;
use crate::store::{CachingStore, StoreOutcome};
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug, Default)]
pub struct AddRequest {
    pub paths: Vec<String>,
    pub recurse: bool,
    pub remote: Option<String>,
}

/// Uploads files and replaces them in git with sidecars.
///
/// # Errors
/// Returns an error on the first file that cannot be added.
pub fn add(ctx: &CommandContext, request: &AddRequest) -> Result<ExecutionOutcome> {
    if request.paths.is_empty() {
        return Err(GotError::usage("Not enough arguments to add command").into());
    }
    let session = Session::open(ctx)?;
    let walker = session.walker();
    if !request.recurse {
        walker.reject_directories(&request.paths, "added")?;
    }
    let known = if request.recurse {
        ctx.git().tracked_paths(session.root())?
    } else {
        HashSet::new()
    };

    let mut added = Vec::new();
    let mut files = Vec::new();
    for entity in walker.untracked(&request.paths, &known)? {
        let (record, outcome) = add_one(ctx, &session, request.remote.as_deref(), &entity)
            .with_context(|| format!("Failed to add '{}'", entity.label))?;
        files.push(json!({
            "path": entity.label,
            "checksum": record.checksum,
            "remote": record.remote,
            "uploaded": outcome == StoreOutcome::Uploaded,
        }));
        added.push(entity.label);
    }

    let message = if added.is_empty() {
        "nothing to add".to_string()
    } else {
        format!("added {}", describe_files(&added))
    };
    Ok(ExecutionOutcome::success(message, json!({ "files": files })))
}

fn add_one(
    ctx: &CommandContext,
    session: &Session,
    remote: Option<&str>,
    entity: &TrackedEntity,
) -> Result<(TrackedFileRecord, StoreOutcome)> {
    let store: &CachingStore = session.registry().resolve(remote)?;
    debug!(file = %entity.label, remote = store.name(), "adding");
    let checksum = file_sha256(&entity.real)?;
    let outcome = store.store(&entity.real, &checksum, &entity.label)?;
    let record = TrackedFileRecord::new(checksum, store.name(), file_mode(&entity.real)?);
    record.write(&entity.sidecar)?;

    let root = session.root();
    ctx.git().stage(root, &entity.sidecar_in(root))?;
    let mut ignore = IgnoreList::load(root)?;
    if ignore.add(&entity.label) {
        ignore.save()?;
        ctx.git().stage(root, ignore.path())?;
    }
    Ok((record, outcome))
}
