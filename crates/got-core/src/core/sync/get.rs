use anyhow::{Context, Result};
use serde_json::json;
use tracing::debug;

use super::walker::TrackedEntity;
use super::{describe_files, LocalState, Session};
use crate::errors::GotError;
use crate::fs::apply_mode;
use crate::store::LoadSource;
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug, Default)]
pub struct GetRequest {
    /// Empty means the invocation directory.
    pub paths: Vec<String>,
    pub force: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ResetRequest {
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retrieval {
    UpToDate,
    Fetched(LoadSource),
}

impl Retrieval {
    fn as_str(self) -> &'static str {
        match self {
            Retrieval::UpToDate => "up-to-date",
            Retrieval::Fetched(LoadSource::Cache) => "cache",
            Retrieval::Fetched(LoadSource::Remote) => "remote",
        }
    }
}

/// Materializes tracked files whose working copy is missing or modified.
///
/// # Errors
/// Returns an error on the first file that cannot be retrieved.
pub fn get(ctx: &CommandContext, request: &GetRequest) -> Result<ExecutionOutcome> {
    let paths = if request.paths.is_empty() {
        vec![".".to_string()]
    } else {
        request.paths.clone()
    };
    let session = Session::open(ctx)?;
    retrieve_all(&session, &paths, request.force)
}

/// Restores the named files to their recorded content.
///
/// # Errors
/// Returns an error for directory arguments or on the first file that cannot
/// be retrieved.
pub fn reset(ctx: &CommandContext, request: &ResetRequest) -> Result<ExecutionOutcome> {
    if request.paths.is_empty() {
        return Err(GotError::usage("Not enough arguments to reset command").into());
    }
    let session = Session::open(ctx)?;
    session.walker().reject_directories(&request.paths, "reset")?;
    retrieve_all(&session, &request.paths, false)
}

fn retrieve_all(session: &Session, paths: &[String], force: bool) -> Result<ExecutionOutcome> {
    let mut fetched = Vec::new();
    let mut files = Vec::new();
    for entity in session.walker().tracked(paths)? {
        let retrieval = retrieve(session, &entity, force)
            .with_context(|| format!("Failed to retrieve file '{}'", entity.label))?;
        files.push(json!({ "path": entity.label, "source": retrieval.as_str() }));
        if retrieval != Retrieval::UpToDate {
            fetched.push(entity.label);
        }
    }
    let message = if fetched.is_empty() {
        "all files up to date".to_string()
    } else {
        format!("retrieved {}", describe_files(&fetched))
    };
    Ok(ExecutionOutcome::success(message, json!({ "files": files })))
}

fn retrieve(session: &Session, entity: &TrackedEntity, force: bool) -> Result<Retrieval> {
    let record = entity.record()?;
    if !force && LocalState::of(&entity.real, &record.checksum)? == LocalState::Clean {
        debug!(file = %entity.label, "working file matches record; skipping download");
        return Ok(Retrieval::UpToDate);
    }
    let store = session.registry().get(&record.remote).ok_or_else(|| {
        GotError::configuration(format!(
            "Could not find remote '{}' for file '{}'",
            record.remote, entity.label
        ))
    })?;
    let source = store.load(&entity.real, &record.checksum, &entity.label, force)?;
    apply_mode(&entity.real, record.mode)?;
    Ok(Retrieval::Fetched(source))
}
