use anyhow::{Context, Result};
use serde_json::json;

use super::walker::TrackedEntity;
use super::{LocalState, Session};
use crate::errors::GotError;
use crate::store::CacheFill;
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug, Default)]
pub struct FillCacheRequest {
    pub paths: Vec<String>,
}

/// Copies clean working files into the local cache.
///
/// # Errors
/// Returns an error on the first file whose record cannot be read or whose
/// remote is unknown.
pub fn fill_local_cache(ctx: &CommandContext, request: &FillCacheRequest) -> Result<ExecutionOutcome> {
    let paths = if request.paths.is_empty() {
        vec![".".to_string()]
    } else {
        request.paths.clone()
    };
    let session = Session::open(ctx)?;

    let mut lines = vec!["Filling current cache".to_string(), "# Cache status".to_string()];
    let mut entries = Vec::new();
    for entity in session.walker().tracked(&paths)? {
        let (status, line) = fill_one(&session, &entity)
            .with_context(|| format!("Failed to fill cache for '{}'", entity.label))?;
        lines.push(format!("# {line}"));
        entries.push(json!({ "path": entity.label, "status": status }));
    }
    Ok(ExecutionOutcome::report(
        lines.join("\n"),
        json!({ "files": entries }),
    ))
}

fn fill_one(session: &Session, entity: &TrackedEntity) -> Result<(&'static str, String)> {
    let record = entity.record()?;
    let label = &entity.label;
    match LocalState::of(&entity.real, &record.checksum)? {
        LocalState::Missing => {
            return Ok((
                "missing",
                format!("Missing locally: '{label}' (remote '{}')", record.remote),
            ))
        }
        LocalState::Modified => {
            return Ok((
                "modified",
                format!("Modified: '{label}' (remote '{}')", record.remote),
            ))
        }
        LocalState::Clean => {}
    }

    let store = session
        .registry()
        .get(&record.remote)
        .ok_or_else(|| GotError::configuration(format!("Remote '{}' not known", record.remote)))?;
    let fill = match store.cache() {
        Some(cache) if cache.contains(&record.checksum) => CacheFill::AlreadyPresent,
        Some(cache) => cache.store(&entity.real, &record.checksum),
        None => CacheFill::Failed,
    };
    Ok(match fill {
        CacheFill::AlreadyPresent => ("cached", format!("File already in cache: '{label}'")),
        CacheFill::Stored => ("added", format!("Adding file to local cache: '{label}'")),
        CacheFill::Failed => ("failed", format!("Failed adding to local cache: '{label}'")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::test_support::{args, TestRepo};
    use crate::sync::{add, AddRequest};
    use std::fs;

    #[test]
    fn fill_reports_each_file_state() -> Result<()> {
        let repo = TestRepo::new()?;
        for name in ["a.bin", "b.bin", "c.bin"] {
            repo.write(name, name.as_bytes())?;
        }
        let ctx = repo.ctx()?;
        add(
            &ctx,
            &AddRequest {
                paths: args(&["a.bin", "b.bin", "c.bin"]),
                ..AddRequest::default()
            },
        )?;
        fs::remove_dir_all(&repo.cache)?;
        fs::remove_file(repo.root.join("b.bin"))?;
        fs::write(repo.root.join("c.bin"), b"edited")?;

        let outcome = fill_local_cache(&ctx, &FillCacheRequest::default())?;
        assert_eq!(
            outcome.message,
            "Filling current cache\n\
             # Cache status\n\
             # Adding file to local cache: 'a.bin'\n\
             # Missing locally: 'b.bin' (remote 'origin')\n\
             # Modified: 'c.bin' (remote 'origin')"
        );

        let again = fill_local_cache(
            &ctx,
            &FillCacheRequest {
                paths: args(&["a.bin"]),
            },
        )?;
        assert_eq!(again.details["files"][0]["status"], "cached");
        Ok(())
    }
}
