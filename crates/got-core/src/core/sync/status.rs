use anyhow::{Context, Result};
use serde_json::json;

use super::walker::TrackedEntity;
use super::{LocalState, Session};
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug, Default)]
pub struct StatusRequest {
    pub paths: Vec<String>,
    pub verbose: bool,
}

/// Reports tracked files that are missing or modified; read-only.
///
/// # Errors
/// Returns an error on the first file whose record cannot be read.
pub fn status(ctx: &CommandContext, request: &StatusRequest) -> Result<ExecutionOutcome> {
    let paths = if request.paths.is_empty() {
        vec![".".to_string()]
    } else {
        request.paths.clone()
    };
    let session = Session::open(ctx)?;

    let mut lines = vec!["# Changes".to_string()];
    let mut changes = Vec::new();
    for entity in session.walker().tracked(&paths)? {
        let (state, remote) = classify(&entity)
            .with_context(|| format!("Failed to get status of '{}'", entity.label))?;
        let line = match state {
            LocalState::Missing => format!("Missing locally: '{}' (remote '{remote}')", entity.label),
            LocalState::Modified => format!("Modified: '{}' (remote '{remote}')", entity.label),
            LocalState::Clean if request.verbose => {
                format!("Unmodified: '{}' (remote '{remote}')", entity.label)
            }
            LocalState::Clean => continue,
        };
        lines.push(format!("# {line}"));
        changes.push(json!({
            "path": entity.label,
            "state": state_name(state),
            "remote": remote,
        }));
    }
    Ok(ExecutionOutcome::report(
        lines.join("\n"),
        json!({ "changes": changes }),
    ))
}

fn classify(entity: &TrackedEntity) -> Result<(LocalState, String)> {
    let record = entity.record()?;
    let state = LocalState::of(&entity.real, &record.checksum)?;
    Ok((state, record.remote))
}

fn state_name(state: LocalState) -> &'static str {
    match state {
        LocalState::Missing => "missing",
        LocalState::Modified => "modified",
        LocalState::Clean => "unmodified",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::test_support::{args, TestRepo};
    use crate::sync::{add, AddRequest};
    use std::fs;

    fn setup() -> Result<TestRepo> {
        let repo = TestRepo::new()?;
        repo.write("a.bin", b"a")?;
        repo.write("b.bin", b"b")?;
        repo.write("c.bin", b"c")?;
        add(
            &repo.ctx()?,
            &AddRequest {
                paths: args(&["a.bin", "b.bin", "c.bin"]),
                ..AddRequest::default()
            },
        )?;
        Ok(repo)
    }

    #[test]
    fn clean_repository_reports_only_the_header() -> Result<()> {
        let repo = setup()?;
        let outcome = status(&repo.ctx()?, &StatusRequest::default())?;
        assert_eq!(outcome.message, "# Changes");
        assert_eq!(outcome.details["passthrough"], true);
        Ok(())
    }

    #[test]
    fn missing_and_modified_files_are_listed() -> Result<()> {
        let repo = setup()?;
        fs::remove_file(repo.root.join("a.bin"))?;
        fs::write(repo.root.join("b.bin"), b"edited")?;

        let outcome = status(&repo.ctx()?, &StatusRequest::default())?;
        assert_eq!(
            outcome.message,
            "# Changes\n\
             # Missing locally: 'a.bin' (remote 'origin')\n\
             # Modified: 'b.bin' (remote 'origin')"
        );
        Ok(())
    }

    #[test]
    fn verbose_lists_unmodified_files() -> Result<()> {
        let repo = setup()?;
        let outcome = status(
            &repo.ctx()?,
            &StatusRequest {
                paths: args(&["c.bin"]),
                verbose: true,
            },
        )?;
        assert_eq!(
            outcome.message,
            "# Changes\n# Unmodified: 'c.bin' (remote 'origin')"
        );
        assert_eq!(outcome.details["changes"][0]["state"], "unmodified");
        Ok(())
    }

    #[test]
    fn status_of_an_untracked_file_fails() -> Result<()> {
        let repo = setup()?;
        let err = status(
            &repo.ctx()?,
            &StatusRequest {
                paths: args(&["zzz.bin"]),
                verbose: false,
            },
        )
        .unwrap_err();
        assert!(format!("{err:#}").starts_with("Failed to get status of 'zzz.bin'"));
        Ok(())
    }
}
