use std::fs;

use anyhow::{Context, Result};
use got_domain::{
    load_registrations, registration_path, RemoteConfig, RemoteType, DEFAULT_REGISTRATION,
    REGISTRATION_VERSION,
};
use serde_json::json;
use tracing::{debug, info};

use crate::errors::GotError;
use crate::store::validate_remote_url;
use crate::sync::{checked_registrations, initialized_registrations, Session};
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug)]
pub struct RegisterRemoteRequest {
    pub name: String,
    pub remote_type: String,
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct RemoveRemoteRequest {
    pub name: String,
}

#[derive(Clone, Debug, Default)]
pub struct ListRemotesRequest;

#[derive(Clone, Debug, Default)]
pub struct UpgradeRequest;

fn parse_remote_type(raw: &str) -> Result<RemoteType, GotError> {
    RemoteType::parse(raw).ok_or_else(|| {
        let known: Vec<_> = RemoteType::ALL.iter().map(|kind| kind.as_str()).collect();
        GotError::configuration(format!(
            "Unknown remote type '{raw}' (expected one of {})",
            known.join(", ")
        ))
    })
}

fn validate_name(name: &str) -> Result<(), GotError> {
    let invalid = name.is_empty()
        || name == DEFAULT_REGISTRATION
        || name.starts_with('.')
        || name.contains(['/', '\\']);
    if invalid {
        return Err(GotError::configuration(format!("Invalid remote name '{name}'")));
    }
    Ok(())
}

fn register(
    ctx: &CommandContext,
    request: &RegisterRemoteRequest,
    existing: &[RemoteConfig],
    is_default: bool,
) -> Result<ExecutionOutcome> {
    let root = ctx.repo_root()?;
    validate_name(&request.name)?;
    if existing.iter().any(|config| config.name == request.name)
        || registration_path(&root, &request.name, false).exists()
    {
        return Err(GotError::configuration(format!(
            "Failed to add remote: a remote with the name '{}' already exists",
            request.name
        ))
        .into());
    }
    let remote_type = parse_remote_type(&request.remote_type)?;
    validate_remote_url(remote_type, &request.url)?;

    let config = RemoteConfig::new(&request.name, remote_type, &request.url, is_default);
    let path = config.write(&root)?;
    ctx.git().stage(&root, &path)?;
    info!(name = %config.name, remote_type = %remote_type, "registered remote");
    Ok(ExecutionOutcome::success(
        format!("registered {remote_type} remote '{}'", config.name),
        json!({
            "name": config.name,
            "remote_type": remote_type.as_str(),
            "url": config.url,
            "default": is_default,
        }),
    ))
}

/// Creates `.got/default`, making the repository usable.
///
/// # Errors
/// Returns an error if the repository is already initialized or the remote
/// is invalid.
pub fn init(ctx: &CommandContext, request: &RegisterRemoteRequest) -> Result<ExecutionOutcome> {
    let root = ctx.repo_root()?;
    if registration_path(&root, &request.name, true).exists() {
        return Err(GotError::configuration("Got remote already initialized!").into());
    }
    let existing = load_registrations(&root)?;
    register(ctx, request, &existing, true)
}

/// Registers an additional, non-default remote.
///
/// # Errors
/// Returns an error if the repository is not initialized or the name is taken.
pub fn add_remote(ctx: &CommandContext, request: &RegisterRemoteRequest) -> Result<ExecutionOutcome> {
    let root = ctx.repo_root()?;
    let existing = checked_registrations(&root)?;
    register(ctx, request, &existing, false)
}

/// Deletes a registration no tracked file refers to.
///
/// # Errors
/// Returns an error for the default or an unknown remote, or when files are
/// still linked to it.
pub fn remove_remote(ctx: &CommandContext, request: &RemoveRemoteRequest) -> Result<ExecutionOutcome> {
    let session = Session::open(ctx)?;
    let name = request.name.as_str();
    let config = match session.registry().get(name) {
        Some(store) if store.config().is_default => {
            return Err(GotError::configuration("Cannot remove default remote").into())
        }
        Some(store) => store.config().clone(),
        None => {
            return Err(
                GotError::configuration(format!("Could not find remote named '{name}'")).into(),
            )
        }
    };

    let root = session.root();
    let mut linked = Vec::new();
    for entity in session.walker().all_tracked()? {
        let record = entity
            .record()
            .with_context(|| format!("Failed to check remote link '{}'", entity.label))?;
        if record.remote == name {
            linked.push(entity.label);
        }
    }
    if !linked.is_empty() {
        return Err(GotError::configuration(format!(
            "Cannot remove remote '{name}'; the following files are linked to it:\n\n  {}",
            linked.join(", ")
        ))
        .into());
    }

    let path = config.path(root);
    let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
    let git = ctx.git();
    if git.staged_additions(root)?.contains(&relative) {
        git.unstage(root, &relative)?;
        fs::remove_file(&path).with_context(|| format!("failed to delete {}", path.display()))?;
    } else {
        fs::remove_file(&path).with_context(|| format!("failed to delete {}", path.display()))?;
        git.stage_removal(root, &relative)?;
    }
    debug!(name, "removed remote registration");
    Ok(ExecutionOutcome::success(
        format!("removed remote '{name}'"),
        json!({ "name": name }),
    ))
}

/// Tabulates the registered remotes, default starred.
///
/// # Errors
/// Returns an error if the repository is not initialized.
pub fn list_remotes(ctx: &CommandContext, _request: &ListRemotesRequest) -> Result<ExecutionOutcome> {
    let session = Session::open(ctx)?;
    let mut lines = vec!["   Name:\tType:\tURL:".to_string(), "-".repeat(80)];
    let mut remotes = Vec::new();
    for store in session.registry().iter() {
        let config = store.config();
        let marker = if config.is_default { " *" } else { "  " };
        lines.push(format!(
            "{marker} {}\t{}\t{}",
            config.name, config.remote_type, config.url
        ));
        remotes.push(json!({
            "name": config.name,
            "remote_type": config.remote_type.as_str(),
            "url": config.url,
            "default": config.is_default,
        }));
    }
    Ok(ExecutionOutcome::report(
        lines.join("\n"),
        json!({ "remotes": remotes }),
    ))
}

/// Rewrites registrations from older schema versions in the current one.
///
/// # Errors
/// Returns an error if the repository is not initialized or a registration
/// comes from a newer git-got.
pub fn upgrade(ctx: &CommandContext, _request: &UpgradeRequest) -> Result<ExecutionOutcome> {
    let root = ctx.repo_root()?;
    let configs = initialized_registrations(&root)?;
    if let Some(newer) = configs
        .iter()
        .find(|config| config.version > REGISTRATION_VERSION)
    {
        return Err(GotError::VersionMismatch {
            name: newer.name.clone(),
            found: newer.version,
            supported: REGISTRATION_VERSION,
        }
        .into());
    }

    let mut upgraded = Vec::new();
    for mut config in configs {
        if config.version == REGISTRATION_VERSION {
            continue;
        }
        info!(name = %config.name, from = config.version, "upgrading registration");
        config.version = REGISTRATION_VERSION;
        let path = config.write(&root)?;
        ctx.git().stage(&root, &path)?;
        upgraded.push(config.name);
    }
    let message = if upgraded.is_empty() {
        "already up to date".to_string()
    } else {
        format!(
            "upgraded {} to version {REGISTRATION_VERSION}",
            upgraded.join(", ")
        )
    };
    Ok(ExecutionOutcome::success(
        message,
        json!({ "upgraded": upgraded, "version": REGISTRATION_VERSION }),
    ))
}
