//! Per-file state transitions: each handler walks its arguments and keeps
//! the working file, its sidecar, and the git index in step.

mod add;
mod chmod;
mod fill_cache;
mod get;
mod rm;
mod rm_local;
mod mv;
mod status;
pub(crate) mod walker;

#[cfg(test)]
pub(crate) mod test_support;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use got_domain::{
    file_sha256, load_registrations, RemoteConfig, DEFAULT_REGISTRATION, GOT_DIR,
};

use crate::config::context::CommandContext;
use crate::errors::GotError;
use crate::store::{ensure_supported_versions, Registry, NOT_INITIALIZED};

pub use add::{add, AddRequest};
pub use chmod::{chmod, parse_mode, ChmodRequest};
pub use fill_cache::{fill_local_cache, FillCacheRequest};
pub use get::{get, reset, GetRequest, ResetRequest};
pub use mv::{mv, MvRequest};
pub use rm::{rm, RmRequest};
pub use rm_local::{rm_local, RmLocalRequest};
pub use status::{status, StatusRequest};

use walker::Walker;

/// Registrations of an initialized repository, in any schema version.
pub(crate) fn initialized_registrations(root: &Path) -> Result<Vec<RemoteConfig>> {
    if !root.join(GOT_DIR).join(DEFAULT_REGISTRATION).is_file() {
        return Err(GotError::configuration(NOT_INITIALIZED).into());
    }
    load_registrations(root)
}

/// Registrations of an initialized repository written by this schema version.
pub(crate) fn checked_registrations(root: &Path) -> Result<Vec<RemoteConfig>> {
    let configs = initialized_registrations(root)?;
    ensure_supported_versions(&configs)?;
    Ok(configs)
}

/// An initialized repository with its stores ready.
pub(crate) struct Session {
    root: PathBuf,
    cwd: PathBuf,
    registry: Registry,
}

impl Session {
    pub(crate) fn open(ctx: &CommandContext<'_>) -> Result<Self> {
        let root = ctx.repo_root()?;
        let configs = checked_registrations(&root)?;
        let cache = ctx.cache();
        let registry = Registry::from_configs(configs, Some(&cache), &ctx.transport_options())?;
        let cwd = ctx
            .cwd()
            .canonicalize()
            .with_context(|| format!("unable to resolve {}", ctx.cwd().display()))?;
        Ok(Self {
            root,
            cwd,
            registry,
        })
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn walker(&self) -> Walker<'_> {
        Walker::new(&self.root, &self.cwd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocalState {
    Missing,
    Modified,
    Clean,
}

impl LocalState {
    pub(crate) fn of(real: &Path, checksum: &str) -> Result<Self> {
        if !real.exists() {
            return Ok(Self::Missing);
        }
        if file_sha256(real)?.eq_ignore_ascii_case(checksum) {
            Ok(Self::Clean)
        } else {
            Ok(Self::Modified)
        }
    }
}

/// `'data.bin'` for one file, `3 files` otherwise.
pub(crate) fn describe_files(labels: &[String]) -> String {
    match labels {
        [only] => format!("'{only}'"),
        many => format!("{} files", many.len()),
    }
}
