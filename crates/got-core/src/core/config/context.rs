use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use got_domain::discover_repo_root;

use crate::config::{Config, EnvSnapshot, GlobalOptions};
use crate::effects::{Effects, GitClient, SharedEffects};
use crate::errors::GotError;
use crate::store::{LocalCache, TransportOptions};
use crate::CommandGroup;

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
    cwd: PathBuf,
    repo_root: OnceLock<PathBuf>,
    effects: SharedEffects,
}

impl<'a> CommandContext<'a> {
    /// Creates a command context for the current process.
    ///
    /// # Errors
    /// Returns an error if the working directory or configuration cannot be
    /// resolved.
    pub fn new(global: &'a GlobalOptions, effects: SharedEffects) -> Result<Self> {
        let env = EnvSnapshot::capture();
        let config = Config::from_snapshot(&env)?;
        let cwd = std::env::current_dir().context("unable to determine current directory")?;
        Ok(Self {
            global,
            config,
            cwd,
            repo_root: OnceLock::new(),
            effects,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        global: &'a GlobalOptions,
        cwd: &Path,
        env: EnvSnapshot,
        effects: SharedEffects,
    ) -> Result<Self> {
        let config = Config::from_snapshot(&env)?;
        Ok(Self {
            global,
            config,
            cwd: cwd.to_path_buf(),
            repo_root: OnceLock::new(),
            effects,
        })
    }

    pub fn effects(&self) -> &dyn Effects {
        self.effects.as_ref()
    }

    pub fn git(&self) -> &dyn GitClient {
        self.effects.git()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn cache(&self) -> LocalCache {
        LocalCache::new(self.config.cache().location.path.clone())
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions::from_config(&self.config)
    }

    /// Resolves the enclosing git repository's root directory.
    ///
    /// # Errors
    /// Returns an error if no `.git` entry exists above the working directory.
    pub fn repo_root(&self) -> Result<PathBuf> {
        if let Some(path) = self.repo_root.get() {
            return Ok(path.clone());
        }
        let path = discover_repo_root(&self.cwd)?
            .ok_or_else(|| GotError::configuration("Could not find git repository"))?;
        let _ = self.repo_root.set(path.clone());
        Ok(path)
    }
}
