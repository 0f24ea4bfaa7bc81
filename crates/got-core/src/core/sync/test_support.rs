use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use got_domain::{RemoteConfig, RemoteType, TrackedFileRecord};
use tempfile::TempDir;
use url::Url;

use crate::config::context::CommandContext;
use crate::config::{EnvSnapshot, GlobalOptions};
use crate::effects::fake::{self, RecordingGit};
use crate::effects::SharedEffects;

static OPTIONS: GlobalOptions = GlobalOptions {
    debug: 0,
    json: false,
};

/// A scratch repository with a `file://` default remote named `origin`.
pub(crate) struct TestRepo {
    _temp: TempDir,
    pub(crate) root: PathBuf,
    pub(crate) remotes: PathBuf,
    pub(crate) cache: PathBuf,
    pub(crate) git: Arc<RecordingGit>,
    effects: SharedEffects,
}

impl TestRepo {
    pub(crate) fn uninitialized() -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let base = temp.path().canonicalize()?;
        let root = base.join("repo");
        fs::create_dir_all(root.join(".git"))?;
        let (effects, git) = fake::effects();
        Ok(Self {
            root,
            remotes: base.join("remotes"),
            cache: base.join("cache"),
            git,
            effects,
            _temp: temp,
        })
    }

    pub(crate) fn new() -> Result<Self> {
        let repo = Self::uninitialized()?;
        repo.register("origin", true)?;
        repo.git.commit();
        Ok(repo)
    }

    pub(crate) fn remote_url(&self, name: &str) -> Result<String> {
        let dir = self.remotes.join(name);
        Url::from_directory_path(&dir)
            .map(String::from)
            .map_err(|()| anyhow!("bad remote directory {}", dir.display()))
    }

    /// Writes a `file://` registration straight to `.got/`.
    pub(crate) fn register(&self, name: &str, is_default: bool) -> Result<PathBuf> {
        let config = RemoteConfig::new(name, RemoteType::File, self.remote_url(name)?, is_default);
        let path = config.write(&self.root)?;
        self.git.index.lock().unwrap().insert(
            path.strip_prefix(&self.root)?.to_path_buf(),
        );
        Ok(path)
    }

    pub(crate) fn ctx(&self) -> Result<CommandContext<'static>> {
        self.ctx_in(&self.root)
    }

    pub(crate) fn ctx_in(&self, cwd: &Path) -> Result<CommandContext<'static>> {
        let home = self.root.join("home");
        let cache = self.cache.display().to_string();
        let env = EnvSnapshot::testing(&[
            ("HOME", &home.display().to_string()),
            ("GOT_CACHE_PATH", &cache),
        ]);
        CommandContext::for_tests(&OPTIONS, cwd, env, self.effects.clone())
    }

    pub(crate) fn write(&self, relative: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub(crate) fn sidecar(&self, relative: &str) -> PathBuf {
        got_domain::sidecar_path(&self.root.join(relative))
    }

    pub(crate) fn record(&self, relative: &str) -> Result<TrackedFileRecord> {
        TrackedFileRecord::read(&self.sidecar(relative))
    }

    pub(crate) fn ignore_lines(&self) -> Result<Vec<String>> {
        let path = self.root.join(".gitignore");
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_to_string(path)?
            .lines()
            .map(ToOwned::to_owned)
            .collect())
    }

    pub(crate) fn remote_object(&self, name: &str, checksum: &str) -> PathBuf {
        self.remotes.join(name).join(format!("{checksum}.got"))
    }
}

pub(crate) fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}
