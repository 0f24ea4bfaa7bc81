use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::debug;

/// The slice of git that sidecar bookkeeping needs. Paths are relative to
/// `root` or absolute inside it.
pub trait GitClient: Send + Sync {
    /// Records the current state of `path` (including its deletion) in the index.
    fn stage(&self, root: &Path, path: &Path) -> Result<()>;

    /// Drops a not-yet-committed addition from the index.
    fn unstage(&self, root: &Path, path: &Path) -> Result<()>;

    /// Stages the removal of a committed path; the worktree is left alone.
    fn stage_removal(&self, root: &Path, path: &Path) -> Result<()>;

    /// Paths added to the index since the last commit, relative to `root`.
    fn staged_additions(&self, root: &Path) -> Result<HashSet<PathBuf>>;

    /// Every path git knows about, relative to `root`.
    fn tracked_paths(&self, root: &Path) -> Result<HashSet<PathBuf>>;
}

pub trait Effects: Send + Sync {
    fn git(&self) -> &dyn GitClient;
}

pub struct SystemEffects {
    git: Arc<SystemGit>,
}

impl SystemEffects {
    #[must_use]
    pub fn new() -> Self {
        Self {
            git: Arc::new(SystemGit),
        }
    }
}

impl Default for SystemEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl Effects for SystemEffects {
    fn git(&self) -> &dyn GitClient {
        self.git.as_ref()
    }
}

struct SystemGit;

impl SystemGit {
    fn run(root: &Path, args: &[&str], path: Option<&Path>) -> Result<Vec<u8>> {
        let mut command = Command::new("git");
        command.args(args).current_dir(root);
        if let Some(path) = path {
            command.arg("--").arg(path);
        }
        debug!(?args, path = ?path, "running git");
        let output = command
            .output()
            .with_context(|| format!("failed to run git {}", args.join(" ")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git {} failed: {}", args.join(" "), stderr.trim());
        }
        Ok(output.stdout)
    }
}

fn split_z(stdout: &[u8]) -> HashSet<PathBuf> {
    stdout
        .split(|byte| *byte == 0)
        .filter(|entry| !entry.is_empty())
        .map(|entry| PathBuf::from(String::from_utf8_lossy(entry).into_owned()))
        .collect()
}

impl GitClient for SystemGit {
    fn stage(&self, root: &Path, path: &Path) -> Result<()> {
        SystemGit::run(root, &["add", "-A"], Some(path)).map(drop)
    }

    // `git reset` needs a HEAD; a fresh repository has none yet.
    fn unstage(&self, root: &Path, path: &Path) -> Result<()> {
        SystemGit::run(root, &["rm", "--cached", "--quiet", "--ignore-unmatch"], Some(path))
            .map(drop)
    }

    fn stage_removal(&self, root: &Path, path: &Path) -> Result<()> {
        SystemGit::run(root, &["rm", "--cached", "--quiet", "--ignore-unmatch"], Some(path))
            .map(drop)
    }

    fn staged_additions(&self, root: &Path) -> Result<HashSet<PathBuf>> {
        let stdout = SystemGit::run(
            root,
            &["diff", "--cached", "--name-only", "--diff-filter=A", "-z"],
            None,
        )?;
        Ok(split_z(&stdout))
    }

    fn tracked_paths(&self, root: &Path) -> Result<HashSet<PathBuf>> {
        let stdout = SystemGit::run(root, &["ls-files", "-z"], None)?;
        Ok(split_z(&stdout))
    }
}

pub type SharedEffects = Arc<dyn Effects>;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_separated_listing_is_split() {
        let paths = split_z(b"a.bin\0dir/b c.bin\0\0");
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(Path::new("dir/b c.bin")));
    }
}
