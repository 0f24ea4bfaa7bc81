use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use got_domain::{
    relative_label, sidecar_path, tracked_path_for_sidecar, TrackedFileRecord, GOT_DIR,
};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::errors::GotError;

/// A real file and its sidecar, addressed from the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrackedEntity {
    pub(crate) real: PathBuf,
    pub(crate) sidecar: PathBuf,
    /// Repository-relative `/`-separated path; also the ignore-list entry.
    pub(crate) label: String,
}

impl TrackedEntity {
    fn new(root: &Path, real: PathBuf) -> Self {
        let label = relative_label(root, &real).unwrap_or_else(|| real.display().to_string());
        let sidecar = sidecar_path(&real);
        Self {
            real,
            sidecar,
            label,
        }
    }

    pub(crate) fn is_tracked(&self) -> bool {
        self.sidecar.is_file()
    }

    pub(crate) fn record(&self) -> Result<TrackedFileRecord> {
        if !self.is_tracked() {
            return Err(GotError::NotTracked(self.label.clone()).into());
        }
        TrackedFileRecord::read(&self.sidecar)
    }

    /// Sidecar path relative to `root`, the form git is handed.
    pub(crate) fn sidecar_in(&self, root: &Path) -> PathBuf {
        self.sidecar
            .strip_prefix(root)
            .map_or_else(|_| self.sidecar.clone(), Path::to_path_buf)
    }
}

/// Resolves command arguments against the invocation directory and expands
/// directories into the entities beneath them.
pub(crate) struct Walker<'a> {
    root: &'a Path,
    cwd: &'a Path,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(root: &'a Path, cwd: &'a Path) -> Self {
        Self { root, cwd }
    }

    pub(crate) fn resolve(&self, arg: &str) -> PathBuf {
        normalize(&self.cwd.join(arg))
    }

    /// Every argument must land inside the repository before any is processed.
    pub(crate) fn resolve_all(&self, args: &[String]) -> Result<Vec<PathBuf>, GotError> {
        args.iter()
            .map(|arg| {
                let full = self.resolve(arg);
                if full.starts_with(self.root) && real_path(&full).starts_with(self.root) {
                    Ok(full)
                } else {
                    Err(GotError::OutsideRepository(full.display().to_string()))
                }
            })
            .collect()
    }

    /// `verb` completes "Got only allows files, not subdirectories, to be ...".
    pub(crate) fn reject_directories(&self, args: &[String], verb: &str) -> Result<(), GotError> {
        if args.iter().any(|arg| self.resolve(arg).is_dir()) {
            return Err(GotError::usage(format!(
                "Got only allows files, not subdirectories, to be {verb}"
            )));
        }
        Ok(())
    }

    pub(crate) fn entity(&self, arg: &str) -> TrackedEntity {
        TrackedEntity::new(self.root, self.resolve(arg))
    }

    /// Sidecar-driven: directories yield every tracked file below them.
    /// A non-directory argument is taken as-is, present or not.
    pub(crate) fn tracked(&self, args: &[String]) -> Result<Vec<TrackedEntity>> {
        let mut entities = Vec::new();
        for full in self.resolve_all(args)? {
            debug!(argument = %full.display(), "walking tracked files");
            if full.is_dir() {
                for file in files_below(&full)? {
                    if let Some(real) = tracked_path_for_sidecar(&file) {
                        entities.push(TrackedEntity::new(self.root, real));
                    }
                }
            } else {
                entities.push(TrackedEntity::new(self.root, full));
            }
        }
        Ok(entities)
    }

    /// Every tracked file in the repository.
    pub(crate) fn all_tracked(&self) -> Result<Vec<TrackedEntity>> {
        let mut entities = Vec::new();
        for file in files_below(self.root)? {
            if let Some(real) = tracked_path_for_sidecar(&file) {
                entities.push(TrackedEntity::new(self.root, real));
            }
        }
        Ok(entities)
    }

    /// Filesystem-driven: directories yield the files git does not know
    /// about yet. `known` holds root-relative paths.
    pub(crate) fn untracked(
        &self,
        args: &[String],
        known: &HashSet<PathBuf>,
    ) -> Result<Vec<TrackedEntity>> {
        let mut entities = Vec::new();
        for full in self.resolve_all(args)? {
            debug!(argument = %full.display(), "walking untracked files");
            if !full.is_dir() {
                entities.push(TrackedEntity::new(self.root, full));
                continue;
            }
            for file in files_below(&full)? {
                if tracked_path_for_sidecar(&file).is_some() {
                    continue;
                }
                let entity = TrackedEntity::new(self.root, file);
                if known.contains(Path::new(&entity.label)) {
                    debug!(file = %entity.label, "skipping file already in git");
                    continue;
                }
                entities.push(entity);
            }
        }
        Ok(entities)
    }
}

fn is_bookkeeping_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && (entry.file_name() == ".git" || entry.file_name() == GOT_DIR)
}

fn files_below(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walk = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_bookkeeping_dir(entry));
    for entry in walk {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Lexical cleanup of `.` and `..`; symlinks are left alone.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolves symlinks through the deepest existing ancestor of `path`.
fn real_path(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut missing: Vec<OsString> = Vec::new();
    loop {
        if let Ok(mut resolved) = existing.canonicalize() {
            for part in missing.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}
