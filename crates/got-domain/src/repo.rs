use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Walks up from `start` to the nearest directory holding a `.git` entry.
pub fn discover_repo_root(start: &Path) -> Result<Option<PathBuf>> {
    let mut dir = start
        .canonicalize()
        .with_context(|| format!("unable to resolve {}", start.display()))?;
    loop {
        if dir.join(".git").exists() {
            return Ok(Some(dir));
        }
        if !dir.pop() {
            break;
        }
    }
    Ok(None)
}

/// Repository-relative path using `/` separators, as written to `.gitignore`.
pub fn relative_label(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
