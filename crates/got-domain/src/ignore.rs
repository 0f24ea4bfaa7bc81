use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// The repository-root `.gitignore`, one tracked file per line.
#[derive(Debug, Clone)]
pub struct IgnoreList {
    path: PathBuf,
    lines: Vec<String>,
}

impl IgnoreList {
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(".gitignore");
        let lines = if path.exists() {
            fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?
                .lines()
                .map(ToOwned::to_owned)
                .collect()
        } else {
            Vec::new()
        };
        Ok(Self { path, lines })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.lines.iter().any(|line| line == entry)
    }

    /// Returns `false` when the entry was already listed.
    pub fn add(&mut self, entry: &str) -> bool {
        if self.contains(entry) {
            return false;
        }
        self.lines.push(entry.to_string());
        true
    }

    /// Drops every line equal to `entry`; returns whether anything changed.
    pub fn remove(&mut self, entry: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line != entry);
        before != self.lines.len()
    }

    pub fn rename(&mut self, from: &str, to: &str) {
        self.remove(from);
        self.add(to);
    }

    pub fn save(&self) -> Result<()> {
        let mut body = self.lines.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        fs::write(&self.path, body)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}
