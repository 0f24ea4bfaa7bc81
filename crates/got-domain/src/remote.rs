use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const GOT_DIR: &str = ".got";
pub const DEFAULT_REGISTRATION: &str = "default";
pub const REGISTRATION_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteType {
    Scp,
    Srr,
    File,
    Ftp,
}

impl RemoteType {
    pub const ALL: [RemoteType; 4] = [
        RemoteType::Scp,
        RemoteType::Srr,
        RemoteType::File,
        RemoteType::Ftp,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RemoteType::Scp => "scp",
            RemoteType::Srr => "srr",
            RemoteType::File => "file",
            RemoteType::Ftp => "ftp",
        }
    }

    /// URL schemes a remote of this type may be registered with.
    pub fn schemes(self) -> &'static [&'static str] {
        match self {
            RemoteType::Scp => &["ssh"],
            RemoteType::Srr => &["http", "https"],
            RemoteType::File => &["file"],
            RemoteType::Ftp => &["ftp"],
        }
    }
}

impl fmt::Display for RemoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registration file under `.got/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(rename = "remote")]
    pub url: String,
    pub remote_type: RemoteType,
    pub version: u32,
    pub name: String,
    #[serde(rename = "default")]
    pub is_default: bool,
}

impl RemoteConfig {
    pub fn new(
        name: impl Into<String>,
        remote_type: RemoteType,
        url: impl Into<String>,
        is_default: bool,
    ) -> Self {
        Self {
            url: url.into(),
            remote_type,
            version: REGISTRATION_VERSION,
            name: name.into(),
            is_default,
        }
    }

    pub fn path(&self, root: &Path) -> PathBuf {
        registration_path(root, &self.name, self.is_default)
    }

    pub fn write(&self, root: &Path) -> Result<PathBuf> {
        let dir = root.join(GOT_DIR);
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let path = self.path(root);
        let body = serde_json::to_string(self).context("failed to encode remote registration")?;
        fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

pub fn registration_path(root: &Path, name: &str, is_default: bool) -> PathBuf {
    let file = if is_default { DEFAULT_REGISTRATION } else { name };
    root.join(GOT_DIR).join(file)
}

/// Reads every registration under `.got/`, default first, then by file name.
pub fn load_registrations(root: &Path) -> Result<Vec<RemoteConfig>> {
    let dir = root.join(GOT_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
        if entry.file_type().map(|kind| kind.is_file()).unwrap_or(false) {
            paths.push(entry.path());
        }
    }
    paths.sort_by_key(|path| {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        (name != DEFAULT_REGISTRATION, name)
    });

    let mut configs = Vec::with_capacity(paths.len());
    for path in paths {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: RemoteConfig = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse remote registration {}", path.display()))?;
        tracing::debug!(name = %config.name, path = %path.display(), "loaded remote registration");
        configs.push(config);
    }
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn registration_json_uses_wire_names() -> Result<()> {
        let config = RemoteConfig::new("origin", RemoteType::File, "file:///srv/got", true);
        let raw: serde_json::Value = serde_json::to_value(&config)?;
        assert_eq!(raw["remote"], "file:///srv/got");
        assert_eq!(raw["remote_type"], "file");
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["name"], "origin");
        assert_eq!(raw["default"], true);
        Ok(())
    }

    #[test]
    fn default_registration_is_loaded_first() -> Result<()> {
        let temp = tempdir()?;
        RemoteConfig::new("backup", RemoteType::Ftp, "ftp://host/dir", false).write(temp.path())?;
        RemoteConfig::new("origin", RemoteType::File, "file:///srv", true).write(temp.path())?;
        RemoteConfig::new("archive", RemoteType::Srr, "https://srr/1", false).write(temp.path())?;

        let names: Vec<_> = load_registrations(temp.path())?
            .into_iter()
            .map(|config| config.name)
            .collect();
        assert_eq!(names, ["origin", "archive", "backup"]);
        assert!(temp.path().join(".got").join("default").is_file());
        Ok(())
    }

    #[test]
    fn remote_types_parse_and_expose_schemes() {
        assert_eq!(RemoteType::parse("scp"), Some(RemoteType::Scp));
        assert_eq!(RemoteType::parse("s3"), None);
        assert_eq!(RemoteType::Srr.schemes(), ["http", "https"]);
        assert_eq!(RemoteType::Scp.schemes(), ["ssh"]);
    }
}
