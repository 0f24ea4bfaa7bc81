use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::hash::is_valid_checksum;

pub const SIDECAR_SUFFIX: &str = ".got";

const PERMISSION_MASK: u32 = 0o7777;

/// Sidecar contents kept in git in place of a large file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFileRecord {
    #[serde(rename = "sha-256")]
    pub checksum: String,
    pub remote: String,
    pub mode: u32,
}

impl TrackedFileRecord {
    pub fn new(checksum: impl Into<String>, remote: impl Into<String>, mode: u32) -> Self {
        Self {
            checksum: checksum.into(),
            remote: remote.into(),
            mode,
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read sidecar {}", path.display()))?;
        let record: Self = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse sidecar {}", path.display()))?;
        if !is_valid_checksum(&record.checksum) {
            bail!("sidecar {} carries an invalid checksum", path.display());
        }
        Ok(record)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_string(self).context("failed to encode sidecar")?;
        fs::write(path, body).with_context(|| format!("failed to write sidecar {}", path.display()))
    }

    pub fn permission_bits(&self) -> u32 {
        self.mode & PERMISSION_MASK
    }

    /// Returns a copy carrying `bits` as its permissions; file-type bits survive.
    #[must_use]
    pub fn with_permissions(&self, bits: u32) -> Self {
        Self {
            mode: (self.mode & !PERMISSION_MASK) | (bits & PERMISSION_MASK),
            ..self.clone()
        }
    }
}

/// `dir/name` is tracked by `dir/.name.got`.
pub fn sidecar_path(real: &Path) -> PathBuf {
    let name = real
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sidecar = format!(".{name}{SIDECAR_SUFFIX}");
    match real.parent() {
        Some(parent) => parent.join(sidecar),
        None => PathBuf::from(sidecar),
    }
}

/// Inverse of [`sidecar_path`]; `None` when `sidecar` is not named like one.
pub fn tracked_path_for_sidecar(sidecar: &Path) -> Option<PathBuf> {
    let name = sidecar.file_name()?.to_str()?;
    let inner = name.strip_prefix('.')?.strip_suffix(SIDECAR_SUFFIX)?;
    if inner.is_empty() {
        return None;
    }
    Some(match sidecar.parent() {
        Some(parent) => parent.join(inner),
        None => PathBuf::from(inner),
    })
}
