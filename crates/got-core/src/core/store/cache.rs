use std::env;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::fs::sibling_tempfile;
use crate::progress::TransferProgress;

const CACHE_DIR_NAME: &str = ".git-got-cache";
const COPY_BLOCK: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct CacheLocation {
    pub path: PathBuf,
    pub source: &'static str,
}

/// Determine the root directory of the local object cache.
///
/// # Errors
///
/// Returns an error if neither an override nor a home directory is available.
pub(crate) fn resolve_cache_location(
    override_path: Option<&str>,
    home: Option<&Path>,
) -> Result<CacheLocation> {
    if let Some(raw) = override_path.filter(|value| !value.trim().is_empty()) {
        return Ok(CacheLocation {
            path: absolutize(PathBuf::from(raw))?,
            source: "GOT_CACHE_PATH",
        });
    }
    let home = home.ok_or_else(|| anyhow!("unable to determine home directory for the cache"))?;
    Ok(CacheLocation {
        path: home.join(CACHE_DIR_NAME),
        source: "default",
    })
}

fn absolutize(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(env::current_dir()
            .context("unable to determine current directory")?
            .join(path))
    }
}

/// Outcome of offering a file to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheFill {
    Stored,
    AlreadyPresent,
    Failed,
}

/// Write-once object cache sharded by the first hex digit of the checksum.
#[derive(Debug, Clone)]
pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, checksum: &str) -> PathBuf {
        let lowered = checksum.to_ascii_lowercase();
        let (shard, leaf) = lowered.split_at(lowered.len().min(1));
        self.root.join(shard).join(leaf)
    }

    pub fn contains(&self, checksum: &str) -> bool {
        self.entry_path(checksum).is_file()
    }

    /// Copies the cached object to `dest`. Any problem is logged and reported
    /// as a miss so the caller falls back to the remote.
    pub fn try_load(&self, checksum: &str, dest: &Path, label: &str) -> bool {
        let entry = self.entry_path(checksum);
        debug!(entry = %entry.display(), "checking cache");
        if !entry.is_file() {
            debug!("object not in cache");
            return false;
        }
        match restore_entry(&entry, checksum, dest, label) {
            Ok(true) => true,
            Ok(false) => {
                warn!(
                    entry = %entry.display(),
                    "cached object does not match its checksum; discarding it"
                );
                let _ = fs::remove_file(&entry);
                false
            }
            Err(err) => {
                warn!(entry = %entry.display(), error = %format!("{err:#}"), "failed retrieving from cache");
                false
            }
        }
    }

    /// Adds `src` under `checksum` unless an entry already exists.
    pub fn store(&self, src: &Path, checksum: &str) -> CacheFill {
        let entry = self.entry_path(checksum);
        if entry.is_file() {
            debug!(entry = %entry.display(), "object already cached");
            return CacheFill::AlreadyPresent;
        }
        debug!(checksum, "storing object in cache");
        match write_entry(src, &entry) {
            Ok(fill) => fill,
            Err(err) => {
                warn!(entry = %entry.display(), error = %format!("{err:#}"), "failed storing object in cache");
                CacheFill::Failed
            }
        }
    }

    /// Removes the whole cache directory.
    pub fn clear(&self) -> Result<()> {
        if self.root.is_dir() {
            fs::remove_dir_all(&self.root)
                .with_context(|| format!("failed to remove {}", self.root.display()))?;
        }
        if self.root.is_dir() {
            bail!("Failed to clear cache at {}", self.root.display());
        }
        Ok(())
    }
}

fn restore_entry(entry: &Path, checksum: &str, dest: &Path, label: &str) -> Result<bool> {
    let mut src =
        File::open(entry).with_context(|| format!("failed to open {}", entry.display()))?;
    let total = src.metadata().map(|meta| meta.len()).unwrap_or(0);
    let mut tmp = sibling_tempfile(dest)
        .with_context(|| format!("failed to stage {}", dest.display()))?;
    let mut progress = TransferProgress::new("Downloading (cached)", label, total);
    let actual = hashing_copy(&mut src, tmp.as_file_mut(), &mut progress)?;
    progress.finish();
    if !actual.eq_ignore_ascii_case(checksum) {
        return Ok(false);
    }
    crate::fs::persist_named_tempfile(tmp, dest)
        .with_context(|| format!("failed to write {}", dest.display()))?;
    Ok(true)
}

fn write_entry(src: &Path, entry: &Path) -> Result<CacheFill> {
    let mut input = File::open(src).with_context(|| format!("failed to open {}", src.display()))?;
    let mut tmp =
        sibling_tempfile(entry).with_context(|| format!("failed to stage {}", entry.display()))?;
    io::copy(&mut input, tmp.as_file_mut())
        .with_context(|| format!("failed to copy {}", src.display()))?;
    tmp.as_file_mut().flush()?;
    match tmp.persist_noclobber(entry) {
        Ok(_) => Ok(CacheFill::Stored),
        Err(_) if entry.is_file() => Ok(CacheFill::AlreadyPresent),
        Err(err) => {
            Err(err.error).with_context(|| format!("failed to persist {}", entry.display()))
        }
    }
}

fn hashing_copy<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    progress: &mut TransferProgress,
) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0_u8; COPY_BLOCK];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        writer.write_all(&buffer[..read])?;
        progress.advance(read as u64);
    }
    writer.flush()?;
    Ok(hex::encode(hasher.finalize()))
}
