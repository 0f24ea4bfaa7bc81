use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::progress::TransferProgress;

/// Full `st_mode` of `path`, file-type bits included.
#[cfg(unix)]
pub(crate) fn file_mode(path: &Path) -> Result<u32> {
    use std::os::unix::fs::MetadataExt;
    let meta = fs::metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
    Ok(meta.mode())
}

#[cfg(not(unix))]
pub(crate) fn file_mode(path: &Path) -> Result<u32> {
    let meta = fs::metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
    Ok(if meta.permissions().readonly() {
        0o100_444
    } else {
        0o100_644
    })
}

#[cfg(unix)]
pub(crate) fn apply_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .with_context(|| format!("failed to set mode {:o} on {}", mode & 0o7777, path.display()))
}

#[cfg(not(unix))]
pub(crate) fn apply_mode(path: &Path, mode: u32) -> Result<()> {
    let mut perms = fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .permissions();
    perms.set_readonly(mode & 0o222 == 0);
    fs::set_permissions(path, perms)
        .with_context(|| format!("failed to set permissions on {}", path.display()))
}

/// Missing files count as removed.
pub(crate) fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Copies `reader` into `writer` in `block`-sized chunks, advancing `progress`.
pub(crate) fn copy_blocks<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    block: usize,
    progress: &mut TransferProgress,
) -> io::Result<u64> {
    let mut buffer = vec![0_u8; block];
    let mut copied = 0_u64;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        writer.write_all(&buffer[..read])?;
        copied += read as u64;
        progress.advance(read as u64);
    }
    writer.flush()?;
    Ok(copied)
}

/// Temporary file in `dest`'s directory so the final rename stays on one device.
pub(crate) fn sibling_tempfile(dest: &Path) -> io::Result<NamedTempFile> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    tempfile::Builder::new()
        .prefix(".got-partial-")
        .tempfile_in(parent)
}

pub(crate) fn persist_named_tempfile(tmp: NamedTempFile, dest: &Path) -> io::Result<()> {
    match tmp.persist(dest) {
        Ok(_) => Ok(()),
        Err(err) => {
            let file = err.file;
            if is_cross_device(&err.error) {
                let mut reader = file.reopen()?;
                let mut writer = File::create(dest)?;
                io::copy(&mut reader, &mut writer)?;
                file.close().ok();
                Ok(())
            } else {
                Err(err.error)
            }
        }
    }
}

fn is_cross_device(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(18))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copy_blocks_reports_every_byte() -> Result<()> {
        let data = vec![7_u8; 10_000];
        let mut out = Vec::new();
        let mut progress = TransferProgress::new("Uploading", "blob", data.len() as u64);
        let copied = copy_blocks(&mut data.as_slice(), &mut out, 4096, &mut progress)?;
        assert_eq!(copied, 10_000);
        assert_eq!(progress.transferred(), 10_000);
        assert_eq!(out, data);
        Ok(())
    }

    #[test]
    fn remove_if_exists_tolerates_missing_files() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("gone.bin");
        assert!(!remove_if_exists(&path)?);
        fs::write(&path, b"x")?;
        assert!(remove_if_exists(&path)?);
        assert!(!path.exists());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn apply_mode_sets_permission_bits() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("tool.sh");
        fs::write(&path, b"#!/bin/sh\n")?;
        apply_mode(&path, 0o100_755)?;
        assert_eq!(file_mode(&path)? & 0o7777, 0o755);
        Ok(())
    }
}
