use std::path::Path;

use anyhow::{Context, Result};
use got_domain::{file_sha256, RemoteConfig};
use tracing::debug;

use super::cache::{CacheFill, LocalCache};
use super::transport::{StoreOutcome, Transfer, Transport};
use crate::errors::GotError;
use crate::fs::{persist_named_tempfile, sibling_tempfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Cache,
    Remote,
}

/// A transport fronted by the local cache. Without a cache every call goes
/// straight to the remote.
pub struct CachingStore {
    config: RemoteConfig,
    transport: Box<dyn Transport>,
    cache: Option<LocalCache>,
}

impl CachingStore {
    pub fn new(
        config: RemoteConfig,
        transport: Box<dyn Transport>,
        cache: Option<LocalCache>,
    ) -> Self {
        Self {
            config,
            transport,
            cache,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&LocalCache> {
        self.cache.as_ref()
    }

    /// Materializes the object for `checksum` at `dest`.
    ///
    /// `force` skips the cache lookup. Remote bytes are verified before they
    /// replace `dest` and before they are offered to the cache.
    pub fn load(
        &self,
        dest: &Path,
        checksum: &str,
        label: &str,
        force: bool,
    ) -> Result<LoadSource> {
        if !force {
            if let Some(cache) = &self.cache {
                if cache.try_load(checksum, dest, label) {
                    debug!(label, "served from cache");
                    return Ok(LoadSource::Cache);
                }
            }
        }

        let staged =
            sibling_tempfile(dest).with_context(|| format!("failed to stage {}", dest.display()))?;
        self.transport
            .fetch(&Transfer {
                local: staged.path(),
                label,
                checksum,
            })
            .map_err(GotError::from)?;
        let actual = file_sha256(staged.path())?;
        if !actual.eq_ignore_ascii_case(checksum) {
            return Err(GotError::IntegrityMismatch {
                label: label.to_string(),
                expected: checksum.to_ascii_lowercase(),
                actual,
            }
            .into());
        }
        persist_named_tempfile(staged, dest)
            .with_context(|| format!("failed to write {}", dest.display()))?;
        self.backfill(dest, checksum);
        Ok(LoadSource::Remote)
    }

    /// Publishes `src` under `checksum`, then makes sure the cache has it.
    pub fn store(&self, src: &Path, checksum: &str, label: &str) -> Result<StoreOutcome> {
        let outcome = self
            .transport
            .store(&Transfer {
                local: src,
                label,
                checksum,
            })
            .map_err(GotError::from)?;
        self.backfill(src, checksum);
        Ok(outcome)
    }

    fn backfill(&self, path: &Path, checksum: &str) -> Option<CacheFill> {
        self.cache.as_ref().map(|cache| cache.store(path, checksum))
    }
}

impl std::fmt::Debug for CachingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingStore")
            .field("name", &self.config.name)
            .field("remote_type", &self.transport.remote_type())
            .field("url", &self.transport.url().as_str())
            .field("cache", &self.cache.as_ref().map(LocalCache::root))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::transport::{connect_transport, TransportOptions};
    use got_domain::RemoteType;
    use std::fs;
    use tempfile::tempdir;
    use url::Url;

    fn file_store(remote: &Path, cache: Option<LocalCache>) -> Result<CachingStore> {
        let url = Url::from_directory_path(remote)
            .map_err(|()| anyhow::anyhow!("bad directory {}", remote.display()))?;
        let config = RemoteConfig::new("origin", RemoteType::File, url.as_str(), true);
        let transport = connect_transport(&config, &TransportOptions::default())?;
        Ok(CachingStore::new(config, transport, cache))
    }

    #[test]
    fn stored_content_loads_back() -> Result<()> {
        let temp = tempdir()?;
        let cache = LocalCache::new(temp.path().join("cache"));
        let store = file_store(&temp.path().join("remote"), Some(cache.clone()))?;
        let src = temp.path().join("data.bin");
        fs::write(&src, b"content C")?;
        let checksum = file_sha256(&src)?;

        assert_eq!(store.store(&src, &checksum, "data.bin")?, StoreOutcome::Uploaded);
        assert!(cache.contains(&checksum));
        assert_eq!(
            store.store(&src, &checksum, "data.bin")?,
            StoreOutcome::AlreadyPresent
        );

        let dest = temp.path().join("restored.bin");
        let source = store.load(&dest, &checksum, "restored.bin", false)?;
        assert_eq!(source, LoadSource::Cache);
        assert_eq!(fs::read(&dest)?, b"content C");
        Ok(())
    }

    #[test]
    fn forced_load_goes_to_the_remote_and_backfills() -> Result<()> {
        let temp = tempdir()?;
        let remote = temp.path().join("remote");
        let src = temp.path().join("data.bin");
        fs::write(&src, b"remote bytes")?;
        let checksum = file_sha256(&src)?;
        file_store(&remote, None)?.store(&src, &checksum, "data.bin")?;

        let cache = LocalCache::new(temp.path().join("cache"));
        let store = file_store(&remote, Some(cache.clone()))?;
        let dest = temp.path().join("out.bin");
        assert_eq!(store.load(&dest, &checksum, "out.bin", true)?, LoadSource::Remote);
        assert_eq!(fs::read(&dest)?, b"remote bytes");
        assert!(cache.contains(&checksum));
        Ok(())
    }

    #[test]
    fn corrupted_remote_object_is_rejected_without_touching_dest() -> Result<()> {
        let temp = tempdir()?;
        let remote = temp.path().join("remote");
        let src = temp.path().join("data.bin");
        fs::write(&src, b"genuine")?;
        let checksum = file_sha256(&src)?;
        file_store(&remote, None)?.store(&src, &checksum, "data.bin")?;
        fs::write(remote.join(format!("{checksum}.got")), b"bit rot")?;

        let cache = LocalCache::new(temp.path().join("cache"));
        let store = file_store(&remote, Some(cache.clone()))?;
        let dest = temp.path().join("out.bin");
        fs::write(&dest, b"previous contents")?;
        let err = store.load(&dest, &checksum, "out.bin", false).unwrap_err();
        let reason = crate::errors::find_got_error(&err).map(GotError::reason);
        assert_eq!(reason, Some("integrity_mismatch"));
        assert_eq!(fs::read(&dest)?, b"previous contents");
        assert!(!cache.contains(&checksum));
        Ok(())
    }
}
