use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::{resolve_cache_location, CacheLocation};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub debug: u8,
    pub json: bool,
}

impl GlobalOptions {
    /// At debug level and above, failures surface with their full error chain.
    #[must_use]
    pub fn propagates_errors(&self) -> bool {
        self.debug >= 3
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) cache: CacheConfig,
    pub(crate) network: NetworkConfig,
    pub(crate) identity: IdentityConfig,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    ///
    /// # Errors
    /// Returns an error if the cache path cannot be resolved.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> anyhow::Result<Self> {
        let home = snapshot
            .var("HOME")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(dirs_next::home_dir);
        let http_timeout = snapshot
            .var("GOT_HTTP_TIMEOUT")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        Ok(Self {
            cache: CacheConfig {
                location: resolve_cache_location(snapshot.var("GOT_CACHE_PATH"), home.as_deref())?,
            },
            network: NetworkConfig {
                http_timeout: Duration::from_secs(http_timeout),
            },
            identity: IdentityConfig {
                user: snapshot
                    .var("USER")
                    .or_else(|| snapshot.var("USERNAME"))
                    .filter(|value| !value.is_empty())
                    .map(ToOwned::to_owned),
                home,
            },
        })
    }

    #[must_use]
    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    #[must_use]
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityConfig {
        &self.identity
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub location: CacheLocation,
}

#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    pub http_timeout: Duration,
}

/// Who we are when a remote URL does not say.
#[derive(Debug, Clone, Default)]
pub struct IdentityConfig {
    pub user: Option<String>,
    pub home: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_defaults_under_home() {
        let snapshot = EnvSnapshot::testing(&[("HOME", "/home/dev"), ("USER", "dev")]);
        let config = Config::from_snapshot(&snapshot).unwrap();
        assert_eq!(
            config.cache().location.path,
            PathBuf::from("/home/dev/.git-got-cache")
        );
        assert_eq!(config.identity().user.as_deref(), Some("dev"));
        assert_eq!(config.network().http_timeout, Duration::from_secs(300));
    }

    #[test]
    fn cache_override_and_timeout_come_from_env() {
        let snapshot = EnvSnapshot::testing(&[
            ("HOME", "/home/dev"),
            ("GOT_CACHE_PATH", "/var/cache/got"),
            ("GOT_HTTP_TIMEOUT", "12"),
        ]);
        let config = Config::from_snapshot(&snapshot).unwrap();
        assert_eq!(config.cache().location.path, PathBuf::from("/var/cache/got"));
        assert_eq!(config.cache().location.source, "GOT_CACHE_PATH");
        assert_eq!(config.network().http_timeout, Duration::from_secs(12));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let snapshot = EnvSnapshot::testing(&[("HOME", "/h"), ("GOT_HTTP_TIMEOUT", "0")]);
        let config = Config::from_snapshot(&snapshot).unwrap();
        assert_eq!(config.network().http_timeout, Duration::from_secs(300));
    }
}
